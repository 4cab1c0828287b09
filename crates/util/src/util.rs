pub mod command;
pub mod fs;

use serde_json::Value;
use std::panic::Location;

/// Merges `source` into `target`. Objects are merged key by key, recursively;
/// any other value in `source` replaces the one in `target`.
pub fn merge_json_value_into(source: Value, target: &mut Value) {
    match (source, target) {
        (Value::Object(source), Value::Object(target)) => {
            for (key, value) in source {
                if let Some(target) = target.get_mut(&key) {
                    merge_json_value_into(value, target);
                } else {
                    target.insert(key, value);
                }
            }
        }
        (source, target) => *target = source,
    }
}

pub trait ResultExt<E> {
    type Ok;

    fn log_err(self) -> Option<Self::Ok>;
    fn warn_on_err(self) -> Option<Self::Ok>;
    fn log_with_level(self, level: log::Level) -> Option<Self::Ok>;
}

impl<T, E> ResultExt<E> for Result<T, E>
where
    E: std::fmt::Debug,
{
    type Ok = T;

    #[track_caller]
    fn log_err(self) -> Option<T> {
        self.log_with_level(log::Level::Error)
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        self.log_with_level(log::Level::Warn)
    }

    #[track_caller]
    fn log_with_level(self, level: log::Level) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                log_error_with_caller(*Location::caller(), error, level);
                None
            }
        }
    }
}

fn log_error_with_caller<E>(caller: Location<'_>, error: E, level: log::Level)
where
    E: std::fmt::Debug,
{
    let file = caller.file();
    #[cfg(not(target_os = "windows"))]
    let file = file.split_once("crates/").map_or(file, |(_, file)| file);
    log::logger().log(
        &log::Record::builder()
            .target(file)
            .module_path(Some(file))
            .file(Some(caller.file()))
            .line(Some(caller.line()))
            .level(level)
            .args(format_args!("{:?}", error))
            .build(),
    );
}
