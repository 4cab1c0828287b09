use dap_host::{DapHost, WorkspaceFolder};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::HashMap;
use util::ResultExt as _;

/// The settings section this extension reads from.
pub const SETTINGS_SECTION: &str = "gdb-dap";
pub const EXECUTABLE_PATH_KEY: &str = "executable-path";
pub const LOG_PATH_KEY: &str = "log-path";
pub const LOG_LEVEL_KEY: &str = "log-level";
pub const ENVIRONMENT_KEY: &str = "environment";

/// The fully qualified name of the executable path setting.
pub fn executable_path_setting() -> String {
    format!("{SETTINGS_SECTION}.{EXECUTABLE_PATH_KEY}")
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct GdbDapSettings {
    /// Path to the GDB executable used as the debug adapter.
    ///
    /// Default: found through xcrun on macOS, then on PATH
    pub executable_path: Option<String>,
    /// File GDB writes its DAP log to.
    pub log_path: Option<String>,
    /// Verbosity of GDB's DAP log, passed to GDB as written.
    pub log_level: Option<Number>,
    /// Extra environment variables for the debug adapter process.
    ///
    /// Default: {}
    pub environment: HashMap<String, String>,
}

impl GdbDapSettings {
    /// Reads the current settings, scoped to `folder` when one is given.
    /// Keys holding a value of the wrong type are treated as unset.
    pub fn load(host: &dyn DapHost, folder: Option<&WorkspaceFolder>) -> Self {
        let configuration = host.configuration(SETTINGS_SECTION, folder);
        Self {
            executable_path: configuration.get(EXECUTABLE_PATH_KEY),
            log_path: configuration.get(LOG_PATH_KEY),
            log_level: configuration.get(LOG_LEVEL_KEY),
            environment: configuration.get(ENVIRONMENT_KEY).unwrap_or_default(),
        }
    }

    pub fn executable_path(&self) -> Option<&str> {
        non_empty(self.executable_path.as_deref())
    }

    pub fn log_path(&self) -> Option<&str> {
        non_empty(self.log_path.as_deref())
    }

    pub fn log_level(&self) -> Option<&Number> {
        self.log_level
            .as_ref()
            .filter(|level| level.as_f64().is_some_and(|level| level != 0.0))
    }

    /// JSON schema describing the settings section, for the extension
    /// manifest's configuration contribution.
    pub fn json_schema() -> Value {
        serde_json::to_value(schemars::schema_for!(GdbDapSettings))
            .log_err()
            .unwrap_or_default()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dap_host::FakeHost;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_load_settings() {
        let host = FakeHost::new();
        let folder = WorkspaceFolder::new("app", "/work/app");
        host.set_settings(
            SETTINGS_SECTION,
            json!({
                "executable-path": "/usr/bin/gdb",
                "log-path": "",
                "log-level": "loud",
                "environment": { "TERM": "dumb" }
            }),
        );
        host.set_folder_settings(
            &folder,
            SETTINGS_SECTION,
            json!({ "executable-path": "/opt/gdb/bin/gdb", "log-level": 2 }),
        );

        let settings = GdbDapSettings::load(&*host, None);
        assert_eq!(settings.executable_path(), Some("/usr/bin/gdb"));
        assert_eq!(settings.log_path(), None);
        assert_eq!(settings.log_level(), None);
        assert_eq!(settings.environment["TERM"], "dumb");

        let settings = GdbDapSettings::load(&*host, Some(&folder));
        assert_eq!(settings.executable_path(), Some("/opt/gdb/bin/gdb"));
        assert_eq!(settings.log_level(), Some(&Number::from(2)));
    }

    #[test]
    fn test_log_level_keeps_any_nonzero_number() {
        let host = FakeHost::new();
        for (level, expected) in [
            (json!(-1), Some("-1")),
            (json!(0.5), Some("0.5")),
            (json!(0), None),
            (json!(0.0), None),
        ] {
            host.set_settings(SETTINGS_SECTION, json!({ "log-level": level }));
            let settings = GdbDapSettings::load(&*host, None);
            assert_eq!(
                settings.log_level().map(ToString::to_string).as_deref(),
                expected
            );
        }
    }

    #[test]
    fn test_missing_section_is_default() {
        let host = FakeHost::new();
        assert_eq!(GdbDapSettings::load(&*host, None), GdbDapSettings::default());
    }

    #[test]
    fn test_json_schema_uses_setting_keys() {
        let schema = GdbDapSettings::json_schema();
        let properties = schema["properties"].as_object().unwrap();
        let mut keys = properties.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(
            keys,
            [ENVIRONMENT_KEY, EXECUTABLE_PATH_KEY, LOG_LEVEL_KEY, LOG_PATH_KEY]
        );
    }
}
