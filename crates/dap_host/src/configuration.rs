use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde_json::Value;
use util::ResultExt as _;

/// A read-only view of one settings section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    section: String,
    value: Value,
}

impl Configuration {
    pub fn new(section: impl Into<String>, value: Value) -> Self {
        Self {
            section: section.into(),
            value,
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Returns the value stored under `key`. Missing and `null` values are
    /// `None`; values of the wrong type are logged and also `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.value.get(key).filter(|value| !value.is_null())?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("invalid value for setting `{}.{key}`", self.section))
            .warn_on_err()
    }
}

/// Describes which settings changed. Keys are dotted, e.g.
/// `gdb-dap.executable-path`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigurationChangeEvent {
    affected_keys: Vec<String>,
}

impl ConfigurationChangeEvent {
    pub fn new(affected_keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            affected_keys: affected_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `section` changed, either directly, through one of its
    /// children, or through one of its parents.
    pub fn affects_configuration(&self, section: &str) -> bool {
        self.affected_keys.iter().any(|key| {
            key == section || is_dotted_prefix(key, section) || is_dotted_prefix(section, key)
        })
    }
}

fn is_dotted_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('.'))
}
