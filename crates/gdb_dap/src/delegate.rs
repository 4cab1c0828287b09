use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::path::Path;

const XCRUN_PATH: &str = "/usr/bin/xcrun";

/// Platform facts the resolver depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Os {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl Os {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Os::MacOs,
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }

    pub fn gdb_binary_name(self) -> &'static str {
        match self {
            Os::Windows => "gdb.exe",
            _ => "gdb",
        }
    }

    /// Name of the environment variable holding the executable search path.
    pub fn path_env_key(self) -> &'static str {
        match self {
            Os::Windows => "Path",
            _ => "PATH",
        }
    }

    pub fn path_list_delimiter(self) -> char {
        match self {
            Os::Windows => ';',
            _ => ':',
        }
    }

    /// Whether the platform ships a developer tool locator (`xcrun`).
    pub fn has_tool_locator(self) -> bool {
        self == Os::MacOs
    }
}

/// Access to the machine the debug adapter will run on.
#[async_trait(?Send)]
pub trait DapDelegate: 'static {
    fn os(&self) -> Os;

    fn env_var(&self, key: &str) -> Option<String>;

    async fn is_executable(&self, path: &Path) -> bool;

    /// Asks the platform tool locator where `executable` lives and returns
    /// its raw output.
    async fn locate_tool(&self, executable: &str) -> Result<String>;
}

/// The delegate backed by the current process and filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemDelegate;

#[async_trait(?Send)]
impl DapDelegate for SystemDelegate {
    fn os(&self) -> Os {
        Os::current()
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    async fn is_executable(&self, path: &Path) -> bool {
        util::fs::is_executable(path).await
    }

    async fn locate_tool(&self, executable: &str) -> Result<String> {
        let output = util::command::new_smol_command(XCRUN_PATH)
            .args(["-find", executable])
            .output()
            .await
            .with_context(|| format!("failed to run {XCRUN_PATH}"))?;
        anyhow::ensure!(
            output.status.success(),
            "{XCRUN_PATH} -find {executable} exited with {}: {:?}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).context("xcrun output is not valid UTF-8")
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDelegate;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// A delegate with a fixed platform, environment and tool locator
    /// answer. Executability is still checked against the real filesystem.
    pub struct FakeDelegate {
        os: Os,
        env: HashMap<String, String>,
        tool_locator: Result<String, String>,
        tool_locator_calls: Mutex<Vec<String>>,
    }

    impl FakeDelegate {
        pub fn new(os: Os) -> Self {
            Self {
                os,
                env: HashMap::default(),
                tool_locator: Err("xcrun: error: unable to find utility".into()),
                tool_locator_calls: Mutex::default(),
            }
        }

        pub fn with_env(mut self, key: &str, value: impl Into<String>) -> Self {
            self.env.insert(key.to_string(), value.into());
            self
        }

        pub fn with_tool_locator_output(mut self, output: impl Into<String>) -> Self {
            self.tool_locator = Ok(output.into());
            self
        }

        pub fn with_tool_locator_error(mut self, error: impl Into<String>) -> Self {
            self.tool_locator = Err(error.into());
            self
        }

        /// Executable names the tool locator was asked for, in order.
        pub fn tool_locator_calls(&self) -> Vec<String> {
            self.tool_locator_calls.lock().clone()
        }
    }

    #[async_trait(?Send)]
    impl DapDelegate for FakeDelegate {
        fn os(&self) -> Os {
            self.os
        }

        fn env_var(&self, key: &str) -> Option<String> {
            self.env.get(key).cloned()
        }

        async fn is_executable(&self, path: &Path) -> bool {
            util::fs::is_executable(path).await
        }

        async fn locate_tool(&self, executable: &str) -> Result<String> {
            self.tool_locator_calls.lock().push(executable.to_string());
            self.tool_locator.clone().map_err(anyhow::Error::msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_conventions() {
        assert_eq!(Os::Windows.gdb_binary_name(), "gdb.exe");
        assert_eq!(Os::Windows.path_env_key(), "Path");
        assert_eq!(Os::Windows.path_list_delimiter(), ';');
        for os in [Os::MacOs, Os::Linux, Os::Other] {
            assert_eq!(os.gdb_binary_name(), "gdb");
            assert_eq!(os.path_env_key(), "PATH");
            assert_eq!(os.path_list_delimiter(), ':');
        }
        assert!(Os::MacOs.has_tool_locator());
        assert!(!Os::Linux.has_tool_locator());
        assert!(!Os::Windows.has_tool_locator());
    }
}
