use crate::{DapDelegate, GdbDapSettings};
use dap_host::DebugSession;
use std::path::Path;

/// Launch configuration key that overrides every other source.
pub const DEBUG_ADAPTER_EXECUTABLE_KEY: &str = "debugAdapterExecutable";

/// Where a debug adapter path can come from, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutableSource {
    LaunchConfiguration,
    Settings,
    ToolLocator,
    SearchPath,
}

impl ExecutableSource {
    pub const ALL: [ExecutableSource; 4] = [
        ExecutableSource::LaunchConfiguration,
        ExecutableSource::Settings,
        ExecutableSource::ToolLocator,
        ExecutableSource::SearchPath,
    ];

    async fn locate(
        self,
        session: &DebugSession,
        settings: &GdbDapSettings,
        delegate: &dyn DapDelegate,
    ) -> Option<String> {
        match self {
            ExecutableSource::LaunchConfiguration => session
                .configuration_str(DEBUG_ADAPTER_EXECUTABLE_KEY)
                .filter(|path| !path.is_empty())
                .map(ToString::to_string),
            ExecutableSource::Settings => settings.executable_path().map(ToString::to_string),
            ExecutableSource::ToolLocator => find_with_tool_locator(delegate).await,
            ExecutableSource::SearchPath => find_in_path(delegate).await,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedExecutable {
    pub path: String,
    pub source: ExecutableSource,
}

/// Finds the debug adapter binary for `session`. The first source that
/// yields a path wins; paths from the launch configuration and settings are
/// returned without checking them.
pub async fn resolve_executable(
    session: &DebugSession,
    settings: &GdbDapSettings,
    delegate: &dyn DapDelegate,
) -> Option<ResolvedExecutable> {
    for source in ExecutableSource::ALL {
        if let Some(path) = source.locate(session, settings, delegate).await {
            log::debug!("found gdb via {source:?}: {path}");
            return Some(ResolvedExecutable { path, source });
        }
        log::debug!("no gdb via {source:?}");
    }
    None
}

async fn find_with_tool_locator(delegate: &dyn DapDelegate) -> Option<String> {
    let os = delegate.os();
    if !os.has_tool_locator() {
        return None;
    }
    match delegate.locate_tool(os.gdb_binary_name()).await {
        Ok(output) => {
            let path = output.trim();
            (!path.is_empty()).then(|| path.to_string())
        }
        Err(error) => {
            log::debug!("tool locator failed: {error:#}");
            None
        }
    }
}

async fn find_in_path(delegate: &dyn DapDelegate) -> Option<String> {
    let os = delegate.os();
    let search_path = delegate
        .env_var(os.path_env_key())
        .filter(|search_path| !search_path.is_empty())?;
    let binary_name = os.gdb_binary_name();
    for directory in search_path.split(os.path_list_delimiter()) {
        let candidate = Path::new(directory).join(binary_name);
        if delegate.is_executable(&candidate).await {
            return Some(candidate.to_string_lossy().into_owned());
        }
    }
    None
}
