use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashMap, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceFolder {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A debug session the host is about to start. The configuration is the
/// user's launch configuration and does not change for the session's lifetime.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugSession {
    pub name: String,
    pub debugger_type: String,
    pub configuration: Map<String, Value>,
    pub workspace_folder: Option<WorkspaceFolder>,
}

impl DebugSession {
    pub fn new(debugger_type: impl Into<String>, configuration: Map<String, Value>) -> Self {
        Self {
            name: String::new(),
            debugger_type: debugger_type.into(),
            configuration,
            workspace_folder: None,
        }
    }

    pub fn with_workspace_folder(mut self, folder: WorkspaceFolder) -> Self {
        self.workspace_folder = Some(folder);
        self
    }

    /// Returns the configuration value for `key` if it is a string.
    pub fn configuration_str(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).and_then(Value::as_str)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableOptions {
    pub env: Option<HashMap<String, String>>,
    pub cwd: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugAdapterExecutable {
    pub command: String,
    pub args: Vec<String>,
    pub options: Option<ExecutableOptions>,
}

impl DebugAdapterExecutable {
    pub fn env(&self) -> Option<&HashMap<String, String>> {
        self.options.as_ref()?.env.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugAdapterServer {
    pub port: u16,
    pub host: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DebugAdapterDescriptor {
    Executable(DebugAdapterExecutable),
    Server(DebugAdapterServer),
}

impl DebugAdapterDescriptor {
    pub fn as_executable(&self) -> Option<&DebugAdapterExecutable> {
        match self {
            DebugAdapterDescriptor::Executable(executable) => Some(executable),
            DebugAdapterDescriptor::Server(_) => None,
        }
    }
}
