use crate::{
    executable_path_setting, show_executable_error, CreateDapExecutableCommand, DapDelegate,
    ExecutableError, GdbDapDescriptorFactory, SystemDelegate, EXECUTABLE_PATH_KEY,
    SETTINGS_SECTION,
};
use dap_host::{observe_configuration, DapHost, ManagedResources};
use futures::FutureExt as _;
use std::{path::Path, sync::Arc};

/// The debugger type GDB's adapter is registered under by default.
pub const DEBUGGER_TYPE: &str = "gdb-dap";

#[derive(Clone)]
pub struct GdbDapOptions {
    /// Debugger type the descriptor factory is registered for.
    pub debugger_type: String,
    /// Replaces the default executable lookup when set.
    pub create_dap_executable_command: Option<CreateDapExecutableCommand>,
}

impl Default for GdbDapOptions {
    fn default() -> Self {
        Self {
            debugger_type: DEBUGGER_TYPE.to_string(),
            create_dap_executable_command: None,
        }
    }
}

/// Starts the extension with the real filesystem and process environment.
pub fn activate(host: Arc<dyn DapHost>) -> ManagedResources {
    start(host, Arc::new(SystemDelegate), GdbDapOptions::default())
}

/// Registers the descriptor factory and the executable path watcher.
/// Everything is released when the returned resources are disposed.
pub fn start(
    host: Arc<dyn DapHost>,
    delegate: Arc<dyn DapDelegate>,
    options: GdbDapOptions,
) -> ManagedResources {
    let mut resources = ManagedResources::default();

    let factory = Arc::new(
        GdbDapDescriptorFactory::new(host.clone(), delegate.clone())
            .with_create_dap_executable_command(options.create_dap_executable_command),
    );
    resources.push_disposable(factory.clone());
    resources.push(
        host.register_debug_adapter_descriptor_factory(&options.debugger_type, factory),
    );

    let weak_host = Arc::downgrade(&host);
    resources.push(observe_configuration(
        &*host,
        |event| event.affects_configuration(&executable_path_setting()),
        move |_| {
            let host = weak_host.clone();
            let delegate = delegate.clone();
            async move {
                if let Some(host) = host.upgrade() {
                    validate_executable_setting(&*host, &*delegate).await;
                }
            }
            .boxed_local()
        },
    ));

    log::info!("registered GDB debug adapter for `{}`", options.debugger_type);
    resources
}

pub fn stop(mut resources: ManagedResources) {
    resources.dispose();
    log::info!("released GDB debug adapter resources");
}

/// Checks the user-level executable path setting and tells the user when
/// it is missing or does not point at an executable.
pub async fn validate_executable_setting(host: &dyn DapHost, delegate: &dyn DapDelegate) {
    let path = host
        .configuration(SETTINGS_SECTION, None)
        .get::<String>(EXECUTABLE_PATH_KEY)
        .filter(|path| !path.is_empty());

    let error = match path {
        Some(path) => {
            if delegate.is_executable(Path::new(&path)).await {
                return;
            }
            ExecutableError::InvalidExecutable(path)
        }
        None => ExecutableError::NotFound,
    };
    log::warn!("{error}");
    show_executable_error(host, &error).await;
}
