use crate::{resolve_executable, show_executable_error, DapDelegate, GdbDapSettings};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use dap_host::{
    DapHost, DebugAdapterDescriptor, DebugAdapterDescriptorFactory, DebugAdapterExecutable,
    DebugAdapterServer, DebugSession, Disposable, ExecutableOptions,
};
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;
use std::{
    net::{Ipv4Addr, SocketAddrV4, TcpListener},
    path::Path,
    process::Stdio,
    sync::Arc,
};
use thiserror::Error;
use util::ResultExt as _;

/// Replaces the default executable lookup. Returning `None` fails the
/// session; the hook is responsible for telling the user why.
pub type CreateDapExecutableCommand = Arc<
    dyn Fn(
        DebugSession,
        Option<DebugAdapterExecutable>,
    ) -> LocalBoxFuture<'static, Option<DebugAdapterExecutable>>,
>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExecutableError {
    #[error("Unable to find the path to the GDB debug adapter executable.")]
    NotFound,
    #[error("Debug adapter path: {0} is not a valid file.")]
    InvalidExecutable(String),
}

struct AdapterServer {
    process: smol::process::Child,
    descriptor: DebugAdapterServer,
}

/// Produces the command the host runs to start GDB in DAP mode.
pub struct GdbDapDescriptorFactory {
    host: Arc<dyn DapHost>,
    delegate: Arc<dyn DapDelegate>,
    create_dap_executable_command: Option<CreateDapExecutableCommand>,
    server: Mutex<Option<AdapterServer>>,
}

impl GdbDapDescriptorFactory {
    pub fn new(host: Arc<dyn DapHost>, delegate: Arc<dyn DapDelegate>) -> Self {
        Self {
            host,
            delegate,
            create_dap_executable_command: None,
            server: Mutex::new(None),
        }
    }

    pub fn with_create_dap_executable_command(
        mut self,
        create_dap_executable_command: Option<CreateDapExecutableCommand>,
    ) -> Self {
        self.create_dap_executable_command = create_dap_executable_command;
        self
    }

    /// Arguments that put GDB in DAP mode, plus logging directives when
    /// configured.
    pub fn debug_adapter_arguments(settings: &GdbDapSettings) -> Vec<String> {
        let mut args = vec!["-i".to_string(), "dap".to_string()];
        if let Some(log_path) = settings.log_path() {
            args.push("-iex".into());
            args.push(format!("set debug dap-log-file {log_path}"));
        }
        if let Some(log_level) = settings.log_level() {
            args.push("-iex".into());
            args.push(format!("set debug dap-log-level {log_level}"));
        }
        args
    }

    /// Resolves and validates the adapter binary for `session`, falling back
    /// to the host's `default_executable` when no source yields a path.
    pub async fn launch_executable(
        &self,
        session: &DebugSession,
        default_executable: Option<&DebugAdapterExecutable>,
    ) -> Result<DebugAdapterExecutable, ExecutableError> {
        let settings = GdbDapSettings::load(&*self.host, session.workspace_folder.as_ref());
        let mut args = Self::debug_adapter_arguments(&settings);

        let command = match resolve_executable(session, &settings, &*self.delegate).await {
            Some(resolved) => resolved.path,
            None => {
                let default_executable = default_executable
                    .filter(|executable| !executable.command.is_empty())
                    .ok_or(ExecutableError::NotFound)?;
                log::debug!(
                    "falling back to the host's debug adapter {}",
                    default_executable.command
                );
                args.extend(default_executable.args.iter().cloned());
                default_executable.command.clone()
            }
        };

        if !self.delegate.is_executable(Path::new(&command)).await {
            return Err(ExecutableError::InvalidExecutable(command));
        }

        let mut env = default_executable
            .and_then(DebugAdapterExecutable::env)
            .cloned()
            .unwrap_or_default();
        env.extend(settings.environment);

        Ok(DebugAdapterExecutable {
            command,
            args,
            options: Some(ExecutableOptions {
                env: Some(env),
                cwd: None,
            }),
        })
    }

    /// Spawns `executable` as a debug adapter server listening on a free
    /// loopback port. `port_args` turns the chosen port into the arguments
    /// that tell the adapter where to listen. Only one server runs per
    /// factory; later calls return the running one.
    pub fn start_server(
        &self,
        executable: &DebugAdapterExecutable,
        port_args: impl FnOnce(u16) -> Vec<String>,
    ) -> Result<DebugAdapterServer> {
        let mut server = self.server.lock();
        if let Some(server) = server.as_ref() {
            return Ok(server.descriptor.clone());
        }

        let host = Ipv4Addr::LOCALHOST;
        let port = TcpListener::bind(SocketAddrV4::new(host, 0))
            .and_then(|listener| listener.local_addr())
            .context("failed to find a free port for the debug adapter server")?
            .port();

        let process = util::command::new_smol_command(&executable.command)
            .args(&executable.args)
            .args(port_args(port))
            .envs(executable.env().cloned().unwrap_or_default())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                format!("failed to spawn debug adapter server {}", executable.command)
            })?;
        log::info!(
            "started debug adapter server {} (pid {}) on {host}:{port}",
            executable.command,
            process.id()
        );

        let descriptor = DebugAdapterServer {
            port,
            host: Some(host.to_string()),
        };
        *server = Some(AdapterServer {
            process,
            descriptor: descriptor.clone(),
        });
        Ok(descriptor)
    }

    pub fn server_process_id(&self) -> Option<u32> {
        self.server.lock().as_ref().map(|server| server.process.id())
    }
}

#[async_trait(?Send)]
impl DebugAdapterDescriptorFactory for GdbDapDescriptorFactory {
    async fn create_debug_adapter_descriptor(
        &self,
        session: &DebugSession,
        executable: Option<&DebugAdapterExecutable>,
    ) -> Option<DebugAdapterDescriptor> {
        if let Some(create_dap_executable_command) = &self.create_dap_executable_command {
            return create_dap_executable_command(session.clone(), executable.cloned())
                .await
                .map(DebugAdapterDescriptor::Executable);
        }

        match self.launch_executable(session, executable).await {
            Ok(executable) => {
                log::info!(
                    "launching debug adapter: {} {}",
                    executable.command,
                    executable.args.join(" ")
                );
                Some(DebugAdapterDescriptor::Executable(executable))
            }
            Err(error) => {
                log::warn!("{error}");
                show_executable_error(&*self.host, &error).await;
                None
            }
        }
    }
}

impl Disposable for GdbDapDescriptorFactory {
    fn dispose(&self) {
        if let Some(mut server) = self.server.lock().take() {
            log::info!(
                "stopping debug adapter server on port {}",
                server.descriptor.port
            );
            server.process.kill().log_err();
        }
    }
}
