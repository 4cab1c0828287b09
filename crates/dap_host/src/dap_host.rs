mod configuration;
#[cfg(any(test, feature = "test-support"))]
mod fake;
mod session;
mod subscription;

use anyhow::Result;
use async_trait::async_trait;
use futures::{future::LocalBoxFuture, FutureExt as _};
use serde_json::Value;
use std::sync::Arc;

pub use configuration::*;
#[cfg(any(test, feature = "test-support"))]
pub use fake::*;
pub use session::*;
pub use subscription::*;

pub type ConfigurationChangeHandler =
    Box<dyn Fn(&ConfigurationChangeEvent) -> LocalBoxFuture<'static, ()>>;

/// Supplies the means to launch a debug adapter for a session.
#[async_trait(?Send)]
pub trait DebugAdapterDescriptorFactory: 'static {
    /// Returns `None` when no adapter can be started. Implementations are
    /// expected to have told the user why before returning.
    async fn create_debug_adapter_descriptor(
        &self,
        session: &DebugSession,
        executable: Option<&DebugAdapterExecutable>,
    ) -> Option<DebugAdapterDescriptor>;
}

/// A resource that can be released. Releasing twice is a no-op.
pub trait Disposable: 'static {
    fn dispose(&self);
}

/// The editor capabilities a debug adapter extension is built on.
#[async_trait(?Send)]
pub trait DapHost: 'static {
    /// Reads the settings under `section`, with workspace-folder values
    /// layered over user values when `folder` is given.
    fn configuration(&self, section: &str, folder: Option<&WorkspaceFolder>) -> Configuration;

    fn register_debug_adapter_descriptor_factory(
        &self,
        debugger_type: &str,
        factory: Arc<dyn DebugAdapterDescriptorFactory>,
    ) -> Subscription;

    fn on_did_change_configuration(&self, handler: ConfigurationChangeHandler) -> Subscription;

    /// Shows an error and resolves to the action the user picked, if any.
    async fn show_error_message(
        &self,
        message: &str,
        modal: bool,
        actions: &[&str],
    ) -> Option<String>;

    async fn execute_command(&self, command: &str, args: Vec<Value>) -> Result<()>;
}

/// Runs `handler` for every configuration change accepted by `predicate`.
pub fn observe_configuration(
    host: &dyn DapHost,
    predicate: impl Fn(&ConfigurationChangeEvent) -> bool + 'static,
    handler: impl Fn(&ConfigurationChangeEvent) -> LocalBoxFuture<'static, ()> + 'static,
) -> Subscription {
    host.on_did_change_configuration(Box::new(move |event| {
        if predicate(event) {
            handler(event)
        } else {
            futures::future::ready(()).boxed_local()
        }
    }))
}
