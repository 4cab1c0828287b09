use crate::{
    Configuration, ConfigurationChangeEvent, ConfigurationChangeHandler, DapHost,
    DebugAdapterDescriptorFactory, Subscription, WorkspaceFolder,
};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    path::PathBuf,
    rc::Rc,
    sync::Arc,
};

type SharedHandler = Rc<dyn Fn(&ConfigurationChangeEvent) -> LocalBoxFuture<'static, ()>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorMessage {
    pub message: String,
    pub modal: bool,
    pub actions: Vec<String>,
}

/// An in-memory host. Configuration change handlers are queued and only run
/// when [`FakeHost::run_until_parked`] is called.
pub struct FakeHost {
    state: Arc<Mutex<FakeHostState>>,
}

#[derive(Default)]
struct FakeHostState {
    user_settings: Map<String, Value>,
    folder_settings: HashMap<PathBuf, Map<String, Value>>,
    factories: HashMap<String, Arc<dyn DebugAdapterDescriptorFactory>>,
    configuration_handlers: BTreeMap<usize, SharedHandler>,
    next_handler_id: usize,
    pending: VecDeque<LocalBoxFuture<'static, ()>>,
    message_response: Option<String>,
    error_messages: Vec<ErrorMessage>,
    executed_commands: Vec<(String, Vec<Value>)>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(FakeHostState::default())),
        })
    }

    /// Replaces the user-level settings of `section` without notifying
    /// observers.
    pub fn set_settings(&self, section: &str, value: Value) {
        self.state
            .lock()
            .user_settings
            .insert(section.to_string(), value);
    }

    pub fn set_folder_settings(&self, folder: &WorkspaceFolder, section: &str, value: Value) {
        self.state
            .lock()
            .folder_settings
            .entry(folder.path.clone())
            .or_default()
            .insert(section.to_string(), value);
    }

    /// Sets a single user-level setting and notifies observers that
    /// `section.key` changed.
    pub fn update_setting(&self, section: &str, key: &str, value: Value) {
        {
            let mut state = self.state.lock();
            let section_value = state
                .user_settings
                .entry(section.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !section_value.is_object() {
                *section_value = Value::Object(Map::new());
            }
            if let Value::Object(settings) = section_value {
                settings.insert(key.to_string(), value);
            }
        }
        self.emit_configuration_change(ConfigurationChangeEvent::new([format!(
            "{section}.{key}"
        )]));
    }

    pub fn emit_configuration_change(&self, event: ConfigurationChangeEvent) {
        let handlers = self
            .state
            .lock()
            .configuration_handlers
            .values()
            .cloned()
            .collect::<Vec<_>>();
        let futures = handlers
            .into_iter()
            .map(|handler| handler(&event))
            .collect::<Vec<_>>();
        self.state.lock().pending.extend(futures);
    }

    /// Drives every queued handler, including ones queued while running.
    pub fn run_until_parked(&self) {
        loop {
            let next = self.state.lock().pending.pop_front();
            match next {
                Some(future) => smol::block_on(future),
                None => break,
            }
        }
    }

    /// The action every subsequent error message resolves to.
    pub fn respond_to_messages_with(&self, action: Option<&str>) {
        self.state.lock().message_response = action.map(ToString::to_string);
    }

    pub fn error_messages(&self) -> Vec<ErrorMessage> {
        self.state.lock().error_messages.clone()
    }

    pub fn executed_commands(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().executed_commands.clone()
    }

    pub fn factory(&self, debugger_type: &str) -> Option<Arc<dyn DebugAdapterDescriptorFactory>> {
        self.state.lock().factories.get(debugger_type).cloned()
    }

    pub fn configuration_handler_count(&self) -> usize {
        self.state.lock().configuration_handlers.len()
    }
}

#[async_trait(?Send)]
impl DapHost for FakeHost {
    fn configuration(&self, section: &str, folder: Option<&WorkspaceFolder>) -> Configuration {
        let state = self.state.lock();
        let mut value = state
            .user_settings
            .get(section)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        if let Some(folder_value) = folder
            .and_then(|folder| state.folder_settings.get(&folder.path))
            .and_then(|settings| settings.get(section))
        {
            util::merge_json_value_into(folder_value.clone(), &mut value);
        }
        Configuration::new(section, value)
    }

    fn register_debug_adapter_descriptor_factory(
        &self,
        debugger_type: &str,
        factory: Arc<dyn DebugAdapterDescriptorFactory>,
    ) -> Subscription {
        let debugger_type = debugger_type.to_string();
        self.state
            .lock()
            .factories
            .insert(debugger_type.clone(), factory);
        let state = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().factories.remove(&debugger_type);
            }
        })
    }

    fn on_did_change_configuration(&self, handler: ConfigurationChangeHandler) -> Subscription {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_handler_id;
            state.next_handler_id += 1;
            state.configuration_handlers.insert(id, Rc::from(handler));
            id
        };
        let state = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().configuration_handlers.remove(&id);
            }
        })
    }

    async fn show_error_message(
        &self,
        message: &str,
        modal: bool,
        actions: &[&str],
    ) -> Option<String> {
        let mut state = self.state.lock();
        state.error_messages.push(ErrorMessage {
            message: message.to_string(),
            modal,
            actions: actions.iter().map(ToString::to_string).collect(),
        });
        state
            .message_response
            .clone()
            .filter(|response| actions.contains(&response.as_str()))
    }

    async fn execute_command(&self, command: &str, args: Vec<Value>) -> Result<()> {
        self.state
            .lock()
            .executed_commands
            .push((command.to_string(), args));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        observe_configuration, DebugAdapterDescriptor, DebugAdapterExecutable, DebugSession,
    };
    use futures::FutureExt as _;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;

    struct NullFactory;

    #[async_trait(?Send)]
    impl DebugAdapterDescriptorFactory for NullFactory {
        async fn create_debug_adapter_descriptor(
            &self,
            _: &DebugSession,
            _: Option<&DebugAdapterExecutable>,
        ) -> Option<DebugAdapterDescriptor> {
            None
        }
    }

    #[test]
    fn test_folder_settings_override_user_settings() {
        let host = FakeHost::new();
        let folder = WorkspaceFolder::new("app", "/work/app");
        host.set_settings(
            "gdb-dap",
            json!({ "executable-path": "/usr/bin/gdb", "environment": { "A": "1" } }),
        );
        host.set_folder_settings(&folder, "gdb-dap", json!({ "environment": { "A": "2" } }));

        let user = host.configuration("gdb-dap", None);
        let scoped = host.configuration("gdb-dap", Some(&folder));
        assert_eq!(
            user.get::<HashMap<String, String>>("environment"),
            Some(HashMap::from_iter([("A".to_string(), "1".to_string())]))
        );
        assert_eq!(
            scoped.get::<HashMap<String, String>>("environment"),
            Some(HashMap::from_iter([("A".to_string(), "2".to_string())]))
        );
        assert_eq!(
            scoped.get::<String>("executable-path").as_deref(),
            Some("/usr/bin/gdb")
        );
    }

    #[test]
    fn test_registration_is_released_with_subscription() {
        let host = FakeHost::new();
        let subscription =
            host.register_debug_adapter_descriptor_factory("gdb-dap", Arc::new(NullFactory));
        assert!(host.factory("gdb-dap").is_some());
        drop(subscription);
        assert!(host.factory("gdb-dap").is_none());
    }

    #[test]
    fn test_observe_configuration_filters_events() {
        let host = FakeHost::new();
        let calls = Rc::new(Cell::new(0));
        let handler_calls = calls.clone();
        let subscription = observe_configuration(
            &*host,
            |event| event.affects_configuration("gdb-dap.executable-path"),
            move |_| {
                let calls = handler_calls.clone();
                async move { calls.set(calls.get() + 1) }.boxed_local()
            },
        );

        host.update_setting("gdb-dap", "log-path", json!("/tmp/dap.log"));
        host.update_setting("gdb-dap", "executable-path", json!("/usr/bin/gdb"));
        host.run_until_parked();
        assert_eq!(calls.get(), 1);

        drop(subscription);
        assert_eq!(host.configuration_handler_count(), 0);
        host.update_setting("gdb-dap", "executable-path", json!("/opt/gdb"));
        host.run_until_parked();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_error_message_response() {
        let host = FakeHost::new();
        smol::block_on(async {
            assert_eq!(host.show_error_message("boom", true, &["Retry"]).await, None);
            host.respond_to_messages_with(Some("Retry"));
            assert_eq!(
                host.show_error_message("boom", true, &["Retry"]).await,
                Some("Retry".to_string())
            );
            assert_eq!(host.show_error_message("boom", false, &[]).await, None);
        });
        assert_eq!(host.error_messages().len(), 3);
        assert!(host.error_messages()[0].modal);
    }
}
