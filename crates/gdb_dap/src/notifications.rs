use crate::{executable_path_setting, ExecutableError};
use dap_host::DapHost;
use serde_json::json;
use util::ResultExt as _;

pub const OPEN_SETTINGS_ACTION: &str = "Open Settings";
pub const OPEN_SETTINGS_COMMAND: &str = "workbench.action.openSettings";

/// Tells the user the debug adapter could not be used, offering to open the
/// executable path setting.
pub async fn show_executable_error(host: &dyn DapHost, error: &ExecutableError) {
    let message = error.to_string();
    let choice = host
        .show_error_message(&message, true, &[OPEN_SETTINGS_ACTION])
        .await;
    if choice.as_deref() == Some(OPEN_SETTINGS_ACTION) {
        host.execute_command(
            OPEN_SETTINGS_COMMAND,
            vec![json!(executable_path_setting())],
        )
        .await
        .log_err();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dap_host::FakeHost;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_settings_action() {
        let host = FakeHost::new();
        smol::block_on(show_executable_error(&*host, &ExecutableError::NotFound));
        assert!(host.executed_commands().is_empty());

        host.respond_to_messages_with(Some(OPEN_SETTINGS_ACTION));
        smol::block_on(show_executable_error(
            &*host,
            &ExecutableError::InvalidExecutable("/bad/path".into()),
        ));
        assert_eq!(
            host.executed_commands(),
            [(
                OPEN_SETTINGS_COMMAND.to_string(),
                vec![json!("gdb-dap.executable-path")]
            )]
        );

        let messages = host.error_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].message,
            "Unable to find the path to the GDB debug adapter executable."
        );
        assert_eq!(
            messages[1].message,
            "Debug adapter path: /bad/path is not a valid file."
        );
        assert!(messages.iter().all(|message| message.modal));
        assert_eq!(messages[1].actions, [OPEN_SETTINGS_ACTION]);
    }
}
