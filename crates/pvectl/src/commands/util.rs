//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use pve_api::{PveClient, TaskStatus};

use crate::error::CliError;

/// How often `--wait` polls a task.
const TASK_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so the operation is refused.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Poll a task until it leaves the "running" state.
pub async fn wait_for_task(
    client: &PveClient,
    node: &str,
    upid: &str,
) -> Result<TaskStatus, CliError> {
    loop {
        let status = client.task_status(node, upid).await?;
        if !status.is_running() {
            return Ok(status);
        }
        tracing::debug!(%upid, "task still running");
        tokio::time::sleep(TASK_POLL_INTERVAL).await;
    }
}

/// Report a started task, optionally waiting for it to finish.
pub async fn finish_task(
    client: &PveClient,
    node: &str,
    upid: &str,
    wait: bool,
    quiet: bool,
) -> Result<(), CliError> {
    if !wait {
        if !quiet {
            println!("{upid}");
        }
        return Ok(());
    }

    let status = wait_for_task(client, node, upid).await?;
    if status.succeeded() {
        if !quiet {
            eprintln!("Task {upid} finished: OK");
        }
        Ok(())
    } else {
        Err(CliError::Protocol {
            message: format!(
                "task {upid} failed: {}",
                status.exitstatus.as_deref().unwrap_or("unknown exit status")
            ),
        })
    }
}

/// Parse `key=value` arguments into form pairs.
pub fn parse_params(raw: &[String]) -> Result<Vec<(String, String)>, CliError> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .ok_or_else(|| CliError::Validation {
                    field: "params".into(),
                    reason: format!("expected key=value, got '{pair}'"),
                })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn params_split_on_first_equals() {
        let parsed = parse_params(&["memory=2048".into(), "args=-cpu host=1".into()]).unwrap();
        assert_eq!(parsed[0], ("memory".into(), "2048".into()));
        assert_eq!(parsed[1], ("args".into(), "-cpu host=1".into()));
    }

    #[test]
    fn params_without_key_are_rejected() {
        assert!(parse_params(&["=x".into()]).is_err());
        assert!(parse_params(&["novalue".into()]).is_err());
    }

    #[test]
    fn empty_value_is_allowed() {
        let parsed = parse_params(&["description=".into()]).unwrap();
        assert_eq!(parsed[0].1, "");
    }
}
