//! Runs a single hook subprocess: writes the context as one line of JSON
//! to its stdin, reads one line of JSON back from its stdout, and
//! enforces the configured timeout.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::HookEntry;
use crate::context::{HookContext, HookDecision, HookOutput};

/// Runs `entry`'s command with `context` piped to stdin. Any failure to
/// spawn, timeout, non-zero exit, or malformed JSON degrades open —
/// logged via `tracing::warn!` and treated as [`HookDecision::Allow`],
/// per the documented degrade-open policy.
pub async fn run_hook(entry: &HookEntry, context: &HookContext) -> HookDecision {
    match run_hook_inner(entry, context).await {
        Ok(output) => output.decision(),
        Err(e) => {
            tracing::warn!(command = %entry.command, error = %e, "hook failed; degrading open");
            HookDecision::Allow
        }
    }
}

pub(crate) async fn run_hook_inner(entry: &HookEntry, context: &HookContext) -> crate::error::Result<HookOutput> {
    let payload = serde_json::to_vec(context).unwrap_or_default();

    let mut child = Command::new(&entry.command)
        .args(&entry.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| crate::error::HookError::Spawn {
            command: entry.command.clone(),
            source,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(&payload).await;
        let _ = stdin.write_all(b"\n").await;
    }

    let timeout = Duration::from_millis(entry.timeout_ms);
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| crate::error::HookError::Timeout {
            command: entry.command.clone(),
            timeout_ms: entry.timeout_ms,
        })?
        .map_err(|source| crate::error::HookError::Spawn {
            command: entry.command.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(exit_error(&entry.command, output.status, stderr));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("");
    serde_json::from_str(first_line).map_err(|e| crate::error::HookError::MalformedOutput {
        command: entry.command.clone(),
        reason: e.to_string(),
    })
}

/// Distinguishes a signal-killed subprocess (a crash) from a clean nonzero
/// exit: only the pipeline's degrade-open policy applies to the former.
#[cfg(unix)]
fn exit_error(command: &str, status: std::process::ExitStatus, stderr: String) -> crate::error::HookError {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => crate::error::HookError::Crashed { command: command.to_string(), signal: Some(signal) },
        None => crate::error::HookError::NonZeroExit {
            command: command.to_string(),
            status: status.code().unwrap_or(-1),
            stderr,
        },
    }
}

#[cfg(not(unix))]
fn exit_error(command: &str, status: std::process::ExitStatus, stderr: String) -> crate::error::HookError {
    crate::error::HookError::NonZeroExit {
        command: command.to_string(),
        status: status.code().unwrap_or(-1),
        stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HookEvent;
    use serde_json::json;
    use std::path::PathBuf;

    fn ctx() -> HookContext {
        HookContext {
            event: HookEvent::PreToolUse,
            tool_name: "read_file".into(),
            tool_input: json!({ "path": "a.txt" }),
            cwd: PathBuf::from("/tmp"),
            session_id: "s1".into(),
        }
    }

    #[tokio::test]
    async fn allows_when_command_echoes_allow() {
        let entry = HookEntry {
            event: HookEvent::PreToolUse,
            command: "echo".into(),
            args: vec![r#"{"decision": "allow"}"#.into()],
            match_pattern: None,
            timeout_ms: 2000,
        };
        let decision = run_hook(&entry, &ctx()).await;
        assert_eq!(decision, HookDecision::Allow);
    }

    #[tokio::test]
    async fn degrades_open_when_command_is_missing() {
        let entry = HookEntry {
            event: HookEvent::PreToolUse,
            command: "definitely-not-a-real-command-xyz".into(),
            args: Vec::new(),
            match_pattern: None,
            timeout_ms: 2000,
        };
        let decision = run_hook(&entry, &ctx()).await;
        assert_eq!(decision, HookDecision::Allow);
    }

    #[tokio::test]
    async fn deny_decision_carries_reason() {
        let entry = HookEntry {
            event: HookEvent::PreToolUse,
            command: "echo".into(),
            args: vec![r#"{"decision": "deny", "reason": "nope"}"#.into()],
            match_pattern: None,
            timeout_ms: 2000,
        };
        let decision = run_hook(&entry, &ctx()).await;
        assert_eq!(decision, HookDecision::Deny { reason: "nope".into() });
    }
}
