//! Wires the hook pipeline and OS sandbox into the processor's mediation
//! traits, so the processor itself never needs to know either crate's
//! shape.

use async_trait::async_trait;
use brynhild_hooks::{HookDecision as PipelineDecision, HookEvent, HookManager};
use brynhild_sandbox::{Operation, SandboxConfig, validate_path, validate_write_path};
use serde_json::Value;

use crate::processor::{HookDecision, PermissionChecker, PostToolHook, PreToolHook, SandboxGuard};

#[async_trait]
impl PreToolHook for HookManager {
    async fn check(&self, tool_name: &str, arguments: &Value) -> HookDecision {
        let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
        match self
            .dispatch(HookEvent::PreToolUse, tool_name, arguments.clone(), cwd)
            .await
        {
            PipelineDecision::Allow => HookDecision::Allow,
            PipelineDecision::Deny { reason } => HookDecision::Deny(reason),
            PipelineDecision::Skip => HookDecision::Skip,
        }
    }
}

/// Fires `POST_TOOL_USE` after a tool call completes. The dispatch's own
/// decision is discarded — by this point the tool already ran, so there's
/// nothing left to block; a hook here can only observe and (via its
/// `inject` field) leave something for the next context build.
#[async_trait]
impl PostToolHook for HookManager {
    async fn notify(&self, tool_name: &str, arguments: &Value, result: &str) {
        let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
        let mut tool_input = arguments.clone();
        if let Value::Object(map) = &mut tool_input {
            map.insert("__result".to_string(), Value::String(result.to_string()));
        }
        let _ = self.dispatch(HookEvent::PostToolUse, tool_name, tool_input, cwd).await;
    }
}

/// Validates a tool call's `path`/`file_path` argument (if any) against the
/// sandbox. Tools with no path-shaped argument pass through untouched —
/// path confinement only applies to tools that actually name a path.
#[async_trait]
impl SandboxGuard for SandboxConfig {
    async fn validate(&self, _tool_name: &str, arguments: &Value) -> std::result::Result<(), String> {
        if self.skip_sandbox {
            return Ok(());
        }
        let Some(path) = path_argument(arguments) else {
            return Ok(());
        };
        let path = std::path::Path::new(path);

        // Without per-tool risk metadata here, assume the stricter
        // (write) validation — the allow-list still lets reads from most
        // of the filesystem through in practice since every write-allowed
        // path is also read-allowed.
        match validate_write_path(path, self) {
            Ok(_) => Ok(()),
            Err(_) => validate_path(path, self, Operation::Read)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }
}

fn path_argument(arguments: &Value) -> Option<&str> {
    arguments
        .get("path")
        .or_else(|| arguments.get("file_path"))
        .and_then(Value::as_str)
}

/// Allows every permission-requiring call unconditionally — the posture
/// for `--dangerously-skip-permissions`.
pub struct AutoApprovePermissionChecker;

#[async_trait]
impl PermissionChecker for AutoApprovePermissionChecker {
    async fn check(&self, _tool_name: &str, _arguments: &Value) -> HookDecision {
        HookDecision::Allow
    }
}

/// Denies every permission-requiring call unconditionally — used when no
/// interactive prompt is available (e.g. `--json` mode) and the caller did
/// not opt into auto-approval.
pub struct DenyAllPermissionChecker;

#[async_trait]
impl PermissionChecker for DenyAllPermissionChecker {
    async fn check(&self, tool_name: &str, _arguments: &Value) -> HookDecision {
        HookDecision::Deny(format!("{tool_name} requires interactive permission, none available"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sandbox_guard_allows_calls_with_no_path_argument() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SandboxConfig::new(tmp.path().to_path_buf());
        let result = SandboxGuard::validate(&config, "echo", &serde_json::json!({"text": "hi"})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn sandbox_guard_rejects_writes_outside_project_root() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SandboxConfig::new(tmp.path().to_path_buf());
        let result = SandboxGuard::validate(&config, "write_file", &serde_json::json!({"path": "/opt/secret.txt"})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn auto_approve_always_allows() {
        let checker = AutoApprovePermissionChecker;
        let decision = checker.check("anything", &serde_json::json!({})).await;
        assert_eq!(decision, HookDecision::Allow);
    }
}
