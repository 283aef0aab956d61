//! Loads the hook table from a DCM-backed config section and dispatches
//! events through it sequentially, collecting any text hooks want
//! injected into the next context build.

use std::path::PathBuf;
use std::sync::Mutex;

use brynhild_dcm::DcmValue;

use crate::config::{HookEntry, HookEvent};
use crate::context::{ContextLocation, HookContext, HookDecision};
use crate::dispatch::run_hook_inner;

pub struct HookManager {
    entries: Vec<HookEntry>,
    session_id: String,
    pending_injections: Mutex<Vec<(ContextLocation, String)>>,
}

impl HookManager {
    pub fn new(entries: Vec<HookEntry>, session_id: impl Into<String>) -> Self {
        HookManager {
            entries,
            session_id: session_id.into(),
            pending_injections: Mutex::new(Vec::new()),
        }
    }

    /// Parses hook entries out of the DCM-merged `hooks` config section
    /// (a sequence of mappings, each matching [`HookEntry`]'s JSON shape).
    /// Malformed entries are skipped with a warning rather than failing
    /// the whole load — one bad entry shouldn't disable every hook.
    pub fn from_dcm_value(value: &DcmValue, session_id: impl Into<String>) -> Self {
        let mut entries = Vec::new();
        if let Some(items) = value.as_sequence() {
            for item in items {
                match serde_json::from_value::<HookEntry>(item.to_json()) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => tracing::warn!(error = %e, "skipping malformed hook config entry"),
                }
            }
        }
        HookManager::new(entries, session_id)
    }

    /// Runs every hook registered for `event` that matches `tool_name`, in
    /// configured order, stopping at the first `Deny`. A `Skip` from any
    /// hook also stops dispatch (remaining hooks don't run against a call
    /// that's already been skipped).
    ///
    /// A crashed hook subprocess always degrades open. A timeout or
    /// nonzero exit degrades open for `post_tool_use`/`context_build` (the
    /// tool already ran; there's nothing left to block) but blocks
    /// `pre_tool_use`, carrying the hook's stderr as the deny reason.
    pub async fn dispatch(&self, event: HookEvent, tool_name: &str, tool_input: serde_json::Value, cwd: PathBuf) -> HookDecision {
        let context = HookContext {
            event,
            tool_name: tool_name.to_string(),
            tool_input,
            cwd,
            session_id: self.session_id.clone(),
        };

        for entry in &self.entries {
            if entry.event != event {
                continue;
            }
            match entry.applies_to(tool_name) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping hook with invalid match pattern");
                    continue;
                }
            }

            let decision = match run_hook_inner(entry, &context).await {
                Ok(output) => {
                    if let Some(text) = &output.inject {
                        self.record_injection(output.context_location, text.clone());
                    }
                    output.decision()
                }
                Err(e) if e.is_crash() => {
                    tracing::warn!(command = %entry.command, error = %e, "hook crashed; degrading open");
                    HookDecision::Allow
                }
                Err(e) if event == HookEvent::PreToolUse => {
                    tracing::warn!(command = %entry.command, error = %e, "hook failed on pre_tool_use; blocking");
                    HookDecision::Deny { reason: e.block_message() }
                }
                Err(e) => {
                    tracing::warn!(command = %entry.command, error = %e, "hook failed; tool result left unchanged");
                    HookDecision::Allow
                }
            };
            match &decision {
                HookDecision::Allow => continue,
                HookDecision::Deny { .. } | HookDecision::Skip => return decision,
            }
        }

        HookDecision::Allow
    }

    pub fn record_injection(&self, location: ContextLocation, text: String) {
        self.pending_injections.lock().unwrap().push((location, text));
    }

    /// Drains and returns every `(location, text)` injection accumulated
    /// since the last call, for the context builder to fold into the next
    /// system prompt on the side the hook requested.
    pub fn take_pending_injections(&self) -> Vec<(ContextLocation, String)> {
        std::mem::take(&mut self.pending_injections.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn dispatch_skips_hooks_for_other_events() {
        let entries = vec![HookEntry {
            event: HookEvent::PostToolUse,
            command: "echo".into(),
            args: vec![r#"{"decision": "deny", "reason": "should not run"}"#.into()],
            match_pattern: None,
            timeout_ms: 1000,
        }];
        let manager = HookManager::new(entries, "s1");
        let decision = manager
            .dispatch(HookEvent::PreToolUse, "read_file", json!({}), PathBuf::from("/tmp"))
            .await;
        assert_eq!(decision, HookDecision::Allow);
    }

    #[tokio::test]
    async fn dispatch_stops_at_first_deny() {
        let entries = vec![HookEntry {
            event: HookEvent::PreToolUse,
            command: "echo".into(),
            args: vec![r#"{"decision": "deny", "reason": "blocked"}"#.into()],
            match_pattern: None,
            timeout_ms: 1000,
        }];
        let manager = HookManager::new(entries, "s1");
        let decision = manager
            .dispatch(HookEvent::PreToolUse, "write_file", json!({}), PathBuf::from("/tmp"))
            .await;
        assert_eq!(decision, HookDecision::Deny { reason: "blocked".into() });
    }

    #[test]
    fn injections_drain_on_take() {
        let manager = HookManager::new(Vec::new(), "s1");
        manager.record_injection(ContextLocation::Append, "note".to_string());
        assert_eq!(manager.take_pending_injections(), vec![(ContextLocation::Append, "note".to_string())]);
        assert!(manager.take_pending_injections().is_empty());
    }
}
