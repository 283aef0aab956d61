//! The JSON contract exchanged with a hook subprocess: context on stdin,
//! decision on stdout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::HookEvent;

/// Sent to a hook subprocess as a single line of JSON on stdin.
#[derive(Debug, Clone, Serialize)]
pub struct HookContext {
    pub event: HookEvent,
    pub tool_name: String,
    pub tool_input: Value,
    pub cwd: PathBuf,
    pub session_id: String,
}

/// A hook's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    Allow,
    Deny { reason: String },
    /// Don't run this tool call, but don't treat it as an error either —
    /// used by hooks that want to silently no-op a call.
    Skip,
}

/// Where a hook's `inject`ed text lands in the next system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLocation {
    Prepend,
    Append,
}

impl Default for ContextLocation {
    fn default() -> Self {
        ContextLocation::Append
    }
}

/// The raw JSON shape read back from a hook's stdout: `{"decision":
/// "allow"|"deny"|"skip", "reason": "...", "inject": "...",
/// "context_location": "prepend"|"append"}`. `reason` is required for
/// `deny`, ignored otherwise; `inject` is optional on any decision and
/// carries text for the next context build, placed per
/// `context_location` (defaulting to `append`, matching prior behavior
/// for hooks that don't specify it).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HookOutput {
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub inject: Option<String>,
    #[serde(default)]
    pub context_location: ContextLocation,
}

impl HookOutput {
    pub fn decision(&self) -> HookDecision {
        match self.decision.as_deref() {
            Some("deny") => HookDecision::Deny {
                reason: self.reason.clone().unwrap_or_else(|| "denied by hook".to_string()),
            },
            Some("skip") => HookDecision::Skip,
            _ => HookDecision::Allow,
        }
    }
}
