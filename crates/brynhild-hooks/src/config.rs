//! Hook configuration: the table of external commands to run around
//! tool use and context building.

use serde::{Deserialize, Serialize};

/// The points in the conversation lifecycle a hook can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    ContextBuild,
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// One configured hook: an external command run for a given event,
/// optionally restricted to tool names matching `match_pattern`.
#[derive(Debug, Clone, Deserialize)]
pub struct HookEntry {
    pub event: HookEvent,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(rename = "match", default)]
    pub match_pattern: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl HookEntry {
    /// Whether this hook applies to a tool call named `tool_name`. A hook
    /// with no `match_pattern` applies to every tool for its event.
    pub fn applies_to(&self, tool_name: &str) -> crate::error::Result<bool> {
        match &self.match_pattern {
            None => Ok(true),
            Some(pattern) => {
                let re = regex::Regex::new(pattern).map_err(|source| crate::error::HookError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                Ok(re.is_match(tool_name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_without_pattern_applies_to_every_tool() {
        let entry = HookEntry {
            event: HookEvent::PreToolUse,
            command: "true".into(),
            args: Vec::new(),
            match_pattern: None,
            timeout_ms: 1000,
        };
        assert!(entry.applies_to("read_file").unwrap());
    }

    #[test]
    fn hook_with_pattern_filters_by_tool_name() {
        let entry = HookEntry {
            event: HookEvent::PreToolUse,
            command: "true".into(),
            args: Vec::new(),
            match_pattern: Some("^write_.*".into()),
            timeout_ms: 1000,
        };
        assert!(entry.applies_to("write_file").unwrap());
        assert!(!entry.applies_to("read_file").unwrap());
    }
}
