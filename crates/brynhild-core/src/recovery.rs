//! Tool-call recovery: scans a turn's thinking text for balanced JSON
//! blobs that look like a tool call the model meant to make but never
//! emitted as a structured `tool_use` block, and proposes them for
//! execution under tight budgets.

use std::collections::HashSet;

use serde_json::Value;

use crate::tool::{RecoveryPolicy, ToolRegistry};

/// A tool call recovered from free-form thinking text rather than the
/// provider's structured tool-call output.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredCall {
    pub tool_name: String,
    pub arguments: Value,
}

/// Caps how many recoveries may fire, matching the Open Question
/// resolution in the project's design ledger.
#[derive(Debug, Clone)]
pub struct RecoveryBudget {
    pub max_per_turn: u32,
    pub max_per_session: u32,
    used_this_turn: u32,
    used_this_session: u32,
    seen: HashSet<(String, String)>,
}

impl Default for RecoveryBudget {
    fn default() -> Self {
        RecoveryBudget {
            max_per_turn: 2,
            max_per_session: 8,
            used_this_turn: 0,
            used_this_session: 0,
            seen: HashSet::new(),
        }
    }
}

impl RecoveryBudget {
    pub fn new(max_per_turn: u32, max_per_session: u32) -> Self {
        RecoveryBudget {
            max_per_turn,
            max_per_session,
            ..Default::default()
        }
    }

    pub fn start_turn(&mut self) {
        self.used_this_turn = 0;
    }

    /// Attempts to reserve budget for one recovered call. Returns `false`
    /// if the turn/session budget is exhausted or this exact call was
    /// already recovered this session (loop detection).
    fn try_reserve(&mut self, call: &RecoveredCall) -> bool {
        if self.used_this_turn >= self.max_per_turn || self.used_this_session >= self.max_per_session {
            return false;
        }
        let key = (call.tool_name.clone(), call.arguments.to_string());
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key);
        self.used_this_turn += 1;
        self.used_this_session += 1;
        true
    }
}

/// Scans `thinking_text` for JSON object literals that plausibly describe
/// a call to a tool in `registry`, filters them through `budget`, and
/// returns the calls that survive — in the order they appeared in the
/// text.
pub fn recover_tool_calls(
    thinking_text: &str,
    registry: &ToolRegistry,
    budget: &mut RecoveryBudget,
) -> Vec<RecoveredCall> {
    if !looks_truncated(thinking_text) {
        return Vec::new();
    }

    let mut recovered = Vec::new();

    for (start, blob) in find_balanced_json_objects(thinking_text) {
        if is_anti_pattern(thinking_text, start, blob) {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(blob) else {
            continue;
        };
        let Some(call) = match_against_registry(&value, registry) else {
            continue;
        };
        if budget.try_reserve(&call) {
            recovered.push(call);
        }
    }

    recovered
}

/// Whether a response looks like it trailed off mid-thought rather than
/// ending on a natural sentence boundary — the gate recovery requires
/// before it scans for a missed tool call at all. A response that ends
/// cleanly (sentence punctuation, a closing quote/paren) was a deliberate
/// choice not to call a tool, not a truncation.
fn looks_truncated(text: &str) -> bool {
    let trimmed = text.trim_end();
    match trimmed.chars().last() {
        None => false,
        Some(c) => !matches!(c, '.' | '!' | '?' | '"' | ')'),
    }
}

/// Skips blobs that are almost certainly prose, not an intended call:
/// empty objects, and JSON immediately preceded by text explicitly framing
/// it as an example rather than an instruction to act.
const ANTI_PATTERN_PHRASES: &[&str] = &["example:", "for instance", "such as", "e.g.", "```"];

fn is_anti_pattern(full_text: &str, span_start: usize, blob: &str) -> bool {
    let trimmed = blob.trim();
    if trimmed == "{}" {
        return true;
    }

    let mut window_start = span_start.saturating_sub(80);
    while window_start > 0 && !full_text.is_char_boundary(window_start) {
        window_start -= 1;
    }
    let preceding = full_text[window_start..span_start].to_lowercase();
    ANTI_PATTERN_PHRASES.iter().any(|phrase| preceding.contains(phrase))
}

/// Matches a parsed JSON value against the registry: either an explicit
/// `{"tool": "...", "arguments": {...}}` / `{"name": "...", ...}` shape, or
/// (fallback) a bare arguments object whose keys are a subset of exactly
/// one registered tool's declared schema properties.
fn match_against_registry(value: &Value, registry: &ToolRegistry) -> Option<RecoveredCall> {
    let obj = value.as_object()?;

    if let Some(name) = obj.get("tool").or_else(|| obj.get("name")).and_then(Value::as_str) {
        if let Ok(tool) = registry.get(name) {
            if tool.recovery_policy() == RecoveryPolicy::Allow {
                let arguments = obj.get("arguments").or_else(|| obj.get("input")).cloned().unwrap_or(Value::Null);
                return Some(RecoveredCall {
                    tool_name: name.to_string(),
                    arguments,
                });
            }
        }
        return None;
    }

    let keys: HashSet<&str> = obj.keys().map(String::as_str).collect();
    if keys.is_empty() {
        return None;
    }

    let mut candidate: Option<String> = None;
    for name in registry_tool_names(registry) {
        let tool = registry.get(&name).ok()?;
        if tool.recovery_policy() != RecoveryPolicy::Allow {
            continue;
        }
        let schema = tool.schema();
        let Some(props) = schema.get("properties").and_then(Value::as_object) else {
            continue;
        };
        let schema_keys: HashSet<&str> = props.keys().map(String::as_str).collect();
        if !keys.is_empty() && keys.is_subset(&schema_keys) {
            if candidate.is_some() {
                // Ambiguous between two tools; don't guess.
                return None;
            }
            candidate = Some(name);
        }
    }

    candidate.map(|tool_name| RecoveredCall {
        tool_name,
        arguments: value.clone(),
    })
}

fn registry_tool_names(registry: &ToolRegistry) -> Vec<String> {
    registry
        .definitions(&[])
        .into_iter()
        .map(|d| d.name)
        .collect()
}

/// Finds every top-level balanced `{...}` span in `text`, ignoring braces
/// that appear inside string literals. Returns each span's byte start
/// offset alongside its text, so callers can inspect what precedes it.
fn find_balanced_json_objects(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        spans.push((start, &text[start..=i]));
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{RiskLevel, Tool};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct ReadFile;

    #[async_trait]
    impl Tool for ReadFile {
        fn name(&self) -> &str {
            "read_file"
        }
        fn description(&self) -> &str {
            "reads a file"
        }
        fn schema(&self) -> Value {
            json!({ "type": "object", "properties": { "path": { "type": "string" } } })
        }
        fn risk_level(&self) -> RiskLevel {
            RiskLevel::ReadOnly
        }
        async fn execute(&self, _arguments: Value) -> std::result::Result<String, String> {
            Ok(String::new())
        }
    }

    fn registry_with_read_file() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ReadFile));
        registry
    }

    #[test]
    fn finds_balanced_object_ignoring_nested_strings() {
        let text = r#"I should call {"tool": "read_file", "arguments": {"path": "a}b"}}"#;
        let spans = find_balanced_json_objects(text);
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn recovers_explicit_tool_shape() {
        let registry = registry_with_read_file();
        let mut budget = RecoveryBudget::default();
        let text = r#"{"tool": "read_file", "arguments": {"path": "a.txt"}}"#;
        let recovered = recover_tool_calls(text, &registry, &mut budget);
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].tool_name, "read_file");
    }

    #[test]
    fn recovers_bare_arguments_matching_single_tool_schema() {
        let registry = registry_with_read_file();
        let mut budget = RecoveryBudget::default();
        let text = r#"{"path": "a.txt"}"#;
        let recovered = recover_tool_calls(text, &registry, &mut budget);
        assert_eq!(recovered.len(), 1);
    }

    #[test]
    fn per_turn_budget_caps_recoveries() {
        let registry = registry_with_read_file();
        let mut budget = RecoveryBudget::new(1, 8);
        let text = r#"{"path": "a.txt"} and also {"path": "b.txt"}"#;
        let recovered = recover_tool_calls(text, &registry, &mut budget);
        assert_eq!(recovered.len(), 1);
    }

    #[test]
    fn duplicate_recovery_is_suppressed() {
        let registry = registry_with_read_file();
        let mut budget = RecoveryBudget::default();
        let text = r#"{"path": "a.txt"}"#;
        recover_tool_calls(text, &registry, &mut budget);
        let second = recover_tool_calls(text, &registry, &mut budget);
        assert!(second.is_empty());
    }

    #[test]
    fn empty_object_is_anti_pattern() {
        let registry = registry_with_read_file();
        let mut budget = RecoveryBudget::default();
        let recovered = recover_tool_calls("{}", &registry, &mut budget);
        assert!(recovered.is_empty());
    }

    #[test]
    fn illustrative_json_after_example_phrase_is_skipped() {
        let registry = registry_with_read_file();
        let mut budget = RecoveryBudget::default();
        let text = r#"You'd call it like this, for instance: {"path": "a.txt"}"#;
        let recovered = recover_tool_calls(text, &registry, &mut budget);
        assert!(recovered.is_empty());
    }

    #[test]
    fn complete_response_is_not_gated_into_recovery() {
        let registry = registry_with_read_file();
        let mut budget = RecoveryBudget::default();
        let text = r#"I considered calling {"path": "a.txt"} but decided not to."#;
        let recovered = recover_tool_calls(text, &registry, &mut budget);
        assert!(recovered.is_empty());
    }
}
