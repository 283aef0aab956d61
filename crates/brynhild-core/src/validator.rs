//! Validates that a message history forms a legal conversation before it
//! is sent to a provider: every tool result must answer a preceding tool
//! call, and (outside the mid-loop window) every assistant turn with tool
//! calls must be immediately followed by their results.

use brynhild_providers::{Message, Role};

use crate::error::{CoreError, Result};

/// Validates a message sequence.
///
/// `in_tool_loop` relaxes the check that every tool call has already been
/// answered — set while still inside an active tool-execution round, where
/// the most recent assistant message's tool calls are expected to be
/// unanswered so far.
pub fn validate_message_sequence(messages: &[Message], in_tool_loop: bool) -> Result<()> {
    let mut pending_tool_ids: Vec<&str> = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        match message.role {
            Role::Assistant => {
                if !pending_tool_ids.is_empty() {
                    return Err(CoreError::InvalidMessageSequence(format!(
                        "assistant message at index {i} follows unanswered tool calls {pending_tool_ids:?}"
                    )));
                }
                pending_tool_ids = message.tool_calls.iter().map(|tc| tc.id.as_str()).collect();
            }
            Role::Tool => {
                let Some(id) = message.tool_call_id.as_deref() else {
                    return Err(CoreError::InvalidMessageSequence(format!(
                        "tool message at index {i} has no tool_call_id"
                    )));
                };
                let Some(pos) = pending_tool_ids.iter().position(|pending| *pending == id) else {
                    return Err(CoreError::InvalidMessageSequence(format!(
                        "tool message at index {i} answers unknown tool_call_id {id}"
                    )));
                };
                pending_tool_ids.remove(pos);
            }
            Role::System | Role::User => {
                if !pending_tool_ids.is_empty() {
                    return Err(CoreError::InvalidMessageSequence(format!(
                        "message at index {i} interrupts unanswered tool calls {pending_tool_ids:?}"
                    )));
                }
            }
        }
    }

    if !pending_tool_ids.is_empty() && !in_tool_loop {
        return Err(CoreError::InvalidMessageSequence(format!(
            "trailing unanswered tool calls {pending_tool_ids:?} outside an active tool loop"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brynhild_providers::ToolCall;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_sequence() {
        let messages = vec![
            Message::user("hi"),
            Message::assistant_tool_calls(vec![ToolCall {
                id: "t1".into(),
                name: "read_file".into(),
                arguments: json!({}),
            }]),
            Message::tool_result("t1", "contents"),
            Message::assistant("done"),
        ];
        assert!(validate_message_sequence(&messages, false).is_ok());
    }

    #[test]
    fn rejects_tool_result_with_unknown_id() {
        let messages = vec![Message::tool_result("ghost", "x")];
        assert!(validate_message_sequence(&messages, false).is_err());
    }

    #[test]
    fn allows_trailing_unanswered_calls_inside_tool_loop() {
        let messages = vec![Message::assistant_tool_calls(vec![ToolCall {
            id: "t1".into(),
            name: "read_file".into(),
            arguments: json!({}),
        }])];
        assert!(validate_message_sequence(&messages, true).is_ok());
        assert!(validate_message_sequence(&messages, false).is_err());
    }
}
