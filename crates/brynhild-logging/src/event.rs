//! The JSONL event vocabulary. Every event carries `timestamp`,
//! `event_number`, and `event_type`, plus type-specific fields — matching
//! the flat, self-describing shape the original conversation logger wrote.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEnvelope {
    pub timestamp: String,
    pub event_number: u64,
    pub event_type: String,
    #[serde(flatten)]
    pub data: Value,
}

/// The event payloads a conversation logger can emit. Each variant's name
/// (snake_case) is the JSONL `event_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LogEvent {
    SessionStart {
        session_id: String,
        provider: String,
        model: String,
    },
    ContextInit {
        base_system_prompt: String,
        context_version: u32,
    },
    ContextInjection {
        context_version: u32,
        source: String,
        location: String,
        content: String,
        content_hash: String,
        origin: Option<String>,
        trigger_type: Option<String>,
        trigger_match: Option<String>,
        metadata: Option<Value>,
    },
    ContextReady {
        context_version: u32,
        system_prompt_hash: String,
    },
    UserMessage {
        content: String,
    },
    AssistantMessage {
        content: String,
        thinking: Option<String>,
    },
    Thinking {
        content: String,
    },
    ToolCall {
        tool_name: String,
        tool_input: Value,
        tool_id: Option<String>,
    },
    ToolResult {
        tool_name: String,
        success: bool,
        output: Option<String>,
        error: Option<String>,
        tool_id: Option<String>,
        duration_ms: Option<u64>,
    },
    Usage {
        input_tokens: u32,
        output_tokens: u32,
        total_tokens: u32,
        cost_usd: Option<f64>,
    },
    ToolCallRecovered {
        tool_name: String,
        tool_input: Value,
    },
    SkillTrigger {
        skill_name: String,
        trigger_type: String,
        trigger_match: Option<String>,
    },
    Error {
        error: String,
        context: Option<String>,
    },
    SessionEnd {
        total_events: u64,
    },
}
