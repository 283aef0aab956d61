//! Core, provider-agnostic types: messages, tool calls, and the unified
//! streaming event vocabulary every provider adapter normalizes into.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    /// For `Role::Tool` this holds the serialized tool result. For
    /// `Role::Assistant` messages that are tool-calls-only, this is empty.
    #[serde(default)]
    pub content: String,

    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Which tool call this message answers (only for `Role::Tool`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self { role: Role::Assistant, content: String::new(), tool_calls, tool_call_id: None }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The result of executing a tool, ready to feed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

/// A tool definition exposed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Unified reasoning-effort vocabulary translated per-provider.
///
/// `Raw` escapes the vocabulary entirely and passes the inner string
/// through to the provider untouched, for provider-specific knobs this
/// enum doesn't model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReasoningLevel {
    #[default]
    Auto,
    Off,
    Minimal,
    Low,
    Medium,
    High,
    Maximum,
    Raw(String),
}

impl ReasoningLevel {
    pub fn parse(s: &str) -> Self {
        if let Some(raw) = s.strip_prefix("raw:") {
            return ReasoningLevel::Raw(raw.to_string());
        }
        match s {
            "auto" => ReasoningLevel::Auto,
            "off" => ReasoningLevel::Off,
            "minimal" => ReasoningLevel::Minimal,
            "low" => ReasoningLevel::Low,
            "medium" => ReasoningLevel::Medium,
            "high" => ReasoningLevel::High,
            "maximum" => ReasoningLevel::Maximum,
            other => ReasoningLevel::Raw(other.to_string()),
        }
    }
}

/// A full request to send to a provider.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub reasoning: ReasoningLevel,
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Unified streaming event vocabulary. Every provider adapter normalizes
/// its own wire format (Anthropic SSE, OpenAI chunked SSE, Ollama NDJSON)
/// into this set before handing it to the conversation processor.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The stream has started.
    MessageStart { message_id: String, model: String },

    /// A chunk of hidden reasoning/thinking text.
    ThinkingDelta { index: u32, text: String },

    /// A chunk of user-visible response text.
    TextDelta { index: u32, text: String },

    /// A tool call has begun; its arguments will follow as `ToolUseDelta`.
    ToolUseStart { index: u32, id: String, name: String },

    /// A fragment of a tool call's JSON arguments.
    ToolUseDelta { index: u32, partial_json: String },

    /// The content block at `index` has finished.
    ContentStop { index: u32 },

    /// The stream has fully terminated.
    MessageStop {
        stop_reason: Option<String>,
        usage: Usage,
    },
}
