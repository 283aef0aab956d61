//! Injection records and the finished context a turn is built on.

/// Where an injected block lands relative to the base system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionLocation {
    SystemPromptPrepend,
    SystemPromptAppend,
    MessageInject,
}

impl InjectionLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemPromptPrepend => "system_prompt_prepend",
            Self::SystemPromptAppend => "system_prompt_append",
            Self::MessageInject => "message_inject",
        }
    }
}

/// Record of one modification made to the system prompt, mirroring the
/// JSONL `context_injection` event shape.
#[derive(Debug, Clone)]
pub struct ContextInjection {
    pub source: String,
    pub location: InjectionLocation,
    pub content: String,
    pub origin: Option<String>,
    pub trigger_type: Option<String>,
    pub trigger_match: Option<String>,
}

/// The fully assembled context for a turn.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub system_prompt: String,
    pub base_prompt: String,
    pub injections: Vec<ContextInjection>,
}
