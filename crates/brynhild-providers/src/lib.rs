//! Provider dispatch: a unified `Provider` trait and registry over
//! Anthropic, OpenAI-compatible, and Ollama backends, normalizing every
//! wire format into one `StreamEvent` vocabulary.

mod anthropic;
mod error;
mod ollama;
mod openai_compat;
mod provider;
mod reasoning;
mod types;

pub use anthropic::AnthropicProvider;
pub use error::{ProviderError, Result};
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatibleProvider;
pub use provider::{EventStream, Provider, ProviderInstanceConfig, ProviderRegistry, ProviderTypeRegistry};
pub use reasoning::{anthropic_thinking_budget, ollama_think_value, openai_reasoning_effort};
pub use types::{
    ChatRequest, Message, ReasoningLevel, Role, StreamEvent, ToolCall, ToolDefinition, ToolResult,
    Usage,
};
