//! Translation of the unified [`ReasoningLevel`] vocabulary into each
//! provider's native knob.

use serde_json::Value;

use crate::types::ReasoningLevel;

/// Anthropic's `thinking` block takes a token budget. `Off`/`Auto` omit
/// the block entirely (the stock, non-extended-thinking request path).
pub fn anthropic_thinking_budget(level: &ReasoningLevel) -> Option<u32> {
    match level {
        ReasoningLevel::Auto | ReasoningLevel::Off => None,
        ReasoningLevel::Minimal => Some(1_024),
        ReasoningLevel::Low => Some(4_096),
        ReasoningLevel::Medium => Some(16_000),
        ReasoningLevel::High => Some(32_000),
        ReasoningLevel::Maximum => Some(64_000),
        ReasoningLevel::Raw(raw) => raw.parse().ok(),
    }
}

/// OpenAI's `reasoning_effort` knob: off->`none`, minimal->`minimal`,
/// low->`low`, medium->`medium`, high->`high`, maximum->`xhigh`.
/// `raw:<vendor-string>` passes the string straight through, native knob
/// untranslated.
pub fn openai_reasoning_effort(level: &ReasoningLevel) -> Option<String> {
    match level {
        ReasoningLevel::Auto => None,
        ReasoningLevel::Off => Some("none".to_string()),
        ReasoningLevel::Minimal => Some("minimal".to_string()),
        ReasoningLevel::Low => Some("low".to_string()),
        ReasoningLevel::Medium => Some("medium".to_string()),
        ReasoningLevel::High => Some("high".to_string()),
        ReasoningLevel::Maximum => Some("xhigh".to_string()),
        ReasoningLevel::Raw(raw) => Some(raw.clone()),
    }
}

/// Ollama's `think` parameter. GPT-OSS models take a string level
/// (`"low"|"medium"|"high"`, and thinking cannot be fully disabled so
/// `Off` still sends `"low"`); other reasoning models take a plain
/// boolean, truthy for any level above `Off`. `Auto` omits the
/// parameter entirely, letting the model decide.
pub fn ollama_think_value(model: &str, level: &ReasoningLevel) -> Option<Value> {
    if matches!(level, ReasoningLevel::Auto) {
        return None;
    }
    if model.to_lowercase().contains("gpt-oss") {
        let value = match level {
            ReasoningLevel::Off | ReasoningLevel::Minimal | ReasoningLevel::Low => "low",
            ReasoningLevel::Medium => "medium",
            ReasoningLevel::High | ReasoningLevel::Maximum => "high",
            ReasoningLevel::Raw(raw) => return Some(Value::String(raw.clone())),
            ReasoningLevel::Auto => unreachable!("handled above"),
        };
        Some(Value::String(value.to_string()))
    } else {
        match level {
            ReasoningLevel::Off => Some(Value::Bool(false)),
            ReasoningLevel::Raw(raw) => Some(Value::String(raw.clone())),
            _ => Some(Value::Bool(true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_escape_parses_numeric_budget() {
        let level = ReasoningLevel::parse("raw:12345");
        assert_eq!(anthropic_thinking_budget(&level), Some(12345));
    }

    #[test]
    fn off_omits_anthropic_thinking_block() {
        assert_eq!(anthropic_thinking_budget(&ReasoningLevel::Off), None);
    }

    #[test]
    fn maximum_collapses_to_openai_xhigh() {
        assert_eq!(openai_reasoning_effort(&ReasoningLevel::Maximum), Some("xhigh".to_string()));
    }

    #[test]
    fn off_maps_to_openai_none() {
        assert_eq!(openai_reasoning_effort(&ReasoningLevel::Off), Some("none".to_string()));
    }

    #[test]
    fn raw_passes_through_untranslated() {
        let level = ReasoningLevel::parse("raw:custom-effort");
        assert_eq!(openai_reasoning_effort(&level), Some("custom-effort".to_string()));
    }

    #[test]
    fn ollama_auto_omits_think_param() {
        assert_eq!(ollama_think_value("llama3", &ReasoningLevel::Auto), None);
    }

    #[test]
    fn ollama_gpt_oss_uses_string_levels() {
        assert_eq!(
            ollama_think_value("gpt-oss-120b", &ReasoningLevel::Medium),
            Some(Value::String("medium".to_string()))
        );
    }

    #[test]
    fn ollama_gpt_oss_cannot_fully_disable() {
        assert_eq!(
            ollama_think_value("gpt-oss-20b", &ReasoningLevel::Off),
            Some(Value::String("low".to_string()))
        );
    }

    #[test]
    fn ollama_non_gpt_oss_uses_boolean() {
        assert_eq!(ollama_think_value("llama3", &ReasoningLevel::High), Some(Value::Bool(true)));
        assert_eq!(ollama_think_value("llama3", &ReasoningLevel::Off), Some(Value::Bool(false)));
    }
}
