//! The `Tool` trait every executable tool implements, and a registry of
//! them keyed by name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// How dangerous a tool's effects are, used by the hook pipeline and
/// permission prompts to decide how much friction to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    ReadOnly,
    Write,
    Destructive,
}

/// Whether the recovery subsystem (see [`crate::recovery`]) is allowed to
/// synthesize a call to this tool from thinking-text it never explicitly
/// requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// The recovery scanner may propose calls to this tool.
    Allow,
    /// Never recover this tool; it must be explicitly requested by the
    /// model's structured tool-call output.
    Deny,
}

/// An executable tool exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> Value;

    /// Whether invoking this tool requires interactive permission unless
    /// `auto_approve_tools`/`dangerously_skip_permissions` is set.
    fn requires_permission(&self) -> bool {
        self.risk_level() != RiskLevel::ReadOnly
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::ReadOnly
    }

    fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy::Allow
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<String, String>;
}

/// Registry of tools available to a conversation, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool definitions for every registered tool, for the provider's
    /// `tools` request field. `disabled` filters by name (settings'
    /// `disabled_tools`).
    pub fn definitions(&self, disabled: &[String]) -> Vec<brynhild_providers::ToolDefinition> {
        self.tools
            .values()
            .filter(|t| !disabled.iter().any(|d| d == t.name()))
            .map(|t| brynhild_providers::ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn schema(&self) -> Value {
            json!({ "type": "object" })
        }
        async fn execute(&self, arguments: Value) -> std::result::Result<String, String> {
            Ok(arguments.to_string())
        }
    }

    #[test]
    fn registry_finds_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        assert!(registry.get("echo").is_ok());
        assert!(registry.get("missing").is_err());
    }

    #[test]
    fn definitions_exclude_disabled_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let defs = registry.definitions(&["echo".to_string()]);
        assert!(defs.is_empty());
    }
}
