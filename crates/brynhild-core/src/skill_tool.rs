//! Exposes a skill's declared scripts to the model as ordinary tools, by
//! wrapping `brynhild-skills`' `ScriptToolSet` behind the `Tool` trait.

use std::sync::Arc;

use async_trait::async_trait;
use brynhild_skills::ScriptToolSet;
use serde_json::Value;

use crate::tool::{RecoveryPolicy, RiskLevel, Tool};

/// One script tool from a loaded skill, dispatched through the shared
/// `ScriptToolSet` it came from.
pub struct SkillScriptTool {
    toolset: Arc<ScriptToolSet>,
    name: String,
    description: String,
}

impl SkillScriptTool {
    /// Builds one `Tool` per script tool in `toolset`.
    pub fn all(toolset: Arc<ScriptToolSet>) -> Vec<Arc<dyn Tool>> {
        toolset
            .tools()
            .iter()
            .map(|t| {
                Arc::new(SkillScriptTool {
                    toolset: Arc::clone(&toolset),
                    name: t.name.clone(),
                    description: t.description.clone(),
                }) as Arc<dyn Tool>
            })
            .collect()
    }
}

#[async_trait]
impl Tool for SkillScriptTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "additionalProperties": true,
            "description": "Parameters are passed to the script as SKILL_PARAM_<NAME> env vars.",
        })
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Write
    }

    /// Scripts must be explicitly called by name — never guessed from
    /// thinking text the way a built-in tool might be.
    fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy::Deny
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<String, String> {
        self.toolset
            .execute(&self.name, arguments)
            .await
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toolset_yields_no_tools() {
        let toolset = Arc::new(ScriptToolSet::new(&[]));
        assert!(SkillScriptTool::all(toolset).is_empty());
    }
}
