//! Script tools — bridges loaded skills' executable scripts into callable
//! tools.
//!
//! Skills contribute to the agent in two ways:
//!
//! 1. **Prompt injection** — skill instructions are appended to the system
//!    prompt so the LLM knows how to use existing tools to accomplish the
//!    skill's purpose (see [`crate::manager::SkillManager::build_prompt_extension`]).
//!
//! 2. **Script tools** — skills that include executable scripts (`.sh`, `.py`,
//!    `.js`, `.ts`) are exposed as additional tools the agent can invoke.
//!    Scripts are executed via subprocess with captured stdout/stderr.
//!
//! This module has no opinion on what a "tool" looks like to the rest of the
//! system — it just runs scripts and returns JSON. The caller is responsible
//! for wrapping [`ScriptToolSet`] into whatever tool-calling abstraction it
//! uses.

use std::process::Stdio;

use serde_json::{Value, json};

use crate::error::{Result, SkillError};
use crate::types::{SkillDefinition, SkillScript};

/// A tool backed by an executable script.
#[derive(Clone)]
pub struct ScriptTool {
    /// Tool name exposed to the LLM (e.g. `skill_todoist_run`).
    pub name: String,
    /// Description for the LLM.
    pub description: String,
    /// The skill this tool belongs to.
    pub skill_name: String,
    /// The script to execute.
    pub script: SkillScript,
}

/// The script tools discovered across a set of loaded skills.
pub struct ScriptToolSet {
    tools: Vec<ScriptTool>,
}

impl ScriptToolSet {
    /// Discover script tools from loaded skills.
    pub fn new(skills: &[SkillDefinition]) -> Self {
        let mut tools = Vec::new();

        for skill in skills {
            for script in &skill.scripts {
                let tool_name = format!(
                    "skill_{}_{}",
                    sanitize_tool_name(&skill.name),
                    sanitize_tool_name(
                        script
                            .filename
                            .rsplit('.')
                            .next_back()
                            .unwrap_or(&script.filename),
                    )
                );

                tools.push(ScriptTool {
                    name: tool_name,
                    description: format!(
                        "Execute the `{}` script from skill `{}`. {}",
                        script.filename, skill.name, skill.description
                    ),
                    skill_name: skill.name.clone(),
                    script: script.clone(),
                });
            }
        }

        tracing::info!(
            script_tools = tools.len(),
            skills = skills.len(),
            "discovered skill script tools"
        );

        Self { tools }
    }

    /// All discovered script tools.
    pub fn tools(&self) -> &[ScriptTool] {
        &self.tools
    }

    /// Find a script tool by name.
    pub fn find(&self, name: &str) -> Option<&ScriptTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Execute a script tool by name and return its output as JSON.
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SkillError::NotFound(name.to_owned()))?;
        execute_script(tool, params).await
    }
}

/// Execute a script tool and return its output.
async fn execute_script(tool: &ScriptTool, params: Value) -> Result<Value> {
    tracing::debug!(
        skill = %tool.skill_name,
        script = %tool.script.filename,
        "executing skill script"
    );

    let interpreter = tool.script.interpreter;
    let script_path = &tool.script.path;

    let mut cmd = tokio::process::Command::new(interpreter.command());

    for arg in interpreter.args() {
        cmd.arg(arg);
    }
    cmd.arg(script_path);

    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    // Pass individual parameters as environment variables.
    if let Some(obj) = params.as_object() {
        for (key, value) in obj {
            let val_str = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            cmd.env(format!("SKILL_PARAM_{}", key.to_uppercase()), val_str);
        }
    }

    // Also pass full JSON as SKILL_PARAMS.
    cmd.env("SKILL_PARAMS", params.to_string());

    let child = cmd.spawn().map_err(|e| SkillError::ScriptFailed {
        skill: tool.skill_name.clone(),
        reason: format!("failed to spawn script: {e}"),
    })?;

    let output = tokio::time::timeout(std::time::Duration::from_secs(60), child.wait_with_output())
        .await
        .map_err(|_| SkillError::ScriptFailed {
            skill: tool.skill_name.clone(),
            reason: format!("script `{}` timed out after 60s", tool.script.filename),
        })?
        .map_err(|e| SkillError::ScriptFailed {
            skill: tool.skill_name.clone(),
            reason: format!("script execution error: {e}"),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if output.status.success() {
        if let Ok(json_val) = serde_json::from_str::<Value>(stdout.trim()) {
            Ok(json_val)
        } else {
            Ok(json!({
                "output": stdout.trim(),
                "exit_code": 0,
            }))
        }
    } else {
        let code = output.status.code().unwrap_or(-1);
        Ok(json!({
            "error": true,
            "exit_code": code,
            "stdout": stdout.trim(),
            "stderr": stderr.trim(),
        }))
    }
}

/// Sanitize a string for use in a tool name.
///
/// LLM APIs require tool names to match `^[a-zA-Z0-9_-]{1,128}$`. This
/// replaces any disallowed characters with underscores and lowercases.
fn sanitize_tool_name(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    let mut result = String::with_capacity(sanitized.len());
    let mut prev_underscore = false;
    for c in sanitized.chars() {
        if c == '_' {
            if !prev_underscore {
                result.push('_');
            }
            prev_underscore = true;
        } else {
            result.push(c);
            prev_underscore = false;
        }
    }

    result.truncate(128);
    result.trim_end_matches('_').to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScriptInterpreter, SkillMetadata, SkillSource};

    #[test]
    fn no_scripts_means_no_tools() {
        let skills = vec![SkillDefinition {
            name: "prompt-only".into(),
            description: "A prompt-only skill.".into(),
            version: None,
            metadata: SkillMetadata::default(),
            instructions: "Do something.".into(),
            source: SkillSource::Builtin,
            scripts: Vec::new(),
        }];

        let set = ScriptToolSet::new(&skills);
        assert!(set.tools().is_empty());
    }

    #[test]
    fn sanitize_tool_name_spaces_and_caps() {
        assert_eq!(sanitize_tool_name("Email OAuth Setup"), "email_oauth_setup");
        assert_eq!(sanitize_tool_name("my-tool"), "my-tool");
        assert_eq!(sanitize_tool_name("hello  world"), "hello_world");
        assert_eq!(sanitize_tool_name("a.b.c"), "a_b_c");
    }

    #[test]
    fn script_discovered_as_tool() {
        let skills = vec![SkillDefinition {
            name: "my-tool".into(),
            description: "A tool skill.".into(),
            version: None,
            metadata: SkillMetadata::default(),
            instructions: "Run the script.".into(),
            source: SkillSource::Builtin,
            scripts: vec![SkillScript {
                filename: "run.sh".into(),
                path: "/tmp/skills/my-tool/run.sh".into(),
                interpreter: ScriptInterpreter::Shell,
            }],
        }];

        let set = ScriptToolSet::new(&skills);
        let tools = set.tools();
        assert_eq!(tools.len(), 1);
        assert!(tools[0].name.contains("my-tool"));
        assert!(set.find(&tools[0].name).is_some());
    }
}
