//! Ties settings, providers, hooks, sandbox, skills, and the context
//! builder together into one turn-running session. This is the thing a
//! thin front end drives: construct once per process, call
//! [`Session::run_turn`] per user message.

use std::path::PathBuf;
use std::sync::Arc;

use brynhild_config::Settings;
use brynhild_context::ContextBuilder;
pub use brynhild_context::Profile;
use brynhild_hooks::HookManager;
use brynhild_logging::ConversationLogger;
use brynhild_providers::{ChatRequest, Message, Provider};
use brynhild_sandbox::SandboxConfig;
use brynhild_skills::{resolve_explicit, resolve_keyword_matches, ScriptToolSet, SkillManager, TriggerKind};

use crate::adapters::{AutoApprovePermissionChecker, DenyAllPermissionChecker};
use crate::error::{BrynhildError, BrynhildResult};
use crate::processor::{CancellationToken, ConversationProcessor, ProcessorConfig, TextDeltaCallback, TurnOutcome};
use crate::skill_tool::SkillScriptTool;
use crate::tool::ToolRegistry;

/// Flags a front end collects from its own CLI surface and hands down
/// unchanged.
pub struct SessionOptions {
    pub dry_run: bool,
    pub skip_permissions: bool,
    pub skip_sandbox: bool,
    pub no_log: bool,
    pub log_file: Option<PathBuf>,
    pub profile: Option<Profile>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            dry_run: false,
            skip_permissions: false,
            skip_sandbox: false,
            no_log: false,
            log_file: None,
            profile: None,
        }
    }
}

pub struct Session {
    processor: ConversationProcessor,
    hook_manager: Arc<HookManager>,
    skill_manager: SkillManager,
    logger: ConversationLogger,
    profile: Option<Profile>,
    project_root: PathBuf,
}

impl Session {
    /// Resolves every piece a turn needs from `settings` and wires them
    /// into one processor: skill scripts become tools, the DCM-layered
    /// `hooks` section becomes a `HookManager`, sandbox settings become a
    /// `SandboxConfig`, and everything mediates tool calls through the
    /// processor's hook/sandbox/permission traits.
    pub fn build(
        settings: &Settings,
        provider_type: &str,
        session_id: impl Into<String>,
        options: SessionOptions,
    ) -> BrynhildResult<Self> {
        let session_id = session_id.into();
        let project_root = settings.project_root().to_path_buf();

        let skills_dir = settings.config_dir().join("skills");
        let mut skill_manager = SkillManager::new(skills_dir);
        skill_manager.load_all().map_err(BrynhildError::Skill)?;

        let toolset = Arc::new(ScriptToolSet::new(skill_manager.skills()));
        let mut registry = ToolRegistry::new();
        for tool in SkillScriptTool::all(toolset) {
            registry.register(tool);
        }

        let hook_manager = Arc::new(match settings.raw().get(&["hooks"]) {
            Ok(value) => HookManager::from_dcm_value(&value, session_id.clone()),
            Err(_) => HookManager::new(Vec::new(), session_id.clone()),
        });

        let sandbox_config = SandboxConfig::new(project_root.clone())
            .with_allowed_paths(settings.allowed_paths().into_iter().map(PathBuf::from).collect())
            .with_allow_network(settings.sandbox_allow_network())
            .with_dry_run(options.dry_run)
            .with_skip_sandbox(options.skip_sandbox || !settings.sandbox_enabled());

        let processor_config = ProcessorConfig {
            disabled_tools: settings.disabled_tools(),
            dry_run: options.dry_run,
            ..ProcessorConfig::default()
        };

        let mut processor = ConversationProcessor::new(Some(registry), processor_config)
            .with_hook(Arc::clone(&hook_manager))
            .with_post_hook(Arc::clone(&hook_manager))
            .with_sandbox(Arc::new(sandbox_config));

        processor = if options.skip_permissions {
            processor.with_permission_checker(Arc::new(AutoApprovePermissionChecker))
        } else {
            processor.with_permission_checker(Arc::new(DenyAllPermissionChecker))
        };

        let log_path = options
            .log_file
            .clone()
            .unwrap_or_else(|| settings.logs_dir().join(format!("{session_id}.jsonl")));
        let logging_enabled = !options.no_log && settings.log_conversations();
        let logger = ConversationLogger::new(&log_path, session_id.clone(), provider_type, &settings.model(), logging_enabled)
            .map_err(BrynhildError::Logging)?;

        Ok(Session {
            processor,
            hook_manager,
            skill_manager,
            logger,
            profile: options.profile,
            project_root,
        })
    }

    pub fn logger(&self) -> &ConversationLogger {
        &self.logger
    }

    /// Builds the system prompt for this turn (rules, profile, skills,
    /// `context_build` hook) and runs the provider/tool loop to
    /// completion. The assembled context is returned alongside the
    /// outcome so a caller can inspect what was injected.
    pub async fn run_turn(
        &mut self,
        provider: &dyn Provider,
        base_system_prompt: &str,
        mut history: Vec<Message>,
        user_message: &str,
        model: &str,
        max_tokens: Option<u32>,
        cancel: Option<CancellationToken>,
        on_text_delta: Option<TextDeltaCallback>,
    ) -> BrynhildResult<(TurnOutcome, brynhild_context::ConversationContext)> {
        let mut builder = ContextBuilder::new(&self.project_root)
            .hooks(&self.hook_manager)
            .logger(&self.logger)
            .skill_manager(&self.skill_manager);
        if let Some(profile) = self.profile.clone() {
            builder = builder.profile(profile);
        }
        let context = builder.build(base_system_prompt).await;

        let _ = self.logger.log_user_message(user_message);

        let mut messages = vec![Message::system(context.system_prompt.clone())];
        messages.append(&mut history);
        self.inject_triggered_skills(user_message, &mut messages);
        messages.push(Message::user(user_message));

        let request_template = ChatRequest {
            model: model.to_string(),
            messages: Vec::new(),
            tools: Vec::new(),
            temperature: None,
            max_tokens,
            reasoning: Default::default(),
        };

        let outcome = self
            .processor
            .run_turn(provider, messages, request_template, cancel, on_text_delta)
            .await
            .map_err(BrynhildError::Core)?;

        let _ = self.logger.log_assistant_message(&outcome.final_text, None);
        let _ = self
            .logger
            .log_usage(outcome.usage.input_tokens, outcome.usage.output_tokens, None);

        Ok((outcome, context))
    }

    pub fn close(&self) {
        let _ = self.logger.close();
    }

    /// Resolves `user_message` against the skill inventory: an explicit
    /// `/skill <name>` invocation takes priority over automatic keyword
    /// matching (which can fire more than one skill). A matched skill's
    /// full body is prepended as an in-band user-role message framed as
    /// system guidance, ahead of the user's actual message.
    fn inject_triggered_skills(&self, user_message: &str, messages: &mut Vec<Message>) {
        if let Some(result) = resolve_explicit(user_message, self.skill_manager.skills()) {
            match result {
                Ok(trigger) => {
                    let _ = self.logger.log_skill_trigger(trigger.skill.name.clone(), "explicit", None);
                    messages.push(skill_guidance_message(&trigger.skill.name, &trigger.skill.instructions));
                }
                Err(reason) => {
                    let _ = self.logger.log_error(reason, Some("skill_trigger".to_string()));
                }
            }
            return;
        }

        for trigger in resolve_keyword_matches(user_message, self.skill_manager.skills()) {
            let matched = match &trigger.kind {
                TriggerKind::Keyword { matched } => Some(matched.clone()),
                TriggerKind::Explicit => None,
            };
            let _ = self.logger.log_skill_trigger(trigger.skill.name.clone(), "keyword", matched);
            messages.push(skill_guidance_message(&trigger.skill.name, &trigger.skill.instructions));
        }
    }
}

fn skill_guidance_message(name: &str, instructions: &str) -> Message {
    Message::user(format!("[Skill triggered: {name}]\n\n{instructions}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brynhild_dcm::DcmValue;

    #[tokio::test]
    async fn build_with_no_hooks_section_yields_empty_hook_manager() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(tmp.path()), DcmValue::Mapping(Default::default()), true).unwrap();
        let session = Session::build(
            &settings,
            "anthropic",
            "s1",
            SessionOptions {
                no_log: true,
                ..SessionOptions::default()
            },
        )
        .unwrap();
        assert!(session.hook_manager.take_pending_injections().is_empty());
    }
}
