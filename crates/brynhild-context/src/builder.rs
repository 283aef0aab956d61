//! Assembles the system prompt a turn runs with: rule files, the active
//! profile, skill metadata, and whatever a `context_build` hook wants to
//! inject, in that order, each step logged as it happens.

use std::path::{Path, PathBuf};

use brynhild_hooks::{ContextLocation, HookEvent, HookManager};
use brynhild_logging::ConversationLogger;
use brynhild_skills::SkillManager;
use serde_json::json;

use crate::profile::Profile;
use crate::rules::{combine_rules, discover_rule_files};
use crate::types::{ContextInjection, ConversationContext, InjectionLocation};

/// Builds a [`ConversationContext`] from a base system prompt plus
/// whatever rules, profile, skills, and hooks apply to this project.
pub struct ContextBuilder<'a> {
    project_root: PathBuf,
    rules_enabled: bool,
    skills_enabled: bool,
    profile: Option<Profile>,
    logger: Option<&'a ConversationLogger>,
    hooks: Option<&'a HookManager>,
    skill_manager: Option<&'a SkillManager>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        ContextBuilder {
            project_root: project_root.as_ref().to_path_buf(),
            rules_enabled: true,
            skills_enabled: true,
            profile: None,
            logger: None,
            hooks: None,
            skill_manager: None,
        }
    }

    pub fn rules_enabled(mut self, enabled: bool) -> Self {
        self.rules_enabled = enabled;
        self
    }

    pub fn skills_enabled(mut self, enabled: bool) -> Self {
        self.skills_enabled = enabled;
        self
    }

    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn logger(mut self, logger: &'a ConversationLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn hooks(mut self, hooks: &'a HookManager) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn skill_manager(mut self, manager: &'a SkillManager) -> Self {
        self.skill_manager = Some(manager);
        self
    }

    /// Runs the build, in order: rule files, the `context_build` hook's
    /// prepend-located injections, the profile's prefix then its pattern
    /// text, the base prompt, then the profile's suffix, skill metadata,
    /// and the hook's append-located injections. Never fails — a missing
    /// piece (no rules, no hooks, no skills) just means that step
    /// contributes nothing.
    pub async fn build(&self, base_prompt: &str) -> ConversationContext {
        if let Some(logger) = self.logger {
            let _ = logger.log_context_init(base_prompt);
        }

        let mut injections = Vec::new();
        let mut prepend = Vec::new();
        let mut append = Vec::new();

        if self.rules_enabled {
            let files = discover_rule_files(&self.project_root);
            for file in &files {
                let injection = ContextInjection {
                    source: format!("rule_file:{}", file.path.display()),
                    location: InjectionLocation::SystemPromptPrepend,
                    content: file.content.clone(),
                    origin: Some(file.path.display().to_string()),
                    trigger_type: None,
                    trigger_match: None,
                };
                self.log_injection(&injection);
                injections.push(injection);
            }
            if let Some(combined) = combine_rules(&files) {
                prepend.push(combined);
            }
        }

        if let Some(hooks) = self.hooks {
            let payload = json!({
                "base_system_prompt": base_prompt,
                "injections_so_far": injections.len(),
            });
            let _ = hooks
                .dispatch(HookEvent::ContextBuild, "context_build", payload, self.project_root.clone())
                .await;
            for (location, text) in hooks.take_pending_injections() {
                let injection_location = match location {
                    ContextLocation::Prepend => InjectionLocation::SystemPromptPrepend,
                    ContextLocation::Append => InjectionLocation::SystemPromptAppend,
                };
                let injection = ContextInjection {
                    source: "hook:context_build".to_string(),
                    location: injection_location,
                    content: text.clone(),
                    origin: None,
                    trigger_type: Some("context_build".to_string()),
                    trigger_match: None,
                };
                self.log_injection(&injection);
                injections.push(injection);
                match location {
                    ContextLocation::Prepend => prepend.push(text),
                    ContextLocation::Append => append.push(text),
                }
            }
        }

        if let Some(profile) = &self.profile {
            if let Some(prefix) = &profile.system_prompt_prefix {
                let injection = ContextInjection {
                    source: format!("profile:{}", profile.name),
                    location: InjectionLocation::SystemPromptPrepend,
                    content: prefix.clone(),
                    origin: Some(profile.name.clone()),
                    trigger_type: None,
                    trigger_match: None,
                };
                self.log_injection(&injection);
                injections.push(injection);
                prepend.push(prefix.clone());
            }
            if let Some(patterns) = profile.patterns_text() {
                let injection = ContextInjection {
                    source: format!("profile:{}", profile.name),
                    location: InjectionLocation::SystemPromptPrepend,
                    content: patterns.clone(),
                    origin: Some(profile.name.clone()),
                    trigger_type: None,
                    trigger_match: None,
                };
                self.log_injection(&injection);
                injections.push(injection);
                prepend.push(patterns);
            }
            if let Some(suffix) = &profile.system_prompt_suffix {
                let injection = ContextInjection {
                    source: format!("profile:{}", profile.name),
                    location: InjectionLocation::SystemPromptAppend,
                    content: suffix.clone(),
                    origin: Some(profile.name.clone()),
                    trigger_type: None,
                    trigger_match: None,
                };
                self.log_injection(&injection);
                injections.push(injection);
                append.push(suffix.clone());
            }
        }

        if self.skills_enabled
            && let Some(skill_manager) = self.skill_manager
        {
            let extension = skill_manager.build_prompt_extension();
            if !extension.is_empty() {
                let injection = ContextInjection {
                    source: "skills".to_string(),
                    location: InjectionLocation::SystemPromptAppend,
                    content: extension.clone(),
                    origin: None,
                    trigger_type: None,
                    trigger_match: None,
                };
                self.log_injection(&injection);
                injections.push(injection);
                append.push(extension);
            }
        }

        let mut blocks = Vec::new();
        blocks.extend(prepend);
        blocks.push(base_prompt.to_string());
        blocks.extend(append);
        let system_prompt = blocks.join("\n\n");

        if let Some(logger) = self.logger {
            let _ = logger.log_context_ready(&system_prompt);
        }

        ConversationContext {
            system_prompt,
            base_prompt: base_prompt.to_string(),
            injections,
        }
    }

    fn log_injection(&self, injection: &ContextInjection) {
        let Some(logger) = self.logger else { return };
        let _ = logger.log_context_injection(
            injection.source.clone(),
            injection.location.as_str(),
            injection.content.clone(),
            injection.origin.clone(),
            injection.trigger_type.clone(),
            injection.trigger_match.clone(),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn base_prompt_alone_with_nothing_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let builder = ContextBuilder::new(tmp.path()).rules_enabled(false).skills_enabled(false);
        let context = builder.build("You are an assistant.").await;
        assert_eq!(context.system_prompt, "You are an assistant.");
        assert!(context.injections.is_empty());
    }

    #[tokio::test]
    async fn rule_file_prepends_before_base_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("AGENTS.md"), "Be terse.").unwrap();
        let builder = ContextBuilder::new(tmp.path()).skills_enabled(false);
        let context = builder.build("Base.").await;
        assert_eq!(context.system_prompt, "Be terse.\n\nBase.");
        assert_eq!(context.injections.len(), 1);
    }

    #[tokio::test]
    async fn profile_prefix_and_suffix_land_on_either_side() {
        let tmp = tempfile::tempdir().unwrap();
        let mut profile = Profile::new("reviewer");
        profile.system_prompt_prefix = Some("Prefix.".into());
        profile.system_prompt_suffix = Some("Suffix.".into());
        let builder = ContextBuilder::new(tmp.path())
            .rules_enabled(false)
            .skills_enabled(false)
            .profile(profile);
        let context = builder.build("Base.").await;
        assert_eq!(context.system_prompt, "Prefix.\n\nBase.\n\nSuffix.");
    }

    #[tokio::test]
    async fn skills_append_after_base_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        let skills_dir = tmp.path().join("skills");
        let manager = SkillManager::new(skills_dir);
        let builder = ContextBuilder::new(tmp.path()).rules_enabled(false).skill_manager(&manager);
        let context = builder.build("Base.").await;
        assert_eq!(context.system_prompt, "Base.");
    }
}
