//! Skill system — compatible with OpenClaw's SKILL.md format.
//!
//! This crate provides:
//!
//! - **SKILL.md parser** — parses OpenClaw-compatible skill definitions with
//!   YAML frontmatter and markdown instructions.
//!
//! - **Skill loader** — discovers and loads skills from the local filesystem.
//!
//! - **Skill manager** — load, list, and remove locally installed skills.
//!
//! - **Script tools** — bridges skills with executable scripts into callable
//!   tools (see [`adapter::ScriptToolSet`]).
//!
//! - **Runtime triggers** — resolves a user message into a skill whose full
//!   body should be pulled into the conversation (see [`trigger`]).
//!
//! # Integration
//!
//! Skills integrate with the agent runtime in two ways:
//!
//! 1. **Prompt injection** — skill instructions are appended to the system
//!    prompt, telling the LLM how to use existing tools to accomplish the
//!    skill's purpose.
//!
//! 2. **Script tools** — skills with executable scripts (`.sh`, `.py`, `.js`,
//!    `.ts`) are exposed as additional tools via [`ScriptToolSet`].
//!
//! This crate has no dependency on the tool-calling or provider crates —
//! wrapping a [`ScriptTool`] into a concrete `Tool` implementation is left to
//! the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use brynhild_skills::{SkillManager, ScriptToolSet};
//! use std::path::PathBuf;
//!
//! // Load all installed skills.
//! let mut manager = SkillManager::new(PathBuf::from("skills"));
//! manager.load_all().unwrap();
//!
//! // Build system prompt extension from skill instructions.
//! let prompt_ext = manager.build_prompt_extension();
//!
//! // Discover script-based tools.
//! let tools = ScriptToolSet::new(manager.skills());
//! ```

pub mod adapter;
pub mod error;
pub mod loader;
pub mod manager;
pub mod parser;
pub mod trigger;
pub mod types;

pub use adapter::{ScriptTool, ScriptToolSet};
pub use error::{Result, SkillError};
pub use loader::{check_requirements, default_skills_dir, load_skills_from_dir};
pub use manager::SkillManager;
pub use parser::parse_skill_md;
pub use trigger::{parse_explicit_command, resolve_explicit, resolve_keyword_matches, SkillTrigger, TriggerKind};
pub use types::{
    ScriptInterpreter, SkillDefinition, SkillMetadata, SkillRequirements, SkillScript, SkillSource,
    SkillStatus,
};
