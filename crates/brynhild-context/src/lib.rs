//! Context builder: turns a base system prompt into the one a turn
//! actually runs with, by merging in rule files, the active profile,
//! skill metadata, and `context_build` hook injections.

pub mod builder;
pub mod profile;
pub mod rules;
pub mod types;

pub use builder::ContextBuilder;
pub use profile::Profile;
pub use rules::{RuleFile, combine_rules, discover_rule_files};
pub use types::{ContextInjection, ConversationContext, InjectionLocation};
