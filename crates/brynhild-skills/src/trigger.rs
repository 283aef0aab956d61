//! Runtime skill triggers: resolving a user message into a skill whose
//! full body should enter the conversation, either because the user asked
//! for it explicitly (`/skill <name>`) or because the message matched one
//! of the skill's trigger keywords.

use crate::types::SkillDefinition;

/// How a skill was pulled into the current turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    /// The user typed `/skill <name>` at the start of their message.
    Explicit,
    /// The message matched one of the skill's declared keywords.
    Keyword { matched: String },
}

/// A skill resolved for injection, alongside why it fired.
#[derive(Debug, Clone)]
pub struct SkillTrigger<'a> {
    pub skill: &'a SkillDefinition,
    pub kind: TriggerKind,
}

/// Parses a leading `/skill <name>` command off `message`. Returns the
/// skill name and the remainder of the message with the command stripped,
/// or `None` if the message doesn't start with the command.
pub fn parse_explicit_command(message: &str) -> Option<(&str, &str)> {
    let rest = message.strip_prefix("/skill ").or_else(|| message.strip_prefix("/skill\t"))?;
    let rest = rest.trim_start();
    let (name, remainder) = match rest.split_once(char::is_whitespace) {
        Some((name, remainder)) => (name, remainder.trim_start()),
        None => (rest, ""),
    };
    if name.is_empty() {
        None
    } else {
        Some((name, remainder))
    }
}

/// Resolves `message` against `skills` for an explicit `/skill <name>`
/// invocation. Returns `None` if the message isn't an explicit invocation,
/// even if the named skill doesn't exist (callers should report that as a
/// user-facing error rather than silently falling through to keyword
/// matching).
pub fn resolve_explicit<'a>(message: &str, skills: &'a [SkillDefinition]) -> Option<Result<SkillTrigger<'a>, String>> {
    let (name, _remainder) = parse_explicit_command(message)?;
    match skills.iter().find(|s| s.name == name) {
        Some(skill) => Some(Ok(SkillTrigger { skill, kind: TriggerKind::Explicit })),
        None => Some(Err(format!("no skill named {name:?} is installed"))),
    }
}

/// Scans `message` for any of each skill's `trigger_keywords` (from its
/// metadata), case-insensitively. Returns every match, in skill-list
/// order — a message may trigger more than one skill.
pub fn resolve_keyword_matches<'a>(message: &str, skills: &'a [SkillDefinition]) -> Vec<SkillTrigger<'a>> {
    let lower = message.to_lowercase();
    skills
        .iter()
        .filter_map(|skill| {
            skill
                .metadata
                .trigger_keywords
                .iter()
                .find(|kw| !kw.is_empty() && lower.contains(&kw.to_lowercase()))
                .map(|kw| SkillTrigger { skill, kind: TriggerKind::Keyword { matched: kw.clone() } })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SkillMetadata, SkillSource};

    fn skill(name: &str, keywords: &[&str]) -> SkillDefinition {
        SkillDefinition {
            name: name.to_string(),
            description: String::new(),
            version: None,
            metadata: SkillMetadata {
                trigger_keywords: keywords.iter().map(|s| s.to_string()).collect(),
                ..SkillMetadata::default()
            },
            instructions: format!("Body of {name}."),
            source: SkillSource::default(),
            scripts: Vec::new(),
        }
    }

    #[test]
    fn parses_explicit_command_with_trailing_text() {
        let parsed = parse_explicit_command("/skill git-commit-helper write a message");
        assert_eq!(parsed, Some(("git-commit-helper", "write a message")));
    }

    #[test]
    fn non_command_message_is_not_explicit() {
        assert_eq!(parse_explicit_command("use the skill please"), None);
    }

    #[test]
    fn resolves_explicit_to_known_skill() {
        let skills = vec![skill("a", &[])];
        let resolved = resolve_explicit("/skill a", &skills).unwrap().unwrap();
        assert_eq!(resolved.skill.name, "a");
        assert_eq!(resolved.kind, TriggerKind::Explicit);
    }

    #[test]
    fn resolves_explicit_unknown_skill_as_error() {
        let skills = vec![skill("a", &[])];
        let resolved = resolve_explicit("/skill nope", &skills).unwrap();
        assert!(resolved.is_err());
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let skills = vec![skill("deploy", &["ship it"])];
        let matches = resolve_keyword_matches("let's Ship It now", &skills);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, TriggerKind::Keyword { matched: "ship it".into() });
    }

    #[test]
    fn no_keywords_means_no_automatic_match() {
        let skills = vec![skill("deploy", &[])];
        let matches = resolve_keyword_matches("ship it now", &skills);
        assert!(matches.is_empty());
    }
}
