//! Model-specific prompt profiles: a prefix/suffix pair plus a handful of
//! named prompt patterns the builder can prepend.
//!
//! Profile *storage and resolution* (by explicit name or model-to-profile
//! mapping) are left to the caller — this build has no dedicated profile
//! store, so a [`Profile`] is supplied already-resolved. See DESIGN.md for
//! the rationale.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub system_prompt_prefix: Option<String>,
    #[serde(default)]
    pub system_prompt_suffix: Option<String>,
    #[serde(default)]
    pub enabled_patterns: Vec<String>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt_prefix: None,
            system_prompt_suffix: None,
            enabled_patterns: Vec::new(),
        }
    }

    /// Renders the `enabled_patterns` list as a single prepend block, one
    /// bullet per pattern name.
    pub fn patterns_text(&self) -> Option<String> {
        if self.enabled_patterns.is_empty() {
            return None;
        }
        let mut text = String::from("## Prompt patterns\n\n");
        for pattern in &self.enabled_patterns {
            text.push_str(&format!("- {pattern}\n"));
        }
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_patterns_means_no_block() {
        let profile = Profile::new("default");
        assert!(profile.patterns_text().is_none());
    }

    #[test]
    fn patterns_render_as_bullets() {
        let mut profile = Profile::new("reviewer");
        profile.enabled_patterns = vec!["concise".into(), "cite-sources".into()];
        let text = profile.patterns_text().unwrap();
        assert!(text.contains("- concise"));
        assert!(text.contains("- cite-sources"));
    }
}
