//! Skill manager — load, list, and remove locally installed skills.

use std::path::{Path, PathBuf};

use crate::error::{Result, SkillError};
use crate::loader::{check_requirements, load_skills_from_dir};
use crate::types::{SkillDefinition, SkillStatus};

/// Manages the local skill inventory.
pub struct SkillManager {
    /// Base directory where skills are stored.
    skills_dir: PathBuf,

    /// Currently loaded skills (in-memory cache).
    skills: Vec<SkillDefinition>,
}

impl SkillManager {
    /// Create a new skill manager.
    ///
    /// If `skills_dir` does not exist, it will be created on first install.
    pub fn new(skills_dir: PathBuf) -> Self {
        Self {
            skills_dir,
            skills: Vec::new(),
        }
    }

    /// Load all skills from the skills directory.
    pub fn load_all(&mut self) -> Result<&[SkillDefinition]> {
        self.skills = load_skills_from_dir(&self.skills_dir)?;
        Ok(&self.skills)
    }

    /// Return the currently loaded skills.
    pub fn skills(&self) -> &[SkillDefinition] {
        &self.skills
    }

    /// Return the skills directory path.
    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Get a loaded skill by name.
    pub fn get(&self, name: &str) -> Option<&SkillDefinition> {
        self.skills.iter().find(|s| s.name == name)
    }

    /// Remove an installed skill.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let skill_dir = self.skills_dir.join(name);
        if !skill_dir.exists() {
            return Err(SkillError::NotFound(name.to_owned()));
        }

        std::fs::remove_dir_all(&skill_dir)?;
        self.skills.retain(|s| s.name != name);

        tracing::info!(name = %name, "skill removed");
        Ok(())
    }

    /// List all installed skills with their status.
    pub fn list_with_status(&self) -> Vec<(&SkillDefinition, SkillStatus)> {
        self.skills
            .iter()
            .map(|s| (s, check_requirements(s)))
            .collect()
    }

    /// Builds the skill-metadata block for the system prompt: one line per
    /// ready skill (name and description), not its full body. A skill's
    /// instructions only enter the conversation when it's actually
    /// triggered — see [`crate::trigger`].
    pub fn build_prompt_extension(&self) -> String {
        let ready_skills: Vec<_> = self
            .skills
            .iter()
            .filter(|s| check_requirements(s) != SkillStatus::Unavailable)
            .collect();

        if ready_skills.is_empty() {
            return String::new();
        }

        let mut prompt = String::from("\n\n## Installed Skills\n\n");
        prompt.push_str("You have the following skills available. ");
        prompt.push_str("Invoke one with `/skill <name>` or mention it to pull in its instructions.\n\n");

        for skill in &ready_skills {
            if skill.description.is_empty() {
                prompt.push_str(&format!("- {}\n", skill.name));
            } else {
                prompt.push_str(&format!("- {}: {}\n", skill.name, skill.description));
            }
        }

        prompt
    }

    /// Ensure the skills directory exists, creating it if needed.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.skills_dir.exists() {
            std::fs::create_dir_all(&self.skills_dir)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_load_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let mut mgr = SkillManager::new(tmp.path().to_path_buf());
        let skills = mgr.load_all().unwrap();
        assert!(skills.is_empty());
    }

    #[test]
    fn manager_load_and_remove() {
        let tmp = tempfile::tempdir().unwrap();

        let skill_dir = tmp.path().join("test-skill");
        std::fs::create_dir(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join("SKILL.md"),
            "---\nname: test-skill\ndescription: A test.\n---\nInstructions here.",
        )
        .unwrap();

        let mut mgr = SkillManager::new(tmp.path().to_path_buf());
        mgr.load_all().unwrap();
        assert_eq!(mgr.skills().len(), 1);
        assert!(mgr.get("test-skill").is_some());

        mgr.remove("test-skill").unwrap();
        assert!(mgr.skills().is_empty());
        assert!(!skill_dir.exists());
    }

    #[test]
    fn manager_remove_nonexistent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut mgr = SkillManager::new(tmp.path().to_path_buf());
        let result = mgr.remove("nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn build_prompt_extension_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = SkillManager::new(tmp.path().to_path_buf());
        assert!(mgr.build_prompt_extension().is_empty());
    }

    #[test]
    fn build_prompt_extension_with_skills() {
        let tmp = tempfile::tempdir().unwrap();

        for name in &["skill-a", "skill-b"] {
            let dir = tmp.path().join(name);
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(
                dir.join("SKILL.md"),
                format!("---\nname: {name}\ndescription: Skill {name}\n---\nDo {name} things."),
            )
            .unwrap();
        }

        let mut mgr = SkillManager::new(tmp.path().to_path_buf());
        mgr.load_all().unwrap();

        let ext = mgr.build_prompt_extension();
        assert!(ext.contains("skill-a"));
        assert!(ext.contains("skill-b"));
        assert!(ext.contains("Skill skill-a"));
        assert!(!ext.contains("Do skill-a things."));
    }
}
