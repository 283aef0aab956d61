//! Discovers project- and user-level rule files (`AGENTS.md`,
//! `.cursorrules`) and concatenates them into a single prepend block.
//!
//! Plugin-contributed rules are out of scope — plugin discovery from
//! packaging entry points is an explicit non-goal.

use std::path::{Path, PathBuf};

/// Conventional project-root rule filenames, checked in this order.
const PROJECT_RULE_FILES: &[&str] = &["AGENTS.md", ".cursorrules"];

/// One discovered rule file and its contents.
#[derive(Debug, Clone)]
pub struct RuleFile {
    pub path: PathBuf,
    pub content: String,
}

/// Finds and reads every rule file that applies to `project_root`, in
/// priority order (user-level first, so project rules — typically more
/// specific — appear closer to the base prompt).
pub fn discover_rule_files(project_root: &Path) -> Vec<RuleFile> {
    let mut files = Vec::new();

    if let Some(user_rules) = user_rules_path()
        && let Ok(content) = std::fs::read_to_string(&user_rules)
    {
        files.push(RuleFile {
            path: user_rules,
            content,
        });
    }

    for name in PROJECT_RULE_FILES {
        let path = project_root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => files.push(RuleFile { path, content }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to read rule file"),
        }
    }

    files
}

fn user_rules_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/brynhild/AGENTS.md"))
}

/// Joins rule file contents into one prepend block, in discovery order.
pub fn combine_rules(files: &[RuleFile]) -> Option<String> {
    if files.is_empty() {
        return None;
    }
    Some(
        files
            .iter()
            .map(|f| f.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_project_rule_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("AGENTS.md"), "Be concise.").unwrap();
        let files = discover_rule_files(tmp.path());
        assert!(files.iter().any(|f| f.content == "Be concise."));
    }

    #[test]
    fn no_rule_files_means_no_block() {
        let tmp = tempfile::tempdir().unwrap();
        let files = discover_rule_files(tmp.path());
        assert!(combine_rules(&files).is_none());
    }

    #[test]
    fn combines_multiple_files_with_blank_line() {
        let files = vec![
            RuleFile { path: "a".into(), content: "first".into() },
            RuleFile { path: "b".into(), content: "second".into() },
        ];
        let combined = combine_rules(&files).unwrap();
        assert_eq!(combined, "first\n\nsecond");
    }
}
