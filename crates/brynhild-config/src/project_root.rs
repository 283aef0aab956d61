//! Project root discovery and the overly-wide-root safety guard.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

const PROJECT_MARKERS: &[&str] = &["pyproject.toml", "setup.py", "setup.cfg", ".git", "Cargo.toml"];

/// Dangerous roots that must never be treated as a project root, even if a
/// marker file happens to live there.
const DANGEROUS_ROOTS: &[&str] = &["/", "/home", "/Users", "/var", "/etc", "/tmp", "/private/tmp"];

/// Walks upward from `start` looking for a `.git` directory.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join(".git").exists() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

fn is_overly_wide_root(path: &Path) -> bool {
    if let Some(home) = dirs_home() {
        if path == home {
            return true;
        }
    }
    let path_str = path.to_string_lossy();
    DANGEROUS_ROOTS.iter().any(|root| path_str == *root)
}

/// Cheap substitute for the `dirs` crate: reads `$HOME` directly.
fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Resolves the project root: prefer the nearest `.git` root, then walk
/// upward for a recognized marker file, then fall back to `start` itself.
/// Refuses to resolve to a home directory or other dangerously wide root
/// unless `allow_wide_root` is set, matching the guard in the reference
/// settings loader.
pub fn find_project_root(start: Option<&Path>, allow_wide_root: bool) -> Result<PathBuf> {
    let cwd;
    let start = match start {
        Some(p) => p,
        None => {
            cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
                path: ".".into(),
                source,
            })?;
            &cwd
        }
    };

    let candidate = find_git_root(start)
        .or_else(|| walk_for_marker(start))
        .unwrap_or_else(|| start.to_path_buf());

    if !allow_wide_root && is_overly_wide_root(&candidate) {
        return Err(ConfigError::ProjectRootTooWide {
            path: candidate.display().to_string(),
        });
    }

    Ok(candidate)
}

fn walk_for_marker(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if PROJECT_MARKERS.iter().any(|m| d.join(m).exists()) {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_marker_file_upward() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "").unwrap();
        let root = find_project_root(Some(&nested), true).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn rejects_dangerous_root_without_override() {
        let err = find_project_root(Some(Path::new("/etc")), false).unwrap_err();
        assert!(matches!(err, ConfigError::ProjectRootTooWide { .. }));
    }

    #[test]
    fn allows_dangerous_root_with_override() {
        let root = find_project_root(Some(Path::new("/etc")), true).unwrap();
        assert_eq!(root, Path::new("/etc"));
    }
}
