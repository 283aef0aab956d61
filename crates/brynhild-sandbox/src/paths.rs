//! Path validation: confines tool file I/O to the project directory (and
//! a small set of always-allowed scratch directories), regardless of
//! what the rest of the filesystem looks like.

use std::path::{Path, PathBuf};

use crate::config::{resolve_best_effort, SandboxConfig};
use crate::error::{Result, SandboxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl Operation {
    fn label(self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
        }
    }
}

/// Validates `path` for `operation` against `config`, returning the
/// resolved, absolute path on success.
///
/// For writes: allowed paths are checked first, so the project directory
/// "punches through" a broader block like `/home`; anything left over
/// that isn't explicitly allowed is denied, even if it isn't on the
/// blocklist either — writes are allow-listed, not block-listed.
///
/// For reads: allowed paths are checked first, then the blocklist; a
/// path that is neither allowed nor blocked is permitted, since the
/// default posture for reads is "most of the filesystem is readable."
pub fn validate_path(path: &Path, config: &SandboxConfig, operation: Operation) -> Result<PathBuf> {
    let resolved = resolve_best_effort(path);

    let in_allowed = config.allowed_write_paths.iter().any(|allowed| resolved.starts_with(allowed));
    if in_allowed {
        return Ok(resolved);
    }

    match operation {
        Operation::Write => Err(SandboxError::PathDenied {
            path: resolved,
            operation: operation.label(),
            reason: format!(
                "is outside allowed directories (writes are only allowed under {})",
                config.project_root.display()
            ),
        }),
        Operation::Read => {
            if let Some(blocked) = config.blocked_read_paths.iter().find(|b| resolved.starts_with(b)) {
                Err(SandboxError::PathDenied {
                    path: resolved,
                    operation: operation.label(),
                    reason: format!("is under protected location {}", blocked.display()),
                })
            } else {
                Ok(resolved)
            }
        }
    }
}

/// For writes, additionally consults the write blocklist after the
/// allow-list misses, purely to produce a more specific error message.
pub fn validate_write_path(path: &Path, config: &SandboxConfig) -> Result<PathBuf> {
    match validate_path(path, config, Operation::Write) {
        Ok(p) => Ok(p),
        Err(SandboxError::PathDenied { path: p, operation, .. }) => {
            if let Some(blocked) = config.blocked_write_paths.iter().find(|b| p.starts_with(b)) {
                Err(SandboxError::PathDenied {
                    path: p,
                    operation,
                    reason: format!("is under protected location {}", blocked.display()),
                })
            } else {
                Err(SandboxError::PathDenied {
                    path: p,
                    operation,
                    reason: format!(
                        "is outside allowed directories (writes are only allowed under {})",
                        config.project_root.display()
                    ),
                })
            }
        }
        Err(other) => Err(other),
    }
}

pub fn is_path_safe(path: &Path, config: &SandboxConfig, operation: Operation) -> bool {
    match operation {
        Operation::Write => validate_write_path(path, config).is_ok(),
        Operation::Read => validate_path(path, config, operation).is_ok(),
    }
}

/// Expands `~`, makes relative paths absolute against `base_dir`, then
/// validates the result.
pub fn resolve_and_validate(path: &str, base_dir: &Path, config: &SandboxConfig, operation: Operation) -> Result<PathBuf> {
    let expanded = if let Some(rest) = path.strip_prefix("~/") {
        std::env::var("HOME").map(|home| PathBuf::from(home).join(rest)).unwrap_or_else(|_| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    };

    let absolute = if expanded.is_absolute() { expanded } else { base_dir.join(expanded) };

    match operation {
        Operation::Write => validate_write_path(&absolute, config),
        Operation::Read => validate_path(&absolute, config, operation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_directory_punches_through_home_block() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let config = SandboxConfig::new(project.clone());
        let target = project.join("notes.txt");
        assert!(validate_write_path(&target, &config).is_ok());
    }

    #[test]
    fn write_outside_allowed_paths_is_denied() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let config = SandboxConfig::new(project);
        assert!(validate_write_path(Path::new("/opt/somewhere/file.txt"), &config).is_err());
    }

    #[test]
    fn read_outside_allowed_and_blocked_is_permitted() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let config = SandboxConfig::new(project);
        assert!(validate_path(Path::new("/usr/bin/env"), &config, Operation::Read).is_ok());
    }
}
