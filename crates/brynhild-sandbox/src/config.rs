//! Sandbox configuration: the set of paths tool execution is confined to.

use std::env;
use std::path::{Path, PathBuf};

/// Platform-specific paths tools must never read from, and the (larger)
/// set they must never write to. Grounded in the observation that the
/// project directory and `/tmp` need to "punch through" a broader block
/// like `/home` — see [`validate_path`](crate::paths::validate_path).
fn sensitive_paths() -> (Vec<&'static str>, Vec<&'static str>) {
    if cfg!(target_os = "macos") {
        (
            vec!["/Users", "/Volumes"],
            vec![
                "/Users", "/Volumes", "/System", "/Library", "/Applications", "/private",
                "/cores", "/etc", "/usr", "/bin", "/sbin", "/var", "/opt",
            ],
        )
    } else if cfg!(target_os = "linux") {
        (
            vec!["/home", "/root", "/mnt", "/media", "/run/media"],
            vec![
                "/home", "/root", "/mnt", "/media", "/run/media", "/etc", "/usr", "/bin",
                "/sbin", "/var", "/opt", "/boot", "/lib", "/lib64", "/lib32", "/srv",
            ],
        )
    } else {
        (Vec::new(), Vec::new())
    }
}

#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub project_root: PathBuf,
    pub allowed_paths: Vec<PathBuf>,
    pub blocked_paths: Vec<String>,
    pub allow_network: bool,
    pub dry_run: bool,
    pub skip_sandbox: bool,

    pub(crate) allowed_write_paths: Vec<PathBuf>,
    pub(crate) blocked_read_paths: Vec<PathBuf>,
    pub(crate) blocked_write_paths: Vec<PathBuf>,
}

impl SandboxConfig {
    pub fn new(project_root: PathBuf) -> Self {
        Self::build(project_root, Vec::new(), Vec::new(), false, false, false)
    }

    pub fn with_allowed_paths(mut self, allowed_paths: Vec<PathBuf>) -> Self {
        self.allowed_paths = allowed_paths;
        self.recompute()
    }

    pub fn with_blocked_paths(mut self, blocked_paths: Vec<String>) -> Self {
        self.blocked_paths = blocked_paths;
        self.recompute()
    }

    pub fn with_allow_network(mut self, allow_network: bool) -> Self {
        self.allow_network = allow_network;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_skip_sandbox(mut self, skip_sandbox: bool) -> Self {
        self.skip_sandbox = skip_sandbox;
        self
    }

    fn build(
        project_root: PathBuf,
        allowed_paths: Vec<PathBuf>,
        blocked_paths: Vec<String>,
        allow_network: bool,
        dry_run: bool,
        skip_sandbox: bool,
    ) -> Self {
        let mut config = SandboxConfig {
            project_root,
            allowed_paths,
            blocked_paths,
            allow_network,
            dry_run,
            skip_sandbox,
            allowed_write_paths: Vec::new(),
            blocked_read_paths: Vec::new(),
            blocked_write_paths: Vec::new(),
        };
        config = config.recompute();
        config
    }

    fn recompute(mut self) -> Self {
        let mut allowed_write_paths = vec![resolve_best_effort(&self.project_root)];
        allowed_write_paths.extend(tmp_paths());
        allowed_write_paths.extend(self.allowed_paths.iter().map(|p| resolve_best_effort(p)));

        let (read_blocklist, write_blocklist) = sensitive_paths();
        let extra: Vec<&str> = self.blocked_paths.iter().map(String::as_str).collect();

        self.allowed_write_paths = allowed_write_paths;
        self.blocked_read_paths = expand_paths(read_blocklist.into_iter().chain(extra.iter().copied()));
        self.blocked_write_paths = expand_paths(write_blocklist.into_iter().chain(extra.iter().copied()));
        self
    }
}

fn tmp_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for candidate in ["/tmp", "/private/tmp"] {
        let p = Path::new(candidate);
        if p.exists() {
            let resolved = resolve_best_effort(p);
            if !paths.contains(&resolved) {
                paths.push(resolved);
            }
        }
    }
    let system_tmp = env::temp_dir();
    if system_tmp.exists() {
        let resolved = resolve_best_effort(&system_tmp);
        if !paths.contains(&resolved) {
            paths.push(resolved);
        }
    }
    paths
}

fn expand_paths<'a>(patterns: impl Iterator<Item = &'a str>) -> Vec<PathBuf> {
    patterns
        .map(|pattern| {
            let expanded = expand_tilde(pattern);
            resolve_best_effort(&expanded)
        })
        .collect()
}

fn expand_tilde(pattern: &str) -> PathBuf {
    if let Some(rest) = pattern.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(pattern)
}

/// Resolves symlinks/`..` when the path exists; falls back to the
/// unresolved path otherwise so callers can still block attempts to
/// create it.
pub(crate) fn resolve_best_effort(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_is_in_allowed_write_paths() {
        let config = SandboxConfig::new(PathBuf::from("/tmp/some-project"));
        assert!(config.allowed_write_paths.iter().any(|p| p.ends_with("some-project")));
    }

    #[test]
    fn extra_blocked_paths_are_appended() {
        let config = SandboxConfig::new(PathBuf::from("/tmp/proj"))
            .with_blocked_paths(vec!["/opt/secrets".to_string()]);
        assert!(config.blocked_write_paths.iter().any(|p| p.ends_with("secrets")));
    }
}
