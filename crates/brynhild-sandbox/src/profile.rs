//! Command wrapping: builds the platform-appropriate sandboxed form of a
//! shell command (`sandbox-exec` + generated Seatbelt profile on macOS,
//! `bwrap` on Linux), or an unsandboxed fallback with a loud warning.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::SandboxConfig;
use crate::error::{Result, SandboxError};

/// Generates a macOS Seatbelt profile for `config`.
///
/// Later rules override earlier ones in Seatbelt's grammar, so the
/// profile denies reads from sensitive locations first, then re-allows
/// reads/writes for the allowed write paths (letting the project
/// directory punch through a `/Users` block), then applies the network
/// policy last.
pub fn generate_seatbelt_profile(config: &SandboxConfig) -> String {
    let mut profile = String::from(
        ";; Brynhild sandbox profile\n\
         (version 1)\n\
         (deny default)\n\
         (allow process-fork)\n\
         (allow process-exec)\n\
         (allow signal)\n\
         (allow file-read*)\n",
    );

    for blocked in &config.blocked_read_paths {
        profile.push_str(&format!("(deny file-read* (subpath \"{}\"))\n", escape(blocked)));
    }

    for allowed in &config.allowed_write_paths {
        profile.push_str(&format!("(allow file-read* (subpath \"{}\"))\n", escape(allowed)));
    }
    for allowed in &config.allowed_write_paths {
        profile.push_str(&format!("(allow file-write* (subpath \"{}\"))\n", escape(allowed)));
    }

    if config.allow_network {
        profile.push_str("(allow network*)\n");
    } else {
        profile.push_str("(deny network*)\n");
    }

    profile.push_str(
        "(allow sysctl-read)\n\
         (allow mach-lookup)\n\
         (allow ipc-posix-shm-read*)\n\
         (allow ipc-posix-shm-write-create)\n\
         (allow ipc-posix-shm-write-data)\n",
    );

    profile
}

fn escape(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\").replace('"', "\\\"")
}

/// Wraps `command` for sandboxed execution, returning the wrapped command
/// line and (on macOS) the path of the generated profile file, which the
/// caller should remove after the command finishes via
/// [`cleanup_sandbox_profile`].
pub fn get_sandbox_command(command: &str, config: &SandboxConfig) -> Result<(String, Option<PathBuf>)> {
    if config.dry_run {
        return Ok((format!("echo '[DRY RUN] Would execute: {command}'"), None));
    }
    if config.skip_sandbox {
        return Ok((command.to_string(), None));
    }

    if cfg!(target_os = "macos") {
        seatbelt_command(command, config)
    } else if cfg!(target_os = "linux") {
        bwrap_command(command, config)
    } else {
        tracing::warn!("no OS sandbox available on this platform; running command unsandboxed");
        Ok((command.to_string(), None))
    }
}

fn seatbelt_command(command: &str, config: &SandboxConfig) -> Result<(String, Option<PathBuf>)> {
    let profile = generate_seatbelt_profile(config);
    let mut profile_path = std::env::temp_dir();
    profile_path.push(format!("brynhild_{}.sb", std::process::id()));
    std::fs::write(&profile_path, profile)?;

    let escaped_command = command.replace('\'', "'\"'\"'");
    let wrapped = format!("sandbox-exec -f '{}' /bin/bash -c '{escaped_command}'", profile_path.display());
    Ok((wrapped, Some(profile_path)))
}

fn bwrap_command(command: &str, config: &SandboxConfig) -> Result<(String, Option<PathBuf>)> {
    require_bwrap()?;

    let mut parts = vec![
        "bwrap".to_string(),
        "--ro-bind".into(),
        "/".into(),
        "/".into(),
        "--dev".into(),
        "/dev".into(),
        "--proc".into(),
        "/proc".into(),
        "--unshare-pid".into(),
    ];

    if !config.allow_network {
        parts.push("--unshare-net".into());
    }

    for allowed in &config.allowed_write_paths {
        parts.push("--bind".into());
        parts.push(allowed.display().to_string());
        parts.push(allowed.display().to_string());
    }

    parts.push("--".into());
    parts.push("/bin/bash".into());
    parts.push("-c".into());
    parts.push(command.to_string());

    let wrapped = shell_join(&parts);
    Ok((wrapped, None))
}

fn shell_join(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| format!("'{}'", p.replace('\'', "'\"'\"'")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn require_bwrap() -> Result<()> {
    let found = Command::new("bwrap")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if found {
        Ok(())
    } else {
        Err(SandboxError::BubblewrapNotFound)
    }
}

pub fn cleanup_sandbox_profile(profile_path: Option<&Path>) {
    if let Some(path) = profile_path {
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn dry_run_wraps_as_echo() {
        let config = SandboxConfig::new(PathBuf::from("/tmp/proj")).with_dry_run(true);
        let (wrapped, profile) = get_sandbox_command("rm -rf /", &config).unwrap();
        assert!(wrapped.starts_with("echo"));
        assert!(profile.is_none());
    }

    #[test]
    fn skip_sandbox_passes_command_through() {
        let config = SandboxConfig::new(PathBuf::from("/tmp/proj")).with_skip_sandbox(true);
        let (wrapped, _) = get_sandbox_command("ls", &config).unwrap();
        assert_eq!(wrapped, "ls");
    }

    #[test]
    fn seatbelt_profile_denies_default_and_blocks_network_unless_allowed() {
        let config = SandboxConfig::new(PathBuf::from("/tmp/proj"));
        let profile = generate_seatbelt_profile(&config);
        assert!(profile.contains("(deny default)"));
        assert!(profile.contains("(deny network*)"));

        let config = config.with_allow_network(true);
        let profile = generate_seatbelt_profile(&config);
        assert!(profile.contains("(allow network*)"));
    }
}
