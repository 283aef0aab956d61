//! Sandbox error types.
//!
//! All sandbox subsystems surface errors through [`SandboxError`], which is the
//! single error type returned by every public API in this crate.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// A path failed validation for the given operation.
    #[error("{operation} access denied: {path} {reason}")]
    PathDenied {
        path: PathBuf,
        operation: &'static str,
        reason: String,
    },

    /// A path could not be resolved (broken symlink loop, permission error).
    #[error("cannot resolve path {path}: {source}")]
    Unresolvable { path: PathBuf, source: std::io::Error },

    /// Linux sandboxing was requested but `bwrap` is not installed.
    #[error("bubblewrap (bwrap) not found on PATH; install it or pass --dangerously-skip-sandbox")]
    BubblewrapNotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_denied_display() {
        let err = SandboxError::PathDenied {
            path: PathBuf::from("/etc/shadow"),
            operation: "write",
            reason: "is in a protected location".into(),
        };
        assert!(err.to_string().contains("write access denied"));
    }

    #[test]
    fn bubblewrap_not_found_display() {
        assert!(SandboxError::BubblewrapNotFound.to_string().contains("bwrap"));
    }
}
