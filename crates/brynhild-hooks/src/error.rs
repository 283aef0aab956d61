//! Hook error types.
//!
//! Deliberately *not* propagated out of [`crate::manager::HookManager`]'s
//! dispatch loop — a misbehaving hook degrades open rather than aborting
//! the conversation. The type exists so the degrade-open path itself, and
//! any direct callers that want to log specifics, have something typed to
//! work with.

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("hook command {command:?} failed to start: {source}")]
    Spawn { command: String, source: std::io::Error },

    #[error("hook command {command:?} timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("hook command {command:?} exited with status {status}: {stderr}")]
    NonZeroExit { command: String, status: i32, stderr: String },

    /// Terminated by a signal rather than exiting. Distinct from
    /// [`HookError::NonZeroExit`]: a crash degrades open, a nonzero exit
    /// does not.
    #[error("hook command {command:?} crashed (signal {signal:?})")]
    Crashed { command: String, signal: Option<i32> },

    #[error("hook command {command:?} produced invalid JSON on stdout: {reason}")]
    MalformedOutput { command: String, reason: String },

    #[error("invalid hook match pattern {pattern:?}: {source}")]
    InvalidPattern { pattern: String, source: regex::Error },
}

impl HookError {
    /// Whether this failure is a subprocess crash (killed by signal) as
    /// opposed to a clean nonzero exit or a timeout. Crashes always
    /// degrade open; the other two don't.
    pub fn is_crash(&self) -> bool {
        matches!(self, HookError::Crashed { .. })
    }

    /// The text to surface as a block reason when this failure is treated
    /// as a `PRE_TOOL_USE` denial: the hook's stderr when there is one,
    /// the error's own message otherwise.
    pub fn block_message(&self) -> String {
        match self {
            HookError::NonZeroExit { stderr, .. } if !stderr.trim().is_empty() => stderr.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HookError>;
