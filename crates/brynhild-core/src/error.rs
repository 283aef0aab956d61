//! Error types for the conversation processor and tool registry.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("no tool registered named {0}")]
    UnknownTool(String),

    #[error("tool {tool_name} execution failed: {reason}")]
    ToolExecutionFailed { tool_name: String, reason: String },

    #[error("tool {tool_name} denied by hook {hook}: {reason}")]
    HookDenied {
        tool_name: String,
        hook: String,
        reason: String,
    },

    #[error("tool {tool_name} rejected by sandbox: {reason}")]
    SandboxViolation { tool_name: String, reason: String },

    #[error("invalid message sequence: {0}")]
    InvalidMessageSequence(String),

    #[error(transparent)]
    Provider(#[from] brynhild_providers::ProviderError),

    #[error("tool execution task panicked: {0}")]
    TaskPanicked(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error taxonomy: wraps every subsystem's error type into one
/// fallible surface for session construction and the CLI boundary.
#[derive(Debug, thiserror::Error)]
pub enum BrynhildError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] brynhild_config::ConfigError),

    #[error(transparent)]
    Provider(#[from] brynhild_providers::ProviderError),

    #[error(transparent)]
    Hook(#[from] brynhild_hooks::HookError),

    #[error(transparent)]
    Sandbox(#[from] brynhild_sandbox::SandboxError),

    #[error(transparent)]
    Skill(#[from] brynhild_skills::SkillError),

    #[error(transparent)]
    Logging(#[from] brynhild_logging::LoggingError),
}

pub type BrynhildResult<T> = std::result::Result<T, BrynhildError>;
