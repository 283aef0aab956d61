//! Conversation tool-loop: message-sequence validation, the tool
//! registry, recovery of missed tool calls, and the processor that
//! drives a provider stream to completion.

pub mod adapters;
pub mod error;
pub mod processor;
pub mod recovery;
pub mod session;
pub mod skill_tool;
pub mod tool;
pub mod validator;

pub use adapters::{AutoApprovePermissionChecker, DenyAllPermissionChecker};
pub use error::{BrynhildError, BrynhildResult, CoreError, Result};
pub use processor::{
    CancellationToken, ConversationProcessor, HookDecision, PermissionChecker, PostToolHook,
    PreToolHook, ProcessorConfig, SandboxGuard, TextDeltaCallback, TurnOutcome,
};
pub use recovery::{recover_tool_calls, RecoveredCall, RecoveryBudget};
pub use session::{Session, SessionOptions};
pub use skill_tool::SkillScriptTool;
pub use tool::{RecoveryPolicy, RiskLevel, Tool, ToolRegistry};
pub use validator::validate_message_sequence;
