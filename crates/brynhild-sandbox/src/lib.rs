//! OS-level sandboxing for tool execution: path validation confining
//! reads/writes to the project directory and a few scratch paths, plus
//! platform-specific command wrapping (Seatbelt on macOS, bubblewrap on
//! Linux) for tools that shell out.
//!
//! - **[`config`]** -- [`SandboxConfig`] holds the project root, extra
//!   allowed/blocked paths, and the network/dry-run/skip-sandbox flags.
//! - **[`paths`]** -- path validation, the allow-before-block check that
//!   lets the project directory punch through a broader platform block.
//! - **[`profile`]** -- command wrapping: Seatbelt profile generation on
//!   macOS, `bwrap` argument construction on Linux.

pub mod config;
pub mod error;
pub mod paths;
pub mod profile;

pub use config::SandboxConfig;
pub use error::{Result, SandboxError};
pub use paths::{is_path_safe, resolve_and_validate, validate_path, validate_write_path, Operation};
pub use profile::{cleanup_sandbox_profile, generate_seatbelt_profile, get_sandbox_command};
