//! CLI argument definitions. Only `chat` and `config show` actually do
//! anything; `session` and `api` are wired up so the subcommand table
//! matches the full surface but print a stub message and exit 1.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "brynhild", version, about = "Terminal-resident coding assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one turn against a provider and print the result.
    Chat {
        /// The prompt to send. Reads from stdin if omitted.
        prompt: Option<String>,

        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        profile: Option<String>,

        /// Runs the tool loop with every tool call synthesized as a no-op.
        #[arg(long)]
        dry_run: bool,

        /// Auto-approves every permission-requiring tool call.
        #[arg(long)]
        dangerously_skip_permissions: bool,

        /// Disables sandbox path/network confinement entirely.
        #[arg(long)]
        dangerously_skip_sandbox: bool,

        #[arg(long)]
        no_log: bool,

        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Prints the turn outcome as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Session management (not implemented in this build).
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Provider introspection (not implemented in this build).
    Api {
        #[command(subcommand)]
        action: ApiAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Prints the fully merged settings as JSON.
    Show,
}

#[derive(Subcommand)]
pub enum SessionAction {
    List,
    Show { session_id: String },
    Delete { session_id: String },
}

#[derive(Subcommand)]
pub enum ApiAction {
    Providers,
    Test { provider: String },
}
