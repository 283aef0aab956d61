//! Conversation logging: an append-only JSONL event log, and a markdown
//! exporter that re-parses that log into a presentation-grade transcript.

pub mod error;
pub mod event;
pub mod logger;
pub mod markdown;

pub use error::{LoggingError, Result};
pub use event::{LogEnvelope, LogEvent};
pub use logger::ConversationLogger;
pub use markdown::{MarkdownExportOptions, ThinkingStyle, export_log_to_markdown};
