//! Error types for the logging subsystem.

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write log event: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to serialize log event: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoggingError>;
