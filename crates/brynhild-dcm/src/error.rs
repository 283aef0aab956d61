//! Error types for the Deep Chain Map.

/// Errors surfaced by [`crate::DeepChainMap`] and its YAML loader.
#[derive(Debug, thiserror::Error)]
pub enum DcmError {
    /// A path component was expected to be a string key but wasn't (e.g. a
    /// list index used where a mapping key was required).
    #[error("path component at position {index} is not a string key")]
    NonStringPathComponent {
        /// Index of the offending component within the path tuple.
        index: usize,
    },

    /// The requested top-level key does not exist in any layer and was not
    /// masked by a front-layer DELETE (it is simply absent).
    #[error("key not found: {0}")]
    NotFound(String),

    /// The front layer carries a DELETE tombstone at the requested key.
    #[error("key deleted in front layer: {0}")]
    Deleted(String),

    /// A path attempted to descend through a scalar as if it were a mapping.
    #[error("cannot descend into non-mapping value at path {0:?}")]
    NotAMapping(Vec<String>),

    /// A list operation was queued against a path whose merged value is not
    /// a sequence.
    #[error("cannot apply list operation at path {0:?}: value is not a list")]
    NotAList(Vec<String>),

    /// The YAML document's top-level value was not a mapping.
    #[error("config file is not a YAML mapping at top level: {0}")]
    NotATopLevelMapping(String),

    /// YAML parsing failed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading the underlying file failed.
    #[error("io error reading {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, DcmError>;
