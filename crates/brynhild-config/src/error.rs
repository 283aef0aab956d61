//! Error types for settings resolution.

/// Errors surfaced while locating or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `find_project_root` resolved to a directory wide enough (home, `/`,
    /// `/etc`, ...) that treating it as a project root would be unsafe,
    /// and the caller did not pass `allow_home_directory`.
    #[error("refusing to use {path} as a project root (too wide); pass allow_home_directory to override")]
    ProjectRootTooWide {
        /// The resolved, rejected path.
        path: String,
    },

    /// Underlying Deep Chain Map error.
    #[error(transparent)]
    Dcm(#[from] brynhild_dcm::DcmError),

    /// Reading a config file or `.env` file failed.
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An environment variable named by the `BRYNHILD_` prefix held a value
    /// that could not be parsed into the expected type.
    #[error("environment variable {key} has an invalid value: {value}")]
    InvalidEnvValue { key: String, value: String },

    /// `get_api_key` was asked for a provider with no configured key.
    #[error("no API key configured for provider {provider}")]
    MissingApiKey { provider: String },

    /// One or more legacy flat env vars are set. Fatal at startup unless
    /// the skip-migration-check flag is set.
    #[error(
        "legacy environment variable(s) in use, migrate to the nested form: {}",
        .0.iter().map(|m| format!("{} -> {}", m.old, m.new)).collect::<Vec<_>>().join(", ")
    )]
    LegacyEnvVar(Vec<crate::legacy::LegacyMapping>),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
