//! Error types for provider dispatch.

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no provider registered for type {0}")]
    UnknownProvider(String),

    #[error("http request to {provider} failed: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    ApiError {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("failed to parse {provider} response: {reason}")]
    ParseFailed { provider: String, reason: String },

    #[error("{provider} does not support reasoning level {level}")]
    UnsupportedReasoningLevel { provider: String, level: String },

    #[error("invalid base_url for provider {provider}: {source}")]
    InvalidBaseUrl {
        provider: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no provider type {requested:?} registered; available types: {}", .available.join(", "))]
    UnknownProviderType {
        requested: String,
        available: Vec<String>,
    },

    #[error("provider type {provider_type} is not implemented yet")]
    NotImplemented { provider_type: String },

    #[error("no API key configured for provider {provider}")]
    MissingApiKey { provider: String },
}

pub type Result<T> = std::result::Result<T, ProviderError>;
