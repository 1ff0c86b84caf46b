//! Error types for document providers.

use thiserror::Error;

/// Errors raised while parsing or wrapping documents.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// JSON text could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML text could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A native value has no representation in the abstract model
    /// (tagged YAML values, non-string mapping keys, non-finite numbers).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias for results with [`ProviderError`].
pub type Result<T> = std::result::Result<T, ProviderError>;
