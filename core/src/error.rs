//! Error types for schema registration and validation sessions.
//!
//! Ordinary keyword mismatches are never errors at this level: they are
//! recovered into [`Error`](crate::output::Error) records inside a
//! [`ValidationResult`](crate::output::ValidationResult). `SchemaError`
//! covers parse-time problems (malformed schemas, duplicate URIs) and
//! caller-contract violations (validating against an unknown URI).

use thiserror::Error;

/// Errors raised while registering schemas or starting a validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A URI was already registered to a different schema object.
    #[error("duplicate schema registration for URI: {0}")]
    DuplicateUri(String),

    /// `validate` was called with a URI no schema is registered under.
    #[error("no schema registered under URI: {0}")]
    SchemaNotFound(String),

    /// A base URI or `$id`/`$ref` value could not be parsed or resolved.
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// A schema value was neither an object nor a boolean.
    #[error("schema at {location} must be an object or boolean, found {found}")]
    InvalidSchemaShape { location: String, found: String },

    /// A keyword value the active dialect cannot interpret, under the
    /// fail-fast policy (see
    /// [`MalformedKeywordPolicy`](crate::validator::MalformedKeywordPolicy)).
    #[error("malformed value for keyword '{keyword}' at {location}: {reason}")]
    MalformedKeyword {
        keyword: String,
        location: String,
        reason: String,
    },

    /// A meta-schema marked a vocabulary as required but it is unknown to
    /// the dialect and no schema is registered under its URI.
    #[error("unknown required vocabulary: {0}")]
    UnknownVocabulary(String),

    /// `$schema` names a URI that is neither a known dialect nor a
    /// registered meta-schema.
    #[error("unknown meta-schema URI: {0}")]
    UnknownMetaschema(String),
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
