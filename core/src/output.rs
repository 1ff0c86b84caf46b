//! Typed validation outcomes with full location provenance.
//!
//! Every keyword evaluation leaves a record: a failure becomes an
//! [`Error`], a success that carries information becomes an
//! [`Annotation`]. Both serialize in the camelCase shape of the JSON
//! Schema output format, so a [`ValidationResult`] can be handed straight
//! to `serde_json`.
//!
//! Location provenance is three-fold:
//!
//! - `evaluation_path` — the pointer through the schema *as traversed*,
//!   including `$ref` hops (`/properties/foo/$ref/type`).
//! - `schema_location` — the canonical `URI#fragment` of the keyword that
//!   was actually applied, after reference resolution.
//! - `instance_location` — the pointer into the instance document.

use serde::Serialize;

/// A failed keyword evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    pub evaluation_path: String,
    pub schema_location: String,
    pub instance_location: String,
    pub keyword: String,
    pub message: String,
}

/// A successful keyword evaluation that produced an informational value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub evaluation_path: String,
    pub schema_location: String,
    pub instance_location: String,
    pub keyword: String,
    pub value: serde_json::Value,
}

/// The outcome of one `validate` call.
///
/// `errors` is empty iff `valid` is true; annotations are retained from
/// every successfully evaluated subschema, including those reached through
/// failed sibling branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Error>,
    pub annotations: Vec<Annotation>,
}

impl ValidationResult {
    /// Shorthand for checking overall validity.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
