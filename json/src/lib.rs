//! Concrete document providers and reference resolvers for the
//! `schema-eval-core` engine.
//!
//! The engine works on the abstract [`InstanceNode`] tree and never
//! parses text itself. This crate supplies the adapters:
//!
//! - [`parse_json`] / [`parse_yaml`] — text to abstract tree, preserving
//!   member insertion order and full numeric precision.
//! - [`wrap_json`] / [`wrap_yaml`] — adapt an already-parsed
//!   `serde_json::Value` / `serde_yaml::Value`, failing with
//!   [`ProviderError::InvalidArgument`] for native shapes the abstract
//!   model cannot represent (YAML tagged values, non-string mapping
//!   keys, non-finite numbers).
//! - [`MapResolver`] / [`DirResolver`] — external reference resolvers
//!   backed by an in-memory table or a directory of schema files.
//!
//! # Example
//!
//! ```
//! use schema_eval_core::Validator;
//! use schema_eval_json::parse_json;
//!
//! let schema = parse_json(r#"{"type": "array", "minItems": 1}"#).unwrap();
//! let mut validator = Validator::new();
//! let uri = validator
//!     .register_schema("https://example.com/list", &schema)
//!     .unwrap();
//!
//! let instance = parse_json("[1, 2]").unwrap();
//! assert!(validator.validate(&uri, &instance).unwrap().valid);
//!
//! let empty = parse_json("[]").unwrap();
//! assert!(!validator.validate(&uri, &empty).unwrap().valid);
//! ```

mod error;
mod provider;
mod resolver;

pub use error::{ProviderError, Result};
pub use provider::{parse_json, parse_yaml, wrap_json, wrap_yaml};
pub use resolver::{DirResolver, MapResolver};

#[doc(no_inline)]
pub use schema_eval_core::InstanceNode;
