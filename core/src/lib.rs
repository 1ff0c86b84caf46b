//! JSON Schema compilation and evaluation engine.
//!
//! This crate implements schema validation for drafts 4, 6, 7, 2019-09
//! and 2020-12: dialect and vocabulary selection, a URI-indexed schema
//! registry with reference resolution (including `$dynamicRef`/
//! `$recursiveRef` and identifier rebasing), per-keyword evaluators, and
//! an evaluation engine that produces a structured trace of every keyword
//! outcome — errors and annotations with full location provenance.
//!
//! The engine works on an abstract value tree ([`InstanceNode`]) and
//! never parses text itself; the companion `schema-eval-json` crate wraps
//! `serde_json`/`serde_yaml` documents and provides file-backed reference
//! resolvers.
//!
//! # Example
//!
//! ```
//! use schema_eval_core::{InstanceNode, Validator};
//!
//! // {"properties": {"port": {"type": "integer"}}, "required": ["port"]}
//! let schema = InstanceNode::object(vec![
//!     (
//!         "properties".into(),
//!         InstanceNode::object(vec![(
//!             "port".into(),
//!             InstanceNode::object(vec![(
//!                 "type".into(),
//!                 InstanceNode::string("integer"),
//!             )]),
//!         )]),
//!     ),
//!     (
//!         "required".into(),
//!         InstanceNode::array(vec![InstanceNode::string("port")]),
//!     ),
//! ])
//! .rooted();
//!
//! let mut validator = Validator::new();
//! let uri = validator
//!     .register_schema("https://example.com/server", &schema)
//!     .unwrap();
//!
//! let instance = InstanceNode::object(vec![("port".into(), InstanceNode::integer(8080))])
//!     .rooted();
//! assert!(validator.validate(&uri, &instance).unwrap().valid);
//!
//! let missing = InstanceNode::object(vec![]).rooted();
//! let result = validator.validate(&uri, &missing).unwrap();
//! assert!(!result.valid);
//! assert_eq!(result.errors[0].keyword, "required");
//! ```

mod compile;
mod dialect;
mod engine;
mod error;
mod keywords;
mod messages;
mod output;
mod registry;
pub mod uri;
mod validator;
mod value;

pub use dialect::{Draft, Vocabulary, VocabularySet};
pub use error::{Result, SchemaError};
pub use messages::MessageProvider;
pub use output::{Annotation, Error, ValidationResult};
pub use registry::SchemaResolver;
pub use validator::{DEFAULT_MAX_DEPTH, MalformedKeywordPolicy, Validator, ValidatorBuilder};
pub use value::{InstanceNode, NodeType, NumberValue, escape_token, unescape_token};
