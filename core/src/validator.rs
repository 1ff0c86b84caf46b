//! Public validation surface: a session owning the registry and the
//! evaluation configuration.
//!
//! A [`Validator`] is populated through
//! [`register_schema`](Validator::register_schema) and then queried with
//! [`validate`](Validator::validate). Registration is the only mutating
//! phase; afterwards the compiled registry is read-only and one validator
//! can serve concurrent validations, each call owning its own transient
//! frame.

use crate::compile::{CompileOptions, Compiler};
use crate::dialect::Draft;
use crate::engine::EvalContext;
use crate::error::{Result, SchemaError};
use crate::messages::MessageProvider;
use crate::output::ValidationResult;
use crate::registry::{Registry, SchemaResolver};
use crate::uri::{index_key, parse_base};
use crate::value::InstanceNode;

/// Default recursion ceiling for one evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// What to do with a keyword value the dialect cannot interpret (a
/// malformed pattern, a negative `minLength`, ...).
///
/// `Fail` raises
/// [`SchemaError::MalformedKeyword`](crate::SchemaError::MalformedKeyword)
/// at registration; `Ignore` drops the keyword and continues, which
/// matches the permissive behavior of several existing validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedKeywordPolicy {
    #[default]
    Fail,
    Ignore,
}

/// A schema registration and validation session.
///
/// # Examples
///
/// ```
/// use schema_eval_core::{InstanceNode, Validator};
///
/// let schema = InstanceNode::object(vec![
///     ("type".into(), InstanceNode::string("string")),
///     ("minLength".into(), InstanceNode::integer(2)),
/// ])
/// .rooted();
///
/// let mut validator = Validator::new();
/// let uri = validator
///     .register_schema("https://example.com/name", &schema)
///     .unwrap();
///
/// let ok = validator
///     .validate(&uri, &InstanceNode::string("ada").rooted())
///     .unwrap();
/// assert!(ok.valid);
///
/// let too_short = validator
///     .validate(&uri, &InstanceNode::string("a").rooted())
///     .unwrap();
/// assert!(!too_short.valid);
/// assert_eq!(too_short.errors[0].keyword, "minLength");
/// ```
pub struct Validator {
    registry: Registry,
    default_draft: Draft,
    malformed: MalformedKeywordPolicy,
    max_depth: usize,
    resolvers: Vec<Box<dyn SchemaResolver>>,
    messages: Option<Box<dyn MessageProvider>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// A validator with default options: dialect 2020-12 for schemas
    /// without `$schema`, fail-fast on malformed keywords, depth ceiling
    /// of [`DEFAULT_MAX_DEPTH`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    /// Compiles and registers `schema` under `base_uri`, closing over
    /// external references through the configured resolvers. Returns the
    /// canonical root URI.
    ///
    /// Fails with [`SchemaError::DuplicateUri`] when the URI (or any
    /// identifier inside the document) is already registered, and with
    /// [`SchemaError::MalformedKeyword`] under the fail-fast policy.
    pub fn register_schema(&mut self, base_uri: &str, schema: &InstanceNode) -> Result<String> {
        let options = CompileOptions {
            default_draft: self.default_draft,
            malformed: self.malformed,
        };
        Compiler::new(&mut self.registry, &self.resolvers, &options)
            .compile_document(base_uri, schema)
    }

    /// Validates `instance` against the schema registered under
    /// `schema_uri`.
    ///
    /// Never fails for malformed instance data; the only error is
    /// [`SchemaError::SchemaNotFound`] for an unknown URI.
    pub fn validate(&self, schema_uri: &str, instance: &InstanceNode) -> Result<ValidationResult> {
        let root = self
            .registry
            .lookup(schema_uri)
            .or_else(|| {
                let normalized = parse_base(schema_uri).ok()?;
                self.registry.lookup(&index_key(&normalized))
            })
            .ok_or_else(|| SchemaError::SchemaNotFound(schema_uri.to_string()))?;
        let frame = EvalContext::new(&self.registry, self.messages.as_deref(), self.max_depth);
        Ok(frame.run(root, instance))
    }
}

/// Builder for [`Validator`] options.
///
/// # Examples
///
/// ```
/// use schema_eval_core::{Draft, MalformedKeywordPolicy, Validator};
///
/// let validator = Validator::builder()
///     .default_draft(Draft::Draft7)
///     .malformed_keywords(MalformedKeywordPolicy::Ignore)
///     .max_depth(64)
///     .build();
/// # let _ = validator;
/// ```
pub struct ValidatorBuilder {
    default_draft: Draft,
    malformed: MalformedKeywordPolicy,
    max_depth: usize,
    resolvers: Vec<Box<dyn SchemaResolver>>,
    messages: Option<Box<dyn MessageProvider>>,
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self {
            default_draft: Draft::Draft202012,
            malformed: MalformedKeywordPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            resolvers: Vec::new(),
            messages: None,
        }
    }
}

impl ValidatorBuilder {
    /// Dialect assumed for schemas that carry no `$schema`.
    pub fn default_draft(mut self, draft: Draft) -> Self {
        self.default_draft = draft;
        self
    }

    pub fn malformed_keywords(mut self, policy: MalformedKeywordPolicy) -> Self {
        self.malformed = policy;
        self
    }

    /// Recursion ceiling per evaluation; exceeding it fails closed with a
    /// "maximum evaluation depth exceeded" error.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Appends an external reference resolver. Resolvers are consulted in
    /// registration order; the first non-empty result wins.
    pub fn with_resolver(mut self, resolver: impl SchemaResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Installs a message provider for keyed failure formatting.
    pub fn with_messages(mut self, messages: impl MessageProvider + 'static) -> Self {
        self.messages = Some(Box::new(messages));
        self
    }

    pub fn build(self) -> Validator {
        Validator {
            registry: Registry::default(),
            default_draft: self.default_draft,
            malformed: self.malformed,
            max_depth: self.max_depth,
            resolvers: self.resolvers,
            messages: self.messages,
        }
    }
}
