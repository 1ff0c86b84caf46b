//! The evaluation engine: walks a compiled schema against an instance.
//!
//! Evaluation of one schema object runs in two ordered tiers: everything
//! except the sibling-dependent applicators first, then
//! `unevaluatedProperties`, `unevaluatedItems` and the `contains` count
//! checks. Within a tier every applicable keyword runs even after one has
//! failed; short-circuiting validity must never suppress annotation
//! production, because sibling-dependent keywords here or in an ancestor
//! may consume annotations from keywords that already failed the boolean.
//!
//! The context owns the per-call transient state: the dynamic-scope stack
//! of resource URIs (pushed by lexical containment, never by the `$ref`
//! hop itself), the evaluation-path segments, collected errors and
//! annotations, and the evaluated-location marks that back the
//! `unevaluated*` keywords. A configurable depth ceiling fails closed on
//! reference cycles without a terminating keyword.

use std::collections::BTreeMap;

use crate::keywords::{RefTarget, Tier};
use crate::messages::{MessageProvider, default_message};
use crate::output::{Annotation, Error, ValidationResult};
use crate::registry::{NodeId, Registry, SchemaNode};
use crate::value::InstanceNode;

/// Per-schema-object sibling-annotation state: a fixed field for the hot
/// `contains` count plus a fallback table keyed by keyword name.
#[derive(Debug, Default)]
pub(crate) struct SiblingState {
    pub contains_count: Option<usize>,
    pub table: BTreeMap<String, serde_json::Value>,
}

impl SiblingState {
    fn record(&mut self, keyword: &str, value: serde_json::Value) {
        self.table.insert(keyword.to_string(), value);
    }

    /// Number of array elements the sibling `contains` matched: the hot
    /// field when set, otherwise recovered from the annotation table.
    pub(crate) fn contains_matches(&self) -> Option<usize> {
        self.contains_count.or_else(|| {
            self.table
                .get("contains")
                .and_then(serde_json::Value::as_array)
                .map(Vec::len)
        })
    }
}

/// Transient state of one `validate` call.
pub(crate) struct EvalContext<'a> {
    registry: &'a Registry,
    messages: Option<&'a dyn MessageProvider>,
    max_depth: usize,
    depth: usize,
    /// Resource URIs entered via lexical containment, outermost first.
    scopes: Vec<String>,
    /// Evaluation-path segments through the schema as traversed.
    segments: Vec<String>,
    errors: Vec<Error>,
    annotations: Vec<Annotation>,
    /// Instance locations covered by a successful subschema application.
    marks: Vec<String>,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        messages: Option<&'a dyn MessageProvider>,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            messages,
            max_depth,
            depth: 0,
            scopes: Vec::new(),
            segments: Vec::new(),
            errors: Vec::new(),
            annotations: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Evaluates the root schema and aggregates the result.
    pub(crate) fn run(mut self, root: NodeId, instance: &InstanceNode) -> ValidationResult {
        let valid = self.evaluate(root, instance);
        ValidationResult {
            valid,
            errors: self.errors,
            annotations: self.annotations,
        }
    }

    /// Evaluates one schema node against one instance value.
    pub(crate) fn evaluate(&mut self, id: NodeId, instance: &InstanceNode) -> bool {
        let registry = self.registry;
        let node = registry.node(id);
        if self.depth >= self.max_depth {
            self.fail(node, "", instance, "max-depth", &[]);
            return false;
        }
        self.depth += 1;
        if node.is_resource_root {
            self.scopes.push(node.resource_uri.clone());
        }

        let mut siblings = SiblingState::default();
        let mut valid = true;
        for tier in [Tier::Main, Tier::Post] {
            for keyword in &node.keywords {
                if keyword.tier() != tier {
                    continue;
                }
                let before = self.annotations.len();
                valid &= keyword.evaluate(self, node, instance, &mut siblings);
                if self.annotations.len() > before {
                    let last = &self.annotations[self.annotations.len() - 1];
                    if last.keyword == keyword.name && last.instance_location == instance.pointer()
                    {
                        let value = last.value.clone();
                        siblings.record(&keyword.name, value);
                    }
                }
            }
        }

        if node.is_resource_root {
            self.scopes.pop();
        }
        self.depth -= 1;
        valid
    }

    /// Applies a subschema to an instance value, rolling back its
    /// annotations and marks when it fails. Errors are kept.
    pub(crate) fn apply(&mut self, id: NodeId, instance: &InstanceNode) -> bool {
        let annotations = self.annotations.len();
        let marks = self.marks.len();
        let ok = self.evaluate(id, instance);
        if !ok {
            self.annotations.truncate(annotations);
            self.marks.truncate(marks);
        }
        ok
    }

    /// Like [`apply`](Self::apply), but failure is an expected outcome
    /// (`not`, the `if` condition, `contains` probing): errors are rolled
    /// back too.
    pub(crate) fn apply_speculative(&mut self, id: NodeId, instance: &InstanceNode) -> bool {
        let errors = self.errors.len();
        let annotations = self.annotations.len();
        let marks = self.marks.len();
        let ok = self.evaluate(id, instance);
        if !ok {
            self.errors.truncate(errors);
            self.annotations.truncate(annotations);
            self.marks.truncate(marks);
        }
        ok
    }

    /// Like [`apply`](Self::apply), but on failure the branch's errors
    /// are drained and handed back, so `anyOf`/`oneOf` can restore them
    /// only when no branch matched.
    pub(crate) fn apply_captured(
        &mut self,
        id: NodeId,
        instance: &InstanceNode,
    ) -> (bool, Vec<Error>) {
        let errors = self.errors.len();
        let annotations = self.annotations.len();
        let marks = self.marks.len();
        let ok = self.evaluate(id, instance);
        if ok {
            (true, Vec::new())
        } else {
            self.annotations.truncate(annotations);
            self.marks.truncate(marks);
            (false, self.errors.split_off(errors))
        }
    }

    pub(crate) fn restore_errors(&mut self, errors: Vec<Error>) {
        self.errors.extend(errors);
    }

    /// Runs `f` with an evaluation-path segment pushed.
    pub(crate) fn with_segment<R>(
        &mut self,
        segment: &str,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.segments.push(segment.to_string());
        let result = f(self);
        self.segments.pop();
        result
    }

    fn evaluation_path(&self) -> String {
        if self.segments.is_empty() {
            String::new()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }

    /// Records a keyword failure.
    pub(crate) fn fail(
        &mut self,
        node: &SchemaNode,
        keyword: &str,
        instance: &InstanceNode,
        key: &'static str,
        args: &[String],
    ) {
        let message = self
            .messages
            .and_then(|provider| provider.format(key, args))
            .unwrap_or_else(|| default_message(key, args));
        self.errors.push(Error {
            evaluation_path: self.evaluation_path(),
            schema_location: node.keyword_location(keyword),
            instance_location: instance.pointer().to_string(),
            keyword: keyword.to_string(),
            message,
        });
    }

    /// Records a successful annotation.
    pub(crate) fn annotate(
        &mut self,
        node: &SchemaNode,
        keyword: &str,
        instance: &InstanceNode,
        value: serde_json::Value,
    ) {
        self.annotations.push(Annotation {
            evaluation_path: self.evaluation_path(),
            schema_location: node.keyword_location(keyword),
            instance_location: instance.pointer().to_string(),
            keyword: keyword.to_string(),
            value,
        });
    }

    /// Marks an instance location as evaluated by a successful subschema
    /// application.
    pub(crate) fn mark_evaluated(&mut self, location: &str) {
        self.marks.push(location.to_string());
    }

    /// True when a prior successful application covered `location` or a
    /// descendant of it.
    pub(crate) fn is_evaluated(&self, location: &str) -> bool {
        self.marks.iter().any(|mark| {
            mark == location
                || (mark.len() > location.len()
                    && mark.starts_with(location)
                    && mark.as_bytes()[location.len()] == b'/')
        })
    }

    pub(crate) fn registry(&self) -> &Registry {
        self.registry
    }

    pub(crate) fn dynamic_scope(&self) -> &[String] {
        &self.scopes
    }

    /// Resolves a reference target, returning the unresolvable URI on
    /// failure.
    pub(crate) fn resolve_target(&self, target: &RefTarget) -> Result<NodeId, String> {
        match target {
            RefTarget::Resolved(id) => Ok(*id),
            RefTarget::Pending(uri) => self.registry.lookup(uri).ok_or_else(|| uri.clone()),
        }
    }
}
