//! Per-keyword evaluators: construction and dispatch.
//!
//! Keyword dispatch is a registry of tagged variants built once per schema
//! object at compile time: every applicable keyword becomes a
//! [`BoundKeyword`] holding an [`EvaluatorKind`] with its data already
//! parsed (regexes compiled, limits extracted, subschema arena indices
//! resolved). Evaluation is then a match over the variant, delegating to
//! the behavioral family modules:
//!
//! - [`assertions`] — pure functions of keyword value and instance value.
//! - [`applicators`] — recurse into referenced schema nodes.
//! - [`references`] — `$ref` / `$recursiveRef` / `$dynamicRef`.
//! - [`unevaluated`] — sibling-dependent applicators that must run last.
//! - [`annotations`] — always succeed, only produce a value.
//!
//! Construction is fallible and `Result`-returning; the caller applies the
//! session's malformed-keyword policy to any error.

pub(crate) mod annotations;
pub(crate) mod applicators;
pub(crate) mod assertions;
pub(crate) mod references;
pub(crate) mod unevaluated;

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use regex::Regex;
use url::Url;

use crate::dialect::Draft;
use crate::engine::{EvalContext, SiblingState};
use crate::error::{Result, SchemaError};
use crate::registry::{NodeId, SchemaNode};
use crate::value::{InstanceNode, NodeType};

/// Evaluation ordering within one schema object.
///
/// Tier `Post` evaluators consult state accumulated by their siblings
/// (evaluated-location marks, the `contains` count) and therefore run
/// after every `Main` keyword, even failed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tier {
    Main,
    Post,
}

/// A keyword bound to its compiled evaluator.
#[derive(Debug)]
pub(crate) struct BoundKeyword {
    pub name: String,
    pub kind: EvaluatorKind,
}

/// Compiled per-keyword evaluation data.
#[derive(Debug)]
pub(crate) enum EvaluatorKind {
    /// The `false` boolean schema.
    AlwaysFail,

    // Assertions.
    Type(Vec<NodeType>),
    Const(InstanceNode),
    Enum(Vec<InstanceNode>),
    MultipleOf(BigDecimal),
    Minimum { limit: BigDecimal, exclusive: bool },
    Maximum { limit: BigDecimal, exclusive: bool },
    MinLength(u64),
    MaxLength(u64),
    Pattern { source: String, regex: Regex },
    MinItems(u64),
    MaxItems(u64),
    UniqueItems,
    MinProperties(u64),
    MaxProperties(u64),
    Required(Vec<String>),
    DependentRequired(Vec<(String, Vec<String>)>),

    // Applicators.
    AllOf(Vec<NodeId>),
    AnyOf(Vec<NodeId>),
    OneOf(Vec<NodeId>),
    Not(NodeId),
    IfThenElse {
        condition: NodeId,
        then: Option<NodeId>,
        otherwise: Option<NodeId>,
    },
    Properties(Vec<(String, NodeId)>),
    PatternProperties(Vec<(String, Regex, NodeId)>),
    AdditionalProperties {
        schema: NodeId,
        /// Sibling `properties` names, resolved at compile time.
        named: Vec<String>,
        /// Sibling `patternProperties` regexes, resolved at compile time.
        patterns: Vec<Regex>,
    },
    PropertyNames(NodeId),
    DependentSchemas(Vec<(String, NodeId)>),
    Dependencies(Vec<(String, Dependency)>),
    /// `prefixItems`, or array-form `items` before 2020-12.
    TupleItems(Vec<NodeId>),
    /// Schema-form `items` / `additionalItems`; applies from `start`.
    UniformItems { schema: NodeId, start: usize },
    Contains {
        schema: NodeId,
        /// True when a sibling `minContains` owns the count check.
        count_deferred: bool,
    },
    MinContains(u64),
    MaxContains(u64),

    // Sibling-dependent applicators.
    UnevaluatedProperties(NodeId),
    UnevaluatedItems(NodeId),

    // References.
    Ref(RefTarget),
    RecursiveRef(RefTarget),
    DynamicRef {
        anchor: Option<String>,
        fallback: RefTarget,
    },

    // Annotations.
    Annotation(serde_json::Value),
}

/// Drafts 4-7 `dependencies` entry.
#[derive(Debug)]
pub(crate) enum Dependency {
    Schema(NodeId),
    Required(Vec<String>),
}

/// A reference destination, patched from `Pending` to `Resolved` during
/// the registry's closure pass. A still-`Pending` target at evaluation
/// time reports an unresolvable-reference error.
#[derive(Debug, Clone)]
pub(crate) enum RefTarget {
    Resolved(NodeId),
    Pending(String),
}

impl BoundKeyword {
    pub(crate) fn tier(&self) -> Tier {
        match self.kind {
            EvaluatorKind::UnevaluatedProperties(_)
            | EvaluatorKind::UnevaluatedItems(_)
            | EvaluatorKind::MinContains(_)
            | EvaluatorKind::MaxContains(_) => Tier::Post,
            _ => Tier::Main,
        }
    }

    /// Runs this keyword against `instance`, recording errors and
    /// annotations on the context. Returns the boolean outcome.
    ///
    /// The keyword name is pushed onto the evaluation path around the
    /// dispatch; `if`/`then`/`else` manages its own segments, and the
    /// `false` boolean schema has no keyword to push.
    pub(crate) fn evaluate(
        &self,
        cx: &mut EvalContext<'_>,
        node: &SchemaNode,
        instance: &InstanceNode,
        siblings: &mut SiblingState,
    ) -> bool {
        match &self.kind {
            EvaluatorKind::AlwaysFail => {
                cx.fail(node, &self.name, instance, "false", &[]);
                false
            }
            EvaluatorKind::IfThenElse {
                condition,
                then,
                otherwise,
            } => applicators::eval_if_then_else(cx, instance, *condition, *then, *otherwise),
            _ => cx.with_segment(&self.name, |cx| self.dispatch(cx, node, instance, siblings)),
        }
    }

    fn dispatch(
        &self,
        cx: &mut EvalContext<'_>,
        node: &SchemaNode,
        instance: &InstanceNode,
        siblings: &mut SiblingState,
    ) -> bool {
        use EvaluatorKind::*;
        match &self.kind {
            AlwaysFail | IfThenElse { .. } => {
                unreachable!("handled before the evaluation-path segment is pushed")
            }
            Type(types) => assertions::eval_type(cx, node, &self.name, instance, types),
            Const(expected) => assertions::eval_const(cx, node, &self.name, instance, expected),
            Enum(choices) => assertions::eval_enum(cx, node, &self.name, instance, choices),
            MultipleOf(divisor) => {
                assertions::eval_multiple_of(cx, node, &self.name, instance, divisor)
            }
            Minimum { limit, exclusive } => {
                assertions::eval_minimum(cx, node, &self.name, instance, limit, *exclusive)
            }
            Maximum { limit, exclusive } => {
                assertions::eval_maximum(cx, node, &self.name, instance, limit, *exclusive)
            }
            MinLength(limit) => assertions::eval_min_length(cx, node, &self.name, instance, *limit),
            MaxLength(limit) => assertions::eval_max_length(cx, node, &self.name, instance, *limit),
            Pattern { source, regex } => {
                assertions::eval_pattern(cx, node, &self.name, instance, source, regex)
            }
            MinItems(limit) => assertions::eval_min_items(cx, node, &self.name, instance, *limit),
            MaxItems(limit) => assertions::eval_max_items(cx, node, &self.name, instance, *limit),
            UniqueItems => assertions::eval_unique_items(cx, node, &self.name, instance),
            MinProperties(limit) => {
                assertions::eval_min_properties(cx, node, &self.name, instance, *limit)
            }
            MaxProperties(limit) => {
                assertions::eval_max_properties(cx, node, &self.name, instance, *limit)
            }
            Required(names) => assertions::eval_required(cx, node, &self.name, instance, names),
            DependentRequired(entries) => {
                assertions::eval_dependent_required(cx, node, &self.name, instance, entries)
            }

            AllOf(branches) => applicators::eval_all_of(cx, node, &self.name, instance, branches),
            AnyOf(branches) => applicators::eval_any_of(cx, node, &self.name, instance, branches),
            OneOf(branches) => applicators::eval_one_of(cx, node, &self.name, instance, branches),
            Not(schema) => applicators::eval_not(cx, node, &self.name, instance, *schema),
            Properties(members) => {
                applicators::eval_properties(cx, node, &self.name, instance, members)
            }
            PatternProperties(members) => {
                applicators::eval_pattern_properties(cx, node, &self.name, instance, members)
            }
            AdditionalProperties {
                schema,
                named,
                patterns,
            } => applicators::eval_additional_properties(
                cx, node, &self.name, instance, *schema, named, patterns,
            ),
            PropertyNames(schema) => {
                applicators::eval_property_names(cx, node, &self.name, instance, *schema)
            }
            DependentSchemas(entries) => {
                applicators::eval_dependent_schemas(cx, node, &self.name, instance, entries)
            }
            Dependencies(entries) => {
                applicators::eval_dependencies(cx, node, &self.name, instance, entries)
            }
            TupleItems(schemas) => {
                applicators::eval_tuple_items(cx, node, &self.name, instance, schemas)
            }
            UniformItems { schema, start } => {
                applicators::eval_uniform_items(cx, node, &self.name, instance, *schema, *start)
            }
            Contains {
                schema,
                count_deferred,
            } => applicators::eval_contains(
                cx,
                node,
                &self.name,
                instance,
                *schema,
                *count_deferred,
                siblings,
            ),
            MinContains(limit) => {
                unevaluated::eval_min_contains(cx, node, &self.name, instance, *limit, siblings)
            }
            MaxContains(limit) => {
                unevaluated::eval_max_contains(cx, node, &self.name, instance, *limit, siblings)
            }

            UnevaluatedProperties(schema) => {
                unevaluated::eval_unevaluated_properties(cx, node, &self.name, instance, *schema)
            }
            UnevaluatedItems(schema) => {
                unevaluated::eval_unevaluated_items(cx, node, &self.name, instance, *schema)
            }

            Ref(target) => references::eval_ref(cx, node, &self.name, instance, target),
            RecursiveRef(fallback) => {
                references::eval_recursive_ref(cx, node, &self.name, instance, fallback)
            }
            DynamicRef { anchor, fallback } => {
                references::eval_dynamic_ref(cx, node, &self.name, instance, anchor, fallback)
            }

            Annotation(value) => {
                cx.annotate(node, &self.name, instance, value.clone());
                true
            }
        }
    }
}

/// Subschema arena indices compiled from one keyword's value.
#[derive(Debug, Clone)]
pub(crate) enum ChildSet {
    One(NodeId),
    List(Vec<NodeId>),
    Map(Vec<(String, NodeId)>),
    Dependencies(Vec<(String, Option<NodeId>)>),
}

/// Everything the factory may consult while constructing one evaluator:
/// the schema object itself (compile-time sibling lookup), the compiled
/// subschemas of every keyword in it, and the lexical base URI.
pub(crate) struct FactoryInput<'a> {
    pub draft: Draft,
    pub base: &'a Url,
    pub location: &'a str,
    pub object: &'a InstanceNode,
    pub children: &'a BTreeMap<String, ChildSet>,
}

impl FactoryInput<'_> {
    pub(crate) fn malformed(&self, keyword: &str, reason: impl Into<String>) -> SchemaError {
        SchemaError::MalformedKeyword {
            keyword: keyword.to_string(),
            location: self.location.to_string(),
            reason: reason.into(),
        }
    }
}

/// Builds the evaluator for one keyword, or `None` for keywords that do
/// not evaluate (e.g. `uniqueItems: false`, `additionalItems` without a
/// tuple-form sibling `items`).
pub(crate) fn build_evaluator(
    input: &FactoryInput<'_>,
    name: &str,
    value: &InstanceNode,
) -> Result<Option<EvaluatorKind>> {
    match name {
        "type" | "const" | "enum" | "multipleOf" | "minimum" | "maximum" | "exclusiveMinimum"
        | "exclusiveMaximum" | "minLength" | "maxLength" | "pattern" | "minItems" | "maxItems"
        | "uniqueItems" | "minProperties" | "maxProperties" | "required" | "dependentRequired"
        | "minContains" | "maxContains" => assertions::build(input, name, value),

        "allOf" | "anyOf" | "oneOf" | "not" | "if" | "properties" | "patternProperties"
        | "additionalProperties" | "propertyNames" | "dependentSchemas" | "dependencies"
        | "items" | "additionalItems" | "prefixItems" | "contains" => {
            applicators::build(input, name, value)
        }

        "unevaluatedProperties" | "unevaluatedItems" => unevaluated::build(input, name, value),

        "$ref" | "$recursiveRef" | "$dynamicRef" => references::build(input, name, value),

        _ => annotations::build(input, name, value),
    }
}
