//! Applicator keywords: recursive invocation of referenced schema nodes
//! with boolean aggregation.
//!
//! Branch evaluation is exhaustive: every branch of `allOf`/`anyOf`/
//! `oneOf` runs even after the aggregate outcome is decided, because
//! sibling-dependent keywords may consume annotations produced by
//! branches that did not decide the boolean. A failed subschema
//! application rolls back the annotations and evaluated-location marks it
//! produced; whether its errors survive depends on the applicator
//! (`anyOf` restores branch errors only when no branch matched).

use regex::Regex;

use crate::dialect::Draft;
use crate::engine::{EvalContext, SiblingState};
use crate::error::Result;
use crate::registry::{NodeId, SchemaNode};
use crate::value::{InstanceNode, escape_token};

use super::{ChildSet, Dependency, EvaluatorKind, FactoryInput};

pub(crate) fn build(
    input: &FactoryInput<'_>,
    name: &str,
    value: &InstanceNode,
) -> Result<Option<EvaluatorKind>> {
    let kind = match name {
        "allOf" => EvaluatorKind::AllOf(require_branches(input, name)?),
        "anyOf" => EvaluatorKind::AnyOf(require_branches(input, name)?),
        "oneOf" => EvaluatorKind::OneOf(require_branches(input, name)?),
        "not" => EvaluatorKind::Not(require_one(input, name)?),
        "if" => EvaluatorKind::IfThenElse {
            condition: require_one(input, name)?,
            then: optional_one(input, "then"),
            otherwise: optional_one(input, "else"),
        },
        "properties" => EvaluatorKind::Properties(require_map(input, name)?),
        "patternProperties" => {
            let mut members = Vec::new();
            for (source, schema) in require_map(input, name)? {
                let regex = Regex::new(&source)
                    .map_err(|e| input.malformed(name, format!("invalid pattern: {e}")))?;
                members.push((source, regex, schema));
            }
            EvaluatorKind::PatternProperties(members)
        }
        "additionalProperties" => EvaluatorKind::AdditionalProperties {
            schema: require_one(input, name)?,
            named: sibling_property_names(input),
            patterns: sibling_patterns(input),
        },
        "propertyNames" => EvaluatorKind::PropertyNames(require_one(input, name)?),
        "dependentSchemas" => EvaluatorKind::DependentSchemas(require_map(input, name)?),
        "dependencies" => {
            let Some(ChildSet::Dependencies(children)) = input.children.get(name) else {
                return Err(input.malformed(name, "value must be an object"));
            };
            let mut entries = Vec::with_capacity(children.len());
            for (property, schema) in children {
                let dependency = match schema {
                    Some(id) => Dependency::Schema(*id),
                    None => {
                        let requirement = value
                            .get(property)
                            .expect("dependency entry exists in keyword value");
                        let names = requirement
                            .as_array()
                            .ok_or_else(|| {
                                input.malformed(
                                    name,
                                    "entries must be schemas or arrays of property names",
                                )
                            })?
                            .iter()
                            .map(|n| {
                                n.as_str().map(str::to_string).ok_or_else(|| {
                                    input.malformed(name, "property dependencies must be strings")
                                })
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Dependency::Required(names)
                    }
                };
                entries.push((property.clone(), dependency));
            }
            EvaluatorKind::Dependencies(entries)
        }
        "items" if input.draft <= Draft::Draft201909 => match input.children.get(name) {
            Some(ChildSet::One(schema)) => EvaluatorKind::UniformItems {
                schema: *schema,
                start: 0,
            },
            Some(ChildSet::List(schemas)) => EvaluatorKind::TupleItems(schemas.clone()),
            _ => return Err(input.malformed(name, "value must be a schema or array of schemas")),
        },
        "items" => EvaluatorKind::UniformItems {
            schema: require_one(input, name)?,
            start: match input.children.get("prefixItems") {
                Some(ChildSet::List(prefix)) => prefix.len(),
                _ => 0,
            },
        },
        "additionalItems" => match input.children.get("items") {
            Some(ChildSet::List(tuple)) => EvaluatorKind::UniformItems {
                schema: require_one(input, name)?,
                start: tuple.len(),
            },
            // Without a tuple-form sibling `items` this keyword is inert.
            _ => return Ok(None),
        },
        "prefixItems" => match input.children.get(name) {
            Some(ChildSet::List(schemas)) => EvaluatorKind::TupleItems(schemas.clone()),
            _ => return Err(input.malformed(name, "value must be an array of schemas")),
        },
        "contains" => EvaluatorKind::Contains {
            schema: require_one(input, name)?,
            count_deferred: input.draft >= Draft::Draft201909
                && input.object.get("minContains").is_some(),
        },
        _ => unreachable!("applicator builder called for '{name}'"),
    };
    Ok(Some(kind))
}

fn require_branches(input: &FactoryInput<'_>, name: &str) -> Result<Vec<NodeId>> {
    match input.children.get(name) {
        Some(ChildSet::List(branches)) if !branches.is_empty() => Ok(branches.clone()),
        Some(ChildSet::List(_)) => Err(input.malformed(name, "array must not be empty")),
        _ => Err(input.malformed(name, "value must be an array of schemas")),
    }
}

fn require_one(input: &FactoryInput<'_>, name: &str) -> Result<NodeId> {
    match input.children.get(name) {
        Some(ChildSet::One(schema)) => Ok(*schema),
        _ => Err(input.malformed(name, "value must be a schema")),
    }
}

fn optional_one(input: &FactoryInput<'_>, name: &str) -> Option<NodeId> {
    match input.children.get(name) {
        Some(ChildSet::One(schema)) => Some(*schema),
        _ => None,
    }
}

fn require_map(input: &FactoryInput<'_>, name: &str) -> Result<Vec<(String, NodeId)>> {
    match input.children.get(name) {
        Some(ChildSet::Map(members)) => Ok(members.clone()),
        _ => Err(input.malformed(name, "value must be an object of schemas")),
    }
}

fn sibling_property_names(input: &FactoryInput<'_>) -> Vec<String> {
    input
        .object
        .get("properties")
        .and_then(InstanceNode::as_object)
        .map(|members| members.iter().map(|(name, _)| name.clone()).collect())
        .unwrap_or_default()
}

fn sibling_patterns(input: &FactoryInput<'_>) -> Vec<Regex> {
    input
        .object
        .get("patternProperties")
        .and_then(InstanceNode::as_object)
        .map(|members| {
            members
                .iter()
                .filter_map(|(source, _)| Regex::new(source).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn eval_all_of(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    branches: &[NodeId],
) -> bool {
    let mut failed = 0usize;
    for (index, branch) in branches.iter().enumerate() {
        let ok = cx.with_segment(&index.to_string(), |cx| cx.apply(*branch, instance));
        if !ok {
            failed += 1;
        }
    }
    if failed > 0 {
        cx.fail(node, keyword, instance, "allOf", &[failed.to_string()]);
    }
    failed == 0
}

pub(crate) fn eval_any_of(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    branches: &[NodeId],
) -> bool {
    let mut matched = false;
    let mut captured = Vec::new();
    for (index, branch) in branches.iter().enumerate() {
        let (ok, errors) =
            cx.with_segment(&index.to_string(), |cx| cx.apply_captured(*branch, instance));
        matched |= ok;
        captured.extend(errors);
    }
    if !matched {
        cx.restore_errors(captured);
        cx.fail(node, keyword, instance, "anyOf", &[]);
    }
    matched
}

pub(crate) fn eval_one_of(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    branches: &[NodeId],
) -> bool {
    let mut matches = 0usize;
    let mut captured = Vec::new();
    for (index, branch) in branches.iter().enumerate() {
        let (ok, errors) =
            cx.with_segment(&index.to_string(), |cx| cx.apply_captured(*branch, instance));
        if ok {
            matches += 1;
        }
        captured.extend(errors);
    }
    match matches {
        1 => true,
        0 => {
            cx.restore_errors(captured);
            cx.fail(node, keyword, instance, "oneOf", &["0".to_string()]);
            false
        }
        n => {
            cx.fail(node, keyword, instance, "oneOf", &[n.to_string()]);
            false
        }
    }
}

pub(crate) fn eval_not(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schema: NodeId,
) -> bool {
    let ok = cx.apply_speculative(schema, instance);
    if ok {
        cx.fail(node, keyword, instance, "not", &[]);
    }
    !ok
}

/// `if`/`then`/`else`, composed into one evaluator at compile time.
/// Pushes its own evaluation-path segments so `then` errors surface under
/// `/then/...` rather than `/if/then/...`.
pub(crate) fn eval_if_then_else(
    cx: &mut EvalContext<'_>,
    instance: &InstanceNode,
    condition: NodeId,
    then: Option<NodeId>,
    otherwise: Option<NodeId>,
) -> bool {
    let matched = cx.with_segment("if", |cx| cx.apply_speculative(condition, instance));
    let branch = if matched { then } else { otherwise };
    let segment = if matched { "then" } else { "else" };
    match branch {
        Some(schema) => cx.with_segment(segment, |cx| cx.apply(schema, instance)),
        None => true,
    }
}

pub(crate) fn eval_properties(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    members: &[(String, NodeId)],
) -> bool {
    if instance.as_object().is_none() {
        return true;
    }
    let mut ok = true;
    let mut matched = Vec::new();
    for (name, schema) in members {
        let Some(member) = instance.get(name) else {
            continue;
        };
        let passed = cx.with_segment(&escape_token(name), |cx| cx.apply(*schema, member));
        if passed {
            cx.mark_evaluated(member.pointer());
            matched.push(serde_json::Value::String(name.clone()));
        } else {
            ok = false;
        }
    }
    if ok {
        cx.annotate(node, keyword, instance, serde_json::Value::Array(matched));
    }
    ok
}

pub(crate) fn eval_pattern_properties(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    members: &[(String, Regex, NodeId)],
) -> bool {
    let Some(object) = instance.as_object() else {
        return true;
    };
    let mut ok = true;
    let mut matched = Vec::new();
    for (name, member) in object {
        for (source, regex, schema) in members {
            if !regex.is_match(name) {
                continue;
            }
            let passed = cx.with_segment(&escape_token(source), |cx| cx.apply(*schema, member));
            if passed {
                cx.mark_evaluated(member.pointer());
                matched.push(serde_json::Value::String(name.clone()));
            } else {
                ok = false;
            }
        }
    }
    if ok {
        cx.annotate(node, keyword, instance, serde_json::Value::Array(matched));
    }
    ok
}

pub(crate) fn eval_additional_properties(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schema: NodeId,
    named: &[String],
    patterns: &[Regex],
) -> bool {
    let Some(object) = instance.as_object() else {
        return true;
    };
    let mut ok = true;
    let mut applied = Vec::new();
    for (name, member) in object {
        if named.iter().any(|n| n == name) || patterns.iter().any(|p| p.is_match(name)) {
            continue;
        }
        if cx.apply(schema, member) {
            cx.mark_evaluated(member.pointer());
            applied.push(serde_json::Value::String(name.clone()));
        } else {
            cx.fail(node, keyword, member, "additionalProperties", &[name.clone()]);
            ok = false;
        }
    }
    if ok {
        cx.annotate(node, keyword, instance, serde_json::Value::Array(applied));
    }
    ok
}

pub(crate) fn eval_property_names(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schema: NodeId,
) -> bool {
    let Some(object) = instance.as_object() else {
        return true;
    };
    let mut ok = true;
    for (name, member) in object {
        let key_node = InstanceNode::string(name.clone()).at_pointer(member.pointer());
        if !cx.apply(schema, &key_node) {
            cx.fail(node, keyword, member, "propertyNames", &[name.clone()]);
            ok = false;
        }
    }
    ok
}

pub(crate) fn eval_dependent_schemas(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    entries: &[(String, NodeId)],
) -> bool {
    if instance.as_object().is_none() {
        return true;
    }
    let mut ok = true;
    for (property, schema) in entries {
        if instance.get(property).is_none() {
            continue;
        }
        let passed = cx.with_segment(&escape_token(property), |cx| cx.apply(*schema, instance));
        if !passed {
            cx.fail(node, keyword, instance, "dependentSchemas", &[property.clone()]);
            ok = false;
        }
    }
    ok
}

pub(crate) fn eval_dependencies(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    entries: &[(String, Dependency)],
) -> bool {
    if instance.as_object().is_none() {
        return true;
    }
    let mut ok = true;
    for (property, dependency) in entries {
        if instance.get(property).is_none() {
            continue;
        }
        match dependency {
            Dependency::Schema(schema) => {
                let passed =
                    cx.with_segment(&escape_token(property), |cx| cx.apply(*schema, instance));
                if !passed {
                    cx.fail(node, keyword, instance, "dependencies", &[property.clone()]);
                    ok = false;
                }
            }
            Dependency::Required(names) => {
                for name in names {
                    if instance.get(name).is_none() {
                        cx.fail(node, keyword, instance, "required", &[name.clone()]);
                        ok = false;
                    }
                }
            }
        }
    }
    ok
}

pub(crate) fn eval_tuple_items(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schemas: &[NodeId],
) -> bool {
    let Some(items) = instance.as_array() else {
        return true;
    };
    let mut ok = true;
    let applied = schemas.len().min(items.len());
    for (index, (schema, item)) in schemas.iter().zip(items.iter()).enumerate() {
        let passed = cx.with_segment(&index.to_string(), |cx| cx.apply(*schema, item));
        if passed {
            cx.mark_evaluated(item.pointer());
        } else {
            ok = false;
        }
    }
    if ok && applied > 0 {
        let value = if applied == items.len() {
            serde_json::Value::Bool(true)
        } else {
            serde_json::Value::from(applied - 1)
        };
        cx.annotate(node, keyword, instance, value);
    }
    ok
}

pub(crate) fn eval_uniform_items(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schema: NodeId,
    start: usize,
) -> bool {
    let Some(items) = instance.as_array() else {
        return true;
    };
    let mut ok = true;
    let mut applied = false;
    for item in items.iter().skip(start) {
        applied = true;
        if cx.apply(schema, item) {
            cx.mark_evaluated(item.pointer());
        } else {
            ok = false;
        }
    }
    if ok && applied {
        cx.annotate(node, keyword, instance, serde_json::Value::Bool(true));
    }
    ok
}

pub(crate) fn eval_contains(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schema: NodeId,
    count_deferred: bool,
    siblings: &mut SiblingState,
) -> bool {
    let Some(items) = instance.as_array() else {
        return true;
    };
    let mut matched = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if cx.apply_speculative(schema, item) {
            cx.mark_evaluated(item.pointer());
            matched.push(index);
        }
    }
    siblings.contains_count = Some(matched.len());
    cx.annotate(
        node,
        keyword,
        instance,
        serde_json::Value::Array(matched.iter().map(|i| serde_json::Value::from(*i)).collect()),
    );
    if matched.is_empty() && !count_deferred {
        cx.fail(node, keyword, instance, "contains", &[]);
        return false;
    }
    true
}
