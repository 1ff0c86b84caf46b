//! Sibling-dependent applicators: `unevaluatedProperties`,
//! `unevaluatedItems`, and the `contains` count checks.
//!
//! These run in the post tier, after every other keyword of the same
//! schema object. An instance member or element counts as evaluated when
//! a prior successful subschema application left a mark at or under its
//! location; the marks survive `$ref` hops and in-place applicators, and
//! are rolled back with the failed branches that produced them.

use crate::engine::{EvalContext, SiblingState};
use crate::error::Result;
use crate::registry::SchemaNode;
use crate::value::InstanceNode;

use super::{EvaluatorKind, FactoryInput};

pub(crate) fn build(
    input: &FactoryInput<'_>,
    name: &str,
    _value: &InstanceNode,
) -> Result<Option<EvaluatorKind>> {
    let schema = match input.children.get(name) {
        Some(super::ChildSet::One(schema)) => *schema,
        _ => return Err(input.malformed(name, "value must be a schema")),
    };
    let kind = match name {
        "unevaluatedProperties" => EvaluatorKind::UnevaluatedProperties(schema),
        "unevaluatedItems" => EvaluatorKind::UnevaluatedItems(schema),
        _ => unreachable!("unevaluated builder called for '{name}'"),
    };
    Ok(Some(kind))
}

pub(crate) fn eval_unevaluated_properties(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schema: crate::registry::NodeId,
) -> bool {
    let Some(object) = instance.as_object() else {
        return true;
    };
    let mut ok = true;
    let mut applied = Vec::new();
    for (name, member) in object {
        if cx.is_evaluated(member.pointer()) {
            continue;
        }
        if cx.apply(schema, member) {
            cx.mark_evaluated(member.pointer());
            applied.push(serde_json::Value::String(name.clone()));
        } else {
            cx.fail(
                node,
                keyword,
                member,
                "unevaluatedProperties",
                &[name.clone()],
            );
            ok = false;
        }
    }
    if ok {
        cx.annotate(node, keyword, instance, serde_json::Value::Array(applied));
    }
    ok
}

pub(crate) fn eval_unevaluated_items(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    schema: crate::registry::NodeId,
) -> bool {
    let Some(items) = instance.as_array() else {
        return true;
    };
    let mut ok = true;
    let mut applied = false;
    for (index, item) in items.iter().enumerate() {
        if cx.is_evaluated(item.pointer()) {
            continue;
        }
        applied = true;
        if cx.apply(schema, item) {
            cx.mark_evaluated(item.pointer());
        } else {
            cx.fail(
                node,
                keyword,
                item,
                "unevaluatedItems",
                &[index.to_string()],
            );
            ok = false;
        }
    }
    if ok && applied {
        cx.annotate(node, keyword, instance, serde_json::Value::Bool(true));
    }
    ok
}

pub(crate) fn eval_min_contains(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
    siblings: &SiblingState,
) -> bool {
    // Without a sibling `contains` there is nothing to count; a limit of
    // zero makes `contains` vacuously satisfiable.
    let Some(count) = siblings.contains_matches() else {
        return true;
    };
    if count as u64 >= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "minContains",
            &[limit.to_string(), count.to_string()],
        );
        false
    }
}

pub(crate) fn eval_max_contains(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
    siblings: &SiblingState,
) -> bool {
    let Some(count) = siblings.contains_matches() else {
        return true;
    };
    if count as u64 <= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "maxContains",
            &[limit.to_string(), count.to_string()],
        );
        false
    }
}
