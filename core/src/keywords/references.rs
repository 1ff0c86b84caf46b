//! Reference evaluators: `$ref`, `$recursiveRef` (2019-09) and
//! `$dynamicRef` (2020-12).
//!
//! Static resolution happened lexically at compile time, so an evaluator
//! carries either an arena index or the absolute URI it could not close
//! over. Dynamic resolution walks the evaluation's dynamic-scope stack
//! from the outermost resource inwards, falling back to the static target
//! when no scope entry defines a matching anchor.

use crate::engine::EvalContext;
use crate::error::Result;
use crate::registry::SchemaNode;
use crate::uri::{index_key, is_pointer_fragment, resolve_reference, split_fragment};
use crate::value::InstanceNode;

use super::{EvaluatorKind, FactoryInput, RefTarget};

pub(crate) fn build(
    input: &FactoryInput<'_>,
    name: &str,
    value: &InstanceNode,
) -> Result<Option<EvaluatorKind>> {
    let text = value
        .as_str()
        .ok_or_else(|| input.malformed(name, "value must be a URI reference string"))?;
    let kind = match name {
        "$ref" => {
            let target = resolve_reference(input.base, text)
                .map_err(|e| input.malformed(name, e.to_string()))?;
            EvaluatorKind::Ref(RefTarget::Pending(index_key(&target)))
        }
        "$recursiveRef" => {
            if text != "#" {
                return Err(input.malformed(name, "value must be '#'"));
            }
            let root = resolve_reference(input.base, "#")
                .map_err(|e| input.malformed(name, e.to_string()))?;
            EvaluatorKind::RecursiveRef(RefTarget::Pending(index_key(&root)))
        }
        "$dynamicRef" => {
            let target = resolve_reference(input.base, text)
                .map_err(|e| input.malformed(name, e.to_string()))?;
            let (_, fragment) = split_fragment(&target);
            let anchor = if is_pointer_fragment(&fragment) {
                None
            } else {
                Some(fragment)
            };
            EvaluatorKind::DynamicRef {
                anchor,
                fallback: RefTarget::Pending(index_key(&target)),
            }
        }
        _ => unreachable!("reference builder called for '{name}'"),
    };
    Ok(Some(kind))
}

pub(crate) fn eval_ref(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    target: &RefTarget,
) -> bool {
    match cx.resolve_target(target) {
        Ok(id) => cx.apply(id, instance),
        Err(uri) => {
            cx.fail(node, keyword, instance, "unresolved-reference", &[uri]);
            false
        }
    }
}

pub(crate) fn eval_recursive_ref(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    fallback: &RefTarget,
) -> bool {
    let static_id = match cx.resolve_target(fallback) {
        Ok(id) => id,
        Err(uri) => {
            cx.fail(node, keyword, instance, "unresolved-reference", &[uri]);
            return false;
        }
    };
    // Only a `$recursiveAnchor: true` at the static target arms the
    // dynamic behavior; otherwise this is a plain reference to the
    // lexical resource root.
    let id = if cx.registry().node(static_id).recursive_anchor {
        cx.dynamic_scope()
            .iter()
            .find_map(|scope| cx.registry().recursive_root(scope))
            .unwrap_or(static_id)
    } else {
        static_id
    };
    cx.apply(id, instance)
}

pub(crate) fn eval_dynamic_ref(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    anchor: &Option<String>,
    fallback: &RefTarget,
) -> bool {
    if let Some(anchor) = anchor {
        let found = cx
            .dynamic_scope()
            .iter()
            .find_map(|scope| cx.registry().dynamic_anchor(scope, anchor));
        if let Some(id) = found {
            return cx.apply(id, instance);
        }
    }
    match cx.resolve_target(fallback) {
        Ok(id) => cx.apply(id, instance),
        Err(uri) => {
            cx.fail(node, keyword, instance, "unresolved-reference", &[uri]);
            false
        }
    }
}
