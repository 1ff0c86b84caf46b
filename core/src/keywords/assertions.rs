//! Type and shape assertions: pure functions of the keyword value and the
//! instance value, with no sibling or recursion dependency.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use regex::Regex;

use crate::dialect::Draft;
use crate::engine::EvalContext;
use crate::error::Result;
use crate::registry::SchemaNode;
use crate::value::{InstanceNode, NodeType};

use super::{EvaluatorKind, FactoryInput};

pub(crate) fn build(
    input: &FactoryInput<'_>,
    name: &str,
    value: &InstanceNode,
) -> Result<Option<EvaluatorKind>> {
    let kind = match name {
        "type" => EvaluatorKind::Type(parse_type_set(input, value)?),
        "const" => EvaluatorKind::Const(value.clone()),
        "enum" => {
            let choices = value
                .as_array()
                .ok_or_else(|| input.malformed(name, "value must be an array"))?;
            EvaluatorKind::Enum(choices.to_vec())
        }
        "multipleOf" => {
            let divisor = require_number(input, name, value)?;
            if divisor <= BigDecimal::from(0) {
                return Err(input.malformed(name, "value must be strictly positive"));
            }
            EvaluatorKind::MultipleOf(divisor)
        }
        "minimum" => EvaluatorKind::Minimum {
            limit: require_number(input, name, value)?,
            exclusive: draft4_exclusive(input, "exclusiveMinimum"),
        },
        "maximum" => EvaluatorKind::Maximum {
            limit: require_number(input, name, value)?,
            exclusive: draft4_exclusive(input, "exclusiveMaximum"),
        },
        // Draft 4 routes the boolean form through minimum/maximum above;
        // these are the standalone numeric forms of draft 6 onwards.
        "exclusiveMinimum" => EvaluatorKind::Minimum {
            limit: require_number(input, name, value)?,
            exclusive: true,
        },
        "exclusiveMaximum" => EvaluatorKind::Maximum {
            limit: require_number(input, name, value)?,
            exclusive: true,
        },
        "minLength" => EvaluatorKind::MinLength(require_limit(input, name, value)?),
        "maxLength" => EvaluatorKind::MaxLength(require_limit(input, name, value)?),
        "pattern" => {
            let source = value
                .as_str()
                .ok_or_else(|| input.malformed(name, "value must be a string"))?;
            let regex = Regex::new(source)
                .map_err(|e| input.malformed(name, format!("invalid pattern: {e}")))?;
            EvaluatorKind::Pattern {
                source: source.to_string(),
                regex,
            }
        }
        "minItems" => EvaluatorKind::MinItems(require_limit(input, name, value)?),
        "maxItems" => EvaluatorKind::MaxItems(require_limit(input, name, value)?),
        "uniqueItems" => match value.as_bool() {
            Some(true) => EvaluatorKind::UniqueItems,
            Some(false) => return Ok(None),
            None => return Err(input.malformed(name, "value must be a boolean")),
        },
        "minProperties" => EvaluatorKind::MinProperties(require_limit(input, name, value)?),
        "maxProperties" => EvaluatorKind::MaxProperties(require_limit(input, name, value)?),
        "required" => EvaluatorKind::Required(require_string_array(input, name, value)?),
        "dependentRequired" => {
            let members = value
                .as_object()
                .ok_or_else(|| input.malformed(name, "value must be an object"))?;
            let mut entries = Vec::with_capacity(members.len());
            for (property, requirement) in members {
                entries.push((
                    property.clone(),
                    require_string_array(input, name, requirement)?,
                ));
            }
            EvaluatorKind::DependentRequired(entries)
        }
        "minContains" => EvaluatorKind::MinContains(require_limit(input, name, value)?),
        "maxContains" => EvaluatorKind::MaxContains(require_limit(input, name, value)?),
        _ => unreachable!("assertion builder called for '{name}'"),
    };
    Ok(Some(kind))
}

fn parse_type_set(input: &FactoryInput<'_>, value: &InstanceNode) -> Result<Vec<NodeType>> {
    let names: Vec<&str> = if let Some(name) = value.as_str() {
        vec![name]
    } else if let Some(items) = value.as_array() {
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| input.malformed("type", "array entries must be strings"))
            })
            .collect::<Result<_>>()?
    } else {
        return Err(input.malformed("type", "value must be a string or array of strings"));
    };
    names
        .into_iter()
        .map(|name| match name {
            "null" => Ok(NodeType::Null),
            "boolean" => Ok(NodeType::Boolean),
            "string" => Ok(NodeType::String),
            "integer" => Ok(NodeType::Integer),
            "number" => Ok(NodeType::Number),
            "array" => Ok(NodeType::Array),
            "object" => Ok(NodeType::Object),
            other => Err(input.malformed("type", format!("unknown type name '{other}'"))),
        })
        .collect()
}

fn draft4_exclusive(input: &FactoryInput<'_>, sibling: &str) -> bool {
    input.draft == Draft::Draft4
        && input
            .object
            .get(sibling)
            .and_then(InstanceNode::as_bool)
            .unwrap_or(false)
}

fn require_number(
    input: &FactoryInput<'_>,
    name: &str,
    value: &InstanceNode,
) -> Result<BigDecimal> {
    value
        .as_number()
        .map(|n| n.value().clone())
        .ok_or_else(|| input.malformed(name, "value must be a number"))
}

fn require_limit(input: &FactoryInput<'_>, name: &str, value: &InstanceNode) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| input.malformed(name, "value must be a non-negative integer"))
}

fn require_string_array(
    input: &FactoryInput<'_>,
    name: &str,
    value: &InstanceNode,
) -> Result<Vec<String>> {
    value
        .as_array()
        .ok_or_else(|| input.malformed(name, "value must be an array of strings"))?
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| input.malformed(name, "array entries must be strings"))
        })
        .collect()
}

pub(crate) fn eval_type(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    types: &[NodeType],
) -> bool {
    let actual = instance.node_type();
    let matched = types
        .iter()
        .any(|t| *t == actual || (*t == NodeType::Number && actual == NodeType::Integer));
    if !matched {
        let expected = types
            .iter()
            .map(|t| t.keyword_name())
            .collect::<Vec<_>>()
            .join(" or ");
        cx.fail(
            node,
            keyword,
            instance,
            "type",
            &[expected, actual.keyword_name().to_string()],
        );
    }
    matched
}

pub(crate) fn eval_const(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    expected: &InstanceNode,
) -> bool {
    if instance == expected {
        true
    } else {
        cx.fail(node, keyword, instance, "const", &[]);
        false
    }
}

pub(crate) fn eval_enum(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    choices: &[InstanceNode],
) -> bool {
    if choices.iter().any(|choice| choice == instance) {
        true
    } else {
        cx.fail(node, keyword, instance, "enum", &[]);
        false
    }
}

pub(crate) fn eval_multiple_of(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    divisor: &BigDecimal,
) -> bool {
    let Some(number) = instance.as_number() else {
        return true;
    };
    if (number.value() % divisor) == BigDecimal::from(0) {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "multipleOf",
            &[divisor.to_string(), number.value().to_string()],
        );
        false
    }
}

pub(crate) fn eval_minimum(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: &BigDecimal,
    exclusive: bool,
) -> bool {
    let Some(number) = instance.as_number() else {
        return true;
    };
    let ok = if exclusive {
        number.value() > limit
    } else {
        number.value() >= limit
    };
    if !ok {
        let key = if exclusive { "exclusiveMinimum" } else { "minimum" };
        cx.fail(
            node,
            keyword,
            instance,
            key,
            &[limit.to_string(), number.value().to_string()],
        );
    }
    ok
}

pub(crate) fn eval_maximum(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: &BigDecimal,
    exclusive: bool,
) -> bool {
    let Some(number) = instance.as_number() else {
        return true;
    };
    let ok = if exclusive {
        number.value() < limit
    } else {
        number.value() <= limit
    };
    if !ok {
        let key = if exclusive { "exclusiveMaximum" } else { "maximum" };
        cx.fail(
            node,
            keyword,
            instance,
            key,
            &[limit.to_string(), number.value().to_string()],
        );
    }
    ok
}

pub(crate) fn eval_min_length(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
) -> bool {
    let Some(text) = instance.as_str() else {
        return true;
    };
    let length = text.chars().count() as u64;
    if length >= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "minLength",
            &[limit.to_string(), length.to_string()],
        );
        false
    }
}

pub(crate) fn eval_max_length(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
) -> bool {
    let Some(text) = instance.as_str() else {
        return true;
    };
    let length = text.chars().count() as u64;
    if length <= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "maxLength",
            &[limit.to_string(), length.to_string()],
        );
        false
    }
}

pub(crate) fn eval_pattern(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    source: &str,
    regex: &Regex,
) -> bool {
    let Some(text) = instance.as_str() else {
        return true;
    };
    if regex.is_match(text) {
        true
    } else {
        cx.fail(node, keyword, instance, "pattern", &[source.to_string()]);
        false
    }
}

pub(crate) fn eval_min_items(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
) -> bool {
    let Some(items) = instance.as_array() else {
        return true;
    };
    if items.len() as u64 >= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "minItems",
            &[limit.to_string(), items.len().to_string()],
        );
        false
    }
}

pub(crate) fn eval_max_items(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
) -> bool {
    let Some(items) = instance.as_array() else {
        return true;
    };
    if items.len() as u64 <= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "maxItems",
            &[limit.to_string(), items.len().to_string()],
        );
        false
    }
}

pub(crate) fn eval_unique_items(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
) -> bool {
    let Some(items) = instance.as_array() else {
        return true;
    };
    let mut seen: HashMap<&InstanceNode, usize> = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if let Some(first) = seen.get(item) {
            cx.fail(
                node,
                keyword,
                instance,
                "uniqueItems",
                &[first.to_string(), index.to_string()],
            );
            return false;
        }
        seen.insert(item, index);
    }
    true
}

pub(crate) fn eval_min_properties(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
) -> bool {
    let Some(members) = instance.as_object() else {
        return true;
    };
    if members.len() as u64 >= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "minProperties",
            &[limit.to_string(), members.len().to_string()],
        );
        false
    }
}

pub(crate) fn eval_max_properties(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    limit: u64,
) -> bool {
    let Some(members) = instance.as_object() else {
        return true;
    };
    if members.len() as u64 <= limit {
        true
    } else {
        cx.fail(
            node,
            keyword,
            instance,
            "maxProperties",
            &[limit.to_string(), members.len().to_string()],
        );
        false
    }
}

pub(crate) fn eval_required(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    names: &[String],
) -> bool {
    if instance.as_object().is_none() {
        return true;
    }
    let mut ok = true;
    for name in names {
        if instance.get(name).is_none() {
            cx.fail(node, keyword, instance, "required", &[name.clone()]);
            ok = false;
        }
    }
    ok
}

pub(crate) fn eval_dependent_required(
    cx: &mut EvalContext<'_>,
    node: &SchemaNode,
    keyword: &str,
    instance: &InstanceNode,
    entries: &[(String, Vec<String>)],
) -> bool {
    if instance.as_object().is_none() {
        return true;
    }
    let mut ok = true;
    for (property, requirements) in entries {
        if instance.get(property).is_none() {
            continue;
        }
        for requirement in requirements {
            if instance.get(requirement).is_none() {
                cx.fail(
                    node,
                    keyword,
                    instance,
                    "dependentRequired",
                    &[property.clone(), requirement.clone()],
                );
                ok = false;
            }
        }
    }
    ok
}
