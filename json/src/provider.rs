//! Adapters from `serde_json`/`serde_yaml` trees to the abstract value
//! model.
//!
//! `serde_json` is compiled with `preserve_order` and
//! `arbitrary_precision`, so object member order survives into the
//! abstract model and numbers reach `BigDecimal` through their original
//! decimal text instead of an `f64` round-trip.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use schema_eval_core::InstanceNode;

use crate::error::{ProviderError, Result};

/// Parses JSON text into an abstract value tree.
///
/// # Examples
///
/// ```
/// use schema_eval_core::NodeType;
/// use schema_eval_json::parse_json;
///
/// let doc = parse_json(r#"{"a": 1.0, "b": [true, null]}"#).unwrap();
/// assert_eq!(doc.get("a").unwrap().node_type(), NodeType::Integer);
/// assert_eq!(doc.get("b").unwrap().pointer(), "/b");
/// ```
pub fn parse_json(text: &str) -> Result<InstanceNode> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    wrap_json(&value)
}

/// Parses YAML text into an abstract value tree.
pub fn parse_yaml(text: &str) -> Result<InstanceNode> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    wrap_yaml(&value)
}

/// Adapts an already-parsed `serde_json::Value`.
pub fn wrap_json(value: &serde_json::Value) -> Result<InstanceNode> {
    Ok(convert_json(value)?.rooted())
}

/// Adapts an already-parsed `serde_yaml::Value`.
///
/// Fails with [`ProviderError::InvalidArgument`] for tagged values,
/// non-string mapping keys, and non-finite numbers — native shapes the
/// abstract model cannot represent.
pub fn wrap_yaml(value: &serde_yaml::Value) -> Result<InstanceNode> {
    Ok(convert_yaml(value)?.rooted())
}

fn convert_json(value: &serde_json::Value) -> Result<InstanceNode> {
    Ok(match value {
        serde_json::Value::Null => InstanceNode::null(),
        serde_json::Value::Bool(b) => InstanceNode::boolean(*b),
        serde_json::Value::Number(number) => InstanceNode::number(parse_decimal(
            &number.to_string(),
        )?),
        serde_json::Value::String(text) => InstanceNode::string(text.clone()),
        serde_json::Value::Array(items) => {
            InstanceNode::array(items.iter().map(convert_json).collect::<Result<_>>()?)
        }
        serde_json::Value::Object(members) => InstanceNode::object(
            members
                .iter()
                .map(|(name, member)| Ok((name.clone(), convert_json(member)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn convert_yaml(value: &serde_yaml::Value) -> Result<InstanceNode> {
    Ok(match value {
        serde_yaml::Value::Null => InstanceNode::null(),
        serde_yaml::Value::Bool(b) => InstanceNode::boolean(*b),
        serde_yaml::Value::Number(number) => {
            InstanceNode::number(parse_decimal(&number.to_string())?)
        }
        serde_yaml::Value::String(text) => InstanceNode::string(text.clone()),
        serde_yaml::Value::Sequence(items) => {
            InstanceNode::array(items.iter().map(convert_yaml).collect::<Result<_>>()?)
        }
        serde_yaml::Value::Mapping(members) => InstanceNode::object(
            members
                .iter()
                .map(|(key, member)| {
                    let name = key.as_str().ok_or_else(|| {
                        ProviderError::InvalidArgument(
                            "YAML mapping keys must be strings".to_string(),
                        )
                    })?;
                    Ok((name.to_string(), convert_yaml(member)?))
                })
                .collect::<Result<_>>()?,
        ),
        serde_yaml::Value::Tagged(tagged) => {
            return Err(ProviderError::InvalidArgument(format!(
                "YAML tagged value '{}' has no JSON representation",
                tagged.tag
            )));
        }
    })
}

fn parse_decimal(text: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(text).map_err(|_| {
        ProviderError::InvalidArgument(format!("number '{text}' is not a finite decimal"))
    })
}
