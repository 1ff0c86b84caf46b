//! Annotation-only evaluators.
//!
//! These always succeed; their sole effect is an annotation carrying the
//! keyword value. `format` is annotation passthrough by design (no
//! semantic validation), and keywords of a deactivated vocabulary or
//! unknown to a 2019-09/2020-12 dialect degrade to this family as well.

use crate::error::Result;
use crate::value::InstanceNode;

use super::{EvaluatorKind, FactoryInput};

pub(crate) fn build(
    input: &FactoryInput<'_>,
    name: &str,
    value: &InstanceNode,
) -> Result<Option<EvaluatorKind>> {
    if name == "format" && value.as_str().is_none() {
        return Err(input.malformed(name, "value must be a string"));
    }
    Ok(Some(EvaluatorKind::Annotation(value.to_json())))
}
