//! Failure message formatting.
//!
//! Evaluators report keyed failures; a [`MessageProvider`] turns a key
//! plus its arguments into user-facing text. The built-in English table
//! is used whenever no provider is installed or a provider declines a
//! key, so localization never changes which errors exist, only their
//! wording.

/// Formats keyed failure messages. Install one via
/// [`ValidatorBuilder::with_messages`](crate::ValidatorBuilder::with_messages).
pub trait MessageProvider: Send + Sync {
    /// Returns the formatted message for `key`, or `None` to fall back to
    /// the built-in wording.
    fn format(&self, key: &str, args: &[String]) -> Option<String>;
}

/// The built-in English message table.
pub(crate) fn default_message(key: &str, args: &[String]) -> String {
    let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or("?");
    match key {
        "false" => "instance is not allowed by a false schema".to_string(),
        "type" => format!("expected {}, found {}", arg(0), arg(1)),
        "const" => "instance does not equal the constant value".to_string(),
        "enum" => "instance does not equal any enumerated value".to_string(),
        "multipleOf" => format!("{} is not a multiple of {}", arg(1), arg(0)),
        "minimum" => format!("{} is less than the minimum of {}", arg(1), arg(0)),
        "exclusiveMinimum" => format!("{} is not greater than {}", arg(1), arg(0)),
        "maximum" => format!("{} is greater than the maximum of {}", arg(1), arg(0)),
        "exclusiveMaximum" => format!("{} is not less than {}", arg(1), arg(0)),
        "minLength" => format!("length {} is less than minLength {}", arg(1), arg(0)),
        "maxLength" => format!("length {} is greater than maxLength {}", arg(1), arg(0)),
        "pattern" => format!("string does not match pattern '{}'", arg(0)),
        "minItems" => format!("{} items is fewer than minItems {}", arg(1), arg(0)),
        "maxItems" => format!("{} items is more than maxItems {}", arg(1), arg(0)),
        "uniqueItems" => format!("items at {} and {} are equal", arg(0), arg(1)),
        "minProperties" => format!("{} properties is fewer than minProperties {}", arg(1), arg(0)),
        "maxProperties" => format!("{} properties is more than maxProperties {}", arg(1), arg(0)),
        "required" => format!("required property '{}' is missing", arg(0)),
        "dependentRequired" => format!(
            "property '{}' requires property '{}' to be present",
            arg(0),
            arg(1)
        ),
        "allOf" => format!("{} subschema(s) did not match", arg(0)),
        "anyOf" => "instance does not match any subschema".to_string(),
        "oneOf" => format!("instance matches {} subschemas, expected exactly one", arg(0)),
        "not" => "instance must not match the subschema".to_string(),
        "propertyNames" => format!("property name '{}' does not match the schema", arg(0)),
        "dependencies" => format!("dependency of property '{}' failed", arg(0)),
        "dependentSchemas" => format!("dependent schema of property '{}' failed", arg(0)),
        "contains" => "no array item matches the contains schema".to_string(),
        "minContains" => format!("{} item(s) matched contains, fewer than {}", arg(1), arg(0)),
        "maxContains" => format!("{} item(s) matched contains, more than {}", arg(1), arg(0)),
        "unevaluatedProperties" => format!("unevaluated property '{}' is not allowed", arg(0)),
        "unevaluatedItems" => format!("unevaluated item at index {} is not allowed", arg(0)),
        "unresolved-reference" => format!("reference '{}' cannot be resolved", arg(0)),
        "max-depth" => "maximum evaluation depth exceeded".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages_interpolate_arguments() {
        let msg = default_message("minimum", &["5".to_string(), "3".to_string()]);
        assert_eq!(msg, "3 is less than the minimum of 5");
    }

    #[test]
    fn test_unknown_key_falls_back_to_key_text() {
        assert_eq!(default_message("mystery", &[]), "mystery");
    }
}
