//! Keyword semantics across the five supported drafts.

use schema_eval_core::{Draft, Validator};
use schema_eval_json::parse_json;

/// Registers a schema under a fixed base URI and returns the session.
fn compiled(schema: &str) -> (Validator, String) {
    let mut validator = Validator::new();
    let uri = validator
        .register_schema("https://example.com/root", &parse_json(schema).unwrap())
        .unwrap();
    (validator, uri)
}

/// One-shot validity check with the default (2020-12) dialect.
fn accepts(schema: &str, instance: &str) -> bool {
    let (validator, uri) = compiled(schema);
    validator
        .validate(&uri, &parse_json(instance).unwrap())
        .unwrap()
        .valid
}

#[test]
fn test_true_schema_accepts_everything_in_every_draft() {
    for draft in [
        Draft::Draft4,
        Draft::Draft6,
        Draft::Draft7,
        Draft::Draft201909,
        Draft::Draft202012,
    ] {
        let mut validator = Validator::builder().default_draft(draft).build();
        let uri = validator
            .register_schema("urn:accept-all", &parse_json("true").unwrap())
            .unwrap();
        for instance in ["null", "0", "\"x\"", "[1]", "{\"a\": 1}"] {
            assert!(
                validator
                    .validate(&uri, &parse_json(instance).unwrap())
                    .unwrap()
                    .valid,
                "true schema rejected {instance} under {draft:?}"
            );
        }
    }
}

#[test]
fn test_false_schema_rejects_everything_in_every_draft() {
    for draft in [
        Draft::Draft4,
        Draft::Draft6,
        Draft::Draft7,
        Draft::Draft201909,
        Draft::Draft202012,
    ] {
        let mut validator = Validator::builder().default_draft(draft).build();
        let uri = validator
            .register_schema("urn:reject-all", &parse_json("false").unwrap())
            .unwrap();
        for instance in ["null", "0", "\"x\"", "[1]", "{\"a\": 1}"] {
            let result = validator
                .validate(&uri, &parse_json(instance).unwrap())
                .unwrap();
            assert!(!result.valid, "false schema accepted {instance} under {draft:?}");
            assert!(!result.errors.is_empty());
        }
    }
}

#[test]
fn test_type_integer_accepts_numbers_without_fraction() {
    let schema = r##"{"type": "integer"}"##;
    assert!(accepts(schema, "1"));
    assert!(accepts(schema, "1.0"));
    assert!(accepts(schema, "1e2"));
    assert!(!accepts(schema, "1.5"));
    assert!(!accepts(schema, "\"1\""));
}

#[test]
fn test_type_number_accepts_integers() {
    let schema = r##"{"type": "number"}"##;
    assert!(accepts(schema, "1"));
    assert!(accepts(schema, "1.5"));
    assert!(!accepts(schema, "true"));
}

#[test]
fn test_type_union() {
    let schema = r##"{"type": ["string", "null"]}"##;
    assert!(accepts(schema, "\"x\""));
    assert!(accepts(schema, "null"));
    assert!(!accepts(schema, "0"));
}

#[test]
fn test_const_is_structural_and_type_aware() {
    assert!(accepts(r##"{"const": 1}"##, "1"));
    assert!(accepts(r##"{"const": 1}"##, "1.0"));
    assert!(!accepts(r##"{"const": 1}"##, "\"1\""));
    assert!(accepts(r##"{"const": {"a": [1, 2]}}"##, r##"{"a": [1, 2.0]}"##));
    assert!(!accepts(r##"{"const": {"a": [1, 2]}}"##, r##"{"a": [2, 1]}"##));
}

#[test]
fn test_enum_matches_deep_values() {
    let schema = r##"{"enum": [{"a": 1}, [1, 2], "x"]}"##;
    assert!(accepts(schema, r##"{"a": 1.0}"##));
    assert!(accepts(schema, "[1, 2]"));
    assert!(accepts(schema, "\"x\""));
    assert!(!accepts(schema, r##"{"a": 2}"##));
}

#[test]
fn test_numeric_ranges() {
    let schema = r##"{"minimum": 5, "maximum": 10}"##;
    assert!(accepts(schema, "5"));
    assert!(accepts(schema, "10"));
    assert!(!accepts(schema, "4.999"));
    assert!(!accepts(schema, "10.001"));
    // Non-numbers are out of scope for numeric keywords.
    assert!(accepts(schema, "\"ignored\""));
}

#[test]
fn test_draft4_boolean_exclusive_minimum() {
    let exclusive = r##"{
        "$schema": "http://json-schema.org/draft-04/schema#",
        "minimum": 5,
        "exclusiveMinimum": true
    }"##;
    assert!(!accepts(exclusive, "5"));
    assert!(accepts(exclusive, "5.1"));

    let inclusive = r##"{
        "$schema": "http://json-schema.org/draft-04/schema#",
        "minimum": 5
    }"##;
    assert!(accepts(inclusive, "5"));
}

#[test]
fn test_draft6_numeric_exclusive_bounds() {
    let schema = r##"{"exclusiveMinimum": 5, "exclusiveMaximum": 10}"##;
    assert!(!accepts(schema, "5"));
    assert!(accepts(schema, "7"));
    assert!(!accepts(schema, "10"));
}

#[test]
fn test_multiple_of_with_decimals() {
    assert!(accepts(r##"{"multipleOf": 0.5}"##, "1.5"));
    assert!(!accepts(r##"{"multipleOf": 0.5}"##, "1.3"));
    assert!(accepts(r##"{"multipleOf": 3}"##, "9"));
    assert!(!accepts(r##"{"multipleOf": 3}"##, "10"));
}

#[test]
fn test_string_length_counts_characters_not_bytes() {
    assert!(accepts(r##"{"maxLength": 1}"##, "\"é\""));
    assert!(!accepts(r##"{"minLength": 2}"##, "\"é\""));
    assert!(accepts(r##"{"minLength": 2}"##, "\"ab\""));
}

#[test]
fn test_pattern() {
    let schema = r##"{"pattern": "^a+$"}"##;
    assert!(accepts(schema, "\"aaa\""));
    assert!(!accepts(schema, "\"ab\""));
}

#[test]
fn test_unique_items_uses_numeric_equality() {
    let schema = r##"{"uniqueItems": true}"##;
    assert!(!accepts(schema, "[1, 1.0]"));
    assert!(!accepts(schema, r##"[{"a": 1}, {"a": 1}]"##));
    assert!(accepts(schema, r##"[1, "1"]"##));
    assert!(accepts(schema, r##"[{"a": 1}, {"a": 2}]"##));
}

#[test]
fn test_required_reports_each_missing_property() {
    let (validator, uri) = compiled(r##"{"required": ["a", "b", "c"]}"##);
    let result = validator
        .validate(&uri, &parse_json(r##"{"b": 1}"##).unwrap())
        .unwrap();
    assert!(!result.valid);
    let missing: Vec<_> = result
        .errors
        .iter()
        .filter(|e| e.keyword == "required")
        .collect();
    assert_eq!(missing.len(), 2);
}

#[test]
fn test_object_size_bounds() {
    let schema = r##"{"minProperties": 1, "maxProperties": 2}"##;
    assert!(!accepts(schema, "{}"));
    assert!(accepts(schema, r##"{"a": 1, "b": 2}"##));
    assert!(!accepts(schema, r##"{"a": 1, "b": 2, "c": 3}"##));
}

#[test]
fn test_draft7_tuple_items_with_additional_items() {
    let schema = r##"{
        "$schema": "http://json-schema.org/draft-07/schema#",
        "items": [{"type": "integer"}],
        "additionalItems": {"type": "string"}
    }"##;
    assert!(accepts(schema, r##"[1, "a", "b"]"##));
    assert!(!accepts(schema, r##"[1, 2]"##));
    assert!(!accepts(schema, r##"["a"]"##));
}

#[test]
fn test_2020_prefix_items_and_uniform_items() {
    let schema = r##"{
        "prefixItems": [{"type": "integer"}],
        "items": {"type": "string"}
    }"##;
    assert!(accepts(schema, r##"[1, "a", "b"]"##));
    assert!(!accepts(schema, r##"[1, 2]"##));
    assert!(!accepts(schema, r##"["a"]"##));
}

#[test]
fn test_draft7_property_dependencies() {
    let schema = r##"{
        "$schema": "http://json-schema.org/draft-07/schema#",
        "dependencies": {"a": ["b"], "c": {"required": ["d"]}}
    }"##;
    assert!(accepts(schema, r##"{"b": 1}"##));
    assert!(!accepts(schema, r##"{"a": 1}"##));
    assert!(accepts(schema, r##"{"a": 1, "b": 1}"##));
    assert!(!accepts(schema, r##"{"c": 1}"##));
    assert!(accepts(schema, r##"{"c": 1, "d": 1}"##));
}

#[test]
fn test_dependent_required_and_schemas() {
    let schema = r##"{
        "dependentRequired": {"a": ["b"]},
        "dependentSchemas": {"c": {"minProperties": 2}}
    }"##;
    assert!(!accepts(schema, r##"{"a": 1}"##));
    assert!(accepts(schema, r##"{"a": 1, "b": 1}"##));
    assert!(!accepts(schema, r##"{"c": 1}"##));
    assert!(accepts(schema, r##"{"c": 1, "d": 1}"##));
}

#[test]
fn test_if_then_else() {
    let schema = r##"{
        "if": {"type": "string"},
        "then": {"minLength": 2},
        "else": {"minimum": 0}
    }"##;
    assert!(accepts(schema, "\"ab\""));
    assert!(!accepts(schema, "\"a\""));
    assert!(accepts(schema, "1"));
    assert!(!accepts(schema, "-1"));
}

#[test]
fn test_boolean_composition() {
    assert!(accepts(
        r##"{"allOf": [{"type": "integer"}, {"minimum": 0}]}"##,
        "1"
    ));
    assert!(!accepts(
        r##"{"allOf": [{"type": "integer"}, {"minimum": 0}]}"##,
        "-1"
    ));
    assert!(accepts(
        r##"{"anyOf": [{"type": "string"}, {"minimum": 0}]}"##,
        "5"
    ));
    assert!(!accepts(
        r##"{"anyOf": [{"type": "string"}, {"minimum": 0}]}"##,
        "-5"
    ));
    assert!(accepts(
        r##"{"oneOf": [{"type": "integer"}, {"minimum": 10}]}"##,
        "5"
    ));
    assert!(!accepts(
        r##"{"oneOf": [{"type": "integer"}, {"minimum": 10}]}"##,
        "15"
    ));
    assert!(accepts(r##"{"not": {"type": "string"}}"##, "5"));
    assert!(!accepts(r##"{"not": {"type": "string"}}"##, "\"s\""));
}

#[test]
fn test_contains_requires_a_match_from_draft6() {
    let schema = r##"{"contains": {"type": "integer"}}"##;
    assert!(accepts(schema, r##"["a", 1]"##));
    assert!(!accepts(schema, r##"["a"]"##));

    // Draft 4 has no `contains`; the keyword is silently skipped.
    let draft4 = r##"{
        "$schema": "http://json-schema.org/draft-04/schema#",
        "contains": {"type": "integer"}
    }"##;
    assert!(accepts(draft4, r##"["a"]"##));
}

#[test]
fn test_property_names() {
    let schema = r##"{"propertyNames": {"maxLength": 3}}"##;
    assert!(accepts(schema, r##"{"abc": 1}"##));
    assert!(!accepts(schema, r##"{"abcd": 1}"##));
}

#[test]
fn test_boolean_subschema_in_properties() {
    let schema = r##"{"properties": {"a": false}}"##;
    assert!(accepts(schema, "{}"));
    assert!(!accepts(schema, r##"{"a": 1}"##));
}

#[test]
fn test_additional_properties_excludes_statically_matched_keys() {
    let schema = r##"{
        "properties": {"a": true},
        "patternProperties": {"^p": true},
        "additionalProperties": {"type": "integer"}
    }"##;
    assert!(accepts(schema, r##"{"a": "anything", "p1": [], "x": 3}"##));
    assert!(!accepts(schema, r##"{"x": "not an integer"}"##));
}

#[test]
fn test_unknown_keywords_become_annotations_only_in_recent_drafts() {
    let (validator, uri) = compiled(r##"{"x-custom": [1, 2]}"##);
    let result = validator.validate(&uri, &parse_json("0").unwrap()).unwrap();
    assert!(result.valid);
    assert!(
        result
            .annotations
            .iter()
            .any(|a| a.keyword == "x-custom" && a.value == serde_json::json!([1, 2]))
    );

    let mut validator = Validator::builder().default_draft(Draft::Draft7).build();
    let uri = validator
        .register_schema("urn:d7", &parse_json(r##"{"x-custom": [1, 2]}"##).unwrap())
        .unwrap();
    let result = validator.validate(&uri, &parse_json("0").unwrap()).unwrap();
    assert!(result.valid);
    assert!(result.annotations.iter().all(|a| a.keyword != "x-custom"));
}
