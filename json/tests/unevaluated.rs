//! Sibling-dependent evaluation: `unevaluatedProperties`,
//! `unevaluatedItems`, and `contains` counting.

use schema_eval_core::Validator;
use schema_eval_json::parse_json;

fn compiled(schema: &str) -> (Validator, String) {
    let mut validator = Validator::new();
    let uri = validator
        .register_schema("https://example.com/root", &parse_json(schema).unwrap())
        .unwrap();
    (validator, uri)
}

fn accepts(schema: &str, instance: &str) -> bool {
    let (validator, uri) = compiled(schema);
    validator
        .validate(&uri, &parse_json(instance).unwrap())
        .unwrap()
        .valid
}

#[test]
fn test_unevaluated_properties_fails_for_the_uncovered_key() {
    let schema = r##"{"properties": {"a": {}}, "unevaluatedProperties": false}"##;
    let (validator, uri) = compiled(schema);
    let result = validator
        .validate(&uri, &parse_json(r##"{"a": 1, "b": 2}"##).unwrap())
        .unwrap();
    assert!(!result.valid);
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.keyword == "unevaluatedProperties" && e.instance_location == "/b")
    );
    assert!(result.errors.iter().all(|e| e.instance_location != "/a"));

    assert!(
        validator
            .validate(&uri, &parse_json(r##"{"a": 1}"##).unwrap())
            .unwrap()
            .valid
    );
}

#[test]
fn test_unevaluated_properties_sees_through_in_place_applicators() {
    let schema = r##"{
        "allOf": [{"properties": {"a": true}}],
        "unevaluatedProperties": false
    }"##;
    assert!(accepts(schema, r##"{"a": 1}"##));
    assert!(!accepts(schema, r##"{"a": 1, "b": 1}"##));
}

#[test]
fn test_unevaluated_properties_sees_through_references() {
    let schema = r##"{
        "$ref": "#/$defs/base",
        "unevaluatedProperties": false,
        "$defs": {"base": {"properties": {"a": true}}}
    }"##;
    assert!(accepts(schema, r##"{"a": 1}"##));
    assert!(!accepts(schema, r##"{"b": 1}"##));
}

#[test]
fn test_marks_from_failed_branches_are_rolled_back() {
    let schema = r##"{
        "anyOf": [
            {"properties": {"a": {"type": "string"}}, "required": ["a"]},
            {"properties": {"b": true}}
        ],
        "unevaluatedProperties": false
    }"##;
    // Branch 0 fails on {"a": 1}, so its coverage of "a" must not leak.
    assert!(!accepts(schema, r##"{"a": 1}"##));
    // Branch 1 covers "b".
    assert!(accepts(schema, r##"{"b": 1}"##));
    // Branch 0 covers "a" when it actually matches.
    assert!(accepts(schema, r##"{"a": "s"}"##));
}

#[test]
fn test_unevaluated_properties_with_a_schema() {
    let schema = r##"{
        "properties": {"a": true},
        "unevaluatedProperties": {"type": "integer"}
    }"##;
    assert!(accepts(schema, r##"{"a": "anything", "b": 3}"##));
    assert!(!accepts(schema, r##"{"b": "not an integer"}"##));
}

#[test]
fn test_unevaluated_items_after_prefix_items() {
    let schema = r##"{"prefixItems": [true], "unevaluatedItems": false}"##;
    let (validator, uri) = compiled(schema);
    assert!(
        validator
            .validate(&uri, &parse_json("[1]").unwrap())
            .unwrap()
            .valid
    );
    let result = validator
        .validate(&uri, &parse_json("[1, 2]").unwrap())
        .unwrap();
    assert!(!result.valid);
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.keyword == "unevaluatedItems" && e.instance_location == "/1")
    );
}

#[test]
fn test_contains_marks_matched_items_as_evaluated() {
    let schema = r##"{
        "contains": {"type": "string"},
        "unevaluatedItems": {"type": "integer"}
    }"##;
    assert!(accepts(schema, r##"["a", 5]"##));
    assert!(!accepts(schema, r##"["a", 5.5]"##));
}

#[test]
fn test_min_contains_zero_is_vacuously_satisfiable() {
    let schema = r##"{"contains": {"const": "x"}, "minContains": 0}"##;
    assert!(accepts(schema, "[]"));
    assert!(accepts(schema, r##"["y"]"##));
}

#[test]
fn test_contains_count_bounds() {
    let schema = r##"{"contains": {"type": "integer"}, "minContains": 2}"##;
    assert!(!accepts(schema, "[1]"));
    assert!(accepts(schema, r##"[1, "x", 2]"##));

    let schema = r##"{"contains": {"type": "integer"}, "maxContains": 1}"##;
    assert!(accepts(schema, r##"[1, "x"]"##));
    assert!(!accepts(schema, "[1, 2]"));
}

#[test]
fn test_contains_without_bounds_still_requires_a_match() {
    let schema = r##"{"contains": {"type": "integer"}}"##;
    assert!(!accepts(schema, r##"["a"]"##));
    assert!(accepts(schema, r##"["a", 1]"##));
}

#[test]
fn test_unevaluated_properties_under_2019() {
    let schema = r##"{
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "properties": {"a": true},
        "unevaluatedProperties": false
    }"##;
    assert!(accepts(schema, r##"{"a": 1}"##));
    assert!(!accepts(schema, r##"{"a": 1, "b": 2}"##));
}

#[test]
fn test_if_condition_annotations_count_as_evaluated() {
    // A passing `if` condition's coverage feeds unevaluatedProperties.
    let schema = r##"{
        "if": {"properties": {"a": {"type": "integer"}}, "required": ["a"]},
        "unevaluatedProperties": false
    }"##;
    assert!(accepts(schema, r##"{"a": 1}"##));
    assert!(!accepts(schema, r##"{"a": "s"}"##));
}
