//! Reference resolution: local pointers, anchors, rebasing, dynamic and
//! recursive references, external resolvers, and failure modes.

use std::fs;

use schema_eval_core::{Draft, SchemaError, Validator};
use schema_eval_json::{DirResolver, MapResolver, parse_json};

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
fn test_local_defs_reference() {
    let schema = r##"{"$ref": "#/$defs/A", "$defs": {"A": {"type": "integer"}}}"##;
    assert!(accepts(schema, "1"));
    assert!(!accepts(schema, "\"a\""));
}

#[test]
fn test_draft7_definitions_reference() {
    let schema = r##"{
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$ref": "#/definitions/A",
        "definitions": {"A": {"type": "integer"}}
    }"##;
    assert!(accepts(schema, "1"));
    assert!(!accepts(schema, "\"a\""));
}

#[test]
fn test_legacy_definitions_remain_addressable_in_2020() {
    let schema = r##"{"$ref": "#/definitions/A", "definitions": {"A": {"type": "integer"}}}"##;
    assert!(accepts(schema, "1"));
}

#[test]
fn test_ref_siblings_are_inert_before_2019() {
    let schema = r##"{
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$ref": "#/definitions/A",
        "minimum": 100,
        "definitions": {"A": {"type": "integer"}}
    }"##;
    assert!(accepts(schema, "1"));

    let schema = r##"{
        "$ref": "#/$defs/A",
        "minimum": 100,
        "$defs": {"A": {"type": "integer"}}
    }"##;
    assert!(!accepts(schema, "1"));
    assert!(accepts(schema, "100"));
}

#[test]
fn test_cyclic_reference_through_properties() {
    let schema = r##"{
        "type": "object",
        "properties": {"next": {"$ref": "#"}}
    }"##;
    assert!(accepts(schema, r##"{"next": {"next": {}}}"##));
    assert!(!accepts(schema, r##"{"next": {"next": 5}}"##));
}

#[test]
fn test_unterminated_cycle_fails_closed_at_the_depth_ceiling() {
    let mut validator = Validator::builder().max_depth(32).build();
    let uri = validator
        .register_schema("urn:loop", &parse_json(r##"{"$ref": "#"}"##).unwrap())
        .unwrap();
    let result = validator.validate(&uri, &parse_json("1").unwrap()).unwrap();
    assert!(!result.valid);
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.message.contains("maximum evaluation depth"))
    );
}

#[test]
fn test_rebasing_keeps_pointer_and_identifier_aliases() {
    let schema = r##"{
        "$defs": {"A": {"$id": "https://example.com/other", "type": "string"}}
    }"##;
    let (validator, _) = compiled(schema);
    let instance = parse_json("\"ok\"").unwrap();
    let by_pointer = validator
        .validate("https://example.com/root#/$defs/A", &instance)
        .unwrap();
    let by_id = validator
        .validate("https://example.com/other", &instance)
        .unwrap();
    assert!(by_pointer.valid);
    assert!(by_id.valid);
    assert!(
        !validator
            .validate("https://example.com/other", &parse_json("5").unwrap())
            .unwrap()
            .valid
    );
}

#[test]
fn test_relative_id_resolves_against_the_registration_base() {
    let schema = r##"{
        "$defs": {"A": {"$id": "sub", "type": "integer"}},
        "$ref": "sub"
    }"##;
    assert!(accepts(schema, "1"));
    assert!(!accepts(schema, "\"a\""));
}

#[test]
fn test_anchor_reference_2019_onwards() {
    let schema = r##"{
        "$ref": "#target",
        "$defs": {"A": {"$anchor": "target", "type": "integer"}}
    }"##;
    assert!(accepts(schema, "1"));
    assert!(!accepts(schema, "\"a\""));
}

#[test]
fn test_fragment_only_id_is_an_anchor_in_draft7() {
    let schema = r##"{
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$ref": "#target",
        "definitions": {"A": {"$id": "#target", "type": "integer"}}
    }"##;
    assert!(accepts(schema, "1"));
    assert!(!accepts(schema, "\"a\""));
}

#[test]
fn test_dynamic_ref_resolves_to_the_outermost_scope() {
    let inner = r##"{
        "$id": "urn:inner",
        "$dynamicRef": "#n",
        "$defs": {"n": {"$dynamicAnchor": "n", "type": "string"}}
    }"##;
    let outer = r##"{
        "$id": "urn:outer",
        "$ref": "urn:inner",
        "$defs": {"n": {"$dynamicAnchor": "n", "type": "integer"}}
    }"##;
    let mut validator = Validator::new();
    validator
        .register_schema("urn:inner", &parse_json(inner).unwrap())
        .unwrap();
    validator
        .register_schema("urn:outer", &parse_json(outer).unwrap())
        .unwrap();

    // Through the outer resource the outermost redefinition of `n` wins.
    assert!(
        validator
            .validate("urn:outer", &parse_json("5").unwrap())
            .unwrap()
            .valid
    );
    assert!(
        !validator
            .validate("urn:outer", &parse_json("\"s\"").unwrap())
            .unwrap()
            .valid
    );

    // Evaluated on its own, the inner definition is the outermost.
    assert!(
        validator
            .validate("urn:inner", &parse_json("\"s\"").unwrap())
            .unwrap()
            .valid
    );
    assert!(
        !validator
            .validate("urn:inner", &parse_json("5").unwrap())
            .unwrap()
            .valid
    );
}

#[test]
fn test_recursive_ref_extends_through_the_dynamic_scope() {
    let tree = r##"{
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "urn:tree",
        "$recursiveAnchor": true,
        "type": "object",
        "properties": {
            "data": true,
            "children": {"items": {"$recursiveRef": "#"}}
        }
    }"##;
    let strict = r##"{
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "urn:strict-tree",
        "$recursiveAnchor": true,
        "$ref": "urn:tree",
        "unevaluatedProperties": false
    }"##;
    let mut validator = Validator::new();
    validator
        .register_schema("urn:tree", &parse_json(tree).unwrap())
        .unwrap();
    validator
        .register_schema("urn:strict-tree", &parse_json(strict).unwrap())
        .unwrap();

    let ok = parse_json(r##"{"children": [{"data": 1}]}"##).unwrap();
    assert!(validator.validate("urn:strict-tree", &ok).unwrap().valid);

    // The misspelled member is caught even though it appears in a child
    // node reached through `$recursiveRef`.
    let typo = parse_json(r##"{"children": [{"daat": 1}]}"##).unwrap();
    assert!(!validator.validate("urn:strict-tree", &typo).unwrap().valid);

    // The lax base schema keeps accepting it.
    assert!(validator.validate("urn:tree", &typo).unwrap().valid);
}

#[test]
fn test_external_reference_through_map_resolver() {
    let mut external = MapResolver::new();
    external.insert(
        "https://example.com/name",
        parse_json(r##"{"type": "string", "minLength": 1}"##).unwrap(),
    );
    let mut validator = Validator::builder().with_resolver(external).build();
    let uri = validator
        .register_schema(
            "https://example.com/root",
            &parse_json(r##"{"$ref": "https://example.com/name"}"##).unwrap(),
        )
        .unwrap();
    assert!(
        validator
            .validate(&uri, &parse_json("\"x\"").unwrap())
            .unwrap()
            .valid
    );
    assert!(
        !validator
            .validate(&uri, &parse_json("\"\"").unwrap())
            .unwrap()
            .valid
    );
}

#[test]
fn test_external_reference_through_dir_resolver() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("port.json"), r##"{"type": "integer"}"##).unwrap();
    fs::write(dir.path().join("name.yaml"), "type: string\n").unwrap();

    let resolver = DirResolver::new("https://example.com/schemas/", dir.path());
    let mut validator = Validator::builder().with_resolver(resolver).build();
    let schema = r##"{
        "properties": {
            "port": {"$ref": "https://example.com/schemas/port.json"},
            "name": {"$ref": "https://example.com/schemas/name.yaml"}
        }
    }"##;
    let uri = validator
        .register_schema("https://example.com/root", &parse_json(schema).unwrap())
        .unwrap();
    assert!(
        validator
            .validate(&uri, &parse_json(r##"{"port": 80, "name": "db"}"##).unwrap())
            .unwrap()
            .valid
    );
    assert!(
        !validator
            .validate(&uri, &parse_json(r##"{"port": "80"}"##).unwrap())
            .unwrap()
            .valid
    );
}

#[test]
fn test_unresolvable_reference_is_a_validation_error_not_a_crash() {
    let schema = r##"{"$ref": "urn:missing", "type": "integer"}"##;
    let (validator, uri) = compiled(schema);
    let result = validator
        .validate(&uri, &parse_json("\"a\"").unwrap())
        .unwrap();
    assert!(!result.valid);
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.keyword == "$ref" && e.message.contains("urn:missing"))
    );
    // Sibling keywords still evaluated.
    assert!(result.errors.iter().any(|e| e.keyword == "type"));
}

#[test]
fn test_evaluation_path_accumulates_ref_hops() {
    let schema = r##"{
        "properties": {"foo": {"$ref": "#/$defs/S"}},
        "$defs": {"S": {"type": "integer"}}
    }"##;
    let (validator, uri) = compiled(schema);
    let result = validator
        .validate(&uri, &parse_json(r##"{"foo": "x"}"##).unwrap())
        .unwrap();
    assert!(!result.valid);
    let error = result
        .errors
        .iter()
        .find(|e| e.keyword == "type")
        .expect("type error");
    assert_eq!(error.evaluation_path, "/properties/foo/$ref/type");
    assert_eq!(
        error.schema_location,
        "https://example.com/root#/$defs/S/type"
    );
    assert_eq!(error.instance_location, "/foo");
}

#[test]
fn test_validating_under_a_pointer_uri() {
    let schema = r##"{"$defs": {"S": {"type": "integer"}}}"##;
    let (validator, _) = compiled(schema);
    assert!(
        validator
            .validate("https://example.com/root#/$defs/S", &parse_json("3").unwrap())
            .unwrap()
            .valid
    );
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut validator = Validator::new();
    validator
        .register_schema("urn:dup", &parse_json("true").unwrap())
        .unwrap();
    let err = validator
        .register_schema("urn:dup", &parse_json("false").unwrap())
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateUri(_)));

    let clashing = r##"{
        "$defs": {
            "a": {"$id": "urn:same"},
            "b": {"$id": "urn:same"}
        }
    }"##;
    let mut validator = Validator::new();
    let err = validator
        .register_schema("urn:clash", &parse_json(clashing).unwrap())
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateUri(_)));
}

#[test]
fn test_unknown_root_uri_is_schema_not_found() {
    let validator = Validator::new();
    let err = validator
        .validate("urn:nope", &parse_json("1").unwrap())
        .unwrap_err();
    assert!(matches!(err, SchemaError::SchemaNotFound(_)));
}

#[test]
fn test_urn_base_with_fragment_references() {
    let mut validator = Validator::builder().default_draft(Draft::Draft202012).build();
    let schema = r##"{"$ref": "#/$defs/A", "$defs": {"A": {"$anchor": "a", "type": "string"}}}"##;
    validator
        .register_schema("urn:test", &parse_json(schema).unwrap())
        .unwrap();
    assert!(
        validator
            .validate("urn:test", &parse_json("\"s\"").unwrap())
            .unwrap()
            .valid
    );
    assert!(
        validator
            .validate("urn:test#a", &parse_json("\"s\"").unwrap())
            .unwrap()
            .valid
    );
}
