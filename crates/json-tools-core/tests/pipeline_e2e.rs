//! End-to-end scenarios over the byte-level API.

use json_tools_core::{
    flatten, generate_schema, paths_with_types, remove_empty_strings, remove_nulls, replace_keys,
    replace_values, Pipeline, TransformError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn parse(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[test]
fn flatten_basic() {
    let out = flatten(
        br#"{"user":{"name":"John","details":{"age":30,"city":"NYC"}}}"#,
        false,
        None,
    )
    .unwrap();
    assert_eq!(
        parse(&out),
        json!({"user.name":"John","user.details.age":30,"user.details.city":"NYC"})
    );
}

#[test]
fn flatten_with_array() {
    let out = flatten(br#"{"tags":["a","b"],"pos":[40.7,-74.0]}"#, false, None).unwrap();
    assert_eq!(
        parse(&out),
        json!({"tags[0]":"a","tags[1]":"b","pos[0]":40.7,"pos[1]":-74.0})
    );
}

#[test]
fn paths_with_types_scenario() {
    let out = paths_with_types(
        br#"{"user":{"name":"John","age":30,"active":true,"meta":null}}"#,
    )
    .unwrap();
    assert_eq!(
        parse(&out),
        json!({
            "user.name": "string",
            "user.age": "integer",
            "user.active": "boolean",
            "user.meta": "null"
        })
    );
}

#[test]
fn remove_empty_and_nulls() {
    let out = Pipeline::new()
        .add_json(br#"{"name":"John","email":"","phone":"555","address":null}"#)
        .unwrap()
        .remove_empty_strings()
        .remove_nulls()
        .build()
        .unwrap();
    assert_eq!(parse(&out), json!({"name":"John","phone":"555"}));
}

#[test]
fn replace_keys_whole_key_semantics() {
    // Whole-key replacement: every key matching `^old_` becomes exactly the
    // replacement, and identical rewritten keys collapse (last one wins).
    let out = replace_keys(br#"{"old_a":1,"old_b":2,"keep":3}"#, "^old_", "new_", false).unwrap();
    assert_eq!(parse(&out), json!({"new_":2,"keep":3}));

    // Fully anchored patterns rename one key without collapsing others.
    let out = replace_keys(br#"{"old_a":1,"old_b":2,"keep":3}"#, "^old_a$", "new_a", false)
        .unwrap();
    assert_eq!(parse(&out), json!({"new_a":1,"old_b":2,"keep":3}));
}

#[test]
fn replace_values_whole_value_semantics() {
    let out = replace_values(
        br#"{"a":"contains secret data","b":"fine"}"#,
        "secret",
        "[redacted]",
        false,
    )
    .unwrap();
    assert_eq!(parse(&out), json!({"a":"[redacted]","b":"fine"}));
}

#[test]
fn schema_merge_across_batch() {
    let out = generate_schema(
        br#"[{"id":1,"name":"a"},{"id":2,"name":"b","active":true}]"#,
        false,
        None,
    )
    .unwrap();
    let schema = parse(&out);
    assert_eq!(schema["$schema"], json!("http://json-schema.org/draft-07/schema#"));
    assert_eq!(schema["type"], json!("object"));
    assert_eq!(schema["properties"]["id"]["type"], json!("integer"));
    assert_eq!(schema["properties"]["name"]["type"], json!("string"));
    assert_eq!(
        schema["properties"]["active"]["type"],
        json!(["boolean", "null"])
    );
    assert_eq!(schema["required"], json!(["id", "name"]));
}

#[test]
fn single_function_filters() {
    assert_eq!(
        parse(&remove_empty_strings(br#"{"a":"","b":[""]}"#, false).unwrap()),
        json!({"b":[]})
    );
    assert_eq!(
        parse(&remove_nulls(br#"{"a":null,"b":[null,1]}"#, false).unwrap()),
        json!({"b":[1]})
    );
}

#[test]
fn pipeline_composes_filters_rewrites_and_flatten() {
    let out = Pipeline::new()
        .add_json(br#"{"old_user":{"name":"","id":7,"meta":null},"keep":true}"#)
        .unwrap()
        .remove_empty_strings()
        .remove_nulls()
        .replace_keys("^old_user$", "user")
        .flatten()
        .build()
        .unwrap();
    assert_eq!(parse(&out), json!({"user.id":7,"keep":true}));
}

#[test]
fn batch_flatten_with_explicit_threads() {
    let docs: Vec<Value> = (0..250)
        .map(|i| json!({"id": i, "inner": {"tags": ["a", "b"]}}))
        .collect();
    let bytes = serde_json::to_vec(&Value::Array(docs)).unwrap();

    let single = flatten(&bytes, false, Some(1)).unwrap();
    let multi = flatten(&bytes, false, Some(4)).unwrap();
    assert_eq!(parse(&single), parse(&multi));

    let arr = parse(&multi);
    let first = &arr.as_array().unwrap()[0];
    assert_eq!(first["inner.tags[0]"], json!("a"));
}

#[test]
fn batch_schema_with_explicit_threads() {
    let docs: Vec<Value> = (0..250)
        .map(|i| json!({"id": i, "score": if i % 2 == 0 { json!(i) } else { json!(0.5) }}))
        .collect();
    let bytes = serde_json::to_vec(&Value::Array(docs)).unwrap();

    let schema = parse(&generate_schema(&bytes, false, Some(4)).unwrap());
    assert_eq!(schema["properties"]["score"]["type"], json!("number"));
    assert_eq!(schema["required"], json!(["id", "score"]));
}

#[test]
fn errors_carry_their_kind() {
    assert!(matches!(
        flatten(b"{", false, None),
        Err(TransformError::Parse(_))
    ));
    assert!(matches!(
        replace_keys(b"{}", "([", "x", false),
        Err(TransformError::InvalidPattern { .. })
    ));
}
