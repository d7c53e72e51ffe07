// Unit tests for lenient field decoding

use crate::json_fields::{lenient_port, lenient_string, nested, nested_or_default};

use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct Probe {
    #[serde(default, deserialize_with = "lenient_port")]
    port: u16,
    #[serde(default, deserialize_with = "lenient_string")]
    label: String,
    #[serde(default, deserialize_with = "nested_or_default")]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Required {
    #[serde(deserialize_with = "nested")]
    doc: Value,
}

/// **VALUE**: Verifies numbers and numeric strings both decode as ports.
#[test]
fn given_port_as_number_or_string_when_decoded_then_same_value() {
    let a: Probe = serde_json::from_value(json!({ "port": 35000 })).unwrap();
    let b: Probe = serde_json::from_value(json!({ "port": "35000" })).unwrap();

    assert_eq!(a.port, 35000);
    assert_eq!(b.port, 35000);
}

/// **VALUE**: Verifies out-of-range ports are rejected rather than truncated.
#[test]
fn given_out_of_range_port_when_decoded_then_error() {
    assert!(serde_json::from_value::<Probe>(json!({ "port": 70000 })).is_err());
    assert!(serde_json::from_value::<Probe>(json!({ "port": "abc" })).is_err());
}

/// **VALUE**: Verifies scalar values of any type become text and null becomes empty.
#[test]
fn given_scalar_labels_when_decoded_then_text() {
    let label = |v: Value| {
        serde_json::from_value::<Probe>(json!({ "label": v }))
            .unwrap()
            .label
    };

    assert_eq!(label(json!("x")), "x");
    assert_eq!(label(json!(7)), "7");
    assert_eq!(label(json!(true)), "true");
    assert_eq!(label(Value::Null), "");
}

/// **VALUE**: Verifies empty nested text decodes to the default, and bad text fails.
#[test]
fn given_nested_text_variants_when_decoded_then_default_or_error() {
    let empty: Probe = serde_json::from_value(json!({ "items": "" })).unwrap();
    assert!(empty.items.is_empty());

    let missing: Probe = serde_json::from_value(json!({})).unwrap();
    assert!(missing.items.is_empty());

    assert!(serde_json::from_value::<Probe>(json!({ "items": "[1," })).is_err());

    let doc: Required = serde_json::from_value(json!({ "doc": "{\"a\":1}" })).unwrap();
    assert_eq!(doc.doc, json!({ "a": 1 }));
}
