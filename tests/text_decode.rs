//! Text-tree decoding: path descent, required/optional policy, container shapes.

use std::collections::HashMap;

use autocodec::{CodecError, FieldDescriptor, FieldError, Record, RecordId, Registry};
use serde_json::json;

#[derive(Debug, PartialEq)]
struct Smelting {
    id: RecordId,
    count: i32,
    tags: Vec<String>,
}

impl Record for Smelting {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::scalar("count", "data/count", |r: &Smelting| &r.count, |r, v| r.count = v),
            FieldDescriptor::list("tags", "tags", |r: &Smelting| &r.tags, |r, v| r.tags = v).optional(),
        ]
    }
}

#[derive(Debug, PartialEq)]
struct Loot {
    id: RecordId,
    weights: HashMap<String, i32>,
    slots: HashMap<u8, String>,
}

impl Record for Loot {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::map("weights", "weights", |r: &Loot| &r.weights, |r, v| r.weights = v),
            FieldDescriptor::map("slots", "slots", |r: &Loot| &r.slots, |r, v| r.slots = v),
        ]
    }
}

fn rid(s: &str) -> RecordId {
    s.parse().expect("record id")
}

fn smelting_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_record_type::<Smelting, _>(rid("mymod:smelting"), |id| Smelting {
        id,
        count: 0,
        tags: Vec::new(),
    });
    registry
}

fn loot_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_record_type::<Loot, _>(rid("mymod:loot"), |id| Loot {
        id,
        weights: HashMap::new(),
        slots: HashMap::new(),
    });
    registry
}

#[test]
fn decode_required_and_optional_fields() {
    let registry = smelting_registry();
    let doc = json!({"data": {"count": 5}, "tags": ["a", "b"]});
    let rec: Smelting = registry.decode_text(rid("mymod:one"), &doc).expect("decode");
    assert_eq!(rec.count, 5);
    assert_eq!(rec.tags, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(rec.id, rid("mymod:one"));
}

#[test]
fn missing_optional_field_keeps_factory_default() {
    let registry = smelting_registry();
    let doc = json!({"data": {"count": 5}});
    let rec: Smelting = registry.decode_text(rid("mymod:one"), &doc).expect("decode");
    assert_eq!(rec.count, 5);
    assert!(rec.tags.is_empty());
}

#[test]
fn missing_required_field_fails() {
    let registry = smelting_registry();
    let doc = json!({"tags": ["a"]});
    let err = registry
        .decode_text::<Smelting>(rid("mymod:one"), &doc)
        .expect_err("decode must fail");
    match err {
        CodecError::MissingRequiredField { field, source, .. } => {
            assert_eq!(field, "count");
            // "data" is absent entirely, so the path itself cannot be walked.
            assert!(matches!(source, FieldError::MalformedPath(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn intermediate_segment_not_an_object_fails() {
    let registry = smelting_registry();
    let doc = json!({"data": 7, "tags": []});
    let err = registry
        .decode_text::<Smelting>(rid("mymod:one"), &doc)
        .expect_err("decode must fail");
    match err {
        CodecError::MissingRequiredField { source, .. } => {
            assert!(matches!(source, FieldError::MalformedPath(seg) if seg == "data"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn inline_single_value_list() {
    let registry = smelting_registry();
    let bare = json!({"data": {"count": 1}, "tags": "solo"});
    let wrapped = json!({"data": {"count": 1}, "tags": ["solo"]});
    let from_bare: Smelting = registry.decode_text(rid("mymod:a"), &bare).expect("decode");
    let from_wrapped: Smelting = registry
        .decode_text(rid("mymod:a"), &wrapped)
        .expect("decode");
    assert_eq!(from_bare.tags, vec!["solo".to_string()]);
    assert_eq!(from_bare, from_wrapped);
}

#[test]
fn malformed_optional_value_is_skipped() {
    let registry = smelting_registry();
    // Numbers where strings were declared: the optional field falls back to
    // its default rather than poisoning the record.
    let doc = json!({"data": {"count": 2}, "tags": [1, 2]});
    let rec: Smelting = registry.decode_text(rid("mymod:one"), &doc).expect("decode");
    assert_eq!(rec.count, 2);
    assert!(rec.tags.is_empty());
}

#[test]
fn malformed_required_value_fails() {
    let registry = smelting_registry();
    let doc = json!({"data": {"count": "five"}});
    let err = registry
        .decode_text::<Smelting>(rid("mymod:one"), &doc)
        .expect_err("decode must fail");
    match err {
        CodecError::MissingRequiredField { field, source, .. } => {
            assert_eq!(field, "count");
            assert!(matches!(source, FieldError::Malformed(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn map_fields_with_string_and_constructed_keys() {
    let registry = loot_registry();
    let doc = json!({
        "weights": {"gold": 3, "iron": 9},
        "slots": {"1": "sword", "2": "shield"},
    });
    let rec: Loot = registry.decode_text(rid("mymod:chest"), &doc).expect("decode");
    assert_eq!(rec.weights.get("gold"), Some(&3));
    assert_eq!(rec.weights.get("iron"), Some(&9));
    assert_eq!(rec.slots.get(&1), Some(&"sword".to_string()));
    assert_eq!(rec.slots.get(&2), Some(&"shield".to_string()));
}

#[test]
fn unparsable_map_key_fails_construction() {
    let registry = loot_registry();
    let doc = json!({
        "weights": {"gold": 3},
        "slots": {"left": "sword"},
    });
    let err = registry
        .decode_text::<Loot>(rid("mymod:chest"), &doc)
        .expect_err("decode must fail");
    match err {
        CodecError::MissingRequiredField { field, source, .. } => {
            assert_eq!(field, "slots");
            assert!(matches!(source, FieldError::KeyConstruction { key, .. } if key == "left"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn map_leaf_must_be_an_object() {
    let registry = loot_registry();
    let doc = json!({"weights": [3, 9], "slots": {}});
    let err = registry
        .decode_text::<Loot>(rid("mymod:chest"), &doc)
        .expect_err("decode must fail");
    match err {
        CodecError::MissingRequiredField { field, source, .. } => {
            assert_eq!(field, "weights");
            assert!(matches!(source, FieldError::NotAnObject));
        }
        other => panic!("unexpected error: {other}"),
    }
}
