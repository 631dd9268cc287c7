use aether_document::{Document, DocumentError, ValueType};
use serde_json::json;

fn keys(doc: &Document) -> Vec<String> {
    doc.root()
        .object_iter()
        .unwrap()
        .map(|(key, _)| key.to_owned())
        .collect()
}

/// An object document `{ "a": 1, "b": 2, "c": 3 }` with the build committed.
fn abc_object() -> Document {
    let mut doc = Document::new("test");
    let mut root = doc.root_mut();
    root.object_initialize(3);
    for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
        root.object_set(key).unwrap().number_set(i + 1);
    }
    doc.end_undo_group();
    doc
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn array_append_returns_null_child() {
    let mut doc = Document::new("test");
    let mut root = doc.root_mut();
    root.array_initialize(0);
    let child = root.array_append().unwrap();
    assert_eq!(child.value_type(), ValueType::Null);
    assert_eq!(doc.root().array_len().unwrap(), 1);
}

#[test]
fn array_insert_shifts_later_elements() {
    let mut doc = Document::from_json_str("test", "[1, 2, 3]").unwrap();
    doc.root_mut().array_insert(0).unwrap().number_set(0);
    doc.root_mut().array_insert(4).unwrap().number_set(4);
    assert_eq!(doc.to_json().unwrap(), json!([0, 1, 2, 3, 4]));
}

#[test]
fn array_insert_past_end_is_bounds_error() {
    let mut doc = Document::from_json_str("test", "[1]").unwrap();
    let err = doc.root_mut().array_insert(2).unwrap_err();
    assert!(matches!(err, DocumentError::Bounds { index: 2, len: 1 }));
    assert_eq!(doc.pending_action_count(), 0);
    assert_eq!(doc.root().array_len().unwrap(), 1);
}

#[test]
fn array_get_and_remove_bounds() {
    let mut doc = Document::from_json_str("test", "[1, 2]").unwrap();
    assert!(matches!(
        doc.root().array_get(2),
        Err(DocumentError::Bounds { index: 2, len: 2 })
    ));
    assert!(matches!(
        doc.root_mut().array_remove(2),
        Err(DocumentError::Bounds { index: 2, len: 2 })
    ));
    assert!(matches!(
        doc.root_mut().array_get_mut(5),
        Err(DocumentError::Bounds { .. })
    ));
    assert_eq!(doc.pending_action_count(), 0);
}

#[test]
fn array_remove_shifts_left_and_undo_restores_index() {
    let mut doc = Document::from_json_str("test", r#"["first", "second", "third"]"#).unwrap();
    doc.root_mut().array_remove(1).unwrap();
    doc.end_undo_group();
    assert_eq!(doc.to_json().unwrap(), json!(["first", "third"]));

    assert!(doc.undo());
    assert_eq!(doc.to_json().unwrap(), json!(["first", "second", "third"]));
    assert!(doc.redo());
    assert_eq!(doc.to_json().unwrap(), json!(["first", "third"]));
}

#[test]
fn array_get_mut_edits_in_place() {
    let mut doc = Document::from_json_str("test", "[1, 2, 3]").unwrap();
    doc.root_mut().array_get_mut(1).unwrap().string_set("two");
    doc.end_undo_group();
    assert_eq!(doc.to_json().unwrap(), json!([1, "two", 3]));
    doc.undo();
    assert_eq!(doc.to_json().unwrap(), json!([1, 2, 3]));
}

#[test]
fn array_operations_fail_on_non_arrays() {
    let mut doc = Document::new("test");
    doc.root_mut().object_initialize(0);
    doc.end_undo_group();

    let mut root = doc.root_mut();
    assert!(matches!(
        root.array_append(),
        Err(DocumentError::Type {
            expected: ValueType::Array,
            found: ValueType::Object
        })
    ));
    assert!(root.array_insert(0).is_err());
    assert!(root.array_remove(0).is_err());
    assert!(root.array_get_mut(0).is_err());
    assert!(root.array_len().is_err());
    assert_eq!(doc.pending_action_count(), 0);
}

#[test]
fn array_append_does_not_auto_initialize_null() {
    let mut doc = Document::new("test");
    assert!(matches!(
        doc.root_mut().array_append(),
        Err(DocumentError::Type {
            expected: ValueType::Array,
            found: ValueType::Null
        })
    ));
    assert!(doc.root().is_null());
}

#[test]
fn removing_nested_subtree_restores_it_on_undo() {
    let mut doc = Document::new("test");
    let mut root = doc.root_mut();
    root.array_initialize(4);
    root.array_append()
        .unwrap()
        .object_initialize(2)
        .object_set("nested")
        .unwrap()
        .string_set("deep");
    doc.end_undo_group();

    doc.root_mut()
        .array_get_mut(0)
        .unwrap()
        .object_set("nested")
        .unwrap()
        .string_set("modified");
    doc.end_undo_group();
    doc.undo();

    doc.root_mut().array_remove(0).unwrap();
    doc.end_undo_group();
    assert_eq!(doc.root().array_len().unwrap(), 0);
    assert_eq!((doc.undo_stack_size(), doc.redo_stack_size()), (2, 0));

    assert!(doc.undo());
    assert_eq!(doc.to_json().unwrap(), json!([{ "nested": "deep" }]));
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn object_set_returns_existing_entry_in_place() {
    let mut doc = abc_object();
    doc.root_mut().object_set("a").unwrap();
    assert_eq!(doc.pending_action_count(), 0);
    doc.root_mut().object_set("a").unwrap().number_set(10);
    assert_eq!(keys(&doc), ["a", "b", "c"]);
    assert_eq!(doc.to_json().unwrap(), json!({ "a": 10, "b": 2, "c": 3 }));
}

#[test]
fn object_get_key_and_value_by_index() {
    let doc = abc_object();
    let root = doc.root();
    assert_eq!(root.object_get_key(2).unwrap(), "c");
    assert_eq!(root.object_get_value(1).unwrap().number_get::<u8>().unwrap(), 2);
    assert!(matches!(
        root.object_get_key(3),
        Err(DocumentError::Bounds { index: 3, len: 3 })
    ));
    assert!(matches!(
        root.object_get_value(3),
        Err(DocumentError::Bounds { index: 3, len: 3 })
    ));
}

#[test]
fn object_try_get_missing_key_is_none() {
    let doc = abc_object();
    assert!(doc.root().object_try_get("missing").unwrap().is_none());
    assert!(doc.root().object_try_get("b").unwrap().is_some());
}

#[test]
fn object_try_get_mut_and_value_mut() {
    let mut doc = abc_object();
    doc.root_mut()
        .object_try_get_mut("b")
        .unwrap()
        .unwrap()
        .bool_set(true);
    doc.root_mut()
        .object_get_value_mut(2)
        .unwrap()
        .string_set("three");
    assert!(doc.root_mut().object_try_get_mut("zzz").unwrap().is_none());
    assert!(doc.root_mut().object_get_value_mut(3).is_err());
    assert_eq!(doc.to_json().unwrap(), json!({ "a": 1, "b": true, "c": "three" }));
}

#[test]
fn object_remove_missing_key_records_nothing() {
    let mut doc = abc_object();
    assert!(!doc.root_mut().object_remove("missing").unwrap());
    doc.end_undo_group();
    assert_eq!(doc.undo_stack_size(), 1);
    assert_eq!(doc.root().object_len().unwrap(), 3);
}

#[test]
fn object_remove_and_undo_restore_key_and_value() {
    let mut doc = abc_object();
    assert!(doc.root_mut().object_remove("a").unwrap());
    doc.end_undo_group();
    assert_eq!(keys(&doc), ["b", "c"]);
    assert!(doc.root().object_try_get("a").unwrap().is_none());

    assert!(doc.undo());
    assert_eq!(keys(&doc), ["a", "b", "c"]);
    assert_eq!(doc.to_json().unwrap(), json!({ "a": 1, "b": 2, "c": 3 }));

    assert!(doc.redo());
    assert_eq!(keys(&doc), ["b", "c"]);
}

#[test]
fn reinserting_removed_key_appends_at_end() {
    let mut doc = abc_object();
    doc.root_mut().object_remove("a").unwrap();
    doc.end_undo_group();
    doc.root_mut().object_set("a").unwrap().number_set(1);
    doc.end_undo_group();
    assert_eq!(keys(&doc), ["b", "c", "a"]);

    doc.undo();
    assert_eq!(keys(&doc), ["b", "c"]);
    doc.undo();
    assert_eq!(keys(&doc), ["a", "b", "c"]);
}

#[test]
fn undo_of_multiple_removals_restores_exact_order() {
    let mut doc = Document::new("test");
    let mut root = doc.root_mut();
    root.object_initialize(0);
    for key in ["k0", "k1", "k2", "k3", "k4", "k5"] {
        root.object_set(key).unwrap().string_set(key);
    }
    doc.end_undo_group();

    let mut root = doc.root_mut();
    root.object_remove("k1").unwrap();
    root.object_remove("k4").unwrap();
    root.object_remove("k0").unwrap();
    doc.end_undo_group();
    assert_eq!(keys(&doc), ["k2", "k3", "k5"]);

    doc.undo();
    assert_eq!(keys(&doc), ["k0", "k1", "k2", "k3", "k4", "k5"]);
}

#[test]
fn object_operations_fail_on_non_objects() {
    let mut doc = Document::new("test");
    doc.root_mut().array_initialize(0);
    let mut root = doc.root_mut();
    assert!(matches!(
        root.object_set("k"),
        Err(DocumentError::Type {
            expected: ValueType::Object,
            found: ValueType::Array
        })
    ));
    assert!(root.object_remove("k").is_err());
    assert!(root.object_try_get_mut("k").is_err());
    assert!(root.object_len().is_err());
    assert!(doc.root().object_try_get("k").is_err());
    assert!(doc.root().object_iter().is_err());
}

#[test]
fn long_keys_and_strings() {
    let mut doc = Document::new("test");
    let key = "k".repeat(4096);
    let value = "v".repeat(1 << 16);
    let mut root = doc.root_mut();
    root.object_initialize(1);
    root.object_set(&key).unwrap().string_set(&value);
    let stored = doc.root().object_try_get(&key).unwrap().unwrap();
    assert_eq!(stored.string_get().unwrap().len(), 1 << 16);
}

// ============================================================================
// Iteration
// ============================================================================

#[test]
fn iterators_visit_in_order() {
    let doc = Document::from_json_str("test", r#"{"z": [3, 1, 2], "a": null}"#).unwrap();
    let entries: Vec<(&str, ValueType)> = doc
        .root()
        .object_iter()
        .unwrap()
        .map(|(key, value)| (key, value.value_type()))
        .collect();
    assert_eq!(entries, [("z", ValueType::Array), ("a", ValueType::Null)]);

    let z = doc.root().object_try_get("z").unwrap().unwrap();
    let numbers: Vec<i32> = z
        .array_iter()
        .unwrap()
        .map(|item| item.number_get().unwrap())
        .collect();
    assert_eq!(numbers, [3, 1, 2]);
}
