use aether_document::{Document, DocumentError, UndoConfig};

#[test]
fn default_config_is_unlimited_with_coalescing() {
    let config = UndoConfig::default();
    assert_eq!(config.max_undo_groups, 0);
    assert!(config.coalesce_sets);
    assert_eq!(config, UndoConfig::unlimited());
}

#[test]
fn builders_set_fields() {
    let config = UndoConfig::unlimited()
        .with_max_undo_groups(16)
        .with_coalesce_sets(false);
    assert_eq!(config.max_undo_groups, 16);
    assert!(!config.coalesce_sets);
}

#[test]
fn parse_partial_config_uses_defaults() {
    let config = UndoConfig::from_json_str(r#"{"max_undo_groups": 50}"#).unwrap();
    assert_eq!(config, UndoConfig::default().with_max_undo_groups(50));

    let config = UndoConfig::from_json_str("{}").unwrap();
    assert_eq!(config, UndoConfig::default());
}

#[test]
fn parse_rejects_unknown_fields() {
    let result = UndoConfig::from_json_str(r#"{"max_groups": 5}"#);
    assert!(matches!(result, Err(DocumentError::Json(_))));
}

#[test]
fn parse_rejects_wrong_types() {
    assert!(UndoConfig::from_json_str(r#"{"coalesce_sets": "yes"}"#).is_err());
    assert!(UndoConfig::from_json_str(r#"{"max_undo_groups": -1}"#).is_err());
}

#[test]
fn config_serializes_back_to_json() {
    let config = UndoConfig::default().with_max_undo_groups(8);
    let text = serde_json::to_string(&config).unwrap();
    assert_eq!(text, r#"{"max_undo_groups":8,"coalesce_sets":true}"#);
    assert_eq!(UndoConfig::from_json_str(&text).unwrap(), config);
}

#[test]
fn document_exposes_its_config() {
    let config = UndoConfig::default().with_max_undo_groups(3);
    let doc = Document::with_config("test", config);
    assert_eq!(*doc.config(), config);
    assert_eq!(*Document::new("test").config(), UndoConfig::default());
}

#[test]
fn depth_limit_of_one_keeps_only_latest_group() {
    let mut doc = Document::with_config("test", UndoConfig::default().with_max_undo_groups(1));
    doc.root_mut().string_set("a");
    doc.end_undo_group();
    doc.root_mut().string_set("b");
    doc.end_undo_group();
    assert_eq!(doc.undo_stack_size(), 1);

    assert!(doc.undo());
    assert_eq!(doc.root().string_get().unwrap(), "a");
    assert!(!doc.undo());
}
