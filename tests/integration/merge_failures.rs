//! Failure paths of snapshot parsing and merging

use canopy::error::SnapshotError;
use canopy::snapshot::{
    parse_document, parse_full, DeltaEntry, IncrementalSnapshot, SnapshotMerger, SnapshotWriter,
};
use canopy::tree::Namespace;
use chrono::Utc;

#[test]
fn test_garbage_input_fails_to_parse() {
    assert!(matches!(
        parse_document("{{{"),
        Err(SnapshotError::Parse(_))
    ));
}

#[test]
fn test_missing_header_tag_is_rejected() {
    let input = r#"{"mod_time": "2024-01-01T00:00:00Z", "contents": []}"#;
    assert!(matches!(
        parse_document(input),
        Err(SnapshotError::InvalidHeader(_))
    ));
}

#[test]
fn test_incremental_where_full_expected_is_rejected() {
    let input = r#"{"document": "incremental", "mod_time": "2024-01-01T00:00:00Z", "contents": []}"#;
    assert!(matches!(
        parse_full(input),
        Err(SnapshotError::InvalidHeader(_))
    ));
}

#[test]
fn test_create_without_id_aborts_the_merge() {
    let mut ns = Namespace::new();
    let baseline = SnapshotWriter::full(&mut ns);

    let inc = IncrementalSnapshot {
        mod_time: Utc::now(),
        contents: vec![DeltaEntry::File {
            name: "f.txt".to_string(),
            id: None,
            mod_time: Some(Utc::now()),
            data: Some("data".to_string()),
        }],
    };

    let mut merged = SnapshotMerger::load_full(&baseline).unwrap();
    let err = SnapshotMerger::apply(&mut merged, &inc).unwrap_err();
    assert!(matches!(
        err,
        SnapshotError::MissingField { field: "id", .. }
    ));
}

#[test]
fn test_duplicate_ids_in_full_snapshot_are_rejected() {
    let input = r#"{
        "document": "full",
        "id": 1,
        "mod_time": "2024-01-01T00:00:00Z",
        "contents": [
            {"type": "file", "name": "a", "id": 2, "mod_time": "2024-01-01T00:00:00Z", "data": ""},
            {"type": "file", "name": "b", "id": 2, "mod_time": "2024-01-01T00:00:00Z", "data": ""}
        ]
    }"#;
    let full = parse_full(input).unwrap();
    assert!(matches!(
        SnapshotMerger::load_full(&full),
        Err(SnapshotError::Parse(_))
    ));
}

#[test]
fn test_deleting_a_missing_entry_is_not_an_error() {
    let mut ns = Namespace::new();
    ns.create_dir_all("/a").unwrap();
    let baseline = SnapshotWriter::full(&mut ns);

    let inc = IncrementalSnapshot {
        mod_time: Utc::now(),
        contents: vec![DeltaEntry::Deleted {
            name: "ghost".to_string(),
        }],
    };

    let mut merged = SnapshotMerger::load_full(&baseline).unwrap();
    SnapshotMerger::apply(&mut merged, &inc).unwrap();
    assert!(merged.resolve("/a").is_ok());
}
