//! Full snapshot round trip: serialize a tree, load it back, compare state

use canopy::snapshot::{parse_full, SnapshotDocument, SnapshotMerger, SnapshotWriter};
use canopy::tree::Namespace;

/// Render both trees as full snapshots and compare structurally. Ids and
/// timestamps are part of the comparison.
fn same_tree(a: &Namespace, b: &Namespace) -> bool {
    SnapshotWriter::full(&mut a.clone()) == SnapshotWriter::full(&mut b.clone())
}

#[test]
fn test_full_snapshot_merge_with_zero_incrementals() {
    let mut ns = Namespace::new();
    ns.create_dir_all("/a/b").unwrap();
    ns.write("/a/b/c.txt", "hello", false).unwrap();

    let full = SnapshotWriter::full(&mut ns);
    let loaded = SnapshotMerger::load_full(&full).unwrap();

    let id = loaded.resolve("/a/b/c.txt").unwrap();
    let node = loaded.node(id).unwrap();
    assert_eq!(node.data(), Some("hello"));
    assert!(same_tree(&ns, &loaded));
}

#[test]
fn test_round_trip_through_json_text() {
    let mut ns = Namespace::new();
    ns.create_dir_all("/docs/notes").unwrap();
    ns.write("/docs/readme.md", "# hi", false).unwrap();
    ns.write("/docs/notes/a.txt", "one", false).unwrap();
    ns.touch("/empty.txt").unwrap();

    let doc = SnapshotDocument::Full(SnapshotWriter::full(&mut ns));
    let json = doc.to_json(true).unwrap();
    let reparsed = parse_full(&json).unwrap();
    let loaded = SnapshotMerger::load_full(&reparsed).unwrap();

    assert_eq!(loaded.node_count(), ns.node_count());
    assert!(same_tree(&ns, &loaded));
}

#[test]
fn test_loaded_tree_preserves_ids_and_timestamps() {
    let mut ns = Namespace::new();
    ns.write("/f.txt", "data", false).unwrap();
    let original_id = ns.resolve("/f.txt").unwrap();
    let original_time = ns.node(original_id).unwrap().mod_time;

    let full = SnapshotWriter::full(&mut ns);
    let loaded = SnapshotMerger::load_full(&full).unwrap();

    let loaded_id = loaded.resolve("/f.txt").unwrap();
    assert_eq!(loaded_id, original_id);
    assert_eq!(loaded.node(loaded_id).unwrap().mod_time, original_time);
}

#[test]
fn test_full_snapshot_resets_change_tracking() {
    let mut ns = Namespace::new();
    ns.create_dir_all("/a").unwrap();
    ns.write("/a/f.txt", "x", false).unwrap();
    assert!(!ns.pending_changes().is_empty());

    let _ = SnapshotWriter::full(&mut ns);
    assert!(ns.pending_changes().is_empty());

    // With nothing changed since the baseline, an incremental is empty.
    match SnapshotWriter::incremental(&mut ns) {
        SnapshotDocument::Incremental(inc) => assert!(inc.contents.is_empty()),
        SnapshotDocument::Full(_) => panic!("expected an incremental document"),
    }
}
