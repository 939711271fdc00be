//! Random mutation scripts checked against the snapshot pipeline
//!
//! A script is a sequence of mutations over a small fixed set of paths.
//! Operations on paths the tree cannot satisfy simply fail and are skipped,
//! which keeps scripts unconditionally applicable while still exercising
//! creates, writes, deletes, and moves in arbitrary interleavings.

use canopy::snapshot::{SnapshotDocument, SnapshotMerger, SnapshotWriter};
use canopy::tree::Namespace;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

#[derive(Debug, Clone)]
enum Op {
    Mkdir(String),
    Write(String, String),
    Append(String, String),
    Touch(String),
    Remove(String),
    Move(String, String),
    Copy(String, String),
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "/a".to_string(),
        "/b".to_string(),
        "/a/x".to_string(),
        "/a/y.txt".to_string(),
        "/a/x/deep.txt".to_string(),
        "/b/z.txt".to_string(),
        "/c.txt".to_string(),
    ])
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        path_strategy().prop_map(Op::Mkdir),
        (path_strategy(), "[a-z]{0,8}").prop_map(|(p, d)| Op::Write(p, d)),
        (path_strategy(), "[a-z]{0,8}").prop_map(|(p, d)| Op::Append(p, d)),
        path_strategy().prop_map(Op::Touch),
        path_strategy().prop_map(Op::Remove),
        (path_strategy(), path_strategy()).prop_map(|(s, d)| Op::Move(s, d)),
        (path_strategy(), path_strategy()).prop_map(|(s, d)| Op::Copy(s, d)),
    ]
}

fn apply(ns: &mut Namespace, op: &Op) {
    // Invalid operations fail and leave the tree untouched.
    let _ = match op {
        Op::Mkdir(p) => ns.create_dir_all(p),
        Op::Write(p, d) => ns.write(p, d, false),
        Op::Append(p, d) => ns.write(p, d, true),
        Op::Touch(p) => ns.touch(p),
        Op::Remove(p) => ns.remove(p, false),
        Op::Move(s, d) => ns.move_or_copy(s, d, false, true),
        Op::Copy(s, d) => ns.move_or_copy(s, d, true, true),
    };
}

fn render(ns: &Namespace) -> canopy::snapshot::FullSnapshot {
    SnapshotWriter::full(&mut ns.clone())
}

/// A full snapshot loads back into an identical tree, whatever produced it.
#[test]
fn test_full_round_trip_for_random_scripts() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec(op_strategy(), 0..40),
            |script| {
                let mut ns = Namespace::new();
                for op in &script {
                    apply(&mut ns, op);
                }

                let full = SnapshotWriter::full(&mut ns);
                let loaded = SnapshotMerger::load_full(&full)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(render(&ns), render(&loaded));
                Ok(())
            },
        )
        .unwrap();
}

/// Baseline plus one incremental reconstructs the live tree exactly.
#[test]
fn test_incremental_merge_matches_live_state() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(op_strategy(), 0..25),
                prop::collection::vec(op_strategy(), 0..25),
            ),
            |(before, after)| {
                let mut ns = Namespace::new();
                for op in &before {
                    apply(&mut ns, op);
                }
                let baseline = SnapshotWriter::full(&mut ns);

                for op in &after {
                    apply(&mut ns, op);
                }
                let doc = SnapshotWriter::incremental(&mut ns);

                let mut merged = SnapshotMerger::load_full(&baseline)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                match doc {
                    SnapshotDocument::Incremental(inc) => {
                        SnapshotMerger::apply(&mut merged, &inc)
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    }
                    SnapshotDocument::Full(full) => {
                        merged = SnapshotMerger::load_full(&full)
                            .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    }
                }
                prop_assert_eq!(render(&ns), render(&merged));
                Ok(())
            },
        )
        .unwrap();
}

/// Successive incrementals applied in order are equivalent to one final full.
#[test]
fn test_chained_incrementals_match_live_state() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::vec(prop::collection::vec(op_strategy(), 0..12), 1..4),
            |phases| {
                let mut ns = Namespace::new();
                let baseline = SnapshotWriter::full(&mut ns);
                let mut merged = SnapshotMerger::load_full(&baseline)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;

                for phase in &phases {
                    for op in phase {
                        apply(&mut ns, op);
                    }
                    match SnapshotWriter::incremental(&mut ns) {
                        SnapshotDocument::Incremental(inc) => {
                            SnapshotMerger::apply(&mut merged, &inc)
                                .map_err(|e| TestCaseError::fail(e.to_string()))?;
                        }
                        SnapshotDocument::Full(full) => {
                            merged = SnapshotMerger::load_full(&full)
                                .map_err(|e| TestCaseError::fail(e.to_string()))?;
                        }
                    }
                }
                prop_assert_eq!(render(&ns), render(&merged));
                Ok(())
            },
        )
        .unwrap();
}
