//! Snapshot pipeline
//!
//! Serializes a `Namespace` as a full snapshot (complete tree state) or an
//! incremental snapshot (only what the change log recorded since the last
//! full baseline), and reconstructs a tree by loading a full snapshot and
//! replaying incrementals in order.

pub mod document;
pub mod merger;
pub mod writer;

pub use document::{
    parse_document, parse_full, parse_incremental, DeltaEntry, FullSnapshot,
    IncrementalSnapshot, SnapshotDocument, TreeEntry,
};
pub use merger::SnapshotMerger;
pub use writer::SnapshotWriter;
