//! Snapshot document schema and parsing
//!
//! JSON documents with an explicit top-level tag (`"document": "full"` or
//! `"incremental"`) and typed entries. Mandatory versus optional fields are
//! encoded in the schema itself: a full-snapshot entry always carries `id`
//! and `mod_time`, while an incremental entry carries only what changed and
//! a `deleted` entry carries nothing but its name.

use crate::error::SnapshotError;
use crate::types::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level snapshot document. The tag is part of the header; a missing or
/// unknown tag aborts parsing before any tree is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "document", rename_all = "lowercase")]
pub enum SnapshotDocument {
    Full(FullSnapshot),
    Incremental(IncrementalSnapshot),
}

/// Complete serialization of the tree: root identity plus nested contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullSnapshot {
    /// Root node id.
    pub id: NodeId,
    /// Root modification time.
    pub mod_time: DateTime<Utc>,
    pub contents: Vec<TreeEntry>,
}

/// One entry of a full snapshot. Every field is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeEntry {
    Directory {
        name: String,
        id: NodeId,
        mod_time: DateTime<Utc>,
        contents: Vec<TreeEntry>,
    },
    File {
        name: String,
        id: NodeId,
        mod_time: DateTime<Utc>,
        data: String,
    },
}

/// Changes recorded since the last full baseline, organized as a nested
/// structure mirroring the path hierarchy of the changed entries only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalSnapshot {
    /// New root timestamp.
    pub mod_time: DateTime<Utc>,
    pub contents: Vec<DeltaEntry>,
}

/// One entry of an incremental snapshot.
///
/// A `deleted` entry is authoritative and may denote whole-subtree removal.
/// Directory and file entries carry only the fields that changed; `id` is
/// present exactly when the entry denotes a fresh creation (and is mandatory
/// for the merge to create anything). A directory entry without an id is a
/// container reached only to describe deeper changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeltaEntry {
    Deleted {
        name: String,
    },
    Directory {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<NodeId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mod_time: Option<DateTime<Utc>>,
        #[serde(default)]
        contents: Vec<DeltaEntry>,
    },
    File {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<NodeId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mod_time: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
}

impl DeltaEntry {
    pub fn name(&self) -> &str {
        match self {
            DeltaEntry::Deleted { name }
            | DeltaEntry::Directory { name, .. }
            | DeltaEntry::File { name, .. } => name,
        }
    }
}

impl SnapshotDocument {
    /// Render as JSON, optionally pretty-printed.
    pub fn to_json(&self, pretty: bool) -> Result<String, SnapshotError> {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.map_err(|e| SnapshotError::Parse(e.to_string()))
    }
}

/// Parse a snapshot document, validating the header tag before building
/// anything.
pub fn parse_document(input: &str) -> Result<SnapshotDocument, SnapshotError> {
    let value: serde_json::Value =
        serde_json::from_str(input).map_err(|e| SnapshotError::Parse(e.to_string()))?;
    match value.get("document").and_then(|v| v.as_str()) {
        Some("full") | Some("incremental") => {}
        Some(other) => {
            return Err(SnapshotError::InvalidHeader(format!(
                "unknown document tag {:?}",
                other
            )))
        }
        None => {
            return Err(SnapshotError::InvalidHeader(
                "missing document tag".to_string(),
            ))
        }
    }
    serde_json::from_value(value).map_err(|e| SnapshotError::Parse(e.to_string()))
}

/// Parse input that must be a full snapshot.
pub fn parse_full(input: &str) -> Result<FullSnapshot, SnapshotError> {
    match parse_document(input)? {
        SnapshotDocument::Full(full) => Ok(full),
        SnapshotDocument::Incremental(_) => Err(SnapshotError::InvalidHeader(
            "expected a full snapshot, found an incremental".to_string(),
        )),
    }
}

/// Parse input that must be an incremental snapshot.
pub fn parse_incremental(input: &str) -> Result<IncrementalSnapshot, SnapshotError> {
    match parse_document(input)? {
        SnapshotDocument::Incremental(inc) => Ok(inc),
        SnapshotDocument::Full(_) => Err(SnapshotError::InvalidHeader(
            "expected an incremental snapshot, found a full".to_string(),
        )),
    }
}
