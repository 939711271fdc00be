//! Namespace node types

use crate::types::NodeId;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Directory or file payload of a node.
///
/// Exhaustively matched at every operation site; a directory owns the mapping
/// from child name to child id, a file holds its opaque data payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Directory { children: BTreeMap<String, NodeId> },
    File { data: String },
}

impl NodeKind {
    pub fn empty_directory() -> Self {
        NodeKind::Directory {
            children: BTreeMap::new(),
        }
    }

    pub fn file(data: impl Into<String>) -> Self {
        NodeKind::File { data: data.into() }
    }
}

/// One node of the namespace tree.
///
/// `is_new` and `is_modified` are relative to the last full snapshot
/// baseline; only a successful full snapshot clears them.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub mod_time: DateTime<Utc>,
    pub is_new: bool,
    pub is_modified: bool,
    /// Non-owning back-reference; `None` only for the root.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Child map of a directory node, `None` for files.
    pub fn children(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut BTreeMap<String, NodeId>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    /// File payload, `None` for directories.
    pub fn data(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { data } => Some(data),
            NodeKind::Directory { .. } => None,
        }
    }
}
