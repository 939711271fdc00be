//! Snapshot merge reconstruction
//!
//! Rebuilds a namespace tree by loading a full snapshot verbatim (supplied
//! ids and timestamps are ground truth) and then replaying incremental
//! snapshots in order, top-down. Any failure is fatal for the whole run: a
//! partially reconstructed tree is never emitted as a baseline.

use crate::error::SnapshotError;
use crate::snapshot::document::{DeltaEntry, FullSnapshot, IncrementalSnapshot, TreeEntry};
use crate::tree::path;
use crate::tree::{Namespace, Node, NodeKind};
use crate::types::NodeId;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

pub struct SnapshotMerger;

impl SnapshotMerger {
    /// Build a fresh tree exactly as the full snapshot describes it. No
    /// replay happens at this stage.
    #[instrument(skip(doc))]
    pub fn load_full(doc: &FullSnapshot) -> Result<Namespace, SnapshotError> {
        let mut ns = Namespace::with_root(doc.id, doc.mod_time);
        let root = ns.root();
        Self::graft_entries(&mut ns, root, &doc.contents)?;
        debug!(nodes = ns.node_count(), "loaded full snapshot");
        Ok(ns)
    }

    fn graft_entries(
        ns: &mut Namespace,
        parent: NodeId,
        entries: &[TreeEntry],
    ) -> Result<(), SnapshotError> {
        for entry in entries {
            match entry {
                TreeEntry::Directory {
                    name,
                    id,
                    mod_time,
                    contents,
                } => {
                    Self::check_fresh_id(ns, *id)?;
                    let dir = ns.graft(parent, name, NodeKind::empty_directory(), *id, *mod_time)?;
                    Self::graft_entries(ns, dir, contents)?;
                }
                TreeEntry::File {
                    name,
                    id,
                    mod_time,
                    data,
                } => {
                    Self::check_fresh_id(ns, *id)?;
                    ns.graft(parent, name, NodeKind::file(data.clone()), *id, *mod_time)?;
                }
            }
        }
        Ok(())
    }

    fn check_fresh_id(ns: &Namespace, id: NodeId) -> Result<(), SnapshotError> {
        if ns.node(id).is_some() {
            return Err(SnapshotError::Parse(format!(
                "duplicate node id {} in full snapshot",
                id
            )));
        }
        Ok(())
    }

    /// Replay one incremental snapshot onto a previously reconstructed
    /// tree. Deletions are carried out in a first pass over the whole
    /// document, then creations and updates top-down, each directory's own
    /// entry before its nested entries. A moved node reappears under a new
    /// parent with its old id, so every stale copy must be gone before any
    /// entry re-homes a live id.
    #[instrument(skip(ns, delta))]
    pub fn apply(ns: &mut Namespace, delta: &IncrementalSnapshot) -> Result<(), SnapshotError> {
        let root = ns.root();
        ns.set_mod_time_unlogged(root, delta.mod_time);
        Self::apply_deletions(ns, root, &delta.contents);
        Self::apply_entries(ns, root, "/", &delta.contents)
    }

    /// First pass: every `deleted` entry in the document, depth-first.
    /// Recursion only descends into directories that already exist; a fresh
    /// subtree carried by a creation entry cannot contain deletions.
    fn apply_deletions(ns: &mut Namespace, dir: NodeId, entries: &[DeltaEntry]) {
        for entry in entries {
            match entry {
                DeltaEntry::Deleted { name } => {
                    // Authoritative; an already-absent path is a satisfied
                    // no-op.
                    if let Some(existing) = ns.child(dir, name) {
                        ns.remove_subtree_unlogged(existing);
                    }
                }
                DeltaEntry::Directory { name, contents, .. } => {
                    if let Some(child) = ns.child(dir, name) {
                        if ns.node(child).map(Node::is_dir).unwrap_or(false) {
                            Self::apply_deletions(ns, child, contents);
                        }
                    }
                }
                DeltaEntry::File { .. } => {}
            }
        }
    }

    fn apply_entries(
        ns: &mut Namespace,
        dir: NodeId,
        dir_path: &str,
        entries: &[DeltaEntry],
    ) -> Result<(), SnapshotError> {
        for entry in entries {
            match entry {
                DeltaEntry::Deleted { name } => {
                    // Normally satisfied by the deletion pass already; still
                    // honored here so a delete ordered after a creation of
                    // the same name wins.
                    if let Some(existing) = ns.child(dir, name) {
                        ns.remove_subtree_unlogged(existing);
                    }
                }
                DeltaEntry::Directory {
                    name,
                    id,
                    mod_time,
                    contents,
                } => {
                    let p = path::join(dir_path, name);
                    let target = Self::apply_directory(ns, dir, &p, name, *id, *mod_time)?;
                    Self::apply_entries(ns, target, &p, contents)?;
                }
                DeltaEntry::File {
                    name,
                    id,
                    mod_time,
                    data,
                } => {
                    let p = path::join(dir_path, name);
                    Self::apply_file(ns, dir, &p, name, *id, *mod_time, data.as_deref())?;
                }
            }
        }
        Ok(())
    }

    fn apply_directory(
        ns: &mut Namespace,
        dir: NodeId,
        p: &str,
        name: &str,
        id: Option<NodeId>,
        mod_time: Option<DateTime<Utc>>,
    ) -> Result<NodeId, SnapshotError> {
        match ns.child(dir, name) {
            None => {
                // Creation requires an id.
                let id = id.ok_or_else(|| SnapshotError::MissingField {
                    path: p.to_string(),
                    field: "id",
                })?;
                let t = mod_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                Ok(ns.graft(dir, name, NodeKind::empty_directory(), id, t)?)
            }
            Some(existing) => {
                let (cur_id, is_dir) = match ns.node(existing) {
                    Some(node) => (node.id, node.is_dir()),
                    None => (existing, false),
                };
                let replace = !is_dir || matches!(id, Some(new_id) if new_id != cur_id);
                if replace {
                    // Same path, unrelated object: delete the old node and
                    // create a new one from the supplied fields only.
                    let new_id = id.ok_or_else(|| SnapshotError::MissingField {
                        path: p.to_string(),
                        field: "id",
                    })?;
                    debug!(path = %p, old_id = cur_id, new_id, "replacing node on id mismatch");
                    ns.remove_subtree_unlogged(existing);
                    let t = mod_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                    Ok(ns.graft(dir, name, NodeKind::empty_directory(), new_id, t)?)
                } else {
                    if let Some(t) = mod_time {
                        ns.set_mod_time_unlogged(existing, t);
                    }
                    Ok(existing)
                }
            }
        }
    }

    fn apply_file(
        ns: &mut Namespace,
        dir: NodeId,
        p: &str,
        name: &str,
        id: Option<NodeId>,
        mod_time: Option<DateTime<Utc>>,
        data: Option<&str>,
    ) -> Result<(), SnapshotError> {
        match ns.child(dir, name) {
            None => {
                let id = id.ok_or_else(|| SnapshotError::MissingField {
                    path: p.to_string(),
                    field: "id",
                })?;
                // Absent optional fields on a creation default to empty
                // values, never inherited from anything.
                let t = mod_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                let kind = NodeKind::file(data.unwrap_or_default());
                ns.graft(dir, name, kind, id, t)?;
                Ok(())
            }
            Some(existing) => {
                let (cur_id, is_dir) = match ns.node(existing) {
                    Some(node) => (node.id, node.is_dir()),
                    None => (existing, true),
                };
                let replace = is_dir || matches!(id, Some(new_id) if new_id != cur_id);
                if replace {
                    let new_id = id.ok_or_else(|| SnapshotError::MissingField {
                        path: p.to_string(),
                        field: "id",
                    })?;
                    debug!(path = %p, old_id = cur_id, new_id, "replacing node on id mismatch");
                    ns.remove_subtree_unlogged(existing);
                    let t = mod_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                    ns.graft(dir, name, NodeKind::file(data.unwrap_or_default()), new_id, t)?;
                } else {
                    // In-place update: only the fields present in the entry.
                    if let Some(t) = mod_time {
                        ns.set_mod_time_unlogged(existing, t);
                    }
                    if let Some(d) = data {
                        ns.set_data_unlogged(existing, d);
                    }
                }
                Ok(())
            }
        }
    }
}
