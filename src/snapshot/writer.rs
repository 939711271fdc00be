//! Snapshot generation
//!
//! Full snapshots serialize the entire tree and establish a new baseline:
//! on success every `is_new`/`is_modified` flag is cleared and the change
//! log drained, so a full write must be the terminal step of any snapshot
//! cycle. Incremental snapshots reorganize the drained change log into a
//! nested structure covering only the paths that changed, leaving the
//! baseline flags intact. When the log cannot be turned into a coherent
//! incremental, the writer falls back to a full snapshot so a snapshot
//! request always yields a valid baseline.

use crate::changelog::{ChangeAction, ChangeEntry};
use crate::snapshot::document::{
    DeltaEntry, FullSnapshot, IncrementalSnapshot, SnapshotDocument, TreeEntry,
};
use crate::tree::path;
use crate::tree::{Namespace, Node, NodeKind};
use crate::types::NodeId;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

pub struct SnapshotWriter;

impl SnapshotWriter {
    /// Serialize the complete tree and reset modification bookkeeping.
    #[instrument(skip(ns))]
    pub fn full(ns: &mut Namespace) -> FullSnapshot {
        let contents = Self::emit_tree(ns, ns.root());
        let root = ns.root_node();
        let snapshot = FullSnapshot {
            id: root.id,
            mod_time: root.mod_time,
            contents,
        };
        ns.clear_baseline_flags();
        let drained = ns.drain_log();
        info!(
            nodes = ns.node_count(),
            drained_entries = drained.len(),
            "full snapshot written; new baseline established"
        );
        snapshot
    }

    /// Serialize only the changes recorded since the last full baseline.
    ///
    /// Drains the change log on success but leaves `is_new`/`is_modified`
    /// intact: they stay valid relative to the last full baseline. Falls
    /// back to a full snapshot when the log is unusable.
    #[instrument(skip(ns))]
    pub fn incremental(ns: &mut Namespace) -> SnapshotDocument {
        match Self::build_delta(ns) {
            Ok(delta) => {
                let drained = ns.drain_log();
                info!(
                    drained_entries = drained.len(),
                    "incremental snapshot written"
                );
                SnapshotDocument::Incremental(delta)
            }
            Err(reason) => {
                warn!(%reason, "change log unusable; falling back to a full snapshot");
                SnapshotDocument::Full(Self::full(ns))
            }
        }
    }

    // ---- full serialization ----

    fn emit_tree(ns: &Namespace, dir: NodeId) -> Vec<TreeEntry> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let children = match ns.node(dir).and_then(Node::children) {
            Some(children) => children,
            None => return Vec::new(),
        };
        for (name, child_id) in children {
            let node = match ns.node(*child_id) {
                Some(node) => node,
                None => continue,
            };
            match &node.kind {
                NodeKind::Directory { .. } => dirs.push(TreeEntry::Directory {
                    name: name.clone(),
                    id: node.id,
                    mod_time: node.mod_time,
                    contents: Self::emit_tree(ns, *child_id),
                }),
                NodeKind::File { data } => files.push(TreeEntry::File {
                    name: name.clone(),
                    id: node.id,
                    mod_time: node.mod_time,
                    data: data.clone(),
                }),
            }
        }
        dirs.extend(files);
        dirs
    }

    // ---- incremental construction ----

    fn build_delta(ns: &Namespace) -> Result<IncrementalSnapshot, String> {
        let entries = ns.pending_changes();
        let mut root_slot = Slot::default();

        for (i, entry) in entries.iter().enumerate() {
            let segs = path::segments(&entry.path);
            if segs.is_empty() {
                return Err(format!("change entry with unusable path {:?}", entry.path));
            }
            match entry.action {
                ChangeAction::Deleted => {
                    *slot_at(&mut root_slot, &segs) = Slot {
                        deleted: true,
                        ..Slot::default()
                    };
                }
                ChangeAction::Created | ChangeAction::Modified => {
                    match ns.resolve(&entry.path) {
                        Ok(id) => {
                            let slot = slot_at(&mut root_slot, &segs);
                            slot.deleted = false;
                            slot.live = Some(id);
                            if entry.action == ChangeAction::Created {
                                slot.created = true;
                            }
                        }
                        Err(_) => {
                            // The node is gone; only fine when a later
                            // delete entry covers the path.
                            if !superseded_by_delete(&entries[i + 1..], &entry.path) {
                                return Err(format!(
                                    "logged path {} no longer resolves",
                                    entry.path
                                ));
                            }
                        }
                    }
                }
            }
        }

        Self::revive_remade_slots(ns, &mut root_slot.children, "/");
        let contents = Self::emit_slots(ns, &root_slot.children, "/")?;
        Ok(IncrementalSnapshot {
            mod_time: ns.root_node().mod_time,
            contents,
        })
    }

    /// A deleted path can be remade in the same interval with the new
    /// contents logged only deeper down (`rm /a` then `mkdir /a/b` logs
    /// `/a/b`, not `/a`). Such a slot stays deleted in the fold; when its
    /// path still resolves, the live node there is a fresh recreation the
    /// document must carry in full, right after the delete.
    fn revive_remade_slots(ns: &Namespace, slots: &mut BTreeMap<String, Slot>, dir_path: &str) {
        for (name, slot) in slots.iter_mut() {
            let p = path::join(dir_path, name);
            if slot.deleted && slot.live.is_none() {
                if let Ok(id) = ns.resolve(&p) {
                    slot.live = Some(id);
                    slot.created = true;
                    // The fresh subtree is authoritative; nested slots are
                    // stale bookkeeping.
                    slot.children.clear();
                    continue;
                }
            }
            Self::revive_remade_slots(ns, &mut slot.children, &p);
        }
    }

    fn emit_slots(
        ns: &Namespace,
        slots: &BTreeMap<String, Slot>,
        dir_path: &str,
    ) -> Result<Vec<DeltaEntry>, String> {
        // Deletions first so a replay never sees an id collide with a node
        // it is about to remove.
        let mut deleted = Vec::new();
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for (name, slot) in slots {
            if slot.deleted {
                deleted.push(DeltaEntry::Deleted { name: name.clone() });
                if slot.live.is_none() {
                    continue;
                }
                // Deleted and remade: the fresh creation follows the delete.
            }
            let p = path::join(dir_path, name);
            match slot.live {
                Some(id) => {
                    let node = ns
                        .node(id)
                        .ok_or_else(|| format!("logged node {} vanished", id))?;
                    match &node.kind {
                        NodeKind::File { data } => {
                            let fresh = slot.created || node.is_new;
                            files.push(DeltaEntry::File {
                                name: name.clone(),
                                id: fresh.then_some(node.id),
                                mod_time: Some(node.mod_time),
                                data: Some(data.clone()),
                            });
                        }
                        NodeKind::Directory { .. } => {
                            if slot.created || node.is_new {
                                // Fresh directory: its current subtree is
                                // authoritative, nested slots are redundant.
                                dirs.push(Self::emit_created(ns, name, node));
                            } else {
                                dirs.push(DeltaEntry::Directory {
                                    name: name.clone(),
                                    id: None,
                                    mod_time: Some(node.mod_time),
                                    contents: Self::emit_slots(ns, &slot.children, &p)?,
                                });
                            }
                        }
                    }
                }
                None => {
                    // Container reached only because something below it
                    // changed. Carry an id exactly when the directory itself
                    // is a fresh creation the replay must perform.
                    let id = ns
                        .resolve(&p)
                        .map_err(|e| format!("container {} unresolvable: {}", p, e))?;
                    let node = ns
                        .node(id)
                        .ok_or_else(|| format!("container {} vanished", p))?;
                    if !node.is_dir() {
                        return Err(format!("container {} is not a directory", p));
                    }
                    dirs.push(DeltaEntry::Directory {
                        name: name.clone(),
                        id: node.is_new.then_some(node.id),
                        mod_time: node.is_new.then_some(node.mod_time),
                        contents: Self::emit_slots(ns, &slot.children, &p)?,
                    });
                }
            }
        }

        deleted.extend(dirs);
        deleted.extend(files);
        Ok(deleted)
    }

    /// Emit a freshly created node with its entire current subtree, ids and
    /// all, so a replay can rebuild it (covers directory copies and moves).
    fn emit_created(ns: &Namespace, name: &str, node: &Node) -> DeltaEntry {
        match &node.kind {
            NodeKind::File { data } => DeltaEntry::File {
                name: name.to_string(),
                id: Some(node.id),
                mod_time: Some(node.mod_time),
                data: Some(data.clone()),
            },
            NodeKind::Directory { children } => {
                let mut dirs = Vec::new();
                let mut files = Vec::new();
                for (child_name, child_id) in children {
                    if let Some(child) = ns.node(*child_id) {
                        let entry = Self::emit_created(ns, child_name, child);
                        if child.is_dir() {
                            dirs.push(entry);
                        } else {
                            files.push(entry);
                        }
                    }
                }
                dirs.extend(files);
                DeltaEntry::Directory {
                    name: name.to_string(),
                    id: Some(node.id),
                    mod_time: Some(node.mod_time),
                    contents: dirs,
                }
            }
        }
    }
}

/// Working structure while folding log entries into the nested delta shape.
#[derive(Debug, Default)]
struct Slot {
    deleted: bool,
    live: Option<NodeId>,
    created: bool,
    children: BTreeMap<String, Slot>,
}

fn slot_at<'a>(root: &'a mut Slot, segs: &[&str]) -> &'a mut Slot {
    let mut cur = root;
    for seg in segs {
        cur = cur.children.entry((*seg).to_string()).or_default();
    }
    cur
}

fn superseded_by_delete(later: &[ChangeEntry], p: &str) -> bool {
    later.iter().any(|e| {
        e.action == ChangeAction::Deleted
            && (e.path == p || p.starts_with(&format!("{}/", e.path)))
    })
}
