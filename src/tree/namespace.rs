//! Namespace tree: arena-backed node graph and every mutating operation
//!
//! All nodes live in an id-keyed arena; a directory's child map owns its
//! children and parent links are plain id back-references. Every operation
//! validates fully before mutating, so a failed call leaves both the tree
//! and the change log untouched. Each successful mutation appends one change
//! log entry, except move, which records delete-at-old-path plus
//! create-at-new-path so incremental snapshots can replay it.

use crate::changelog::{ChangeAction, ChangeEntry, ChangeLog};
use crate::error::TreeError;
use crate::tree::node::{Node, NodeKind};
use crate::tree::path;
use crate::types::NodeId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// The namespace tree together with its session state: root, current
/// directory cursor, id counter, and the change log fed by mutations.
#[derive(Debug, Clone)]
pub struct Namespace {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    cwd: NodeId,
    next_id: NodeId,
    log: ChangeLog,
}

impl Namespace {
    /// Fresh namespace containing only the root directory.
    pub fn new() -> Self {
        Self::with_root(1, Utc::now())
    }

    /// Namespace whose root carries an externally supplied id and timestamp.
    /// Used when reconstructing a tree from a snapshot document.
    pub(crate) fn with_root(root_id: NodeId, mod_time: DateTime<Utc>) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id,
            Node {
                id: root_id,
                name: String::new(),
                mod_time,
                is_new: false,
                is_modified: false,
                parent: None,
                kind: NodeKind::empty_directory(),
            },
        );
        Self {
            nodes,
            root: root_id,
            cwd: root_id,
            next_id: root_id + 1,
            log: ChangeLog::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root node. Always live; the root is created once per session and
    /// never destroyed.
    pub fn root_node(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Child id under a directory node, if present.
    pub fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.nodes
            .get(&dir)
            .and_then(|n| n.children())
            .and_then(|c| c.get(name).copied())
    }

    /// Mutations recorded since the last snapshot write.
    pub fn pending_changes(&self) -> &[ChangeEntry] {
        self.log.entries()
    }

    // ---- path navigation ----

    /// Resolve a path to a node id. Absolute paths begin at the root,
    /// relative paths at the current directory; `..` steps to the parent
    /// (no-op at root). Traversing through a file fails with
    /// `NotADirectory`; an unresolved final segment is `PathNotFound`,
    /// which callers also use as an existence probe.
    pub fn resolve(&self, p: &str) -> Result<NodeId, TreeError> {
        let mut cur = if path::is_absolute(p) { self.root } else { self.cwd };
        for seg in path::segments(p) {
            if seg == ".." {
                let node = &self.nodes[&cur];
                if !node.is_dir() {
                    return Err(TreeError::NotADirectory(p.to_string()));
                }
                cur = node.parent.unwrap_or(self.root);
                continue;
            }
            let children = self.nodes[&cur]
                .children()
                .ok_or_else(|| TreeError::NotADirectory(p.to_string()))?;
            cur = children
                .get(seg)
                .copied()
                .ok_or_else(|| TreeError::PathNotFound(p.to_string()))?;
        }
        Ok(cur)
    }

    fn resolve_dir(&self, p: &str) -> Result<NodeId, TreeError> {
        let id = self.resolve(p)?;
        if self.nodes[&id].is_dir() {
            Ok(id)
        } else {
            Err(TreeError::NotADirectory(p.to_string()))
        }
    }

    /// Absolute path of a live node, rebuilt from parent links.
    pub fn path_of(&self, id: NodeId) -> String {
        if id == self.root {
            return "/".to_string();
        }
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == self.root {
                break;
            }
            let node = &self.nodes[&c];
            parts.push(node.name.clone());
            cur = node.parent;
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    /// Change the session's current directory.
    pub fn change_dir(&mut self, p: &str) -> Result<(), TreeError> {
        self.cwd = self.resolve_dir(p)?;
        Ok(())
    }

    pub fn cwd_path(&self) -> String {
        self.path_of(self.cwd)
    }

    // ---- mutations ----

    /// Create every missing directory along `p`. Succeeds as a no-op when
    /// the whole path already exists as directories; fails with
    /// `NotADirectory` when any segment exists as a file. Logs one `Created`
    /// entry for the deepest directory actually created.
    pub fn create_dir_all(&mut self, p: &str) -> Result<(), TreeError> {
        let segs = path::segments(p);
        if segs.iter().any(|s| *s == "..") {
            return Err(TreeError::InvalidPath(p.to_string()));
        }
        let now = Utc::now();

        // Walk existing segments first; creation only starts past them, so
        // a validation failure can never leave partial state behind.
        let mut cur = if path::is_absolute(p) { self.root } else { self.cwd };
        let mut idx = 0;
        while idx < segs.len() {
            let children = self.nodes[&cur]
                .children()
                .ok_or_else(|| TreeError::NotADirectory(p.to_string()))?;
            match children.get(segs[idx]) {
                Some(&c) => {
                    cur = c;
                    idx += 1;
                }
                None => break,
            }
        }
        if idx == segs.len() {
            if !self.nodes[&cur].is_dir() {
                return Err(TreeError::NotADirectory(p.to_string()));
            }
            return Ok(());
        }

        for seg in &segs[idx..] {
            cur = self.insert_new_node(cur, seg, NodeKind::empty_directory(), now);
        }
        let abs = self.path_of(cur);
        debug!(path = %abs, id = cur, "created directory chain");
        self.log.append(ChangeEntry::new(abs, cur, ChangeAction::Created));
        Ok(())
    }

    /// Create an empty file at `p`, or refresh the modification time of an
    /// existing one. Never a no-op. A directory at `p` is `NotAFile`.
    pub fn touch(&mut self, p: &str) -> Result<(), TreeError> {
        let now = Utc::now();
        match self.resolve(p) {
            Ok(id) => {
                if self.nodes[&id].is_dir() {
                    return Err(TreeError::NotAFile(p.to_string()));
                }
                let abs = self.path_of(id);
                let node = self.nodes.get_mut(&id).ok_or_else(|| {
                    TreeError::PathNotFound(p.to_string())
                })?;
                node.mod_time = now;
                node.is_modified = true;
                self.log.append(ChangeEntry::new(abs, id, ChangeAction::Modified));
                Ok(())
            }
            Err(TreeError::PathNotFound(_)) => {
                let id = self.create_file(p, String::new(), now)?;
                let abs = self.path_of(id);
                self.log.append(ChangeEntry::new(abs, id, ChangeAction::Created));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Set or append a file's data, creating the file first when absent.
    /// Exactly one log entry either way: `Created` for a fresh file,
    /// `Modified` for an update.
    pub fn write(&mut self, p: &str, data: &str, append: bool) -> Result<(), TreeError> {
        let now = Utc::now();
        match self.resolve(p) {
            Ok(id) => {
                if self.nodes[&id].is_dir() {
                    return Err(TreeError::NotAFile(p.to_string()));
                }
                let abs = self.path_of(id);
                if let Some(node) = self.nodes.get_mut(&id) {
                    if let NodeKind::File { data: existing } = &mut node.kind {
                        if append {
                            existing.push_str(data);
                        } else {
                            *existing = data.to_string();
                        }
                    }
                    node.mod_time = now;
                    node.is_modified = true;
                }
                self.log.append(ChangeEntry::new(abs, id, ChangeAction::Modified));
                Ok(())
            }
            Err(TreeError::PathNotFound(_)) => {
                let id = self.create_file(p, data.to_string(), now)?;
                let abs = self.path_of(id);
                self.log.append(ChangeEntry::new(abs, id, ChangeAction::Created));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Read a file's data. Directories are `NotAFile`.
    pub fn read(&self, p: &str) -> Result<&str, TreeError> {
        let id = self.resolve(p)?;
        self.nodes[&id]
            .data()
            .ok_or_else(|| TreeError::NotAFile(p.to_string()))
    }

    /// Children of a directory, directories first, then lexicographically by
    /// name within each group.
    pub fn list(&self, p: &str) -> Result<Vec<&Node>, TreeError> {
        let id = self.resolve_dir(p)?;
        let children = self.nodes[&id].children().unwrap_or_else(|| unreachable!());
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for child_id in children.values() {
            let node = &self.nodes[child_id];
            if node.is_dir() {
                dirs.push(node);
            } else {
                files.push(node);
            }
        }
        dirs.extend(files);
        Ok(dirs)
    }

    /// Delete a file, or a directory when empty. `bypass_empty_check` is for
    /// replay streams, where a delete entry is authoritative and may denote
    /// whole-subtree removal.
    pub fn remove(&mut self, p: &str, bypass_empty_check: bool) -> Result<(), TreeError> {
        let id = self.resolve(p)?;
        if id == self.root {
            return Err(TreeError::InvalidPath(
                "the root directory cannot be removed".to_string(),
            ));
        }
        if let Some(children) = self.nodes[&id].children() {
            if !children.is_empty() && !bypass_empty_check {
                return Err(TreeError::DirectoryNotEmpty(p.to_string()));
            }
        }
        let abs = self.path_of(id);
        self.remove_subtree_unlogged(id);
        debug!(path = %abs, id, "removed node");
        self.log.append(ChangeEntry::new(abs, id, ChangeAction::Deleted));
        Ok(())
    }

    /// Move or copy `src` to `dst`.
    ///
    /// A copy duplicates the node (recursively for directories, gated on
    /// `recursive`) with freshly assigned ids and current timestamps. A move
    /// re-parents the existing node, preserving its identity, and logs it as
    /// delete-at-old-path plus create-at-new-path. When `dst` names an
    /// existing directory the source lands inside it under its own name;
    /// otherwise `dst`'s parent must exist and `dst` itself must not.
    pub fn move_or_copy(
        &mut self,
        src: &str,
        dst: &str,
        copy: bool,
        recursive: bool,
    ) -> Result<(), TreeError> {
        let src_id = self.resolve(src)?;
        if src_id == self.root {
            return Err(TreeError::InvalidPath(
                "the root directory cannot be moved or copied".to_string(),
            ));
        }
        let src_is_dir = self.nodes[&src_id].is_dir();
        if copy && src_is_dir && !recursive {
            return Err(TreeError::InvalidPath(format!(
                "{} is a directory (recursive copy required)",
                src
            )));
        }

        let (dst_parent, dst_name) = match self.resolve(dst) {
            Ok(existing) if self.nodes[&existing].is_dir() => {
                (existing, self.nodes[&src_id].name.clone())
            }
            Ok(_) => return Err(TreeError::AlreadyExists(dst.to_string())),
            Err(TreeError::PathNotFound(_)) => {
                let (parent_path, leaf) = path::split_parent(dst)?;
                let parent_id = if parent_path.is_empty() {
                    self.cwd
                } else {
                    self.resolve(parent_path)?
                };
                if !self.nodes[&parent_id].is_dir() {
                    return Err(TreeError::NotADirectory(dst.to_string()));
                }
                (parent_id, leaf.to_string())
            }
            Err(e) => return Err(e),
        };

        if self.child(dst_parent, &dst_name).is_some() {
            let taken = path::join(&self.path_of(dst_parent), &dst_name);
            return Err(TreeError::AlreadyExists(taken));
        }

        // A directory may never become an ancestor of itself.
        if src_is_dir {
            let mut cur = Some(dst_parent);
            while let Some(c) = cur {
                if c == src_id {
                    return Err(TreeError::CyclicMove(format!("{} -> {}", src, dst)));
                }
                cur = self.nodes[&c].parent;
            }
        }

        if copy {
            let now = Utc::now();
            let new_id = self.clone_subtree(src_id, dst_parent, &dst_name, now);
            let abs = self.path_of(new_id);
            debug!(src = %src, dst = %abs, id = new_id, "copied node");
            self.log
                .append(ChangeEntry::new(abs, new_id, ChangeAction::Created));
        } else {
            let old_path = self.path_of(src_id);
            let old_name = self.nodes[&src_id].name.clone();
            if let Some(old_parent) = self.nodes[&src_id].parent {
                if let Some(node) = self.nodes.get_mut(&old_parent) {
                    if let Some(children) = node.children_mut() {
                        children.remove(&old_name);
                    }
                }
            }
            if let Some(node) = self.nodes.get_mut(&src_id) {
                node.parent = Some(dst_parent);
                node.name = dst_name.clone();
                node.is_modified = true;
            }
            if let Some(node) = self.nodes.get_mut(&dst_parent) {
                if let Some(children) = node.children_mut() {
                    children.insert(dst_name, src_id);
                }
            }
            let new_path = self.path_of(src_id);
            debug!(src = %old_path, dst = %new_path, id = src_id, "moved node");
            self.log
                .append(ChangeEntry::new(old_path, src_id, ChangeAction::Deleted));
            self.log
                .append(ChangeEntry::new(new_path, src_id, ChangeAction::Created));
        }
        Ok(())
    }

    // ---- snapshot bookkeeping ----

    /// Drain the change log. Used exactly once per snapshot write.
    pub(crate) fn drain_log(&mut self) -> Vec<ChangeEntry> {
        self.log.drain_all()
    }

    /// Clear `is_new`/`is_modified` on every node, establishing a new full
    /// snapshot baseline. Only a successful full snapshot may call this.
    pub(crate) fn clear_baseline_flags(&mut self) {
        for node in self.nodes.values_mut() {
            node.is_new = false;
            node.is_modified = false;
        }
    }

    // ---- reconstruction primitives (unlogged) ----

    /// Attach a node with an externally supplied id and timestamp. The id
    /// counter watermark is kept above every registered id so later
    /// mutations never collide.
    pub(crate) fn graft(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        id: NodeId,
        mod_time: DateTime<Utc>,
    ) -> Result<NodeId, TreeError> {
        let children = self
            .nodes
            .get_mut(&parent)
            .and_then(|n| n.children_mut())
            .ok_or_else(|| TreeError::NotADirectory(name.to_string()))?;
        if children.contains_key(name) {
            return Err(TreeError::AlreadyExists(name.to_string()));
        }
        children.insert(name.to_string(), id);
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.to_string(),
                mod_time,
                is_new: true,
                is_modified: false,
                parent: Some(parent),
                kind,
            },
        );
        self.next_id = self.next_id.max(id + 1);
        Ok(id)
    }

    /// Detach a node from its parent and drop its whole subtree from the
    /// arena. Resets the cwd to root when the cwd was inside the subtree.
    pub(crate) fn remove_subtree_unlogged(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get(&id) {
            let name = node.name.clone();
            if let Some(parent) = node.parent {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    if let Some(children) = p.children_mut() {
                        children.remove(&name);
                    }
                }
            }
        }
        let mut ids = Vec::new();
        self.collect_subtree(id, &mut ids);
        let cwd_removed = ids.contains(&self.cwd);
        for i in ids {
            self.nodes.remove(&i);
        }
        if cwd_removed {
            self.cwd = self.root;
        }
    }

    pub(crate) fn set_mod_time_unlogged(&mut self, id: NodeId, mod_time: DateTime<Utc>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.mod_time = mod_time;
        }
    }

    pub(crate) fn set_data_unlogged(&mut self, id: NodeId, data: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if let NodeKind::File { data: existing } = &mut node.kind {
                *existing = data.to_string();
            }
        }
    }

    // ---- internals ----

    fn alloc_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create and attach a brand-new node. Caller has already validated the
    /// parent and name.
    fn insert_new_node(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        mod_time: DateTime<Utc>,
    ) -> NodeId {
        let id = self.alloc_id();
        if let Some(node) = self.nodes.get_mut(&parent) {
            if let Some(children) = node.children_mut() {
                children.insert(name.to_string(), id);
            }
        }
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.to_string(),
                mod_time,
                is_new: true,
                is_modified: false,
                parent: Some(parent),
                kind,
            },
        );
        id
    }

    /// Resolve `p`'s parent directory and create a file leaf under it.
    fn create_file(
        &mut self,
        p: &str,
        data: String,
        now: DateTime<Utc>,
    ) -> Result<NodeId, TreeError> {
        let (parent_path, leaf) = path::split_parent(p)?;
        let parent_id = if parent_path.is_empty() {
            self.cwd
        } else {
            self.resolve(parent_path)?
        };
        if !self.nodes[&parent_id].is_dir() {
            return Err(TreeError::NotADirectory(p.to_string()));
        }
        if self.child(parent_id, leaf).is_some() {
            // Shadowed by `..` traversal in the original path; re-resolve
            // would have succeeded. Treat as conflict to stay conservative.
            return Err(TreeError::AlreadyExists(p.to_string()));
        }
        Ok(self.insert_new_node(parent_id, leaf, NodeKind::File { data }, now))
    }

    /// Deep-copy a subtree under a new parent with fresh ids and `now`
    /// timestamps.
    fn clone_subtree(
        &mut self,
        src: NodeId,
        parent: NodeId,
        name: &str,
        now: DateTime<Utc>,
    ) -> NodeId {
        let kind = self.nodes[&src].kind.clone();
        match kind {
            NodeKind::File { data } => {
                self.insert_new_node(parent, name, NodeKind::File { data }, now)
            }
            NodeKind::Directory { children } => {
                let dir_id =
                    self.insert_new_node(parent, name, NodeKind::empty_directory(), now);
                for (child_name, child_id) in children {
                    self.clone_subtree(child_id, dir_id, &child_name, now);
                }
                dir_id
            }
        }
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        if let Some(children) = self.nodes.get(&id).and_then(|n| n.children()) {
            for child_id in children.values() {
                self.collect_subtree(*child_id, out);
            }
        }
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
