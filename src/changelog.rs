//! Change Log
//!
//! Ordered, append-only record of namespace mutations since the last full
//! snapshot baseline. Fed by `Namespace` operations and drained exactly once
//! per snapshot write. Entries are only appended after an operation has fully
//! validated, so the log never records a mutation that failed.

use crate::types::NodeId;

/// What a mutation did to the node at `path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Created,
    Modified,
    Deleted,
}

/// One recorded mutation. `path` is absolute at the time of the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub path: String,
    pub id: NodeId,
    pub action: ChangeAction,
}

impl ChangeEntry {
    pub fn new(path: impl Into<String>, id: NodeId, action: ChangeAction) -> Self {
        Self {
            path: path.into(),
            id,
            action,
        }
    }
}

/// Append-only mutation log, ordered by occurrence.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    entries: Vec<ChangeEntry>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the tail.
    pub fn append(&mut self, entry: ChangeEntry) {
        self.entries.push(entry);
    }

    /// Atomically return the full ordered sequence and empty the log.
    pub fn drain_all(&mut self) -> Vec<ChangeEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Ordered view of the recorded entries without consuming them.
    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
