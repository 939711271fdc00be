//! Core types for the Canopy namespace tree.

/// NodeId: process-unique integer identity assigned to a node at creation
/// and carried through snapshots.
pub type NodeId = u64;
