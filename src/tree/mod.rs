//! Namespace Tree
//!
//! Represents the modeled namespace as an arena of directory and file nodes.
//! A directory's child map is the only ownership edge; parent links are
//! non-owning id back-references, so the tree stays acyclic by construction
//! and moves are explicit re-parenting operations.

pub mod namespace;
pub mod node;
pub mod path;

pub use namespace::Namespace;
pub use node::{Node, NodeKind};
