//! Canopy: Versioned Namespace Tree Management
//!
//! Models a hierarchical namespace of directories and files, records every
//! mutation in an ordered change log, and serializes the result as full or
//! incremental snapshot documents. A standalone merger rebuilds an equivalent
//! tree from a full snapshot plus an ordered run of incrementals.

pub mod changelog;
pub mod config;
pub mod error;
pub mod logging;
pub mod shell;
pub mod snapshot;
pub mod tree;
pub mod types;
