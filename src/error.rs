//! Error types for the Canopy namespace tree and snapshot pipeline.

use thiserror::Error;

/// Namespace operation errors.
///
/// These are reported to the caller and never abort the session. A failed
/// operation guarantees the tree and change log are left untouched.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Cannot move a directory into its own subtree: {0}")]
    CyclicMove(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Snapshot document errors.
///
/// Parse and merge failures are fatal for the whole run: a partially
/// reconstructed tree is never a trustworthy baseline.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot header: {0}")]
    InvalidHeader(String),

    #[error("Missing required field `{field}` at {path}")]
    MissingField { path: String, field: &'static str },

    #[error("Snapshot parse failure: {0}")]
    Parse(String),

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tree error during merge: {0}")]
    Tree(#[from] TreeError),
}

/// Configuration and logging setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}
