//! Path tokenization and joining for namespace paths
//!
//! Namespace paths are `/`-separated strings. Absolute paths begin at the
//! root; relative paths resolve against the session's current directory.
//! `.` segments are dropped during tokenization, `..` is kept and handled
//! by the resolver (parent step, no-op at root).

use crate::error::TreeError;

/// True when `path` starts at the root.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Split a path into traversal segments, dropping empty segments and `.`.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Join a directory path and a child name into an absolute-style path.
pub fn join(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// Split a path into its parent portion and final segment.
///
/// `"/a/b/c"` yields `("/a/b", "c")`; a bare `"c"` yields `("", "c")`, where
/// the empty parent means the current directory. Fails for paths without a
/// usable final segment (`"/"`, `""`, or one ending in `.`/`..`), which can
/// never name a node to create.
pub fn split_parent(path: &str) -> Result<(&str, &str), TreeError> {
    let trimmed = path.trim_end_matches('/');
    let (parent, leaf) = match trimmed.rfind('/') {
        Some(0) => ("/", &trimmed[1..]),
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    };
    if leaf.is_empty() || leaf == "." || leaf == ".." {
        return Err(TreeError::InvalidPath(path.to_string()));
    }
    Ok((parent, leaf))
}
