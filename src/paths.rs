//! Project-root discovery and relative path resolution.
//!
//! Environment files and relative application-binary references are both
//! resolved against the project root rather than the current directory, so
//! test runs behave the same regardless of where they are launched from.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Returns the project root directory.
///
/// Walks up from the current directory to the nearest ancestor containing a
/// `Cargo.toml`. Falls back to the current directory if none is found.
pub fn project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut dir = cwd.as_path();
    loop {
        if dir.join("Cargo.toml").is_file() {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return cwd,
        }
    }
}

/// Returns true for same-directory (`./`) and parent-directory (`../`)
/// relative references. Remote references (`https://...`, `bs://...`) and
/// absolute paths return false.
pub fn is_relative_reference(reference: &str) -> bool {
    reference.starts_with("./") || reference.starts_with("../")
}

/// Resolves a relative reference against `root`, normalizing `.` and `..`
/// components lexically (no filesystem access).
pub fn resolve_relative(root: &Path, reference: &str) -> PathBuf {
    normalize(&root.join(reference))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
