//! Lexical path helpers shared by vault discovery, input expansion and
//! destination checks. Nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True when a root-relative path could leave the root: absolute, prefixed
/// or containing a `..` segment under either separator
pub fn escapes_root(value: &str) -> bool {
    value.starts_with(['/', '\\'])
        || value.split(['/', '\\']).any(|segment| segment.trim() == "..")
        || Path::new(value)
            .components()
            .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}
