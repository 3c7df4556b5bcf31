// src/watch/path_utils.rs

//! Path helpers for the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Tries a plain `strip_prefix` first, then again on canonicalized paths
/// (macOS reports `/private/var/...` for `/var/...`). Removed files cannot be
/// canonicalized, so their parent directory is canonicalized instead.
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok().or_else(|| {
        let parent = path.parent()?.canonicalize().ok()?;
        Some(parent.join(path.file_name()?))
    })?;

    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

/// True when `rel_path` is `dir` itself or lies inside it. Both relative,
/// `/`-separated.
pub fn is_within(rel_path: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    rel_path == dir
        || rel_path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_checks_component_boundaries() {
        assert!(is_within("dist/index.html", "dist"));
        assert!(is_within("dist", "dist/"));
        assert!(!is_within("distribution/x", "dist"));
        assert!(!is_within("src/dist/x", "dist"));
    }

    #[test]
    fn relative_to_root() {
        let root = Path::new("/project");
        assert_eq!(
            relative_str(root, Path::new("/project/src/a.js")).as_deref(),
            Some("src/a.js")
        );
    }
}
