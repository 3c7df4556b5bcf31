// src/watch/hash.rs

//! Content hashing for `use_hash = true`.
//!
//! Editors often touch a file without changing it (save without edits,
//! atomic rename). With hashing on, an event whose file content is the same
//! as at the last dispatch is dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Compute the BLAKE3 hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last dispatched content hash per file, kept in memory.
#[derive(Debug, Default)]
pub struct ContentFilter {
    hashes: HashMap<PathBuf, String>,
}

impl ContentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record current hashes without reporting changes.
    pub fn seed<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            if let Ok(hash) = compute_file_hash(path) {
                self.hashes.insert(path.to_path_buf(), hash);
            }
        }
    }

    /// True when `path` changed since it was last seen. Removed or unreadable
    /// files always count as changed.
    pub fn changed(&mut self, path: &Path) -> bool {
        match compute_file_hash(path) {
            Ok(hash) => {
                if self.hashes.get(path) == Some(&hash) {
                    debug!(path = %path.display(), "content unchanged; dropping event");
                    return false;
                }
                self.hashes.insert(path.to_path_buf(), hash);
                true
            }
            Err(_) => {
                self.hashes.remove(path);
                true
            }
        }
    }

    /// Keep the root-relative paths whose content changed.
    pub fn retain_changed(&mut self, root: &Path, rel_paths: Vec<String>) -> Vec<String> {
        rel_paths
            .into_iter()
            .filter(|rel| self.changed(&root.join(rel)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_content_is_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.scss");
        std::fs::write(&file, "body {}").unwrap();

        let mut filter = ContentFilter::new();
        filter.seed([&file]);
        assert!(!filter.changed(&file));

        std::fs::write(&file, "body { color: red }").unwrap();
        assert!(filter.changed(&file));
        assert!(!filter.changed(&file));
    }

    #[test]
    fn retain_changed_drops_untouched_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.scss"), "a").unwrap();
        std::fs::write(dir.path().join("b.scss"), "b").unwrap();

        let mut filter = ContentFilter::new();
        filter.seed([dir.path().join("a.scss"), dir.path().join("b.scss")]);
        std::fs::write(dir.path().join("b.scss"), "b2").unwrap();

        let kept = filter.retain_changed(dir.path(), vec!["a.scss".into(), "b.scss".into()]);
        assert_eq!(kept, vec!["b.scss".to_string()]);
    }

    #[test]
    fn removed_file_counts_as_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut filter = ContentFilter::new();
        assert!(filter.changed(&dir.path().join("gone.js")));
    }
}
