// src/transform/paths.rs

//! Source glob expansion shared by the file-based transformers.
//!
//! Patterns are relative to the project root and use `/` separators. A `*`
//! never crosses a directory boundary; use `**` for that. Each pattern has a
//! *base*: its leading components without glob syntax. Outputs keep the path
//! of each match relative to that base, so `src/fonts/**` copies
//! `src/fonts/a/b.woff` to `<dest>/a/b.woff`.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::transform::TransformError;

/// A file matched by a source glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub abs: PathBuf,
    /// Path relative to the glob base.
    pub rel_to_base: PathBuf,
}

/// One compiled source pattern.
#[derive(Debug, Clone)]
pub struct SourceGlob {
    pattern: String,
    base: PathBuf,
    matcher: Option<GlobMatcher>,
}

impl SourceGlob {
    pub fn new(pattern: &str) -> Result<Self, TransformError> {
        let pattern = normalize_pattern(pattern);
        let base = glob_base(&pattern);

        let matcher = if has_glob_meta(&pattern) {
            let glob = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| TransformError::new(format!("invalid glob '{pattern}': {e}")))?;
            Some(glob.compile_matcher())
        } else {
            None
        };

        Ok(Self {
            pattern,
            base,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Literal prefix directory, relative to the root.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Expand against `root`, sorted by path for stable output.
    ///
    /// A literal pattern naming a missing file, or a glob whose base
    /// directory does not exist, is an error carrying that path.
    pub fn expand(&self, root: &Path) -> Result<Vec<SourceFile>, TransformError> {
        let Some(matcher) = &self.matcher else {
            let abs = root.join(&self.pattern);
            if !abs.is_file() {
                return Err(TransformError::at(abs, "source file not found"));
            }
            let rel_to_base = abs
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_default();
            return Ok(vec![SourceFile { abs, rel_to_base }]);
        };

        let base_dir = root.join(&self.base);
        if !base_dir.is_dir() {
            return Err(TransformError::at(base_dir, "source directory not found"));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&base_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| base_dir.clone());
                TransformError::at(path, e.to_string())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let abs = entry.path().to_path_buf();
            let Ok(rel_to_root) = abs.strip_prefix(root) else {
                continue;
            };
            let rel_str = rel_to_root.to_string_lossy().replace('\\', "/");
            if !matcher.is_match(&rel_str) {
                continue;
            }

            let rel_to_base = abs
                .strip_prefix(&base_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| rel_to_root.to_path_buf());
            files.push(SourceFile { abs, rel_to_base });
        }

        Ok(files)
    }
}

/// Expand several patterns in declaration order, dropping duplicates (first
/// occurrence wins).
pub fn expand_all(root: &Path, patterns: &[SourceGlob]) -> Result<Vec<SourceFile>, TransformError> {
    let mut out: Vec<SourceFile> = Vec::new();
    for glob in patterns {
        for file in glob.expand(root)? {
            if !out.iter().any(|f| f.abs == file.abs) {
                out.push(file);
            }
        }
    }
    Ok(out)
}

/// Compile `patterns` and expand them on the blocking pool.
pub async fn expand_sources(
    root: &Path,
    patterns: &[String],
) -> Result<Vec<SourceFile>, TransformError> {
    let globs = compile_all(patterns)?;
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || expand_all(&root, &globs))
        .await
        .map_err(|e| TransformError::new(format!("source expansion aborted: {e}")))?
}

pub fn compile_all(patterns: &[String]) -> Result<Vec<SourceGlob>, TransformError> {
    patterns.iter().map(|p| SourceGlob::new(p)).collect()
}

/// Strip a leading `./` and convert backslashes.
pub fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.replace('\\', "/");
    let mut rest = pattern.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Leading components free of glob syntax. For a literal path this is the
/// parent directory.
fn glob_base(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal_parts = if has_glob_meta(pattern) {
        parts.iter().take_while(|p| !has_glob_meta(p)).count()
    } else {
        parts.len().saturating_sub(1)
    };

    parts[..literal_parts]
        .iter()
        .filter(|p| !p.is_empty())
        .collect::<PathBuf>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, rel).unwrap();
    }

    #[tokio::test]
    async fn expands_in_declaration_order_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/scripts/b.js");
        write(dir.path(), "src/scripts/a.js");
        write(dir.path(), "src/scripts/vendor/x.js");

        let patterns = vec![
            "./src/scripts/b.js".to_string(),
            "src/scripts/*.js".to_string(),
        ];
        let files = expand_sources(dir.path(), &patterns).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.rel_to_base.to_string_lossy().into_owned())
            .collect();

        // `*` stays inside `src/scripts`.
        assert_eq!(names, vec!["b.js", "a.js"]);
    }

    #[tokio::test]
    async fn missing_base_directory_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = expand_sources(dir.path(), &["src/fonts/**".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.path, Some(dir.path().join("src/fonts")));
        assert_eq!(err.message, "source directory not found");
    }

    #[test]
    fn base_stops_at_first_glob_component() {
        assert_eq!(glob_base("src/fonts/**/*.woff"), PathBuf::from("src/fonts"));
        assert_eq!(glob_base("src/index.html"), PathBuf::from("src"));
        assert_eq!(normalize_pattern("././src/*.html"), "src/*.html");
    }
}
