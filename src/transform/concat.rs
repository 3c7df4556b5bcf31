// src/transform/concat.rs

use tracing::{debug, warn};

use crate::transform::paths::expand_sources;
use crate::transform::{
    BuildSettings, TransformError, TransformFuture, TransformReport, Transformer,
};

/// Joins every file matched by `src`, in declaration order, into the single
/// file `<output>/<dest>`.
///
/// Within one glob, matches are ordered by path. A file matched by two globs
/// is included once, at its first position.
#[derive(Debug, Clone)]
pub struct ConcatTransformer {
    src: Vec<String>,
    dest: String,
    separator: String,
}

impl ConcatTransformer {
    pub fn new(src: Vec<String>, dest: String, separator: String) -> Self {
        Self {
            src,
            dest,
            separator,
        }
    }
}

impl Transformer for ConcatTransformer {
    fn describe(&self) -> String {
        format!("concat {:?} -> {}", self.src, self.dest)
    }

    fn transform<'a>(&'a self, settings: &'a BuildSettings) -> TransformFuture<'a> {
        Box::pin(async move {
            let files = expand_sources(&settings.root, &self.src).await?;

            if files.is_empty() {
                warn!(src = ?self.src, "concat matched no files; nothing written");
                return Ok(TransformReport::default());
            }

            let mut joined: Vec<u8> = Vec::new();
            for (i, file) in files.iter().enumerate() {
                if i > 0 {
                    joined.extend_from_slice(self.separator.as_bytes());
                }
                let bytes = tokio::fs::read(&file.abs)
                    .await
                    .map_err(|e| TransformError::io(&file.abs, e))?;
                joined.extend_from_slice(&bytes);
            }

            let target = settings.output.join(&self.dest);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TransformError::io(parent, e))?;
            }
            tokio::fs::write(&target, &joined)
                .await
                .map_err(|e| TransformError::io(&target, e))?;

            debug!(inputs = files.len(), to = %target.display(), "concatenated");
            Ok(TransformReport::with_outputs(vec![target]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    fn write(root: &std::path::Path, rel: &str, body: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, body).unwrap();
    }

    #[tokio::test]
    async fn joins_in_declaration_order_with_separator() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "vendor/jquery.js", "JQ");
        write(dir.path(), "src/scripts/b.js", "B");
        write(dir.path(), "src/scripts/a.js", "A");
        let settings = BuildSettings::new(dir.path(), "dist", Mode::Development);

        let t = ConcatTransformer::new(
            vec!["vendor/jquery.js".into(), "src/scripts/*.js".into()],
            "main.min.js".into(),
            ";".into(),
        );
        let report = t.transform(&settings).await.unwrap();

        let body = std::fs::read_to_string(settings.output.join("main.min.js")).unwrap();
        assert_eq!(body, "JQ;A;B");
        assert_eq!(report.outputs, vec![settings.output.join("main.min.js")]);
    }

    #[tokio::test]
    async fn duplicate_matches_are_included_once() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.js", "A");
        write(dir.path(), "src/b.js", "B");
        let settings = BuildSettings::new(dir.path(), "dist", Mode::Development);

        let t = ConcatTransformer::new(
            vec!["src/b.js".into(), "src/*.js".into()],
            "all.js".into(),
            "\n".into(),
        );
        t.transform(&settings).await.unwrap();

        let body = std::fs::read_to_string(settings.output.join("all.js")).unwrap();
        assert_eq!(body, "B\nA");
    }

    #[tokio::test]
    async fn missing_literal_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BuildSettings::new(dir.path(), "dist", Mode::Development);

        let t = ConcatTransformer::new(vec!["vendor/jquery.js".into()], "x.js".into(), ";".into());
        let err = t.transform(&settings).await.unwrap_err();
        assert_eq!(err.path, Some(dir.path().join("vendor/jquery.js")));
    }

    #[tokio::test]
    async fn no_matches_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        let settings = BuildSettings::new(dir.path(), "dist", Mode::Development);

        let t = ConcatTransformer::new(vec!["src/*.js".into()], "x.js".into(), ";".into());
        let report = t.transform(&settings).await.unwrap();
        assert!(report.outputs.is_empty());
        assert!(!settings.output.join("x.js").exists());
    }
}
