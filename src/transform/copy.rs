// src/transform/copy.rs

use std::path::PathBuf;

use tracing::debug;

use crate::transform::paths::expand_sources;
use crate::transform::{
    BuildSettings, TransformError, TransformFuture, TransformReport, Transformer,
};

/// Mirrors every file matched by `src` into `<output>/<dest>`, keeping each
/// file's path relative to its glob base.
#[derive(Debug, Clone)]
pub struct CopyTransformer {
    src: Vec<String>,
    dest: String,
}

impl CopyTransformer {
    pub fn new(src: Vec<String>, dest: String) -> Self {
        Self { src, dest }
    }
}

impl Transformer for CopyTransformer {
    fn describe(&self) -> String {
        format!("copy {:?} -> {}", self.src, self.dest)
    }

    fn transform<'a>(&'a self, settings: &'a BuildSettings) -> TransformFuture<'a> {
        Box::pin(async move {
            let files = expand_sources(&settings.root, &self.src).await?;
            let dest_dir = settings.output.join(&self.dest);

            let mut outputs: Vec<PathBuf> = Vec::with_capacity(files.len());
            for file in files {
                let target = dest_dir.join(&file.rel_to_base);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| TransformError::io(parent, e))?;
                }
                tokio::fs::copy(&file.abs, &target)
                    .await
                    .map_err(|e| TransformError::io(&file.abs, e))?;
                debug!(from = %file.abs.display(), to = %target.display(), "copied");
                outputs.push(target);
            }

            Ok(TransformReport::with_outputs(outputs))
        })
    }
}
