// src/transform/clean.rs

use tracing::debug;

use crate::transform::{
    BuildSettings, TransformError, TransformFuture, TransformReport, Transformer,
};

/// Deletes everything inside the output directory, then recreates it empty.
///
/// A missing output directory is not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanTransformer;

impl Transformer for CleanTransformer {
    fn describe(&self) -> String {
        "clean output directory".to_string()
    }

    fn transform<'a>(&'a self, settings: &'a BuildSettings) -> TransformFuture<'a> {
        Box::pin(async move {
            let out = &settings.output;
            match tokio::fs::remove_dir_all(out).await {
                Ok(()) => debug!(path = %out.display(), "removed output directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(TransformError::io(out, e)),
            }
            tokio::fs::create_dir_all(out)
                .await
                .map_err(|e| TransformError::io(out, e))?;
            Ok(TransformReport::default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[tokio::test]
    async fn removes_previous_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BuildSettings::new(dir.path(), "dist", Mode::Development);
        std::fs::create_dir_all(settings.output.join("css")).unwrap();
        std::fs::write(settings.output.join("css/old.css"), "x").unwrap();

        CleanTransformer.transform(&settings).await.unwrap();

        assert!(settings.output.is_dir());
        assert_eq!(std::fs::read_dir(&settings.output).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_output_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BuildSettings::new(dir.path(), "dist", Mode::Development);

        CleanTransformer.transform(&settings).await.unwrap();
        assert!(settings.output.is_dir());
    }
}
