// src/transform/mod.rs

//! Asset transformers.
//!
//! A transformer maps source asset(s) to output asset(s). The orchestration
//! layer treats every transformer as a black box behind the [`Transformer`]
//! trait; tests plug in fakes the same way.
//!
//! - [`clean`] empties the output directory.
//! - [`copy`] mirrors files matched by source globs into the output.
//! - [`concat`] joins matched files into one output file.
//! - [`command`] delegates to an external tool through the platform shell.
//! - [`paths`] has the glob expansion shared by `copy` and `concat`.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use thiserror::Error;

use crate::config::model::{ActionKind, TaskConfig};
use crate::types::Mode;

pub mod clean;
pub mod command;
pub mod concat;
pub mod copy;
pub mod paths;

pub use clean::CleanTransformer;
pub use command::CommandTransformer;
pub use concat::ConcatTransformer;
pub use copy::CopyTransformer;

/// Process-wide build settings, threaded explicitly into every transformer.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Project root; all source globs are relative to it.
    pub root: PathBuf,
    /// Absolute output directory (`root/<config.output>`).
    pub output: PathBuf,
    pub mode: Mode,
}

impl BuildSettings {
    pub fn new(root: impl Into<PathBuf>, output: impl AsRef<Path>, mode: Mode) -> Self {
        let root = root.into();
        let output = root.join(output);
        Self { root, output, mode }
    }

    /// Path of `abs` relative to the output directory, with forward slashes.
    pub fn output_relative(&self, abs: &Path) -> Option<String> {
        abs.strip_prefix(&self.output)
            .ok()
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
    }
}

/// What a successful transformer run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Files written (absolute paths).
    pub outputs: Vec<PathBuf>,
}

impl TransformReport {
    pub fn with_outputs(outputs: Vec<PathBuf>) -> Self {
        Self { outputs }
    }
}

/// A transformer rejected its input or could not read/write an asset.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub struct TransformError {
    /// Offending asset, when known.
    pub path: Option<PathBuf>,
    pub message: String,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(p) => write!(f, "{}: {}", p.display(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }

    pub fn at(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// I/O failures are reported as transformation errors on the given path.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::at(path, err.to_string())
    }
}

pub type TransformResult = Result<TransformReport, TransformError>;

/// Boxed future returned by [`Transformer::transform`].
pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = TransformResult> + Send + 'a>>;

/// An asset transformation step.
pub trait Transformer: Send + Sync + fmt::Debug {
    /// Short human description used in logs and `--dry-run`.
    fn describe(&self) -> String;

    /// Run the transformation once.
    fn transform<'a>(&'a self, settings: &'a BuildSettings) -> TransformFuture<'a>;
}

/// Build the built-in transformer for a leaf task.
///
/// Expects a validated [`TaskConfig`]; missing fields degrade to empty values.
pub fn from_task_config(action: ActionKind, task: &TaskConfig) -> Box<dyn Transformer> {
    let dest = task.dest.clone().unwrap_or_else(|| ".".to_string());
    match action {
        ActionKind::Clean => Box::new(CleanTransformer),
        ActionKind::Copy => Box::new(CopyTransformer::new(task.src.clone(), dest)),
        ActionKind::Concat => Box::new(ConcatTransformer::new(
            task.src.clone(),
            dest,
            task.separator.clone().unwrap_or_else(|| "\n".to_string()),
        )),
        ActionKind::Command => Box::new(CommandTransformer::new(
            task.cmd.clone(),
            task.dev_cmd.clone(),
            task.prod_cmd.clone(),
            task.outputs.clone(),
        )),
    }
}
