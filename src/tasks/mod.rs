// src/tasks/mod.rs

//! Named tasks and their composition.
//!
//! A task is either a leaf wrapping one [`Transformer`](crate::transform::Transformer)
//! or a composite running other tasks in series or in parallel. Every
//! invocation is an explicit future resolving to `Result<TaskReport, TaskFailure>`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::server::ReloadHub;
use crate::transform::{BuildSettings, TransformError};

pub mod compose;
pub mod registry;

pub use registry::{TaskFuture, TaskRegistry};

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// A task invocation failed.
///
/// For composites this is the failure of the member that stopped the run,
/// so `task` names the leaf that actually failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskName,
    pub path: Option<PathBuf>,
    pub message: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task '{}' failed: ", self.task)?;
        if let Some(p) = &self.path {
            write!(f, "{}: ", p.display())?;
        }
        f.write_str(&self.message)
    }
}

impl TaskFailure {
    pub fn new(task: impl Into<TaskName>, message: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            path: None,
            message: message.into(),
        }
    }

    pub fn from_transform(task: impl Into<TaskName>, err: TransformError) -> Self {
        Self {
            task: task.into(),
            path: err.path,
            message: err.message,
        }
    }
}

/// Result of a successful task invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: TaskName,
    /// Files written by the task and, for composites, all of its members.
    pub outputs: Vec<PathBuf>,
    pub elapsed: Duration,
}

pub type TaskResult = Result<TaskReport, TaskFailure>;

/// Everything a task invocation needs besides the registry itself.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: BuildSettings,
    /// Live-reload hub; tasks with a `reload` kind notify it on success.
    pub reload: Option<ReloadHub>,
}

impl RunContext {
    pub fn new(settings: BuildSettings) -> Self {
        Self {
            settings,
            reload: None,
        }
    }

    pub fn with_reload(mut self, hub: ReloadHub) -> Self {
        self.reload = Some(hub);
        self
    }
}
