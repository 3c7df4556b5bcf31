// src/engine/mod.rs

//! Orchestration engine for assetflow.
//!
//! This module ties together:
//! - the watch dispatch loop that reacts to:
//!   - file changes (from the watcher or injected by tests)
//!   - manual task triggers
//!   - task completion events
//!   - shutdown signals
//! - the trigger queue (what happens when a task is re-triggered while it is
//!   still running)
//! - the session lifecycle (`Idle -> Cleaning -> Building -> ...`)
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::tasks::TaskName;

/// Outcome of one task invocation, as reported back to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Explicit trigger (CLI or tests).
    Manual,
    /// A watched file changed.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Stop once nothing is running and nothing is queued.
    pub exit_when_idle: bool,
}

/// Events flowing into the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A file changed; `rel_path` is relative to the project root with `/`
    /// separators.
    FileChanged { rel_path: String },
    /// A task should run.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// An invocation finished.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod lifecycle;
pub mod queue;
pub mod runtime;

pub use core::{CoreCommand, CoreRuntime, CoreStep};
pub use lifecycle::{Lifecycle, LifecyclePhase};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
pub use crate::types::TriggerWhileRunningBehaviour;
