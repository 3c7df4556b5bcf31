// src/engine/lifecycle.rs

//! Session lifecycle: `Idle -> Cleaning -> Building -> SteadyServing | Done`.
//!
//! Cleaning always completes before Building starts. A clean failure ends
//! the session in both entry points. A build failure ends `build` but only
//! gets logged in `dev`, which still moves on to serving.

use std::fmt;

use tracing::{error, info};

use crate::config::model::PipelineSection;
use crate::errors::{AssetflowError, Result};
use crate::tasks::{RunContext, TaskRegistry, TaskReport, TaskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    #[default]
    Idle,
    Cleaning,
    Building,
    SteadyServing,
    Done,
}

impl LifecyclePhase {
    pub fn can_transition_to(self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        matches!(
            (self, next),
            (Idle, Cleaning)
                | (Cleaning, Building)
                | (Cleaning, Done)
                | (Building, SteadyServing)
                | (Building, Done)
                | (SteadyServing, Done)
        )
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecyclePhase::Idle => "idle",
            LifecyclePhase::Cleaning => "cleaning",
            LifecyclePhase::Building => "building",
            LifecyclePhase::SteadyServing => "serving",
            LifecyclePhase::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    phase: LifecyclePhase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Move to `next`, rejecting transitions the state machine does not have.
    pub fn advance(&mut self, next: LifecyclePhase) -> Result<()> {
        let from = self.phase();
        if !from.can_transition_to(next) {
            return Err(AssetflowError::IllegalTransition(format!("{from} -> {next}")));
        }
        info!(%from, to = %next, "lifecycle transition");
        self.phase = next;
        Ok(())
    }

    /// Run the clean task, then the build task.
    ///
    /// A clean failure is returned as an error with the lifecycle in `Done`.
    /// Otherwise the build result is handed back with the lifecycle left in
    /// `Building` for the caller to finish.
    pub async fn clean_and_build(
        &mut self,
        registry: &TaskRegistry,
        ctx: &RunContext,
        pipeline: &PipelineSection,
    ) -> Result<TaskResult> {
        self.advance(LifecyclePhase::Cleaning)?;
        if let Err(failure) = registry.run(&pipeline.clean, ctx).await {
            self.advance(LifecyclePhase::Done)?;
            return Err(failure.into());
        }

        self.advance(LifecyclePhase::Building)?;
        Ok(registry.run(&pipeline.build, ctx).await)
    }
}

/// One-shot production-style build: clean, build, done.
pub async fn run_build(
    registry: &TaskRegistry,
    ctx: &RunContext,
    pipeline: &PipelineSection,
) -> Result<TaskReport> {
    let mut lifecycle = Lifecycle::new();
    let result = lifecycle.clean_and_build(registry, ctx, pipeline).await?;
    lifecycle.advance(LifecyclePhase::Done)?;
    let report = result?;
    info!(
        outputs = report.outputs.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "build finished"
    );
    Ok(report)
}

/// Initial build of a dev session. Returns with the lifecycle in
/// `SteadyServing` unless cleaning failed.
pub async fn start_dev_session(
    lifecycle: &mut Lifecycle,
    registry: &TaskRegistry,
    ctx: &RunContext,
    pipeline: &PipelineSection,
) -> Result<()> {
    if let Err(failure) = lifecycle.clean_and_build(registry, ctx, pipeline).await? {
        error!(
            task = %failure.task,
            path = ?failure.path,
            error = %failure.message,
            "initial build failed; serving anyway"
        );
    }
    lifecycle.advance(LifecyclePhase::SteadyServing)
}

/// Run a single named task once, outside the lifecycle.
pub async fn run_task(registry: &TaskRegistry, ctx: &RunContext, name: &str) -> Result<TaskReport> {
    if !registry.contains(name) {
        return Err(AssetflowError::TaskNotFound(name.to_string()));
    }
    Ok(registry.run(name, ctx).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_paths_are_legal() {
        let mut lc = Lifecycle::new();
        lc.advance(LifecyclePhase::Cleaning).unwrap();
        lc.advance(LifecyclePhase::Building).unwrap();
        lc.advance(LifecyclePhase::SteadyServing).unwrap();
        assert_eq!(lc.phase(), LifecyclePhase::SteadyServing);
    }

    #[test]
    fn building_before_cleaning_is_rejected() {
        let mut lc = Lifecycle::new();
        let err = lc.advance(LifecyclePhase::Building).unwrap_err();
        assert!(matches!(err, AssetflowError::IllegalTransition(_)));
        assert_eq!(lc.phase(), LifecyclePhase::Idle);
    }

    #[test]
    fn done_is_terminal() {
        assert!(!LifecyclePhase::Done.can_transition_to(LifecyclePhase::Cleaning));
        assert!(!LifecyclePhase::SteadyServing.can_transition_to(LifecyclePhase::Building));
    }
}
