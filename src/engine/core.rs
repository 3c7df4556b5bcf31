// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) reads events from the
//! channel, spawns task invocations and handles shutdown. The core has no
//! channels, no Tokio types and performs no IO, so it is unit tested
//! directly.

use std::collections::HashMap;

use tracing::debug;

use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason};
use crate::tasks::TaskName;
use crate::types::TriggerWhileRunningBehaviour;
use crate::watch::WatchBinding;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start one invocation of this task.
    Dispatch(TaskName),
    /// Stop the loop (used with `exit_when_idle`).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct CoreRuntime {
    bindings: Vec<WatchBinding>,
    /// In-flight invocation count per task (more than one only with
    /// `overlap`).
    running: HashMap<TaskName, usize>,
    queue: TriggerQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(
        bindings: Vec<WatchBinding>,
        behaviour: TriggerWhileRunningBehaviour,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            bindings,
            running: HashMap::new(),
            queue: TriggerQueue::new(behaviour),
            options,
        }
    }

    /// Nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn running_count(&self, task: &str) -> usize {
        self.running.get(task).copied().unwrap_or(0)
    }

    /// Tasks bound to `rel_path`, in binding order, without duplicates.
    pub fn tasks_for_path(&self, rel_path: &str) -> Vec<TaskName> {
        let mut tasks: Vec<TaskName> = Vec::new();
        for binding in &self.bindings {
            if binding.matches(rel_path) && !tasks.iter().any(|t| t == binding.task()) {
                tasks.push(binding.task().to_string());
            }
        }
        tasks
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let mut commands = Vec::new();

        match event {
            RuntimeEvent::FileChanged { rel_path } => {
                let tasks = self.tasks_for_path(&rel_path);
                debug!(path = %rel_path, ?tasks, "file change matched bindings");
                for task in tasks {
                    self.handle_trigger(task, TriggerReason::FileWatch, &mut commands);
                }
            }
            RuntimeEvent::TaskTriggered { task, reason } => {
                self.handle_trigger(task, reason, &mut commands);
            }
            RuntimeEvent::TaskCompleted { task, outcome } => {
                self.handle_completion(task, outcome, &mut commands);
            }
            RuntimeEvent::ShutdownRequested => {
                return CoreStep {
                    commands,
                    keep_running: false,
                };
            }
        }

        if self.options.exit_when_idle && self.is_idle() && self.queue.is_empty() {
            commands.push(CoreCommand::RequestExit);
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }

    fn handle_trigger(
        &mut self,
        task: TaskName,
        reason: TriggerReason,
        commands: &mut Vec<CoreCommand>,
    ) {
        let running = self.running_count(&task);
        if running > 0 {
            match self.queue.behaviour() {
                TriggerWhileRunningBehaviour::Queue => {
                    debug!(task = %task, ?reason, "task busy; queueing follow-up");
                    self.queue.record_trigger(&task);
                    return;
                }
                TriggerWhileRunningBehaviour::Overlap => {
                    debug!(task = %task, ?reason, running, "task busy; overlapping");
                }
            }
        }
        self.start(task, commands);
    }

    fn handle_completion(
        &mut self,
        task: TaskName,
        outcome: TaskOutcome,
        commands: &mut Vec<CoreCommand>,
    ) {
        debug!(task = %task, ?outcome, "invocation completed");

        let remaining = match self.running.get_mut(&task) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.running.remove(&task);
            if self.queue.take(&task) {
                self.start(task, commands);
            }
        }
    }

    fn start(&mut self, task: TaskName, commands: &mut Vec<CoreCommand>) {
        *self.running.entry(task.clone()).or_insert(0) += 1;
        commands.push(CoreCommand::Dispatch(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(task: &str, glob: &str) -> WatchBinding {
        WatchBinding::new(task, glob, &[]).unwrap()
    }

    fn core(behaviour: TriggerWhileRunningBehaviour) -> CoreRuntime {
        CoreRuntime::new(
            vec![
                binding("copy:html", "src/*.html"),
                binding("styles", "src/styles/**/*.scss"),
                binding("scripts", "src/scripts/*.js"),
            ],
            behaviour,
            RuntimeOptions::default(),
        )
    }

    fn changed(path: &str) -> RuntimeEvent {
        RuntimeEvent::FileChanged {
            rel_path: path.to_string(),
        }
    }

    fn completed(task: &str) -> RuntimeEvent {
        RuntimeEvent::TaskCompleted {
            task: task.to_string(),
            outcome: TaskOutcome::Success,
        }
    }

    #[test]
    fn file_change_dispatches_exactly_the_bound_task() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue);
        let step = core.step(changed("src/styles/partials/_nav.scss"));
        assert_eq!(step.commands, vec![CoreCommand::Dispatch("styles".into())]);
        assert!(step.keep_running);
    }

    #[test]
    fn unmatched_change_does_nothing() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue);
        let step = core.step(changed("README.md"));
        assert!(step.commands.is_empty());
    }

    #[test]
    fn queue_mode_coalesces_retriggers_into_one_follow_up() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue);
        core.step(changed("src/index.html"));
        assert!(core.step(changed("src/index.html")).commands.is_empty());
        assert!(core.step(changed("src/about.html")).commands.is_empty());

        let step = core.step(completed("copy:html"));
        assert_eq!(step.commands, vec![CoreCommand::Dispatch("copy:html".into())]);

        let step = core.step(completed("copy:html"));
        assert!(step.commands.is_empty());
        assert!(core.is_idle());
    }

    #[test]
    fn overlap_mode_dispatches_immediately() {
        let mut core = core(TriggerWhileRunningBehaviour::Overlap);
        core.step(changed("src/index.html"));
        let step = core.step(changed("src/index.html"));
        assert_eq!(step.commands, vec![CoreCommand::Dispatch("copy:html".into())]);
        assert_eq!(core.running_count("copy:html"), 2);
    }

    #[test]
    fn failure_does_not_block_later_triggers() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue);
        core.step(changed("src/scripts/app.js"));
        core.step(RuntimeEvent::TaskCompleted {
            task: "scripts".into(),
            outcome: TaskOutcome::Failed("syntax error".into()),
        });
        let step = core.step(changed("src/scripts/app.js"));
        assert_eq!(step.commands, vec![CoreCommand::Dispatch("scripts".into())]);
    }

    #[test]
    fn exit_when_idle_after_last_completion() {
        let mut core = CoreRuntime::new(
            vec![],
            TriggerWhileRunningBehaviour::Queue,
            RuntimeOptions {
                exit_when_idle: true,
            },
        );
        let step = core.step(RuntimeEvent::TaskTriggered {
            task: "build".into(),
            reason: TriggerReason::Manual,
        });
        assert!(step.keep_running);

        let step = core.step(completed("build"));
        assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
        assert!(!step.keep_running);
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = core(TriggerWhileRunningBehaviour::Queue);
        assert!(!core.step(RuntimeEvent::ShutdownRequested).keep_running);
    }
}
