// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::tasks::{RunContext, TaskName, TaskRegistry};

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent, TaskOutcome};

/// Dispatch loop for watch mode.
///
/// An IO shell around [`CoreRuntime`], which holds all the dispatch
/// semantics. This struct reads events from the channel, spawns each
/// invocation without waiting on others, and reports completions back
/// through the same channel. A failed invocation is logged and never stops
/// the loop.
pub struct Runtime {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    registry: Arc<TaskRegistry>,
    ctx: Arc<RunContext>,
    in_flight: JoinSet<()>,
    /// Task name per spawned invocation, for completions that never report
    /// back (a panicking transformer).
    names: HashMap<Id, TaskName>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// `event_tx` must feed `event_rx`; completions are sent through it.
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        registry: Arc<TaskRegistry>,
        ctx: RunContext,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            registry,
            ctx: Arc::new(ctx),
            in_flight: JoinSet::new(),
            names: HashMap::new(),
        }
    }

    /// Main event loop.
    ///
    /// Returns after `ShutdownRequested` (or, with `exit_when_idle`, once
    /// idle) and after every in-flight invocation has finished.
    pub async fn run(self) -> Result<()> {
        let Runtime {
            mut core,
            mut event_rx,
            event_tx,
            registry,
            ctx,
            mut in_flight,
            mut names,
        } = self;

        info!("dispatch loop started");

        loop {
            let event = tokio::select! {
                maybe = event_rx.recv() => {
                    let Some(event) = maybe else {
                        info!("runtime event channel closed; exiting");
                        break;
                    };
                    event
                }
                Some(joined) = in_flight.join_next_with_id(), if !in_flight.is_empty() => {
                    match reap(&mut names, joined) {
                        Some(event) => event,
                        None => continue,
                    }
                }
            };

            debug!(?event, "runtime received event");

            let step = core.step(event);

            for command in step.commands {
                match command {
                    CoreCommand::Dispatch(task) => {
                        let id =
                            spawn_invocation(&mut in_flight, &registry, &ctx, &event_tx, &task);
                        names.insert(id, task);
                    }
                    CoreCommand::RequestExit => {
                        debug!("core issued RequestExit command");
                    }
                }
            }

            if !step.keep_running {
                info!("core requested exit; stopping dispatch loop");
                break;
            }
        }

        // Completions sent from here on are dropped.
        drop(event_rx);
        if !in_flight.is_empty() {
            info!(remaining = in_flight.len(), "waiting for in-flight tasks");
        }
        while in_flight.join_next().await.is_some() {}

        info!("dispatch loop exiting");
        Ok(())
    }
}

/// Forget a finished invocation. An invocation that did not run to the end
/// never sent its completion, so one is made up here to release the task in
/// the core.
fn reap(
    names: &mut HashMap<Id, TaskName>,
    joined: std::result::Result<(Id, ()), JoinError>,
) -> Option<RuntimeEvent> {
    match joined {
        Ok((id, ())) => {
            names.remove(&id);
            None
        }
        Err(err) => {
            let task = names.remove(&err.id())?;
            error!(task = %task, error = %err, "task invocation aborted");
            Some(RuntimeEvent::TaskCompleted {
                task,
                outcome: TaskOutcome::Failed(err.to_string()),
            })
        }
    }
}

fn spawn_invocation(
    in_flight: &mut JoinSet<()>,
    registry: &Arc<TaskRegistry>,
    ctx: &Arc<RunContext>,
    event_tx: &mpsc::Sender<RuntimeEvent>,
    task: &str,
) -> Id {
    let registry = Arc::clone(registry);
    let ctx = Arc::clone(ctx);
    let tx = event_tx.clone();
    let task = task.to_string();

    info!(task = %task, "dispatching");
    in_flight
        .spawn(async move {
            let outcome = match registry.run(&task, &ctx).await {
                Ok(report) => {
                    debug!(
                        task = %task,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "invocation succeeded"
                    );
                    TaskOutcome::Success
                }
                Err(failure) => {
                    error!(
                        task = %failure.task,
                        path = ?failure.path,
                        error = %failure.message,
                        "task failed"
                    );
                    TaskOutcome::Failed(failure.to_string())
                }
            };
            let _ = tx.send(RuntimeEvent::TaskCompleted { task, outcome }).await;
        })
        .id()
}
