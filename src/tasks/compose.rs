// src/tasks/compose.rs

//! Series and parallel combinators over registry invocations.

use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error};

use crate::tasks::{RunContext, TaskName, TaskRegistry, TaskReport, TaskResult};

/// Run `members` strictly in order. Member i+1 starts only after member i
/// succeeded; the first failure ends the series and is returned as is.
pub async fn run_series(
    registry: &TaskRegistry,
    name: &str,
    members: &[TaskName],
    ctx: &RunContext,
) -> TaskResult {
    let started = Instant::now();
    let mut outputs = Vec::new();

    for member in members {
        debug!(task = %name, member = %member, "series step");
        let report = registry.run(member, ctx).await?;
        outputs.extend(report.outputs);
    }

    Ok(TaskReport {
        task: name.to_string(),
        outputs,
        elapsed: started.elapsed(),
    })
}

/// Start every member at once and wait for all of them.
///
/// Members are never cancelled when a sibling fails. If several fail, the
/// failure of the earliest-declared member is returned and every other
/// failure is logged here.
pub async fn run_parallel(
    registry: &TaskRegistry,
    name: &str,
    members: &[TaskName],
    ctx: &RunContext,
) -> TaskResult {
    let started = Instant::now();
    debug!(task = %name, members = ?members, "parallel start");

    let results = join_all(members.iter().map(|m| registry.run(m, ctx))).await;

    let mut outputs = Vec::new();
    let mut first_failure = None;
    for result in results {
        match result {
            Ok(report) => outputs.extend(report.outputs),
            Err(failure) if first_failure.is_none() => first_failure = Some(failure),
            Err(failure) => {
                error!(
                    task = %failure.task,
                    path = ?failure.path,
                    error = %failure.message,
                    parent = %name,
                    "parallel member failed"
                );
            }
        }
    }

    if let Some(failure) = first_failure {
        return Err(failure);
    }

    Ok(TaskReport {
        task: name.to_string(),
        outputs,
        elapsed: started.elapsed(),
    })
}
