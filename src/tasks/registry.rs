// src/tasks/registry.rs

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::model::{ConfigFile, TaskKind};
use crate::dag::DagGraph;
use crate::errors::{AssetflowError, Result};
use crate::tasks::compose::{run_parallel, run_series};
use crate::tasks::{RunContext, TaskFailure, TaskName, TaskReport, TaskResult};
use crate::transform::{self, Transformer};
use crate::types::ReloadKind;

/// Boxed future returned by [`TaskRegistry::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = TaskResult> + Send + 'a>>;

#[derive(Debug, Clone)]
enum TaskShape {
    Leaf(Arc<dyn Transformer>),
    Series(Vec<TaskName>),
    Parallel(Vec<TaskName>),
}

#[derive(Debug, Clone)]
struct TaskNode {
    shape: TaskShape,
    reload: ReloadKind,
}

/// Mapping from task name to a runnable unit.
///
/// Names are unique. A composite can only reference tasks registered before
/// it, which rules out cycles by construction.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskName, TaskNode>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every task of a validated config, members first.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let graph = DagGraph::from_config(cfg);
        let mut registry = Self::new();

        for name in graph.members_first_order() {
            let Some(task) = cfg.task.get(&name) else {
                continue;
            };
            match task.kind() {
                Some(TaskKind::Leaf(action)) => {
                    let transformer: Arc<dyn Transformer> =
                        Arc::from(transform::from_task_config(action, task));
                    registry.register(&name, transformer, task.reload)?;
                }
                Some(TaskKind::Series) => {
                    registry.compose_series(&name, task.series.clone())?;
                    registry.set_reload(&name, task.reload)?;
                }
                Some(TaskKind::Parallel) => {
                    registry.compose_parallel(&name, task.parallel.clone())?;
                    registry.set_reload(&name, task.reload)?;
                }
                None => {
                    return Err(AssetflowError::config(format!(
                        "task '{name}' must set exactly one of action, series or parallel"
                    )));
                }
            }
        }

        debug!(tasks = registry.tasks.len(), "task registry built");
        Ok(registry)
    }

    /// Register a leaf task.
    pub fn register(
        &mut self,
        name: &str,
        transformer: Arc<dyn Transformer>,
        reload: ReloadKind,
    ) -> Result<()> {
        self.ensure_new(name)?;
        self.tasks.insert(
            name.to_string(),
            TaskNode {
                shape: TaskShape::Leaf(transformer),
                reload,
            },
        );
        Ok(())
    }

    /// Register `name` as the ordered series of already-registered `members`.
    pub fn compose_series(&mut self, name: &str, members: Vec<TaskName>) -> Result<()> {
        self.ensure_composable(name, &members)?;
        self.insert_composite(name, TaskShape::Series(members));
        Ok(())
    }

    /// Register `name` as the concurrent group of already-registered `members`.
    pub fn compose_parallel(&mut self, name: &str, members: Vec<TaskName>) -> Result<()> {
        self.ensure_composable(name, &members)?;
        self.insert_composite(name, TaskShape::Parallel(members));
        Ok(())
    }

    /// Make a successful run of `name` push a live-reload signal covering
    /// everything it wrote.
    pub fn set_reload(&mut self, name: &str, reload: ReloadKind) -> Result<()> {
        let node = self
            .tasks
            .get_mut(name)
            .ok_or_else(|| AssetflowError::TaskNotFound(name.to_string()))?;
        node.reload = reload;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn reload_kind(&self, name: &str) -> ReloadKind {
        self.tasks
            .get(name)
            .map(|node| node.reload)
            .unwrap_or_default()
    }

    /// One-line description used by `--dry-run`.
    pub fn describe(&self, name: &str) -> Option<String> {
        self.tasks.get(name).map(|node| match &node.shape {
            TaskShape::Leaf(transformer) => transformer.describe(),
            TaskShape::Series(m) => format!("series {}", m.join(" -> ")),
            TaskShape::Parallel(m) => format!("parallel {}", m.join(" | ")),
        })
    }

    /// Run a task once. Unknown names resolve to a failure.
    pub fn run<'a>(&'a self, name: &'a str, ctx: &'a RunContext) -> TaskFuture<'a> {
        Box::pin(async move {
            let Some(node) = self.tasks.get(name) else {
                return Err(TaskFailure::new(name, "no such task"));
            };
            let report = match &node.shape {
                TaskShape::Leaf(transformer) => {
                    self.run_leaf(name, transformer.as_ref(), ctx).await?
                }
                TaskShape::Series(members) => run_series(self, name, members, ctx).await?,
                TaskShape::Parallel(members) => run_parallel(self, name, members, ctx).await?,
            };
            notify_reload(ctx, node.reload, &report);
            Ok(report)
        })
    }

    async fn run_leaf(
        &self,
        name: &str,
        transformer: &dyn Transformer,
        ctx: &RunContext,
    ) -> TaskResult {
        let started = Instant::now();
        debug!(task = %name, "task started");

        let report = transformer
            .transform(&ctx.settings)
            .await
            .map_err(|e| TaskFailure::from_transform(name, e))?;

        let elapsed = started.elapsed();
        info!(
            task = %name,
            elapsed_ms = elapsed.as_millis() as u64,
            outputs = report.outputs.len(),
            "task finished"
        );

        Ok(TaskReport {
            task: name.to_string(),
            outputs: report.outputs,
            elapsed,
        })
    }

    fn insert_composite(&mut self, name: &str, shape: TaskShape) {
        self.tasks.insert(
            name.to_string(),
            TaskNode {
                shape,
                reload: ReloadKind::None,
            },
        );
    }

    fn ensure_new(&self, name: &str) -> Result<()> {
        if self.tasks.contains_key(name) {
            return Err(AssetflowError::config(format!(
                "task '{name}' is already registered"
            )));
        }
        Ok(())
    }

    fn ensure_composable(&self, name: &str, members: &[TaskName]) -> Result<()> {
        self.ensure_new(name)?;
        if members.is_empty() {
            return Err(AssetflowError::config(format!(
                "composite task '{name}' has no members"
            )));
        }
        if let Some(missing) = members.iter().find(|m| !self.tasks.contains_key(*m)) {
            return Err(AssetflowError::TaskNotFound(format!(
                "task '{name}' references unknown task '{missing}'"
            )));
        }
        Ok(())
    }
}

fn notify_reload(ctx: &RunContext, reload: ReloadKind, report: &TaskReport) {
    let Some(hub) = &ctx.reload else { return };
    if reload == ReloadKind::None {
        return;
    }
    let rel: Vec<String> = report
        .outputs
        .iter()
        .filter_map(|p| ctx.settings.output_relative(p))
        .collect();
    hub.notify(reload, &rel);
}
