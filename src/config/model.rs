// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ReloadKind, TriggerWhileRunningBehaviour};

/// Raw configuration as read from a TOML file (not yet validated).
///
/// ```toml
/// [config]
/// output = "dist"
///
/// [pipeline]
/// clean = "clean"
/// build = "assets"
///
/// [task.clean]
/// action = "clean"
///
/// [task."copy:html"]
/// action = "copy"
/// src = ["src/*.html"]
/// dest = "."
/// reload = "page"
/// watch = ["src/*.html"]
///
/// [task.assets]
/// parallel = ["copy:html"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Entry tasks for the lifecycle from `[pipeline]`.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Dev server settings from `[server]`.
    #[serde(default)]
    pub server: ServerSection,

    /// Defaults applied to every watch binding from `[default]`.
    #[serde(default)]
    pub default: DefaultSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holding one means every reference resolves and the task graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub pipeline: PipelineSection,
    pub server: ServerSection,
    pub default: DefaultSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            pipeline: raw.pipeline,
            server: raw.server,
            default: raw.default,
            task: raw.task,
        }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Output directory, relative to the project root. Fully regenerable:
    /// the clean step deletes everything inside it.
    #[serde(default = "default_output")]
    pub output: String,

    /// Name of the one environment variable selecting the build mode.
    #[serde(default = "default_mode_var")]
    pub mode_var: String,

    /// Quiet window per path before a file event is dispatched.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// `"queue"` (default) or `"overlap"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Drop file events whose content hash did not change.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_output() -> String {
    "dist".to_string()
}

fn default_mode_var() -> String {
    "ASSETFLOW_ENV".to_string()
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            output: default_output(),
            mode_var: default_mode_var(),
            debounce_ms: default_debounce_ms(),
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            use_hash: false,
        }
    }
}

/// `[pipeline]` section: which tasks make up the CLEANING and BUILDING phases.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_clean_task")]
    pub clean: String,

    #[serde(default = "default_build_task")]
    pub build: String,
}

fn default_clean_task() -> String {
    "clean".to_string()
}

fn default_build_task() -> String {
    "build".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            clean: default_clean_task(),
            build: default_build_task(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Open the served URL in the default browser once listening.
    #[serde(default)]
    pub open: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open: false,
        }
    }
}

/// `[default]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    /// Exclude globs applied to every watch binding.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Built-in leaf actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Clean,
    Copy,
    Concat,
    Command,
}

/// `[task.<name>]` section.
///
/// A task is either a leaf (`action = ...`) or a composite (`series` or
/// `parallel`), never both.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    #[serde(default)]
    pub action: Option<ActionKind>,

    #[serde(default)]
    pub description: Option<String>,

    /// Source globs, relative to the project root (`copy`, `concat`).
    #[serde(default)]
    pub src: Vec<String>,

    /// Destination relative to the output directory: a directory for `copy`,
    /// a file for `concat`.
    #[serde(default)]
    pub dest: Option<String>,

    /// Joiner between concatenated files; defaults to a newline.
    #[serde(default)]
    pub separator: Option<String>,

    /// Command used in both modes unless a mode-specific one is given.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub dev_cmd: Option<String>,

    #[serde(default)]
    pub prod_cmd: Option<String>,

    /// Files (relative to the output directory) a `command` task produces.
    /// Only used to name stylesheets in css reload signals.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Members run strictly in order.
    #[serde(default)]
    pub series: Vec<String>,

    /// Members run concurrently.
    #[serde(default)]
    pub parallel: Vec<String>,

    #[serde(default)]
    pub reload: ReloadKind,

    /// Globs (relative to the project root) that re-trigger this task.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Globs that never trigger this task, on top of `[default].exclude`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// What a task does, derived from which fields are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Leaf(ActionKind),
    Series,
    Parallel,
}

impl TaskConfig {
    /// Classify the task; `None` when the fields are contradictory or empty
    /// (validation reports those).
    pub fn kind(&self) -> Option<TaskKind> {
        let composite = (!self.series.is_empty(), !self.parallel.is_empty());
        match (self.action, composite) {
            (Some(action), (false, false)) => Some(TaskKind::Leaf(action)),
            (None, (true, false)) => Some(TaskKind::Series),
            (None, (false, true)) => Some(TaskKind::Parallel),
            _ => None,
        }
    }

    /// Sub-tasks of a composite, in declaration order.
    pub fn members(&self) -> &[String] {
        if !self.series.is_empty() {
            &self.series
        } else {
            &self.parallel
        }
    }
}
