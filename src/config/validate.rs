// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ActionKind, ConfigFile, RawConfigFile, TaskConfig, TaskKind};
use crate::errors::{AssetflowError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_shapes(cfg)?;
    validate_task_references(cfg)?;
    validate_pipeline(cfg)?;
    validate_globs(cfg)?;
    validate_output_disjoint(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(AssetflowError::config(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    validate_output_dir(&cfg.config.output)?;

    if cfg.config.mode_var.trim().is_empty() {
        return Err(AssetflowError::config("[config].mode_var must not be empty"));
    }

    if cfg.server.port == 0 {
        return Err(AssetflowError::config("[server].port must be >= 1 (got 0)"));
    }

    Ok(())
}

/// The clean step deletes everything under the output directory, so it must
/// be a real subdirectory of the project root.
fn validate_output_dir(output: &str) -> Result<()> {
    let path = Path::new(output);
    let mut normal_components = 0;

    for component in path.components() {
        match component {
            Component::Normal(_) => normal_components += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AssetflowError::config(format!(
                    "[config].output '{output}' must be a relative path inside the project root"
                )));
            }
        }
    }

    if normal_components == 0 {
        return Err(AssetflowError::config(format!(
            "[config].output '{output}' must name a subdirectory of the project root"
        )));
    }

    Ok(())
}

fn validate_task_shapes(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        let kind = task.kind().ok_or_else(|| {
            AssetflowError::config(format!(
                "task '{name}' must set exactly one of `action`, `series` or `parallel`"
            ))
        })?;

        if let TaskKind::Leaf(action) = kind {
            validate_leaf(name, action, task)?;
        }
    }
    Ok(())
}

fn validate_leaf(name: &str, action: ActionKind, task: &TaskConfig) -> Result<()> {
    match action {
        ActionKind::Clean => Ok(()),
        ActionKind::Copy | ActionKind::Concat => {
            if task.src.is_empty() {
                return Err(AssetflowError::config(format!(
                    "task '{name}' ({action:?}) needs at least one `src` glob"
                )));
            }
            match task.dest.as_deref() {
                Some(dest) if is_contained(dest) => Ok(()),
                Some(dest) => Err(AssetflowError::config(format!(
                    "task '{name}' has `dest = \"{dest}\"` outside the output directory"
                ))),
                None => Err(AssetflowError::config(format!(
                    "task '{name}' ({action:?}) needs a `dest`"
                ))),
            }
        }
        ActionKind::Command => {
            let has_both_modes = task.dev_cmd.is_some() && task.prod_cmd.is_some();
            if task.cmd.is_none() && !has_both_modes {
                return Err(AssetflowError::config(format!(
                    "task '{name}' (command) needs `cmd`, or both `dev_cmd` and `prod_cmd`"
                )));
            }
            Ok(())
        }
    }
}

fn is_contained(rel: &str) -> bool {
    Path::new(rel)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn validate_task_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for member in task.members() {
            if !cfg.task.contains_key(member) {
                return Err(AssetflowError::TaskNotFound(format!(
                    "task '{name}' references unknown task '{member}'"
                )));
            }
            if member == name {
                return Err(AssetflowError::DagCycle(format!(
                    "task '{name}' cannot contain itself"
                )));
            }
        }
    }
    Ok(())
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    for (field, task) in [("clean", &cfg.pipeline.clean), ("build", &cfg.pipeline.build)] {
        if !cfg.task.contains_key(task) {
            return Err(AssetflowError::TaskNotFound(format!(
                "[pipeline].{field} references unknown task '{task}'"
            )));
        }
    }
    Ok(())
}

fn validate_globs(cfg: &RawConfigFile) -> Result<()> {
    for pat in cfg.default.exclude.iter() {
        check_glob("[default].exclude", pat)?;
    }

    for (name, task) in cfg.task.iter() {
        let lists = [("src", &task.src), ("watch", &task.watch), ("exclude", &task.exclude)];
        for (field, patterns) in lists {
            for pat in patterns.iter() {
                check_glob(&format!("task '{name}' `{field}`"), pat)?;
            }
        }
    }
    Ok(())
}

fn check_glob(location: &str, pattern: &str) -> Result<()> {
    Glob::new(pattern).map(|_| ()).map_err(|e| {
        AssetflowError::config(format!("{location}: invalid glob '{pattern}': {e}"))
    })
}

/// Sources and watched files must live outside the output directory: clean
/// would delete them and the watcher ignores that directory.
fn validate_output_disjoint(cfg: &RawConfigFile) -> Result<()> {
    let output = normal_path(&cfg.config.output);

    for (name, task) in cfg.task.iter() {
        for (field, patterns) in [("src", &task.src), ("watch", &task.watch)] {
            for pat in patterns.iter() {
                if literal_prefix(pat).starts_with(&output) {
                    return Err(AssetflowError::config(format!(
                        "task '{name}' `{field}` pattern '{pat}' lies inside the output \
                         directory '{}'",
                        cfg.config.output
                    )));
                }
            }
        }
    }
    Ok(())
}

fn normal_path(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Leading components of a glob without glob syntax. For a literal path
/// this is the whole path.
fn literal_prefix(pattern: &str) -> PathBuf {
    let pattern = pattern.replace('\\', "/");
    pattern
        .split('/')
        .take_while(|part| !part.contains(['*', '?', '[', '{']))
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: composite -> member.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for member in task.members() {
            graph.add_edge(name.as_str(), member.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(AssetflowError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
