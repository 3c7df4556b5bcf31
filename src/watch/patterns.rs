// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::config::model::ConfigFile;
use crate::tasks::TaskName;
use crate::transform::paths::normalize_pattern;

/// One glob bound to one task.
///
/// Patterns are relative to the project root. The watcher passes relative
/// paths (e.g. `"src/styles/main.scss"`) into [`WatchBinding::matches`].
#[derive(Clone)]
pub struct WatchBinding {
    task: TaskName,
    pattern: String,
    watch: GlobMatcher,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("task", &self.task)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(task: impl Into<TaskName>, pattern: &str, exclude: &[String]) -> Result<Self> {
        let task = task.into();
        let pattern = normalize_pattern(pattern);
        let watch = compile(&pattern)
            .with_context(|| format!("building watch glob for task {task}"))?
            .compile_matcher();

        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building exclude globset for task {task}"))?,
            )
        };

        Ok(Self {
            task,
            pattern,
            watch,
            exclude,
        })
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if `rel_path` triggers this binding's task.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// One binding per `(task, watch glob)` pair. Excludes are the task's own
/// list followed by `[default].exclude`.
pub fn build_bindings_from_config(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let mut bindings = Vec::new();

    for (name, task) in cfg.tasks() {
        if task.watch.is_empty() {
            continue;
        }
        let mut exclude = task.exclude.clone();
        exclude.extend(cfg.default.exclude.iter().cloned());

        for pattern in &task.watch {
            bindings.push(WatchBinding::new(name.clone(), pattern, &exclude)?);
        }
    }

    Ok(bindings)
}

fn compile(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile(&normalize_pattern(pat))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_does_not_cross_directories() {
        let b = WatchBinding::new("copy:html", "./src/*.html", &[]).unwrap();
        assert!(b.matches("src/index.html"));
        assert!(!b.matches("src/partials/nav.html"));
    }

    #[test]
    fn exclude_wins_over_watch() {
        let b = WatchBinding::new("styles", "src/styles/**", &["**/*.swp".to_string()]).unwrap();
        assert!(b.matches("src/styles/main.scss"));
        assert!(!b.matches("src/styles/.main.scss.swp"));
    }
}
