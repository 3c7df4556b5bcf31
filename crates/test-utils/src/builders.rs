#![allow(dead_code)]

use assetflow::config::{ActionKind, ConfigFile, RawConfigFile, TaskConfig};
use assetflow::errors::Result;
use assetflow::types::ReloadKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: assetflow::config::load_from_str("")
                .expect("empty config parses to defaults"),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.config.config.output = output.to_string();
        self
    }

    pub fn with_pipeline(mut self, clean: &str, build: &str) -> Self {
        self.config.pipeline.clean = clean.to_string();
        self.config.pipeline.build = build.to_string();
        self
    }

    pub fn with_global_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn action(action: ActionKind) -> Self {
        Self {
            task: TaskConfig {
                action: Some(action),
                ..TaskConfig::default()
            },
        }
    }

    pub fn clean() -> Self {
        Self::action(ActionKind::Clean)
    }

    pub fn copy(src: &str, dest: &str) -> Self {
        Self::action(ActionKind::Copy).src(src).dest(dest)
    }

    pub fn concat(dest: &str) -> Self {
        Self::action(ActionKind::Concat).dest(dest)
    }

    pub fn command(cmd: &str) -> Self {
        let mut b = Self::action(ActionKind::Command);
        b.task.cmd = Some(cmd.to_string());
        b
    }

    pub fn series(members: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                series: members.iter().map(|m| m.to_string()).collect(),
                ..TaskConfig::default()
            },
        }
    }

    pub fn parallel(members: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                parallel: members.iter().map(|m| m.to_string()).collect(),
                ..TaskConfig::default()
            },
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.task.dest = Some(dest.to_string());
        self
    }

    pub fn separator(mut self, sep: &str) -> Self {
        self.task.separator = Some(sep.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.task.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn reload(mut self, kind: ReloadKind) -> Self {
        self.task.reload = kind;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
