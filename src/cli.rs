// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Build front-end assets, then watch, rebuild and live-reload them.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Its directory is the project root.
    #[arg(long, value_name = "PATH", default_value = "Assetflow.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph, but don't run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// What to do; `dev` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Dev)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Clean, build, then watch sources and serve the output with live reload.
    Dev,
    /// Clean and build once.
    Build,
    /// Run one named task once, without cleaning.
    Run {
        #[arg(value_name = "TASK")]
        task: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_is_the_default_command() {
        let args = CliArgs::try_parse_from(["assetflow"]).unwrap();
        assert_eq!(args.command(), Command::Dev);
        assert_eq!(args.config, "Assetflow.toml");
    }

    #[test]
    fn run_takes_a_task_name() {
        let args =
            CliArgs::try_parse_from(["assetflow", "run", "styles", "--config", "site/Assetflow.toml"])
                .unwrap();
        assert_eq!(
            args.command(),
            Command::Run {
                task: "styles".into()
            }
        );
        assert_eq!(args.config, "site/Assetflow.toml");
    }
}
