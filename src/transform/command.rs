// src/transform/command.rs

//! Transformer that delegates to an external tool.
//!
//! The command line runs through the platform shell in the project root. It
//! sees `ASSETFLOW_MODE` (`development` / `production`) and `ASSETFLOW_OUT`
//! (absolute output directory) in its environment. The output directory is
//! created before the command starts.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::transform::{
    BuildSettings, TransformError, TransformFuture, TransformReport, Transformer,
};
use crate::types::Mode;

/// Number of trailing stderr lines kept in the failure message.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct CommandTransformer {
    cmd: Option<String>,
    dev_cmd: Option<String>,
    prod_cmd: Option<String>,
    /// Produced files, relative to the output directory.
    outputs: Vec<String>,
}

impl CommandTransformer {
    pub fn new(
        cmd: Option<String>,
        dev_cmd: Option<String>,
        prod_cmd: Option<String>,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            cmd,
            dev_cmd,
            prod_cmd,
            outputs,
        }
    }

    /// Command line for `mode`: the mode-specific one if set, else `cmd`.
    pub fn command_for(&self, mode: Mode) -> Option<&str> {
        let specific = match mode {
            Mode::Development => self.dev_cmd.as_deref(),
            Mode::Production => self.prod_cmd.as_deref(),
        };
        specific.or(self.cmd.as_deref())
    }
}

fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

impl Transformer for CommandTransformer {
    fn describe(&self) -> String {
        match (&self.cmd, &self.dev_cmd, &self.prod_cmd) {
            (_, Some(dev), Some(prod)) => format!("command dev=`{dev}` prod=`{prod}`"),
            (Some(cmd), _, _) => format!("command `{cmd}`"),
            _ => "command (unset)".to_string(),
        }
    }

    fn transform<'a>(&'a self, settings: &'a BuildSettings) -> TransformFuture<'a> {
        Box::pin(async move {
            let line = self.command_for(settings.mode).ok_or_else(|| {
                TransformError::new(format!("no command configured for {} mode", settings.mode))
            })?;

            tokio::fs::create_dir_all(&settings.output)
                .await
                .map_err(|e| TransformError::io(&settings.output, e))?;

            info!(cmd = %line, mode = %settings.mode, "running command");

            let output = shell_command(line)
                .current_dir(&settings.root)
                .env("ASSETFLOW_MODE", settings.mode.as_str())
                .env("ASSETFLOW_OUT", &settings.output)
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|e| TransformError::new(format!("failed to spawn `{line}`: {e}")))?;

            if !output.status.success() {
                let code = output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let tail = stderr_tail(&output.stderr);
                let message = if tail.is_empty() {
                    format!("`{line}` exited with {code}")
                } else {
                    format!("`{line}` exited with {code}:\n{tail}")
                };
                return Err(TransformError::new(message));
            }

            debug!(cmd = %line, "command finished");
            let outputs = self
                .outputs
                .iter()
                .map(|rel| settings.output.join(rel))
                .collect();
            Ok(TransformReport::with_outputs(outputs))
        })
    }
}
