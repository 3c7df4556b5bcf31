// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a watch event re-triggers a task that is still running.
///
/// - `Queue`: remember the trigger and run the task once more after the
///   current invocation finishes. Repeated triggers coalesce into a single
///   follow-up run (default behaviour).
/// - `Overlap`: dispatch immediately, letting the new invocation race the one
///   already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Overlap,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "overlap" => Ok(TriggerWhileRunningBehaviour::Overlap),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"overlap\")"
            )),
        }
    }
}

/// Build mode selected once at startup from the mode environment variable.
///
/// Transformers consult it to pick optional stages (source maps in
/// development, prefixing and minification in production).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// Interpret the raw value of the mode variable.
    ///
    /// `None` (variable unset) and the empty string mean development.
    pub fn from_env_value(value: Option<&str>) -> Result<Self, String> {
        match value.map(str::trim) {
            None | Some("") => Ok(Mode::Development),
            Some(v) => v.parse(),
        }
    }

    /// Read the mode from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, String> {
        let value = std::env::var(var).ok();
        Mode::from_env_value(value.as_deref())
            .map_err(|e| format!("{var}: {e}"))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    pub fn is_production(self) -> bool {
        self == Mode::Production
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Mode::Development),
            "prod" | "production" => Ok(Mode::Production),
            other => Err(format!(
                "invalid mode: {other} (expected \"dev\", \"development\", \"prod\" or \"production\")"
            )),
        }
    }
}

/// Live-reload signal a leaf task pushes to browsers after it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    #[default]
    None,
    /// Full page reload (markup, scripts).
    Page,
    /// Re-fetch stylesheets in place without reloading the page.
    Css,
}
