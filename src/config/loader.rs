// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetflowError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (dangling references, cycles, globs). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        AssetflowError::config(format!("reading config file {}: {e}", path.display()))
    })?;

    load_from_str(&contents)
}

/// Parse a configuration from an in-memory TOML string.
pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - dangling task references in compositions and `[pipeline]`,
///   - cycles among composite tasks,
///   - invalid globs and unsafe output directories.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Default config path: `Assetflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetflow.toml")
}
