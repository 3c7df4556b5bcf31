// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::tasks::TaskFailure;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Task(#[from] TaskFailure),

    #[error("Illegal lifecycle transition: {0}")]
    IllegalTransition(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetflowError {
    /// Shorthand for building a [`AssetflowError::ConfigError`].
    pub fn config(msg: impl Into<String>) -> Self {
        AssetflowError::ConfigError(msg.into())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
