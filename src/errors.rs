// src/errors.rs

//! Crate-wide error types.
//!
//! [`SupervisorError`] is the taxonomy of fatal outcomes of a single
//! supervised command. [`BootstrapError`] wraps it together with everything
//! the installer workflow can fail on.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::exec::ExecutionResult;

/// Fatal outcomes of one `Supervisor::run` call.
///
/// A nonzero exit with fail-fast disabled is *not* an error; it is returned as
/// data in [`ExecutionResult::exit_code`]. Stream read errors are logged and
/// never surface here.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("{description} failed: could not start `{command}`: {source}")]
    Spawn {
        description: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{description} timed out (exceeded {timeout:?})")]
    Timeout {
        description: String,
        timeout: Duration,
        /// Output drained before the process was killed.
        partial: ExecutionResult,
    },

    #[error("{description} failed with exit code {code}")]
    NonZeroExit {
        description: String,
        code: i32,
        result: ExecutionResult,
    },

    #[error("{description} failed: could not query process status: {source}")]
    Wait {
        description: String,
        #[source]
        source: std::io::Error,
    },
}

impl SupervisorError {
    /// Description of the step that failed.
    pub fn description(&self) -> &str {
        match self {
            SupervisorError::Spawn { description, .. }
            | SupervisorError::Timeout { description, .. }
            | SupervisorError::NonZeroExit { description, .. }
            | SupervisorError::Wait { description, .. } => description,
        }
    }
}

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Command(#[from] SupervisorError),

    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("archive {path:?} is unusable: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("{0}")]
    Runtime(String),

    #[error("{0}")]
    Environment(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
