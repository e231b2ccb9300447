// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobphaseError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A create/list/delete call was rejected by the job backend.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend call '{operation}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The opaque job definition could not be turned into a backend job object.
    #[error("Invalid job definition: {0}")]
    InvalidDefinition(#[from] serde_json::Error),

    #[error("Job '{job}' has no start or completion timestamp; cannot compute report")]
    MissingTimestamp { job: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobphaseError>;
