// src/config/mod.rs

//! Configuration loading and validation for jobphase.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the job model before any job is submitted (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, JobConfig, PhaseConfig, RawConfigFile};
