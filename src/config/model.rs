// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::types::{ClusterContext, parse_duration};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// namespace = "batch"
/// refresh_interval = "5s"
/// parallelization = 2
///
/// [[phase]]
/// [[phase.job]]
/// name = "extract"
/// [phase.job.definition.spec.template.spec]
/// restartPolicy = "Never"
///
/// [[phase]]
/// [[phase.job]]
/// name = "load"
/// depends_on = ["extract"]
/// ```
///
/// This is the *unvalidated* form; convert with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Phases in run order (`[[phase]]` array of tables).
    #[serde(default)]
    pub phase: Vec<PhaseConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (or [`ConfigFile::new_unchecked`]).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub phase: Vec<PhaseConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, phase: Vec<PhaseConfig>) -> Self {
        Self { config, phase }
    }

    /// Total number of jobs across all phases.
    pub fn job_count(&self) -> usize {
        self.phase.iter().map(|p| p.job.len()).sum()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Namespace every job is created, listed and deleted in.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Sleep between reconciliation ticks.
    #[serde(
        default = "default_refresh_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub refresh_interval: Duration,

    /// Upper bound for a single backend call.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,

    /// Maximum number of concurrently active jobs; `0` means unbounded.
    #[serde(default)]
    pub parallelization: usize,

    /// Delete every job of the run once the final phase has finished.
    #[serde(default = "default_cleanup")]
    pub cleanup: bool,

    #[serde(default)]
    pub cluster_context: ClusterContext,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_cleanup() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            refresh_interval: default_refresh_interval(),
            request_timeout: default_request_timeout(),
            parallelization: 0,
            cleanup: default_cleanup(),
            cluster_context: ClusterContext::default(),
        }
    }
}

/// One `[[phase]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseConfig {
    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// One `[[phase.job]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Logical job name; also used as the Kubernetes Job name.
    pub name: String,

    /// Names of jobs that must have finished before this one is submitted.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Job manifest, forwarded as-is apart from name and labels.
    ///
    /// `apiVersion`, `kind` and `metadata` may be omitted.
    #[serde(default = "empty_definition")]
    pub definition: serde_json::Value,
}

fn empty_definition() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl JobConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            definition: empty_definition(),
        }
    }
}
