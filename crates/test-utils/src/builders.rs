#![allow(dead_code)]

use std::time::Duration;

use jobphase::config::{ConfigFile, ConfigSection, JobConfig, PhaseConfig, RawConfigFile};
use jobphase::engine::ReconcilerOptions;
use jobphase::model::{JobModel, JobSpec};
use serde_json::{Value, json};

/// Minimal manifest used for test jobs.
pub fn echo_definition(name: &str) -> Value {
    json!({
        "spec": {
            "template": {
                "spec": {
                    "restartPolicy": "Never",
                    "containers": [{ "name": name, "image": "busybox", "command": ["echo", name] }]
                }
            }
        }
    })
}

/// Builder for `JobSpec<Value>`.
pub struct JobSpecBuilder {
    spec: JobSpec<Value>,
}

impl JobSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            spec: JobSpec::new(name, Vec::new(), echo_definition(name)),
        }
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.spec.depends_on.push(dep.to_string());
        self
    }

    pub fn build(self) -> JobSpec<Value> {
        self.spec
    }
}

/// Builder for an (unvalidated) `JobModel<Value>`.
///
/// Phases are added in order; this can express models that config
/// validation would reject, e.g. dependencies on undeclared jobs.
#[derive(Default)]
pub struct JobModelBuilder {
    phases: Vec<Vec<JobSpec<Value>>>,
}

impl JobModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, jobs: Vec<JobSpecBuilder>) -> Self {
        self.phases
            .push(jobs.into_iter().map(JobSpecBuilder::build).collect());
        self
    }

    pub fn build(self) -> JobModel<Value> {
        JobModel::new(self.phases)
    }
}

/// Builder for a validated `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                phase: Vec::new(),
            },
        }
    }

    pub fn phase(mut self, jobs: Vec<JobConfig>) -> Self {
        self.config.phase.push(PhaseConfig { job: jobs });
        self
    }

    pub fn parallelization(mut self, n: usize) -> Self {
        self.config.config.parallelization = n;
        self
    }

    pub fn cleanup(mut self, val: bool) -> Self {
        self.config.config.cleanup = val;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `JobConfig` with dependencies.
pub fn job_config(name: &str, deps: &[&str]) -> JobConfig {
    let mut job = JobConfig::new(name);
    job.depends_on = deps.iter().map(|d| d.to_string()).collect();
    job.definition = echo_definition(name);
    job
}

/// Options with a 1ms tick so loop tests finish quickly.
pub fn fast_options(parallelization: usize, cleanup: bool) -> ReconcilerOptions {
    ReconcilerOptions {
        refresh_interval: Duration::from_millis(1),
        parallelization,
        cleanup,
    }
}
