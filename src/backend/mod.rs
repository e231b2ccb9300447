// src/backend/mod.rs

//! Job backend abstraction.
//!
//! The reconciler talks to a `JobBackend` instead of a concrete cluster
//! client. Production uses [`KubeBackend`] (Kubernetes `batch/v1` Jobs);
//! tests swap in an in-memory fake that records what was created/deleted.
//!
//! Every job the reconciler creates carries two labels ([`JobLabels`]):
//! the phase index and the logical job name. All run state is recovered
//! from those labels; there is no other state store.

pub mod kubernetes;
pub mod selector;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::model::{JobName, JobSpec};

pub use kubernetes::KubeBackend;
pub use selector::LabelSelector;

/// Label carrying the phase index (`phase=<index>`).
pub const PHASE_LABEL: &str = "phase";
/// Label carrying the logical job name (`jobname=<name>`).
pub const NAME_LABEL: &str = "jobname";

/// Boxed future returned by backend calls.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Trait abstracting the cluster job API.
pub trait JobBackend: Send {
    /// Opaque job definition payload this backend accepts.
    type Definition: Send + Sync;

    /// List jobs matching `selector`.
    fn list_jobs<'a>(&'a self, selector: &'a LabelSelector) -> BackendFuture<'a, Vec<ObservedJob>>;

    /// Create the job described by `spec`, tagged with `labels`.
    ///
    /// Fails if a job with that name already exists.
    fn create_job<'a>(
        &'a mut self,
        spec: &'a JobSpec<Self::Definition>,
        labels: &'a JobLabels,
    ) -> BackendFuture<'a, ()>;

    /// Delete the job named `name`. Fails if it does not exist.
    fn delete_job<'a>(&'a mut self, name: &'a str) -> BackendFuture<'a, ()>;
}

/// The two labels stamped onto every created job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLabels {
    pub phase: usize,
    pub name: JobName,
}

impl JobLabels {
    pub fn new(phase: usize, name: impl Into<JobName>) -> Self {
        Self {
            phase,
            name: name.into(),
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (PHASE_LABEL.to_string(), self.phase.to_string()),
            (NAME_LABEL.to_string(), self.name.clone()),
        ])
    }
}

/// Snapshot of one backend-reported job instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedJob {
    pub name: JobName,
    /// Parsed `phase` label; `None` if missing or malformed.
    pub phase: Option<usize>,
    pub active: bool,
    pub succeeded: bool,
    pub failed: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
}

impl ObservedJob {
    /// A freshly created job with no status reported yet.
    pub fn new(name: impl Into<JobName>, phase: Option<usize>) -> Self {
        Self {
            name: name.into(),
            phase,
            active: false,
            succeeded: false,
            failed: false,
            start_time: None,
            completion_time: None,
        }
    }

    /// Build from a label map, preferring the `jobname` label over the
    /// backend object name.
    pub fn from_labels(object_name: &str, labels: &BTreeMap<String, String>) -> Self {
        let name = labels
            .get(NAME_LABEL)
            .cloned()
            .unwrap_or_else(|| object_name.to_string());
        let phase = labels.get(PHASE_LABEL).and_then(|p| p.parse().ok());
        Self::new(name, phase)
    }

    /// A job is finished only once the backend reports success.
    pub fn is_finished(&self) -> bool {
        self.succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_into_observed_job() {
        let labels = JobLabels::new(3, "transform").to_map();
        let observed = ObservedJob::from_labels("ignored", &labels);

        assert_eq!(observed.name, "transform");
        assert_eq!(observed.phase, Some(3));
        assert!(!observed.is_finished());
    }

    #[test]
    fn malformed_phase_label_is_ignored() {
        let labels = BTreeMap::from([(PHASE_LABEL.to_string(), "two".to_string())]);
        let observed = ObservedJob::from_labels("extract", &labels);

        assert_eq!(observed.name, "extract");
        assert_eq!(observed.phase, None);
    }
}
