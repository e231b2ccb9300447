// src/engine/snapshot.rs

use crate::backend::{JobBackend, LabelSelector, ObservedJob};
use crate::errors::Result;

/// Immutable view of every job the backend reports for this run.
///
/// Captured once per tick (and again after each submission) and fed into
/// the pure decision functions. Nothing else carries scheduler state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    jobs: Vec<ObservedJob>,
}

impl Snapshot {
    pub fn new(jobs: Vec<ObservedJob>) -> Self {
        Self { jobs }
    }

    /// List every job carrying the phase label.
    pub async fn capture<B: JobBackend + ?Sized>(backend: &B) -> Result<Self> {
        Self::capture_matching(backend, &LabelSelector::run()).await
    }

    /// List the jobs matching `selector` only.
    pub async fn capture_matching<B: JobBackend + ?Sized>(
        backend: &B,
        selector: &LabelSelector,
    ) -> Result<Self> {
        let jobs = backend.list_jobs(selector).await?;
        Ok(Self::new(jobs))
    }

    pub fn jobs(&self) -> &[ObservedJob] {
        &self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs labelled with phase `index`.
    pub fn in_phase(&self, index: usize) -> impl Iterator<Item = &ObservedJob> {
        self.jobs.iter().filter(move |j| j.phase == Some(index))
    }

    /// Jobs labelled with the logical name `name`.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ObservedJob> {
        self.jobs.iter().filter(move |j| j.name == name)
    }

    pub fn active_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.active).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ObservedJob> {
        self.jobs.iter().filter(|j| j.failed && !j.succeeded)
    }

    /// Highest phase index any job is labelled with.
    pub fn max_phase(&self) -> Option<usize> {
        self.jobs.iter().filter_map(|j| j.phase).max()
    }
}
