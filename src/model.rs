// src/model.rs

//! Static job model: ordered phases of job specifications.
//!
//! The model is generic over the job definition payload `D`. The scheduler
//! never looks inside it; it is handed to the [`JobBackend`] verbatim.
//!
//! [`JobBackend`]: crate::backend::JobBackend

use crate::config::model::ConfigFile;

/// Canonical logical job name type used throughout the engine.
pub type JobName = String;

/// Static definition of one logical job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec<D> {
    /// Unique across the whole model; also the backend job name.
    pub name: JobName,
    /// Jobs (same or earlier phase) that must have finished first.
    pub depends_on: Vec<JobName>,
    /// Opaque payload forwarded to the backend.
    pub definition: D,
}

impl<D> JobSpec<D> {
    pub fn new(name: impl Into<JobName>, depends_on: Vec<JobName>, definition: D) -> Self {
        Self {
            name: name.into(),
            depends_on,
            definition,
        }
    }

    pub fn has_dependencies(&self) -> bool {
        !self.depends_on.is_empty()
    }
}

/// One ordered stage of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase<D> {
    /// Always equal to the phase's position in [`JobModel::phases`].
    pub index: usize,
    /// Declared order is the submission order within a pass.
    pub jobs: Vec<JobSpec<D>>,
}

/// Ordered sequence of phases; immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobModel<D> {
    phases: Vec<Phase<D>>,
}

impl<D> JobModel<D> {
    /// Build a model from per-phase job lists. Indices are assigned from
    /// position, so they are contiguous from 0.
    ///
    /// No semantic validation happens here; see [`crate::config::validate`].
    pub fn new(phases: Vec<Vec<JobSpec<D>>>) -> Self {
        let phases = phases
            .into_iter()
            .enumerate()
            .map(|(index, jobs)| Phase { index, jobs })
            .collect();
        Self { phases }
    }

    pub fn phases(&self) -> &[Phase<D>] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> Option<&Phase<D>> {
        self.phases.get(index)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Index of the final phase, or `None` for an empty model.
    pub fn last_index(&self) -> Option<usize> {
        self.phases.len().checked_sub(1)
    }

    /// All job specs in phase order, then declared order.
    pub fn jobs(&self) -> impl Iterator<Item = &JobSpec<D>> {
        self.phases.iter().flat_map(|p| p.jobs.iter())
    }

    /// Phase index that declares `name`, if any.
    pub fn phase_of(&self, name: &str) -> Option<usize> {
        self.phases
            .iter()
            .find(|p| p.jobs.iter().any(|j| j.name == name))
            .map(|p| p.index)
    }

    pub fn contains_job(&self, name: &str) -> bool {
        self.phase_of(name).is_some()
    }
}

impl JobModel<serde_json::Value> {
    /// Construct the model from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let phases = cfg
            .phase
            .iter()
            .map(|phase| {
                phase
                    .job
                    .iter()
                    .map(|job| {
                        JobSpec::new(
                            job.name.clone(),
                            job.depends_on.clone(),
                            job.definition.clone(),
                        )
                    })
                    .collect()
            })
            .collect();

        Self::new(phases)
    }
}
