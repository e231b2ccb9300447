// src/engine/phase.rs

//! Phase state inference from a [`Snapshot`].

use tracing::warn;

use super::snapshot::Snapshot;
use crate::model::JobModel;

/// The furthest phase that has been *started*, or `None` if no job of the
/// run exists yet.
///
/// Phases are scanned from 0 and the scan stops at the first phase with no
/// observed job, so jobs found beyond a gap do not move the run forward.
/// The loop then resumes by filling in the phase after the returned one.
pub fn current_phase<D>(model: &JobModel<D>, snapshot: &Snapshot) -> Option<usize> {
    if model.is_empty() || snapshot.is_empty() {
        return None;
    }

    let mut current = None;

    for phase in model.phases() {
        if snapshot.in_phase(phase.index).next().is_none() {
            break;
        }
        current = Some(phase.index);
    }

    if let Some(max) = snapshot.max_phase() {
        let reached = current.map_or(0, |c| c + 1);
        if max >= reached && max < model.len() {
            warn!(
                current_phase = ?current,
                highest_labelled_phase = max,
                "jobs exist beyond an empty phase; resuming from the first gap"
            );
        }
    }

    current
}

/// Whether the job named `name` was created with the label of phase `index`.
pub fn is_job_created(name: &str, index: usize, snapshot: &Snapshot) -> bool {
    snapshot.in_phase(index).any(|j| j.name == name)
}

/// Whether at least one instance of `name` has finished.
pub fn is_job_finished(name: &str, snapshot: &Snapshot) -> bool {
    snapshot.named(name).any(|j| j.is_finished())
}

/// True iff every job spec of phase `index` has a finished instance.
///
/// A job that was never submitted keeps the phase unfinished; an index
/// outside the model is never finished.
pub fn is_phase_finished<D>(model: &JobModel<D>, index: usize, snapshot: &Snapshot) -> bool {
    match model.phase(index) {
        Some(phase) => phase
            .jobs
            .iter()
            .all(|spec| is_job_finished(&spec.name, snapshot)),
        None => false,
    }
}
