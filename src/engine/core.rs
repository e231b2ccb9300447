// src/engine/core.rs

//! Pure reconciliation decisions.
//!
//! Everything in here is a function of the static [`JobModel`] and one
//! [`Snapshot`]: no Tokio, no backend, no IO. The async shell in
//! [`super::runtime`] captures snapshots, calls these functions and
//! performs the resulting backend calls.

use super::admission::AdmissionController;
use super::deps::dependencies_satisfied;
use super::phase::{current_phase, is_job_created, is_phase_finished};
use super::snapshot::Snapshot;
use crate::model::JobModel;

/// What one tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Nothing created yet: admit phase 0.
    Start,
    /// `phase` is the earliest started phase that has not finished:
    /// re-run its admission pass.
    Continue { phase: usize },
    /// `from` finished and is not the last phase: admit `to`.
    Advance { from: usize, to: usize },
    /// The last phase finished.
    Finish,
}

/// `Advance` and `Finish` require every phase up to the current one to
/// have finished, not only the current one.
pub fn decide_tick<D>(model: &JobModel<D>, snapshot: &Snapshot) -> TickDecision {
    let Some(last) = model.last_index() else {
        return TickDecision::Finish;
    };

    let Some(current) = current_phase(model, snapshot) else {
        return TickDecision::Start;
    };

    // A phase filled in after a gap can still be running while a later,
    // already present phase has finished.
    match (0..=current).find(|&i| !is_phase_finished(model, i, snapshot)) {
        Some(phase) => TickDecision::Continue { phase },
        None if current == last => TickDecision::Finish,
        None => TickDecision::Advance {
            from: current,
            to: current + 1,
        },
    }
}

/// Result of looking for the next job to submit within a phase pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStep {
    /// Submit the job at this position of the phase.
    Submit(usize),
    /// The concurrency ceiling is reached; end the pass.
    AdmissionDenied,
    /// No further job of the phase is eligible right now.
    Exhausted,
}

/// One step of a phase admission pass.
///
/// Walks the phase's jobs in declared order starting at `from`:
/// already-created jobs are skipped, admission is checked before each
/// remaining job, and the first job whose dependencies are satisfied
/// (or that has none) is returned.
pub fn next_submission<D>(
    model: &JobModel<D>,
    phase: usize,
    from: usize,
    snapshot: &Snapshot,
    admission: &AdmissionController,
) -> PassStep {
    let Some(jobs) = model.phase(phase).map(|p| &p.jobs) else {
        return PassStep::Exhausted;
    };

    for (idx, spec) in jobs.iter().enumerate().skip(from) {
        if is_job_created(&spec.name, phase, snapshot) {
            continue;
        }

        if !admission.allowed_to_submit(snapshot) {
            return PassStep::AdmissionDenied;
        }

        if !spec.has_dependencies()
            || dependencies_satisfied(model, &spec.name, &spec.depends_on, snapshot)
        {
            return PassStep::Submit(idx);
        }
    }

    PassStep::Exhausted
}
