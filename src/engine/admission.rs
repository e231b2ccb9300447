// src/engine/admission.rs

use super::snapshot::Snapshot;

/// Concurrency gate for job submission.
///
/// Counts active jobs across the whole run, not just the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionController {
    /// `0` means unbounded.
    ceiling: usize,
}

impl AdmissionController {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn allows(&self, active: usize) -> bool {
        self.ceiling == 0 || active < self.ceiling
    }

    pub fn allowed_to_submit(&self, snapshot: &Snapshot) -> bool {
        self.allows(snapshot.active_count())
    }
}
