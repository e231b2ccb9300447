// src/engine/deps.rs

//! Dependency satisfaction, re-evaluated from scratch on every tick.

use tracing::{debug, warn};

use super::snapshot::Snapshot;
use crate::model::{JobModel, JobName};

/// State of a single named dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyState {
    /// At least one instance exists and every instance has finished.
    Finished,
    /// Not submitted yet, or some instance has not finished.
    Pending,
    /// The name is not declared anywhere in the model; it can never finish.
    Unknown,
}

pub fn dependency_state<D>(model: &JobModel<D>, name: &str, snapshot: &Snapshot) -> DependencyState {
    if !model.contains_job(name) {
        return DependencyState::Unknown;
    }

    let mut instances = snapshot.named(name).peekable();
    if instances.peek().is_none() {
        debug!(dependency = %name, "no job found for dependency yet");
        return DependencyState::Pending;
    }

    if instances.all(|j| j.is_finished()) {
        DependencyState::Finished
    } else {
        DependencyState::Pending
    }
}

/// True iff every dependency is [`DependencyState::Finished`].
///
/// All dependencies are evaluated (not short-circuited) so each unmet one
/// gets logged.
pub fn dependencies_satisfied<D>(
    model: &JobModel<D>,
    job: &str,
    depends_on: &[JobName],
    snapshot: &Snapshot,
) -> bool {
    let mut satisfied = true;

    for dep in depends_on {
        match dependency_state(model, dep, snapshot) {
            DependencyState::Finished => {}
            DependencyState::Pending => {
                debug!(job, dependency = %dep, "dependency not finished yet");
                satisfied = false;
            }
            DependencyState::Unknown => {
                warn!(
                    job,
                    dependency = %dep,
                    "dependency is not defined in the job model; job will never be submitted"
                );
                satisfied = false;
            }
        }
    }

    satisfied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ObservedJob;
    use crate::model::JobSpec;

    fn model() -> JobModel<()> {
        let spec = |n: &str| JobSpec::new(n, Vec::new(), ());
        JobModel::new(vec![vec![spec("a"), spec("b")], vec![spec("c")]])
    }

    fn job(name: &str, succeeded: bool) -> ObservedJob {
        let mut job = ObservedJob::new(name, Some(0));
        job.succeeded = succeeded;
        job
    }

    fn names(list: &[&str]) -> Vec<JobName> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_instance_is_pending() {
        let snapshot = Snapshot::new(vec![job("a", true)]);
        assert_eq!(dependency_state(&model(), "b", &snapshot), DependencyState::Pending);
        assert!(!dependencies_satisfied(&model(), "c", &names(&["a", "b"]), &snapshot));
    }

    #[test]
    fn every_instance_must_be_finished() {
        let snapshot = Snapshot::new(vec![job("a", true), job("a", false)]);
        assert_eq!(dependency_state(&model(), "a", &snapshot), DependencyState::Pending);
    }

    #[test]
    fn all_finished_is_satisfied() {
        let snapshot = Snapshot::new(vec![job("a", true), job("b", true)]);
        assert!(dependencies_satisfied(&model(), "c", &names(&["a", "b"]), &snapshot));
    }

    #[test]
    fn undeclared_name_is_unknown_even_if_backend_has_it() {
        let snapshot = Snapshot::new(vec![job("ghost", true)]);
        assert_eq!(dependency_state(&model(), "ghost", &snapshot), DependencyState::Unknown);
        assert!(!dependencies_satisfied(&model(), "c", &names(&["ghost"]), &snapshot));
    }

    #[test]
    fn no_dependencies_is_trivially_satisfied() {
        assert!(dependencies_satisfied(&model(), "a", &[], &Snapshot::default()));
    }
}
