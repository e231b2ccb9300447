// tests/properties.rs

use proptest::prelude::*;

use jobphase::backend::ObservedJob;
use jobphase::engine::{AdmissionController, Snapshot, current_phase, is_phase_finished};
use jobphase::model::{JobModel, JobSpec};

// Model with `sizes.len()` phases; phase i holds jobs "p{i}-j{k}".
fn model_of(sizes: &[usize]) -> JobModel<()> {
    JobModel::new(
        sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                (0..n)
                    .map(|k| JobSpec::new(format!("p{i}-j{k}"), Vec::new(), ()))
                    .collect()
            })
            .collect(),
    )
}

fn observed(name: String, phase: usize, succeeded: bool) -> ObservedJob {
    let mut job = ObservedJob::new(name, Some(phase));
    job.succeeded = succeeded;
    job.active = !succeeded;
    job
}

proptest! {
    #[test]
    fn admission_never_lets_active_reach_the_ceiling(
        ceiling in 0usize..8,
        active in 0usize..16,
    ) {
        let gate = AdmissionController::new(ceiling);
        prop_assert_eq!(gate.allows(active), ceiling == 0 || active < ceiling);
    }

    #[test]
    fn current_phase_is_the_contiguous_prefix(
        sizes in proptest::collection::vec(1usize..4, 1..6),
        present in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let model = model_of(&sizes);
        let jobs = sizes
            .iter()
            .enumerate()
            .filter(|(i, _)| present[*i])
            .map(|(i, _)| observed(format!("p{i}-j0"), i, false))
            .collect();
        let snapshot = Snapshot::new(jobs);

        let prefix = present.iter().take(sizes.len()).take_while(|p| **p).count();
        let expected = prefix.checked_sub(1);

        prop_assert_eq!(current_phase(&model, &snapshot), expected);
    }

    #[test]
    fn phase_with_a_missing_job_is_never_finished(
        size in 1usize..6,
        missing in 0usize..6,
    ) {
        let missing = missing % size;
        let model = model_of(&[size]);
        let jobs = (0..size)
            .filter(|k| *k != missing)
            .map(|k| observed(format!("p0-j{k}"), 0, true))
            .collect();

        prop_assert!(!is_phase_finished(&model, 0, &Snapshot::new(jobs)));
    }

    #[test]
    fn phase_with_every_job_succeeded_is_finished(size in 1usize..6) {
        let model = model_of(&[size]);
        let jobs = (0..size)
            .map(|k| observed(format!("p0-j{k}"), 0, true))
            .collect();

        prop_assert!(is_phase_finished(&model, 0, &Snapshot::new(jobs)));
    }
}
