// tests/update_phase.rs

use std::error::Error;

use jobphase::backend::LabelSelector;
use jobphase::engine::{Reconciler, Snapshot};
use jobphase::errors::JobphaseError;
use jobphase_test_utils::builders::{JobModelBuilder, JobSpecBuilder, fast_options};
use jobphase_test_utils::fake_backend::FakeBackend;
use jobphase_test_utils::init_tracing;
use jobphase_test_utils::recording_sink::RecordingSink;

type TestResult = Result<(), Box<dyn Error>>;

fn three_roots() -> jobphase::model::JobModel<serde_json::Value> {
    JobModelBuilder::new()
        .phase(vec![
            JobSpecBuilder::new("a"),
            JobSpecBuilder::new("b"),
            JobSpecBuilder::new("c"),
        ])
        .build()
}

#[tokio::test]
async fn second_pass_without_state_change_submits_nothing() -> TestResult {
    init_tracing();

    let backend = FakeBackend::new();
    let mut reconciler =
        Reconciler::new(three_roots(), backend.clone(), RecordingSink::new(), fast_options(0, true));

    assert_eq!(reconciler.update_phase(0).await?, 3);
    assert_eq!(reconciler.update_phase(0).await?, 0);
    assert_eq!(backend.created(), vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn admission_is_rechecked_after_every_submission() -> TestResult {
    init_tracing();

    let backend = FakeBackend::new();
    let mut reconciler =
        Reconciler::new(three_roots(), backend.clone(), RecordingSink::new(), fast_options(2, true));

    assert_eq!(reconciler.update_phase(0).await?, 2);
    assert_eq!(backend.created(), vec!["a", "b"]);

    backend.finish("a");
    assert_eq!(reconciler.update_phase(0).await?, 1);
    assert_eq!(backend.created(), vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn active_jobs_of_other_phases_count_against_the_ceiling() -> TestResult {
    init_tracing();

    let model = JobModelBuilder::new()
        .phase(vec![JobSpecBuilder::new("a")])
        .phase(vec![JobSpecBuilder::new("b")])
        .build();
    let backend = FakeBackend::new();
    // Still running from phase 0 (e.g. a straggler left behind).
    backend.insert_job("stray", 0, true);

    let mut reconciler =
        Reconciler::new(model, backend.clone(), RecordingSink::new(), fast_options(1, true));

    assert_eq!(reconciler.update_phase(1).await?, 0);
    assert!(backend.created().is_empty());
    Ok(())
}

#[tokio::test]
async fn pass_keeps_declared_order_and_skips_blocked_jobs() -> TestResult {
    init_tracing();

    let model = JobModelBuilder::new()
        .phase(vec![
            JobSpecBuilder::new("first"),
            JobSpecBuilder::new("blocked").depends_on("first"),
            JobSpecBuilder::new("second"),
        ])
        .build();
    let backend = FakeBackend::new();
    let sink = RecordingSink::new();
    let mut reconciler = Reconciler::new(model, backend.clone(), sink.clone(), fast_options(0, true));

    reconciler.update_phase(0).await?;
    assert_eq!(sink.submitted(), vec!["first", "second"]);

    backend.finish("first");
    reconciler.update_phase(0).await?;
    assert_eq!(sink.submitted(), vec!["first", "second", "blocked"]);
    Ok(())
}

#[tokio::test]
async fn create_failure_aborts_the_tick() -> TestResult {
    init_tracing();

    let backend = FakeBackend::new();
    backend.fail_create_of("b");
    let mut reconciler =
        Reconciler::new(three_roots(), backend.clone(), RecordingSink::new(), fast_options(0, true));

    match reconciler.tick().await {
        Err(JobphaseError::Backend(msg)) => assert!(msg.contains("'b'"), "{msg}"),
        other => panic!("expected backend error, got {other:?}"),
    }

    // No retry and nothing after the failing job.
    assert_eq!(backend.created(), vec!["a", "b"]);
    assert_eq!(backend.job_names(), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn snapshot_can_be_narrowed_to_a_phase_or_a_job() -> TestResult {
    init_tracing();

    let backend = FakeBackend::new();
    backend.insert_job("extract", 0, false);
    backend.insert_job("load", 1, true);
    backend.insert_job("notify", 1, true);

    let phase_one = Snapshot::capture_matching(&backend, &LabelSelector::phase(1)).await?;
    let names: Vec<_> = phase_one.jobs().iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["load", "notify"]);

    let extract = Snapshot::capture_matching(&backend, &LabelSelector::job_name("extract")).await?;
    assert_eq!(extract.jobs().len(), 1);
    assert_eq!(extract.jobs()[0].phase, Some(0));

    assert_eq!(Snapshot::capture(&backend).await?.jobs().len(), 3);
    Ok(())
}
