use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;

use jobphase::backend::{BackendFuture, JobBackend, JobLabels, LabelSelector, ObservedJob};
use jobphase::errors::{JobphaseError, Result};
use jobphase::model::JobSpec;

/// What happens to a job right after it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// The job is active until the test finishes or fails it.
    #[default]
    Manual,
    /// The job is reported as succeeded straight away (one minute runtime).
    Instant,
}

#[derive(Debug, Clone)]
struct FakeJob {
    labels: BTreeMap<String, String>,
    observed: ObservedJob,
}

#[derive(Debug, Default)]
struct FakeState {
    jobs: Vec<FakeJob>,
    created: Vec<String>,
    deleted: Vec<String>,
    list_calls: usize,
    mode: CompletionMode,
    fail_create: Option<String>,
    fail_delete: Option<String>,
}

/// In-memory job backend.
///
/// Cloning shares the underlying store, so a test can keep a handle while
/// the reconciler owns another one.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: CompletionMode) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().mode = mode;
        backend
    }

    /// Names passed to `create_job`, in call order.
    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    /// Names passed to successful `delete_job` calls, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    /// Names of jobs currently stored.
    pub fn job_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.jobs.iter().map(|j| j.observed.name.clone()).collect()
    }

    /// Mark `name` as succeeded after `secs` seconds of runtime.
    pub fn finish_after(&self, name: &str, secs: i64) {
        self.update(name, |job| {
            let start = base_time();
            job.active = false;
            job.succeeded = true;
            job.start_time = Some(start);
            job.completion_time = Some(start + TimeDelta::seconds(secs));
        });
    }

    pub fn finish(&self, name: &str) {
        self.finish_after(name, 60);
    }

    /// Mark `name` as failed.
    pub fn fail(&self, name: &str) {
        self.update(name, |job| {
            job.active = false;
            job.failed = true;
            job.start_time = Some(base_time());
        });
    }

    /// Drop the completion timestamp of `name` while keeping it succeeded.
    pub fn clear_completion_time(&self, name: &str) {
        self.update(name, |job| job.completion_time = None);
    }

    /// Put a labelled job into the store without going through
    /// `create_job` (e.g. left over from an earlier process).
    pub fn insert_job(&self, name: &str, phase: usize, active: bool) {
        let labels = JobLabels::new(phase, name).to_map();
        let mut observed = ObservedJob::from_labels(name, &labels);
        observed.active = active;
        self.state
            .lock()
            .unwrap()
            .jobs
            .push(FakeJob { labels, observed });
    }

    /// Make the creation of `name` fail with a backend error.
    pub fn fail_create_of(&self, name: &str) {
        self.state.lock().unwrap().fail_create = Some(name.to_string());
    }

    /// Make the deletion of `name` fail with a backend error.
    pub fn fail_delete_of(&self, name: &str) {
        self.state.lock().unwrap().fail_delete = Some(name.to_string());
    }

    fn update(&self, name: &str, f: impl Fn(&mut ObservedJob)) {
        let mut state = self.state.lock().unwrap();
        let mut found = false;
        for job in state.jobs.iter_mut().filter(|j| j.observed.name == name) {
            f(&mut job.observed);
            found = true;
        }
        assert!(found, "fake backend has no job named '{name}'");
    }

    fn list_now(&self, selector: &LabelSelector) -> Vec<ObservedJob> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        state
            .jobs
            .iter()
            .filter(|j| selector.matches(&j.labels))
            .map(|j| j.observed.clone())
            .collect()
    }

    fn create_now(&self, spec: &JobSpec<Value>, labels: &JobLabels) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.created.push(spec.name.clone());

        if state.fail_create.as_deref() == Some(spec.name.as_str()) {
            return Err(JobphaseError::Backend(format!(
                "create job: injected failure for '{}'",
                spec.name
            )));
        }
        if state.jobs.iter().any(|j| j.observed.name == spec.name) {
            return Err(JobphaseError::Backend(format!(
                "create job: jobs.batch \"{}\" already exists",
                spec.name
            )));
        }

        let labels = labels.to_map();
        let mut observed = ObservedJob::from_labels(&spec.name, &labels);
        match state.mode {
            CompletionMode::Manual => observed.active = true,
            CompletionMode::Instant => {
                let start = base_time();
                observed.succeeded = true;
                observed.start_time = Some(start);
                observed.completion_time = Some(start + TimeDelta::seconds(60));
            }
        }

        state.jobs.push(FakeJob { labels, observed });
        Ok(())
    }

    fn delete_now(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if state.fail_delete.as_deref() == Some(name) {
            return Err(JobphaseError::Backend(format!(
                "delete job: injected failure for '{name}'"
            )));
        }

        let Some(pos) = state.jobs.iter().position(|j| j.observed.name == name) else {
            return Err(JobphaseError::Backend(format!(
                "delete job: jobs.batch \"{name}\" not found"
            )));
        };

        state.jobs.remove(pos);
        state.deleted.push(name.to_string());
        Ok(())
    }
}

impl JobBackend for FakeBackend {
    type Definition = Value;

    fn list_jobs<'a>(&'a self, selector: &'a LabelSelector) -> BackendFuture<'a, Vec<ObservedJob>> {
        let jobs = self.list_now(selector);
        Box::pin(std::future::ready(Ok(jobs)))
    }

    fn create_job<'a>(
        &'a mut self,
        spec: &'a JobSpec<Value>,
        labels: &'a JobLabels,
    ) -> BackendFuture<'a, ()> {
        let result = self.create_now(spec, labels);
        Box::pin(std::future::ready(result))
    }

    fn delete_job<'a>(&'a mut self, name: &'a str) -> BackendFuture<'a, ()> {
        let result = self.delete_now(name);
        Box::pin(std::future::ready(result))
    }
}
