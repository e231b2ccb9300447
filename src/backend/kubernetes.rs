// src/backend/kubernetes.rs

//! Kubernetes `batch/v1` Job backend.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{BackendFuture, JobBackend, JobLabels, LabelSelector, ObservedJob};
use crate::errors::{JobphaseError, Result};
use crate::model::JobSpec;
use crate::types::ClusterContext;

/// Job backend talking to the Kubernetes API in a single namespace.
///
/// Every call is bounded by `request_timeout`; a timeout fails the call
/// like any other API error.
#[derive(Clone)]
pub struct KubeBackend {
    api: Api<Job>,
    namespace: String,
    request_timeout: Duration,
}

impl KubeBackend {
    pub fn new(client: Client, namespace: &str, request_timeout: Duration) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            request_timeout,
        }
    }

    /// Build a client from in-cluster or kubeconfig credentials.
    pub async fn connect(
        context: ClusterContext,
        namespace: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let config = match context {
            ClusterContext::InCluster => Config::incluster().map_err(|e| {
                JobphaseError::Backend(format!("loading in-cluster configuration: {e}"))
            })?,
            ClusterContext::Kubeconfig => Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .map_err(|e| JobphaseError::Backend(format!("loading kubeconfig: {e}")))?,
        };

        let client = Client::try_from(config)
            .map_err(|e| JobphaseError::Backend(format!("building Kubernetes client: {e}")))?;

        info!(namespace, ?context, "connected to Kubernetes API");
        Ok(Self::new(client, namespace, request_timeout))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl JobBackend for KubeBackend {
    type Definition = Value;

    fn list_jobs<'a>(&'a self, selector: &'a LabelSelector) -> BackendFuture<'a, Vec<ObservedJob>> {
        Box::pin(async move {
            let params = ListParams::default().labels(&selector.to_string());
            let list = bounded("list jobs", self.request_timeout, self.api.list(&params)).await?;

            debug!(selector = %selector, count = list.items.len(), "listed jobs");
            Ok(list.items.iter().map(observed_from_job).collect())
        })
    }

    fn create_job<'a>(
        &'a mut self,
        spec: &'a JobSpec<Value>,
        labels: &'a JobLabels,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let job = job_from_definition(spec, labels)?;
            let params = PostParams::default();
            bounded("create job", self.request_timeout, self.api.create(&params, &job)).await?;
            Ok(())
        })
    }

    fn delete_job<'a>(&'a mut self, name: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            // Background propagation removes the job's pods as well.
            let params = DeleteParams::background();
            bounded("delete job", self.request_timeout, self.api.delete(name, &params)).await?;
            Ok(())
        })
    }
}

async fn bounded<T, F>(operation: &'static str, after: Duration, call: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, kube::Error>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(JobphaseError::Backend(format!("{operation}: {err}"))),
        Err(_) => Err(JobphaseError::Timeout { operation, after }),
    }
}

/// Turn the opaque definition into a `Job`, forcing name and labels.
///
/// `apiVersion`, `kind` and `metadata` are filled in when the manifest
/// leaves them out.
pub fn job_from_definition(spec: &JobSpec<Value>, labels: &JobLabels) -> Result<Job> {
    let mut manifest = spec.definition.clone();
    let object = manifest.as_object_mut().ok_or_else(|| {
        JobphaseError::ConfigError(format!(
            "definition of job '{}' must be a table, got {}",
            spec.name, spec.definition
        ))
    })?;

    object.entry("apiVersion").or_insert_with(|| json!("batch/v1"));
    object.entry("kind").or_insert_with(|| json!("Job"));
    object.entry("metadata").or_insert_with(|| json!({}));

    let mut job: Job = serde_json::from_value(manifest)?;
    job.metadata.name = Some(spec.name.clone());
    job.metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .extend(labels.to_map());

    Ok(job)
}

/// Project a Kubernetes `Job` onto the fields the scheduler looks at.
pub fn observed_from_job(job: &Job) -> ObservedJob {
    let object_name = job.metadata.name.as_deref().unwrap_or_default();
    let mut observed = match &job.metadata.labels {
        Some(labels) => ObservedJob::from_labels(object_name, labels),
        None => ObservedJob::new(object_name, None),
    };

    if let Some(status) = &job.status {
        observed.active = status.active.unwrap_or(0) > 0;
        observed.succeeded = status.succeeded.unwrap_or(0) > 0;
        observed.failed = status.failed.unwrap_or(0) > 0;
        observed.start_time = status.start_time.as_ref().map(|t| t.0);
        observed.completion_time = status.completion_time.as_ref().map(|t| t.0);
    }

    observed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use k8s_openapi::api::batch::v1::JobStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    use crate::backend::{NAME_LABEL, PHASE_LABEL};

    #[tokio::test]
    async fn hung_call_fails_with_timeout() {
        let call = std::future::pending::<std::result::Result<(), kube::Error>>();
        let err = bounded("list jobs", Duration::from_millis(5), call)
            .await
            .unwrap_err();

        match err {
            JobphaseError::Timeout { operation, after } => {
                assert_eq!(operation, "list jobs");
                assert_eq!(after, Duration::from_millis(5));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn call_within_bound_returns_its_value() {
        let call = std::future::ready(Ok::<_, kube::Error>(7));
        let value = bounded("list jobs", Duration::from_secs(1), call).await.unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn definition_gets_name_labels_and_type_meta() {
        let definition = json!({
            "metadata": { "name": "something-else", "labels": { "team": "data" } },
            "spec": { "template": { "spec": { "restartPolicy": "Never", "containers": [] } } }
        });
        let spec = JobSpec::new("extract", Vec::new(), definition);

        let job = job_from_definition(&spec, &JobLabels::new(0, "extract")).unwrap();

        assert_eq!(job.metadata.name.as_deref(), Some("extract"));
        let labels = job.metadata.labels.unwrap();
        assert_eq!(labels.get(PHASE_LABEL).map(String::as_str), Some("0"));
        assert_eq!(labels.get(NAME_LABEL).map(String::as_str), Some("extract"));
        assert_eq!(labels.get("team").map(String::as_str), Some("data"));
        assert!(job.spec.is_some());
    }

    #[test]
    fn non_table_definition_is_rejected() {
        let spec = JobSpec::new("extract", Vec::new(), json!("not a manifest"));
        let err = job_from_definition(&spec, &JobLabels::new(0, "extract")).unwrap_err();
        assert!(matches!(err, JobphaseError::ConfigError(_)));
    }

    #[test]
    fn status_counts_map_to_flags() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 12, 5, 0).unwrap();

        let mut job = Job::default();
        job.metadata.name = Some("load".to_string());
        job.metadata.labels = Some(JobLabels::new(1, "load").to_map());
        job.status = Some(JobStatus {
            active: Some(0),
            succeeded: Some(1),
            start_time: Some(Time(start)),
            completion_time: Some(Time(end)),
            ..JobStatus::default()
        });

        let observed = observed_from_job(&job);
        assert_eq!(observed.phase, Some(1));
        assert!(!observed.active);
        assert!(observed.is_finished());
        assert_eq!(observed.completion_time, Some(end));
    }

    #[test]
    fn job_without_status_is_pending() {
        let mut job = Job::default();
        job.metadata.name = Some("orphan".to_string());

        let observed = observed_from_job(&job);
        assert_eq!(observed.name, "orphan");
        assert_eq!(observed.phase, None);
        assert!(!observed.active && !observed.is_finished());
    }
}
