// src/lib.rs

pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod model;
pub mod types;

use anyhow::Result;
use tracing::{debug, info};

use crate::backend::{KubeBackend, LabelSelector, ObservedJob};
use crate::cli::CliArgs;
use crate::config::loader::load_from_path;
use crate::config::model::{ConfigFile, ConfigSection};
use crate::engine::{Reconciler, ReconcilerOptions, Snapshot, TracingSink};
use crate::model::JobModel;
use crate::types::ClusterContext;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - the Kubernetes backend
/// - the reconciler, which runs until the last phase finished
pub async fn run(args: CliArgs) -> Result<()> {
    let mut raw = load_from_path(&args.config)?;
    apply_overrides(&mut raw.config, &args);
    let cfg = ConfigFile::try_from(raw)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let backend = KubeBackend::connect(
        cfg.config.cluster_context,
        &cfg.config.namespace,
        cfg.config.request_timeout,
    )
    .await?;

    if args.status {
        let snapshot = Snapshot::capture_matching(&backend, &status_selector(&args)).await?;
        print_status(backend.namespace(), &snapshot);
        return Ok(());
    }

    let model = JobModel::from_config(&cfg);
    let options = ReconcilerOptions::from(&cfg.config);
    let reconciler = Reconciler::new(model, backend, TracingSink, options);

    let report = reconciler.run().await?;
    info!(
        jobs = report.jobs.len(),
        total_seconds = report.total.num_seconds(),
        "run complete"
    );
    Ok(())
}

/// CLI flags take precedence over `[config]`; validation runs afterwards.
fn apply_overrides(cfg: &mut ConfigSection, args: &CliArgs) {
    if let Some(ref namespace) = args.namespace {
        cfg.namespace = namespace.clone();
    }
    if let Some(parallelization) = args.parallelization {
        cfg.parallelization = parallelization;
    }
    if args.no_cleanup {
        cfg.cleanup = false;
    }
    if args.kubeconfig {
        cfg.cluster_context = ClusterContext::Kubeconfig;
    }
}

/// Which jobs `--status` lists: the whole run unless narrowed down.
fn status_selector(args: &CliArgs) -> LabelSelector {
    match (args.phase, &args.job) {
        (Some(phase), _) => LabelSelector::phase(phase),
        (None, Some(job)) => LabelSelector::job_name(job),
        (None, None) => LabelSelector::run(),
    }
}

/// Simple dry-run output: print settings, phases, jobs and dependencies.
fn print_dry_run(cfg: &ConfigFile) {
    println!("jobphase dry-run");
    println!("  config.namespace = {}", cfg.config.namespace);
    println!("  config.refresh_interval = {:?}", cfg.config.refresh_interval);
    println!("  config.request_timeout = {:?}", cfg.config.request_timeout);
    println!("  config.parallelization = {}", cfg.config.parallelization);
    println!("  config.cleanup = {}", cfg.config.cleanup);
    println!("  config.cluster_context = {:?}", cfg.config.cluster_context);
    println!();

    println!("phases ({}), jobs ({}):", cfg.phase.len(), cfg.job_count());
    for (idx, phase) in cfg.phase.iter().enumerate() {
        println!("  phase {idx}:");
        for job in phase.job.iter() {
            println!("    - {}", job.name);
            if !job.depends_on.is_empty() {
                println!("        depends_on: {:?}", job.depends_on);
            }
        }
    }

    debug!("dry-run complete (no cluster access)");
}

fn print_status(namespace: &str, snapshot: &Snapshot) {
    let mut jobs: Vec<&ObservedJob> = snapshot.jobs().iter().collect();
    jobs.sort_by(|a, b| (a.phase, &a.name).cmp(&(b.phase, &b.name)));

    println!("jobs in namespace '{namespace}' ({}):", jobs.len());
    println!(
        "{:<40}{:<8}{:<8}{:<11}{:<8}{:<25}",
        "NAME", "PHASE", "ACTIVE", "SUCCEEDED", "FAILED", "STARTED"
    );
    for job in jobs {
        let phase = job.phase.map_or_else(|| "-".to_string(), |p| p.to_string());
        let started = job
            .start_time
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        println!(
            "{:<40}{:<8}{:<8}{:<11}{:<8}{:<25}",
            job.name, phase, job.active, job.succeeded, job.failed, started
        );
    }
}
