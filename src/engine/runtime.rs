// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::backend::{JobBackend, JobLabels};
use crate::config::ConfigSection;
use crate::errors::Result;
use crate::model::JobModel;

use super::admission::AdmissionController;
use super::core::{PassStep, TickDecision, decide_tick, next_submission};
use super::events::{EventSink, RunEvent};
use super::phase::{current_phase, is_job_created};
use super::report::RunReport;
use super::snapshot::Snapshot;

/// Options for the reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Sleep between ticks.
    pub refresh_interval: Duration,
    /// Maximum number of active jobs; `0` means unbounded.
    pub parallelization: usize,
    /// Delete every job of the run after the final phase finished.
    pub cleanup: bool,
}

impl From<&ConfigSection> for ReconcilerOptions {
    fn from(cfg: &ConfigSection) -> Self {
        Self {
            refresh_interval: cfg.refresh_interval,
            parallelization: cfg.parallelization,
            cleanup: cfg.cleanup,
        }
    }
}

/// Outcome of a single [`Reconciler::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The run is still in progress.
    Running {
        decision: TickDecision,
        submitted: usize,
    },
    /// The final phase finished, the report was produced and cleanup ran.
    Done(RunReport),
}

/// Drives a run to completion against a [`JobBackend`].
///
/// The reconciler holds no run state of its own: every tick re-derives
/// the current phase and job status from the backend, so a restarted
/// process picks up where the previous one stopped.
pub struct Reconciler<B: JobBackend, S: EventSink> {
    model: JobModel<B::Definition>,
    backend: B,
    sink: S,
    admission: AdmissionController,
    options: ReconcilerOptions,
}

impl<B: JobBackend, S: EventSink> fmt::Debug for Reconciler<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("phases", &self.model.len())
            .field("admission", &self.admission)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: JobBackend, S: EventSink> Reconciler<B, S> {
    pub fn new(
        model: JobModel<B::Definition>,
        backend: B,
        sink: S,
        options: ReconcilerOptions,
    ) -> Self {
        Self {
            model,
            backend,
            sink,
            admission: AdmissionController::new(options.parallelization),
            options,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Main loop: tick, sleep, repeat until the run is done.
    ///
    /// Any backend error aborts the run; nothing is retried.
    pub async fn run(mut self) -> Result<RunReport> {
        info!(
            phases = self.model.len(),
            parallelization = self.options.parallelization,
            "jobphase reconciler started"
        );

        loop {
            if let TickOutcome::Done(report) = self.tick().await? {
                info!("reconciler finished");
                return Ok(report);
            }

            debug!(
                interval = ?self.options.refresh_interval,
                "waiting for status update"
            );
            tokio::time::sleep(self.options.refresh_interval).await;
        }
    }

    /// One reconciliation step against a fresh snapshot.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let snapshot = Snapshot::capture(&self.backend).await?;

        self.sink.record(RunEvent::TickStarted {
            current_phase: current_phase(&self.model, &snapshot),
            observed: snapshot.jobs().len(),
            active: snapshot.active_count(),
        });
        for failed in snapshot.failed() {
            self.sink.record(RunEvent::JobFailed {
                job: failed.name.clone(),
            });
        }

        let decision = decide_tick(&self.model, &snapshot);
        let submitted = match decision {
            TickDecision::Start => {
                self.sink.record(RunEvent::RunStarting);
                self.update_phase_from(0, snapshot).await?
            }
            TickDecision::Continue { phase } => {
                self.sink.record(RunEvent::PhaseRunning { phase });
                self.update_phase_from(phase, snapshot).await?
            }
            TickDecision::Advance { from, to } => {
                self.sink.record(RunEvent::PhaseAdvanced { from, to });
                self.update_phase_from(to, snapshot).await?
            }
            TickDecision::Finish => {
                let report = self.finish(&snapshot).await?;
                return Ok(TickOutcome::Done(report));
            }
        };

        Ok(TickOutcome::Running {
            decision,
            submitted,
        })
    }

    /// Admission pass for `phase`, returning how many jobs were created.
    ///
    /// Idempotent: jobs already observed in the phase are never re-created.
    pub async fn update_phase(&mut self, phase: usize) -> Result<usize> {
        let snapshot = Snapshot::capture(&self.backend).await?;
        self.update_phase_from(phase, snapshot).await
    }

    async fn update_phase_from(&mut self, phase: usize, mut snapshot: Snapshot) -> Result<usize> {
        let mut cursor = 0;
        let mut submitted = 0;

        loop {
            match next_submission(&self.model, phase, cursor, &snapshot, &self.admission) {
                PassStep::Submit(idx) => {
                    let Some(spec) = self.model.phase(phase).and_then(|p| p.jobs.get(idx)) else {
                        break;
                    };
                    let labels = JobLabels::new(phase, spec.name.clone());
                    self.backend.create_job(spec, &labels).await?;

                    self.sink.record(RunEvent::JobSubmitted {
                        phase,
                        job: spec.name.clone(),
                    });
                    submitted += 1;
                    cursor = idx + 1;

                    // Admission must see the job just created.
                    snapshot = Snapshot::capture(&self.backend).await?;
                }
                PassStep::AdmissionDenied => {
                    self.sink.record(RunEvent::AdmissionDenied {
                        ceiling: self.admission.ceiling(),
                        active: snapshot.active_count(),
                    });
                    break;
                }
                PassStep::Exhausted => break,
            }
        }

        Ok(submitted)
    }

    async fn finish(&mut self, snapshot: &Snapshot) -> Result<RunReport> {
        let report = RunReport::from_snapshot(snapshot)?;

        for job in &report.jobs {
            self.sink.record(RunEvent::JobRuntime {
                job: job.job.clone(),
                elapsed: job.elapsed,
            });
        }
        self.sink.record(RunEvent::RunCompleted {
            jobs: report.jobs.len(),
            total: report.total,
        });

        if self.options.cleanup {
            self.cleanup(snapshot).await?;
        }

        Ok(report)
    }

    /// Delete every job of the run, phase by phase.
    ///
    /// Stops at the first failed deletion.
    pub async fn cleanup(&mut self, snapshot: &Snapshot) -> Result<()> {
        for phase in self.model.phases() {
            for spec in phase.jobs.iter() {
                if !is_job_created(&spec.name, phase.index, snapshot) {
                    continue;
                }

                self.backend.delete_job(&spec.name).await?;
                self.sink.record(RunEvent::JobDeleted {
                    job: spec.name.clone(),
                });
            }
        }
        Ok(())
    }
}
