// src/engine/events.rs

//! Structured events emitted by the reconciler.
//!
//! The reconciler never logs its decisions directly; it hands a
//! [`RunEvent`] to the injected [`EventSink`]. Production uses
//! [`TracingSink`], tests record the events and assert on them.

use chrono::TimeDelta;
use tracing::{debug, info, warn};

use crate::model::JobName;

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A tick captured its snapshot.
    TickStarted {
        current_phase: Option<usize>,
        observed: usize,
        active: usize,
    },
    /// No job of the run exists yet; phase 0 is being admitted.
    RunStarting,
    /// The current phase is unfinished; looking for newly eligible jobs.
    PhaseRunning { phase: usize },
    /// The current phase finished; admitting the next one.
    PhaseAdvanced { from: usize, to: usize },
    JobSubmitted { phase: usize, job: JobName },
    /// The concurrency ceiling stopped the current pass.
    AdmissionDenied { ceiling: usize, active: usize },
    /// The backend reports a failed job; it will never count as finished.
    JobFailed { job: JobName },
    /// The final phase finished.
    RunCompleted { jobs: usize, total: TimeDelta },
    JobRuntime { job: JobName, elapsed: TimeDelta },
    JobDeleted { job: JobName },
}

/// Receiver for [`RunEvent`]s.
pub trait EventSink: Send {
    fn record(&mut self, event: RunEvent);
}

/// Default sink: turns every event into a `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: RunEvent) {
        match event {
            RunEvent::TickStarted {
                current_phase,
                observed,
                active,
            } => debug!(?current_phase, observed, active, "reconciliation tick"),
            RunEvent::RunStarting => info!("no jobs found; creating first phase"),
            RunEvent::PhaseRunning { phase } => {
                debug!(phase, "phase is running; checking for jobs with satisfied dependencies")
            }
            RunEvent::PhaseAdvanced { from, to } => {
                info!(finished = from, phase = to, "phase finished; creating next phase")
            }
            RunEvent::JobSubmitted { phase, job } => info!(phase, job = %job, "created job"),
            RunEvent::AdmissionDenied { ceiling, active } => debug!(
                parallelization = ceiling,
                active, "cannot create more jobs until active jobs finish"
            ),
            RunEvent::JobFailed { job } => {
                warn!(job = %job, "job reports failure; its phase cannot finish")
            }
            RunEvent::RunCompleted { jobs, total } => info!(
                jobs,
                total_seconds = total.num_seconds(),
                "all phases finished; total compute time {total}"
            ),
            RunEvent::JobRuntime { job, elapsed } => info!(
                job = %job,
                seconds = elapsed.num_seconds(),
                "job took {elapsed}"
            ),
            RunEvent::JobDeleted { job } => info!(job = %job, "cleaned up job"),
        }
    }
}
