// src/engine/mod.rs

//! Reconciliation engine for jobphase.
//!
//! Run state is never stored: every tick captures a [`Snapshot`] of the
//! jobs the backend reports and derives everything from it.
//!
//! - [`phase`] infers the current phase and whether a phase has finished.
//! - [`deps`] evaluates dependency satisfaction.
//! - [`admission`] bounds the number of active jobs.
//! - [`core`] combines those into pure per-tick decisions.
//! - [`runtime`] is the async loop that talks to the backend.
//! - [`report`] and [`events`] cover the run summary and event sink.

pub mod admission;
pub mod core;
pub mod deps;
pub mod events;
pub mod phase;
pub mod report;
pub mod runtime;
pub mod snapshot;

pub use admission::AdmissionController;
pub use self::core::{PassStep, TickDecision, decide_tick, next_submission};
pub use deps::{DependencyState, dependencies_satisfied, dependency_state};
pub use events::{EventSink, RunEvent, TracingSink};
pub use phase::{current_phase, is_job_created, is_job_finished, is_phase_finished};
pub use report::{JobRuntime, RunReport};
pub use runtime::{Reconciler, ReconcilerOptions, TickOutcome};
pub use snapshot::Snapshot;
