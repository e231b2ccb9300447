// src/engine/report.rs

use chrono::TimeDelta;

use super::snapshot::Snapshot;
use crate::errors::{JobphaseError, Result};
use crate::model::JobName;

/// Wall-clock runtime of one job instance.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRuntime {
    pub job: JobName,
    pub phase: Option<usize>,
    pub elapsed: TimeDelta,
}

/// Summary produced when the final phase finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub jobs: Vec<JobRuntime>,
    /// Sum of `completion - start` over every job of the run.
    pub total: TimeDelta,
}

impl RunReport {
    /// Fails on the first job lacking a start or completion timestamp.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let mut jobs = Vec::with_capacity(snapshot.jobs().len());
        let mut total = TimeDelta::zero();

        for observed in snapshot.jobs() {
            let (Some(start), Some(end)) = (observed.start_time, observed.completion_time) else {
                return Err(JobphaseError::MissingTimestamp {
                    job: observed.name.clone(),
                });
            };

            let elapsed = end - start;
            total += elapsed;
            jobs.push(JobRuntime {
                job: observed.name.clone(),
                phase: observed.phase,
                elapsed,
            });
        }

        Ok(Self { jobs, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ObservedJob;
    use chrono::{TimeZone, Utc};

    fn finished(name: &str, secs: i64) -> ObservedJob {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut job = ObservedJob::new(name, Some(0));
        job.succeeded = true;
        job.start_time = Some(start);
        job.completion_time = Some(start + TimeDelta::seconds(secs));
        job
    }

    #[test]
    fn sums_job_durations() {
        let snapshot = Snapshot::new(vec![finished("a", 30), finished("b", 90)]);
        let report = RunReport::from_snapshot(&snapshot).unwrap();

        assert_eq!(report.total, TimeDelta::seconds(120));
        assert_eq!(report.jobs.len(), 2);
        assert_eq!(report.jobs[1].elapsed, TimeDelta::seconds(90));
    }

    #[test]
    fn missing_completion_time_is_an_error() {
        let mut broken = finished("b", 10);
        broken.completion_time = None;
        let snapshot = Snapshot::new(vec![finished("a", 5), broken]);

        match RunReport::from_snapshot(&snapshot) {
            Err(JobphaseError::MissingTimestamp { job }) => assert_eq!(job, "b"),
            other => panic!("expected MissingTimestamp, got {other:?}"),
        }
    }
}
