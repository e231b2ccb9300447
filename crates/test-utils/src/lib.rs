//! Shared helpers for jobphase integration tests: an in-memory job
//! backend, an event-recording sink and model/config builders.

pub mod builders;
pub mod fake_backend;
pub mod recording_sink;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests (or with `-- --nocapture`). The filter comes from `JOBPHASE_LOG`,
/// e.g. `JOBPHASE_LOG=jobphase=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("JOBPHASE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("jobphase=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Guard for loop tests: a reconciler that never reaches its last phase
/// fails the test instead of hanging it.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("reconciler did not finish within 5 seconds")
}
