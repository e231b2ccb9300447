use std::sync::{Arc, Mutex};

use jobphase::engine::{EventSink, RunEvent};

/// Event sink that keeps every event for later assertions.
///
/// Clones share the same event list.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names from `JobSubmitted` events, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::JobSubmitted { job, .. } => Some(job),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&RunEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn record(&mut self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }
}
