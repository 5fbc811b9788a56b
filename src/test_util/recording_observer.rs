use std::sync::{Mutex, PoisonError};

use crate::error::ReportError;
use crate::reporter::ReporterObserver;

/// Observer that records every event it sees, in order.
///
/// Errors are recorded with their kind, e.g. `error:probe`, so tests can
/// assert on exact event sequences.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn occurrences(&self, event: &str) -> usize {
        self.events()
            .iter()
            .filter(|recorded| recorded.as_str() == event)
            .count()
    }

    fn record(&self, event: impl Into<String>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }
}

impl ReporterObserver for RecordingObserver {
    fn on_start(&self) {
        self.record("start");
    }

    fn on_update(&self) {
        self.record("update");
    }

    fn on_error(&self, error: &ReportError) {
        self.record(format!("error:{}", error_kind(error)));
    }

    fn on_stop(&self) {
        self.record("stop");
    }
}

fn error_kind(error: &ReportError) -> &'static str {
    match error {
        ReportError::Probe(_) => "probe",
        ReportError::Write { .. } => "write",
        ReportError::Serialization { .. } => "serialization",
        ReportError::InvalidState { .. } => "invalid_state",
        ReportError::DuplicateCollection => "duplicate_collection",
    }
}
