use std::io::{Error, ErrorKind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::batch::WriteRecord;
use crate::client::StorageClient;
use crate::error::DynError;

/// One observed `write` call with everything the client received.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCall {
    pub target: String,
    pub records: Vec<WriteRecord>,
}

#[derive(Debug, Default)]
struct FakeState {
    probe_failures: usize,
    probe_calls: usize,
    write_failures: usize,
    write_delay: Option<Duration>,
    writes: Vec<WriteCall>,
}

/// In-memory [`StorageClient`] with scriptable probe and write outcomes.
///
/// Cloning shares the underlying state, so a test keeps one handle for
/// assertions while the reporter owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeStorage {
    state: Arc<Mutex<FakeState>>,
}

impl FakeStorage {
    /// Storage whose first `count` probes fail before connectivity appears.
    pub fn with_failing_probes(count: usize) -> Self {
        let storage = Self::default();
        storage.state().probe_failures = count;
        storage
    }

    /// Arms the next `count` writes to fail.
    pub fn fail_writes(&self, count: usize) {
        self.state().write_failures = count;
    }

    /// Suspends every write for `delay` before it completes.
    pub fn delay_writes(&self, delay: Duration) {
        self.state().write_delay = Some(delay);
    }

    pub fn probe_calls(&self) -> usize {
        self.state().probe_calls
    }

    pub fn write_calls(&self) -> usize {
        self.state().writes.len()
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.state().writes.clone()
    }

    pub fn last_write(&self) -> Option<WriteCall> {
        self.state().writes.last().cloned()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageClient for FakeStorage {
    async fn probe(&self) -> Result<(), DynError> {
        let fail = {
            let mut state = self.state();
            state.probe_calls += 1;

            match state.probe_failures {
                0 => false,
                remaining => {
                    state.probe_failures = remaining - 1;
                    true
                }
            }
        };

        if fail {
            return Err(Box::new(Error::new(
                ErrorKind::ConnectionRefused,
                "storage backend refused the probe",
            )));
        }

        Ok(())
    }

    async fn write(&self, target: &str, records: &[WriteRecord]) -> Result<(), DynError> {
        let delay = {
            let mut state = self.state();
            state.writes.push(WriteCall {
                target: target.to_owned(),
                records: records.to_vec(),
            });
            state.write_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let fail = {
            let mut state = self.state();

            match state.write_failures {
                0 => false,
                remaining => {
                    state.write_failures = remaining - 1;
                    true
                }
            }
        };

        if fail {
            return Err(Box::new(Error::new(
                ErrorKind::BrokenPipe,
                "storage backend dropped the batch",
            )));
        }

        Ok(())
    }
}
