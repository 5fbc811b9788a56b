use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::metric::{MetricCollection, MetricEntry};

/// Collection with caller-controlled entries and a finalize counter.
#[derive(Debug, Default)]
pub struct TestCollection {
    entries: Mutex<Vec<MetricEntry>>,
    finalized: AtomicUsize,
}

impl TestCollection {
    pub fn new(entries: Vec<MetricEntry>) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(entries),
            finalized: AtomicUsize::new(0),
        })
    }

    /// Replaces the entries enumerated by future snapshots.
    pub fn set_entries(&self, entries: Vec<MetricEntry>) {
        *self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = entries;
    }

    /// How many times this collection was finalized.
    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }
}

impl MetricCollection for TestCollection {
    fn entries(&self) -> Vec<MetricEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn finalize(&self) {
        self.finalized.fetch_add(1, Ordering::SeqCst);
    }
}
