//! Periodic metrics-shipping reporter.
//!
//! A [`Reporter`] snapshots every registered [`MetricCollection`] on a fixed
//! cadence and ships the result as one [`Batch`] to a remote storage backend
//! behind the [`StorageClient`] seam. Shipping starts only after a retried
//! connectivity probe succeeds, and lifecycle outcomes surface through
//! [`ReporterObserver`] events instead of return values.
//!
//! Timers run on tokio's clock, so tests drive the whole lifecycle with
//! [`tokio::time::pause`] and [`tokio::time::advance`].

#![warn(missing_debug_implementations, unreachable_pub)]

mod batch;
mod client;
mod error;
mod metric;
mod registry;
mod reporter;
mod scheduler;

#[cfg(any(test, feature = "test_util"))]
pub mod test_util;

pub use batch::{Batch, BatchSerializer, TargetPartition, WriteRecord};
pub use client::StorageClient;
pub use error::{DynError, ReportError};
pub use metric::{MetricCollection, MetricEntry, MetricValue};
pub use registry::{CollectionRegistry, RegistryEntry, SnapshotEntries};
pub use reporter::{Reporter, ReporterObserver, ReporterSettings, ReporterState};
pub use scheduler::{Scheduler, TimeUnit};
