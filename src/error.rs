use std::error::Error;

use thiserror::Error;

/// Boxed error produced by the external storage client.
pub type DynError = Box<dyn Error + Send + Sync>;

/// Every failure a reporter can surface through its `error` event.
///
/// Only the connectivity probe is ever retried; a failed write or a
/// malformed metric value is surfaced once and dropped.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Storage backend did not answer the health probe.
    ///
    /// Recoverable: the probe is re-issued until it succeeds or the
    /// reporter is stopped.
    #[error("storage backend is not reachable")]
    Probe(#[source] DynError),

    /// A materialized batch could not be delivered.
    ///
    /// The recurring flush schedule keeps running; the batch is dropped.
    #[error("failed to deliver batch to `{target}`")]
    Write {
        target: String,
        #[source]
        source: DynError,
    },

    /// A metric entry carried a value that cannot appear in a batch,
    /// such as a non-finite float. Skips that flush cycle only.
    #[error("metric `{name}` holds a value that cannot be serialized")]
    Serialization { name: String },

    /// Caller misuse, e.g. starting a reporter that is not idle.
    #[error("reporter cannot start from the `{state}` state")]
    InvalidState { state: &'static str },

    /// The same collection instance was registered twice.
    #[error("collection is already registered")]
    DuplicateCollection,
}
