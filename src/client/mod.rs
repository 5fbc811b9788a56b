//! Seam for the remote storage backend.

use crate::batch::WriteRecord;
use crate::error::DynError;

/// Asynchronous client for the remote storage backend.
///
/// Implemented by the embedding application; the reporter only needs a
/// health check and a batched write. Both calls may suspend for as long as
/// the backend takes to answer; the reporter stays responsive while they
/// are in flight.
#[trait_variant::make(Send)]
pub trait StorageClient {
    /// One-shot connectivity health check.
    async fn probe(&self) -> Result<(), DynError>;

    /// Delivers one materialized batch to `target`.
    ///
    /// An empty record slice is a valid call, not one to be skipped.
    async fn write(&self, target: &str, records: &[WriteRecord]) -> Result<(), DynError>;
}
