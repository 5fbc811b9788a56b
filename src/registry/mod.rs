//! Mutable set of registered collections with stable-order snapshots.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::ReportError;
use crate::metric::{collection_id, MetricCollection};

/// Copy-on-read view of the registry taken when a flush begins.
pub type SnapshotEntries = SmallVec<[RegistryEntry; 4]>;

/// A registered collection paired with its optional name prefix.
#[derive(Clone)]
pub struct RegistryEntry {
    prefix: Option<String>,
    collection: Arc<dyn MetricCollection>,
}

impl RegistryEntry {
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn collection(&self) -> &Arc<dyn MetricCollection> {
        &self.collection
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegistryEntry")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered set of `(collection, prefix)` pairs.
///
/// Removal only excludes a collection from future snapshots; finalization
/// happens once, on [`finalize_all`](CollectionRegistry::finalize_all), and
/// covers every collection ever registered, removed ones included.
#[derive(Default)]
pub struct CollectionRegistry {
    entries: Vec<RegistryEntry>,
    registered: FxHashSet<usize>,
    ever_seen: FxHashSet<usize>,
    ever_registered: Vec<Arc<dyn MetricCollection>>,
}

impl CollectionRegistry {
    /// Registers a collection under an optional prefix.
    ///
    /// Registering the same collection instance twice is rejected with
    /// [`ReportError::DuplicateCollection`]. A collection that was removed
    /// may be registered again.
    pub fn add(
        &mut self,
        collection: Arc<dyn MetricCollection>,
        prefix: Option<String>,
    ) -> Result<(), ReportError> {
        let id = collection_id(&collection);

        if !self.registered.insert(id) {
            return Err(ReportError::DuplicateCollection);
        }

        if self.ever_seen.insert(id) {
            self.ever_registered.push(Arc::clone(&collection));
        }

        self.entries.push(RegistryEntry { prefix, collection });
        Ok(())
    }

    /// Unregisters a collection; a no-op when it is not present.
    ///
    /// Does not finalize: the collection stays on the ever-registered list
    /// until [`finalize_all`](CollectionRegistry::finalize_all) runs.
    pub fn remove(&mut self, collection: &Arc<dyn MetricCollection>) {
        let id = collection_id(collection);

        if self.registered.remove(&id) {
            self.entries
                .retain(|entry| collection_id(&entry.collection) != id);
        }
    }

    /// Point-in-time copy of the registered pairs, in insertion order.
    ///
    /// Mutating the registry afterwards never affects a returned snapshot.
    pub fn snapshot_entries(&self) -> SnapshotEntries {
        self.entries.iter().cloned().collect()
    }

    /// Finalizes every collection ever registered, exactly once each.
    pub fn finalize_all(&mut self) {
        for collection in self.drain_for_finalize() {
            collection.finalize();
        }
    }

    /// Empties the registry and hands out the collections awaiting
    /// finalization, so callers can run finalizers outside their locks.
    pub(crate) fn drain_for_finalize(&mut self) -> Vec<Arc<dyn MetricCollection>> {
        self.entries.clear();
        self.registered.clear();
        std::mem::take(&mut self.ever_registered)
    }
}

impl fmt::Debug for CollectionRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CollectionRegistry")
            .field("entries", &self.entries)
            .field("ever_registered", &self.ever_registered.len())
            .finish()
    }
}
