//! Point-in-time view of a metric collection.
//!
//! Collections are owned by the embedding application; the reporter only
//! enumerates their entries during a flush and finalizes them on stop.

use std::sync::Arc;

/// Current value of a single named metric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
}

impl MetricValue {
    /// A value is serializable when it can appear in a batch body.
    ///
    /// Non-finite floats are the one malformed case: they have no wire
    /// representation and fail the flush cycle that observes them.
    pub fn is_serializable(&self) -> bool {
        match self {
            Self::Integer(_) => true,
            Self::Float(value) => value.is_finite(),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// One `(name, value)` pair as enumerated by a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEntry {
    name: String,
    value: MetricValue,
}

impl MetricEntry {
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> MetricValue {
        self.value
    }
}

/// Externally owned container of named metrics.
///
/// The reporter never copies or mutates collection internals: it reads
/// [`entries`](MetricCollection::entries) when a flush begins and calls
/// [`finalize`](MetricCollection::finalize) exactly once when stopped, so a
/// collection can release timers or other resources it holds internally.
pub trait MetricCollection: Send + Sync {
    /// Enumerates current metric entries, in the collection's own order.
    fn entries(&self) -> Vec<MetricEntry>;

    /// Releases resources owned by the collection.
    fn finalize(&self);
}

/// Collections are identified by their allocation, never by contents.
pub(crate) fn collection_id(collection: &Arc<dyn MetricCollection>) -> usize {
    Arc::as_ptr(collection) as *const () as usize
}
