//! Materialized batches and the snapshot-to-batch transform.

pub use serializer::{BatchSerializer, TargetPartition};

use crate::metric::MetricValue;

mod serializer;

/// One fully-qualified metric name with its value, as carried in a batch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WriteRecord {
    name: String,
    value: MetricValue,
}

impl WriteRecord {
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

/// Ordered records plus the target they are delivered to.
///
/// Always fully materialized before the write call; never sent partially.
/// A batch with no records is valid and still delivered.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Batch {
    target: String,
    records: Vec<WriteRecord>,
}

impl Batch {
    pub(crate) fn new(target: String, records: Vec<WriteRecord>) -> Self {
        Self { target, records }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn records(&self) -> &[WriteRecord] {
        &self.records
    }

    pub fn into_parts(self) -> (String, Vec<WriteRecord>) {
        (self.target, self.records)
    }
}
