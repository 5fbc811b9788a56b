use chrono::Utc;

use super::{Batch, WriteRecord};
use crate::error::ReportError;
use crate::registry::RegistryEntry;

/// Granularity of the time-partitioned batch target.
///
/// The partition label stays stable within one window and changes when the
/// window rolls over, so consecutive flushes land in the same destination
/// until the date changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetPartition {
    #[default]
    Daily,
    Monthly,
}

impl TargetPartition {
    fn date_format(self) -> &'static str {
        match self {
            Self::Daily => "%Y.%m.%d",
            Self::Monthly => "%Y.%m",
        }
    }
}

/// Deterministic transform from a registry snapshot to a [`Batch`].
///
/// Records follow registry order on the outside and each collection's own
/// enumeration order on the inside.
#[derive(Debug, Clone)]
pub struct BatchSerializer {
    target_prefix: String,
    partition: TargetPartition,
}

impl Default for BatchSerializer {
    fn default() -> Self {
        Self::new("metrics", TargetPartition::default())
    }
}

impl BatchSerializer {
    pub fn new(target_prefix: impl Into<String>, partition: TargetPartition) -> Self {
        Self {
            target_prefix: target_prefix.into(),
            partition,
        }
    }

    /// Target identifier for a batch materialized right now.
    pub fn target(&self) -> String {
        format!(
            "{}-{}",
            self.target_prefix,
            Utc::now().format(self.partition.date_format())
        )
    }

    /// Materializes one batch from a registry snapshot.
    ///
    /// An empty snapshot, or one where every collection is empty, yields a
    /// valid batch with no records. The first non-serializable value aborts
    /// the whole batch with [`ReportError::Serialization`].
    pub fn serialize(&self, entries: &[RegistryEntry]) -> Result<Batch, ReportError> {
        let mut records = Vec::new();

        for entry in entries {
            for metric in entry.collection().entries() {
                if !metric.value().is_serializable() {
                    return Err(ReportError::Serialization {
                        name: qualified_name(entry.prefix(), metric.name()),
                    });
                }

                records.push(WriteRecord::new(
                    qualified_name(entry.prefix(), metric.name()),
                    metric.value(),
                ));
            }
        }

        Ok(Batch::new(self.target(), records))
    }
}

fn qualified_name(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}.{name}"),
        _ => name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metric::{MetricCollection, MetricEntry};
    use crate::registry::CollectionRegistry;

    struct FixedCollection(Vec<MetricEntry>);

    impl FixedCollection {
        fn create(entries: Vec<MetricEntry>) -> Arc<dyn MetricCollection> {
            Arc::new(Self(entries))
        }
    }

    impl MetricCollection for FixedCollection {
        fn entries(&self) -> Vec<MetricEntry> {
            self.0.clone()
        }

        fn finalize(&self) {}
    }

    fn registry_with(
        collections: Vec<(Option<&str>, Vec<MetricEntry>)>,
    ) -> CollectionRegistry {
        let mut registry = CollectionRegistry::default();

        for (prefix, entries) in collections {
            registry
                .add(FixedCollection::create(entries), prefix.map(String::from))
                .unwrap();
        }

        registry
    }

    #[test]
    fn qualifies_metric_name_with_collection_prefix() {
        let registry = registry_with(vec![(
            Some("foo"),
            vec![MetricEntry::new("bar", 1i64)],
        )]);

        let batch = BatchSerializer::default()
            .serialize(&registry.snapshot_entries())
            .unwrap();

        assert_eq!(batch.records(), &[WriteRecord::new("foo.bar", 1i64)]);
    }

    #[test]
    fn keeps_bare_name_without_prefix() {
        let registry = registry_with(vec![(None, vec![MetricEntry::new("bar", 1i64)])]);

        let batch = BatchSerializer::default()
            .serialize(&registry.snapshot_entries())
            .unwrap();

        assert_eq!(batch.records(), &[WriteRecord::new("bar", 1i64)]);
    }

    #[test]
    fn treats_empty_prefix_as_absent() {
        let registry = registry_with(vec![(Some(""), vec![MetricEntry::new("bar", 1i64)])]);

        let batch = BatchSerializer::default()
            .serialize(&registry.snapshot_entries())
            .unwrap();

        assert_eq!(batch.records(), &[WriteRecord::new("bar", 1i64)]);
    }

    #[test]
    fn empty_registry_yields_sendable_empty_batch() {
        let batch = BatchSerializer::default().serialize(&[]).unwrap();

        assert!(batch.records().is_empty());
        assert!(batch.target().starts_with("metrics-"));
    }

    #[test]
    fn preserves_registry_and_enumeration_order() {
        let registry = registry_with(vec![
            (
                Some("cache"),
                vec![
                    MetricEntry::new("hits", 10i64),
                    MetricEntry::new("misses", 2i64),
                ],
            ),
            (Some("pool"), vec![MetricEntry::new("active", 5i64)]),
        ]);

        let batch = BatchSerializer::default()
            .serialize(&registry.snapshot_entries())
            .unwrap();

        assert_eq!(
            batch
                .records()
                .iter()
                .map(WriteRecord::name)
                .collect::<Vec<_>>(),
            vec!["cache.hits", "cache.misses", "pool.active"]
        );
    }

    #[test]
    fn non_finite_value_fails_the_whole_batch() {
        let registry = registry_with(vec![(
            Some("load"),
            vec![
                MetricEntry::new("average", 0.5f64),
                MetricEntry::new("spike", f64::NAN),
            ],
        )]);

        let result = BatchSerializer::default().serialize(&registry.snapshot_entries());

        assert!(matches!(
            result,
            Err(ReportError::Serialization { name }) if name == "load.spike"
        ));
    }

    #[test]
    fn daily_target_carries_the_current_date() {
        let serializer = BatchSerializer::new("staging", TargetPartition::Daily);

        assert_eq!(
            serializer.target(),
            format!("staging-{}", Utc::now().format("%Y.%m.%d"))
        );
    }

    #[test]
    fn monthly_target_drops_the_day() {
        let serializer = BatchSerializer::new("staging", TargetPartition::Monthly);

        assert_eq!(
            serializer.target(),
            format!("staging-{}", Utc::now().format("%Y.%m"))
        );
    }

    #[test]
    fn target_is_recomputed_per_batch() {
        let serializer = BatchSerializer::default();

        let first = serializer.serialize(&[]).unwrap();
        let second = serializer.serialize(&[]).unwrap();

        // same partition window, same destination
        assert_eq!(first.target(), second.target());
    }
}
