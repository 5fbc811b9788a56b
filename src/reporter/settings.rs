use std::time::Duration;

use crate::batch::TargetPartition;

const DEFAULT_TARGET_PREFIX: &str = "metrics";
const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Reporter construction settings.
///
/// Defaults match the expected production behavior: batches land in a
/// daily-partitioned `metrics-*` target and an unreachable backend is
/// re-probed every five seconds.
#[derive(Debug, Clone)]
pub struct ReporterSettings {
    target_prefix: String,
    partition: TargetPartition,
    probe_interval: Duration,
}

impl ReporterSettings {
    /// Changes the prefix of the time-partitioned batch target.
    pub fn with_target_prefix(self, target_prefix: impl Into<String>) -> Self {
        Self {
            target_prefix: target_prefix.into(),
            ..self
        }
    }

    /// Changes the granularity of the batch target partition.
    pub fn with_partition(self, partition: TargetPartition) -> Self {
        Self { partition, ..self }
    }

    /// Changes how long the reporter waits between failed probes.
    pub fn with_probe_interval(self, probe_interval: Duration) -> Self {
        Self {
            probe_interval,
            ..self
        }
    }

    pub fn target_prefix(&self) -> &str {
        &self.target_prefix
    }

    pub fn partition(&self) -> TargetPartition {
        self.partition
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            target_prefix: DEFAULT_TARGET_PREFIX.into(),
            partition: TargetPartition::default(),
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_daily_metrics_target_and_five_second_probe() {
        let settings = ReporterSettings::default();

        assert_eq!(settings.target_prefix(), "metrics");
        assert_eq!(settings.partition(), TargetPartition::Daily);
        assert_eq!(settings.probe_interval(), Duration::from_secs(5));
    }

    #[test]
    fn allows_modifying_target_prefix() {
        let settings = ReporterSettings::default().with_target_prefix("staging");

        assert_eq!(settings.target_prefix(), "staging");
    }

    #[test]
    fn allows_modifying_partition_and_probe_interval() {
        let settings = ReporterSettings::default()
            .with_partition(TargetPartition::Monthly)
            .with_probe_interval(Duration::from_secs(1));

        assert_eq!(settings.partition(), TargetPartition::Monthly);
        assert_eq!(settings.probe_interval(), Duration::from_secs(1));
    }
}
