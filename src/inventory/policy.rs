//! Metric policy tables
//!
//! Each capacity model gets its own fixed table of metrics. The aggregation
//! kind of a policy decides how raw samples collapse into cluster values.

use crate::domain::ports::MetricUnit;
use crate::inventory::descriptor::CapacityShape;
use serde::Serialize;

/// Metrics namespace for provisioned clusters
pub const FIXED_CAPACITY_NAMESPACE: &str = "AWS/Kafka";

/// Metrics namespace for serverless clusters
pub const ON_DEMAND_NAMESPACE: &str = "AWS/Kafka-Serverless";

/// Dimension naming the cluster
pub const CLUSTER_NAME_DIMENSION: &str = "Cluster Name";

/// Dimension naming the broker
pub const BROKER_ID_DIMENSION: &str = "Broker ID";

/// How raw samples reduce to a cluster value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AggregationKind {
    /// Latest cluster-level sample (stateful counts)
    LatestClusterValue,
    /// Sum of per-broker values (extensive quantities such as rates)
    SumAcrossBrokers,
    /// Mean of per-broker averages, max of per-broker maxima
    AverageAcrossBrokersPeakMax,
    /// One sample over the whole window at cluster granularity
    WindowAveragePeak,
}

impl AggregationKind {
    /// Whether results are keyed `<name>_Avg` / `<name>_Peak`
    pub fn has_avg_peak(&self) -> bool {
        !matches!(self, AggregationKind::LatestClusterValue)
    }

    /// Whether the metric is queried once per broker
    pub fn is_per_broker(&self) -> bool {
        matches!(
            self,
            AggregationKind::SumAcrossBrokers | AggregationKind::AverageAcrossBrokersPeakMax
        )
    }
}

/// Static configuration for one reported metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricPolicy {
    /// Name used in result keys and report columns
    pub name: &'static str,
    /// Metric name in the backend
    pub source_metric: &'static str,
    pub unit: MetricUnit,
    pub kind: AggregationKind,
}

impl MetricPolicy {
    const fn new(
        name: &'static str,
        source_metric: &'static str,
        unit: MetricUnit,
        kind: AggregationKind,
    ) -> Self {
        Self {
            name,
            source_metric,
            unit,
            kind,
        }
    }

    /// Result key for the window average
    pub fn avg_key(&self) -> String {
        format!("{}_Avg", self.name)
    }

    /// Result key for the window peak
    pub fn peak_key(&self) -> String {
        format!("{}_Peak", self.name)
    }

    /// Every result key this policy produces
    pub fn result_keys(&self) -> Vec<String> {
        if self.kind.has_avg_peak() {
            vec![self.avg_key(), self.peak_key()]
        } else {
            vec![self.name.to_string()]
        }
    }
}

use AggregationKind::*;
use MetricUnit::*;

/// Policies for provisioned clusters
pub static FIXED_CAPACITY_POLICIES: &[MetricPolicy] = &[
    MetricPolicy::new("StorageUsedPercent", "KafkaDataLogsDiskUsed", Percent, AverageAcrossBrokersPeakMax),
    MetricPolicy::new("GlobalPartitionCount", "GlobalPartitionCount", Count, LatestClusterValue),
    MetricPolicy::new("GlobalTopicCount", "GlobalTopicCount", Count, LatestClusterValue),
    MetricPolicy::new("BytesInPerSec", "BytesInPerSec", BytesPerSecond, SumAcrossBrokers),
    MetricPolicy::new("BytesOutPerSec", "BytesOutPerSec", BytesPerSecond, SumAcrossBrokers),
    MetricPolicy::new("ClientConnectionCount", "ClientConnectionCount", Count, SumAcrossBrokers),
    MetricPolicy::new("ConnectionCloseRate", "ConnectionCloseRate", CountPerSecond, SumAcrossBrokers),
    MetricPolicy::new("ConnectionCreationRate", "ConnectionCreationRate", CountPerSecond, SumAcrossBrokers),
    MetricPolicy::new("RequestBytesMean", "RequestBytesMean", Bytes, AverageAcrossBrokersPeakMax),
];

/// Policies for serverless clusters
pub static ON_DEMAND_POLICIES: &[MetricPolicy] = &[
    MetricPolicy::new("BytesInPerSec", "BytesInPerSec", BytesPerSecond, WindowAveragePeak),
    MetricPolicy::new("BytesOutPerSec", "BytesOutPerSec", BytesPerSecond, WindowAveragePeak),
];

/// Policy table and namespace for a capacity model
pub fn policies_for(shape: &CapacityShape) -> (&'static str, &'static [MetricPolicy]) {
    match shape {
        CapacityShape::FixedCapacity(_) => (FIXED_CAPACITY_NAMESPACE, FIXED_CAPACITY_POLICIES),
        CapacityShape::OnDemand => (ON_DEMAND_NAMESPACE, ON_DEMAND_POLICIES),
    }
}

/// Metric columns in report order: latest values, then every average,
/// then every peak. Names shared between tables appear once.
pub fn metric_columns() -> Vec<String> {
    let mut latest = Vec::new();
    let mut windowed: Vec<&MetricPolicy> = Vec::new();

    for policy in FIXED_CAPACITY_POLICIES.iter().chain(ON_DEMAND_POLICIES) {
        if policy.kind.has_avg_peak() {
            if !windowed.iter().any(|p| p.name == policy.name) {
                windowed.push(policy);
            }
        } else if !latest.iter().any(|n: &String| n == policy.name) {
            latest.push(policy.name.to_string());
        }
    }

    latest
        .into_iter()
        .chain(windowed.iter().map(|p| p.avg_key()))
        .chain(windowed.iter().map(|p| p.peak_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::descriptor::FixedCapacity;

    #[test]
    fn test_table_selection() {
        let (ns, table) = policies_for(&CapacityShape::OnDemand);
        assert_eq!(ns, ON_DEMAND_NAMESPACE);
        assert_eq!(table.len(), 2);

        let (ns, table) = policies_for(&CapacityShape::FixedCapacity(FixedCapacity::default()));
        assert_eq!(ns, FIXED_CAPACITY_NAMESPACE);
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn test_result_keys() {
        let storage = FIXED_CAPACITY_POLICIES[0];
        assert_eq!(
            storage.result_keys(),
            vec!["StorageUsedPercent_Avg", "StorageUsedPercent_Peak"]
        );

        let partitions = FIXED_CAPACITY_POLICIES[1];
        assert_eq!(partitions.result_keys(), vec!["GlobalPartitionCount"]);
    }

    #[test]
    fn test_metric_column_order() {
        let columns = metric_columns();
        assert_eq!(columns.len(), 2 + 7 * 2);
        assert_eq!(columns[0], "GlobalPartitionCount");
        assert_eq!(columns[1], "GlobalTopicCount");
        assert_eq!(columns[2], "StorageUsedPercent_Avg");
        assert_eq!(columns[8], "RequestBytesMean_Avg");
        assert_eq!(columns[9], "StorageUsedPercent_Peak");
        assert_eq!(columns[15], "RequestBytesMean_Peak");
    }
}
