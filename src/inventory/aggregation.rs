//! Metric Aggregation Engine
//!
//! Reconciles per-broker and cluster-level samples into one representative
//! value per metric. The reduction for each aggregation kind is a pure
//! function over already-fetched samples; [`MetricEngine`] only decides what
//! to fetch and where failures stop.

use crate::domain::ports::{
    Datapoint, Dimension, MetricQuery, MetricsSourceRef, Statistic,
};
use crate::error::{Error, Result};
use crate::inventory::descriptor::ClusterDescriptor;
use crate::inventory::policy::{
    policies_for, AggregationKind, MetricPolicy, BROKER_ID_DIMENSION, CLUSTER_NAME_DIMENSION,
};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

// =============================================================================
// Samples and Results
// =============================================================================

/// Window statistics obtained for one broker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrokerSample {
    pub broker_id: u32,
    pub average: Option<f64>,
    pub maximum: Option<f64>,
}

/// Cluster-level average and peak
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AvgPeak {
    pub average: Option<f64>,
    pub peak: Option<f64>,
}

/// Result values keyed by metric name or `<name>_Avg` / `<name>_Peak`.
///
/// `None` means the value was unobtainable. A key may also be missing
/// entirely; [`MetricResult::backfill`] adds it as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricResult {
    values: IndexMap<String, Option<f64>>,
}

impl MetricResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<f64>) {
        self.values.insert(key.into(), value);
    }

    fn insert_pair(&mut self, policy: &MetricPolicy, pair: AvgPeak) {
        self.insert(policy.avg_key(), pair.average);
        self.insert(policy.peak_key(), pair.peak);
    }

    /// Value for a key; `None` if the key is absent
    pub fn get(&self, key: &str) -> Option<Option<f64>> {
        self.values.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add a null entry for every key of `policies` that is missing
    pub fn backfill(&mut self, policies: &[MetricPolicy]) {
        for key in policies.iter().flat_map(MetricPolicy::result_keys) {
            self.values.entry(key).or_insert(None);
        }
    }
}

// =============================================================================
// Aggregation Functions
// =============================================================================

/// Maximum statistic of the most recent datapoint
pub fn latest_cluster_value(points: &[Datapoint]) -> Option<f64> {
    points
        .iter()
        .max_by_key(|p| p.timestamp)
        .and_then(|p| p.maximum)
}

/// Sum of per-broker averages and sum of per-broker maxima
pub fn sum_across_brokers(samples: &[BrokerSample]) -> AvgPeak {
    let sum = |values: Vec<f64>| (!values.is_empty()).then(|| values.iter().sum::<f64>());
    AvgPeak {
        average: sum(samples.iter().filter_map(|s| s.average).collect()),
        peak: sum(samples.iter().filter_map(|s| s.maximum).collect()),
    }
}

/// Mean of per-broker averages and the single highest per-broker maximum
pub fn average_across_brokers_peak_max(samples: &[BrokerSample]) -> AvgPeak {
    let averages: Vec<f64> = samples.iter().filter_map(|s| s.average).collect();
    let average = (!averages.is_empty())
        .then(|| averages.iter().sum::<f64>() / averages.len() as f64);
    let peak = samples
        .iter()
        .filter_map(|s| s.maximum)
        .reduce(f64::max);

    AvgPeak { average, peak }
}

/// Average and maximum of the first datapoint of a whole-window query
pub fn window_average_peak(points: &[Datapoint]) -> AvgPeak {
    points
        .first()
        .map(|p| AvgPeak {
            average: p.average,
            peak: p.maximum,
        })
        .unwrap_or_default()
}

// =============================================================================
// Engine
// =============================================================================

/// Configuration for the aggregation engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lookback for latest-value metrics
    pub latest_window: Duration,
    /// Granularity of latest-value queries, in seconds
    pub latest_period_secs: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            latest_window: Duration::minutes(15),
            latest_period_secs: 60,
        }
    }
}

/// Computes per-cluster metric values from the metrics backend
pub struct MetricEngine {
    metrics: MetricsSourceRef,
    config: EngineConfig,
}

/// Reporting window shared by every query of one cluster
struct Window<'a> {
    namespace: &'static str,
    cluster_name: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    period_secs: i32,
}

impl MetricEngine {
    pub fn new(metrics: MetricsSourceRef, config: EngineConfig) -> Self {
        Self { metrics, config }
    }

    /// Compute every metric of the descriptor's policy table.
    ///
    /// Query failures never escape: each one turns its values into `None`.
    /// Per-broker metrics of a cluster without a usable broker count are left
    /// out of the result entirely.
    pub async fn aggregate(
        &self,
        descriptor: &ClusterDescriptor,
        window_end: DateTime<Utc>,
        window_days: u32,
    ) -> MetricResult {
        let mut result = MetricResult::new();

        let Some(cluster_name) = descriptor.display_name.as_deref() else {
            warn!(
                "Cluster {} has no name, skipping metrics",
                descriptor.cluster_id
            );
            return result;
        };

        let (namespace, policies) = policies_for(&descriptor.capacity);
        let window = Window {
            namespace,
            cluster_name,
            start: window_end - Duration::days(i64::from(window_days)),
            end: window_end,
            period_secs: window_period_secs(window_days),
        };

        info!(
            "Fetching {} metrics for {}",
            descriptor.capacity.label(),
            cluster_name
        );

        for policy in policies {
            match policy.kind {
                AggregationKind::LatestClusterValue => {
                    let value = match self.latest(&window, policy).await {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("Error fetching {} for {}: {}", policy.name, cluster_name, e);
                            None
                        }
                    };
                    if let Some(v) = value {
                        debug!("Fetched {}: current value {}", policy.name, v);
                    }
                    result.insert(policy.name, value);
                }
                AggregationKind::WindowAveragePeak => {
                    let pair = match self.whole_window(&window, policy).await {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!("Error fetching {} for {}: {}", policy.name, cluster_name, e);
                            AvgPeak::default()
                        }
                    };
                    log_pair(policy, &pair);
                    result.insert_pair(policy, pair);
                }
                AggregationKind::SumAcrossBrokers | AggregationKind::AverageAcrossBrokersPeakMax => {
                    let Some(brokers) = descriptor.broker_count() else {
                        continue;
                    };
                    let samples = self.per_broker(&window, policy, brokers).await;
                    let pair = if policy.kind == AggregationKind::SumAcrossBrokers {
                        sum_across_brokers(&samples)
                    } else {
                        average_across_brokers_peak_max(&samples)
                    };
                    log_pair(policy, &pair);
                    result.insert_pair(policy, pair);
                }
            }
        }

        result
    }

    async fn latest(&self, window: &Window<'_>, policy: &MetricPolicy) -> Result<Option<f64>> {
        let query = MetricQuery {
            namespace: window.namespace.to_string(),
            metric_name: policy.source_metric.to_string(),
            dimensions: vec![Dimension::new(CLUSTER_NAME_DIMENSION, window.cluster_name)],
            start: window.end - self.config.latest_window,
            end: window.end,
            period_secs: self.config.latest_period_secs,
            statistics: vec![Statistic::Maximum],
            unit: policy.unit,
        };
        let points = self.query(policy, &query).await?;
        Ok(latest_cluster_value(&points))
    }

    async fn whole_window(&self, window: &Window<'_>, policy: &MetricPolicy) -> Result<AvgPeak> {
        let query = window.query(policy, None);
        let points = self.query(policy, &query).await?;
        Ok(window_average_peak(&points))
    }

    /// Collect one sample per broker, skipping brokers whose query fails
    async fn per_broker(
        &self,
        window: &Window<'_>,
        policy: &MetricPolicy,
        brokers: u32,
    ) -> Vec<BrokerSample> {
        let mut samples = Vec::with_capacity(brokers as usize);

        for broker_id in 1..=brokers {
            let query = window.query(policy, Some(broker_id));
            match self.query(policy, &query).await {
                Ok(points) => {
                    if let Some(point) = points.first() {
                        samples.push(BrokerSample {
                            broker_id,
                            average: point.average,
                            maximum: point.maximum,
                        });
                    }
                }
                Err(e) => {
                    warn!(
                        "Error fetching {} for {} (Broker ID {}): {}",
                        policy.name, window.cluster_name, broker_id, e
                    );
                }
            }
        }

        samples
    }

    async fn query(&self, policy: &MetricPolicy, query: &MetricQuery) -> Result<Vec<Datapoint>> {
        self.metrics
            .get_statistics(query)
            .await
            .map_err(|e| Error::MetricQuery {
                metric: policy.name.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Window<'_> {
    /// Whole-window Average+Maximum query, optionally for one broker
    fn query(&self, policy: &MetricPolicy, broker_id: Option<u32>) -> MetricQuery {
        let mut dimensions = vec![Dimension::new(CLUSTER_NAME_DIMENSION, self.cluster_name)];
        if let Some(id) = broker_id {
            dimensions.push(Dimension::new(BROKER_ID_DIMENSION, id.to_string()));
        }

        MetricQuery {
            namespace: self.namespace.to_string(),
            metric_name: policy.source_metric.to_string(),
            dimensions,
            start: self.start,
            end: self.end,
            period_secs: self.period_secs,
            statistics: vec![Statistic::Average, Statistic::Maximum],
            unit: policy.unit,
        }
    }
}

/// One aggregation period spanning the whole window
fn window_period_secs(window_days: u32) -> i32 {
    i32::try_from(u64::from(window_days) * 24 * 60 * 60).unwrap_or(i32::MAX)
}

fn log_pair(policy: &MetricPolicy, pair: &AvgPeak) {
    if pair.average.is_some() || pair.peak.is_some() {
        debug!(
            "Fetched {}: avg={:?}, peak={:?}",
            policy.name, pair.average, pair.peak
        );
    }
}
