//! Domain Ports - Core trait definitions for the inventory scanner
//!
//! These traits define the boundaries between the scan logic and the cloud
//! provider. Adapters in [`crate::aws`] implement them against the AWS SDK;
//! tests implement them in memory.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Cluster Listing
// =============================================================================

/// Summary of one cluster as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster ARN
    pub cluster_arn: String,
    /// Cluster name, when the listing API provides it
    pub cluster_name: Option<String>,
}

impl ClusterSummary {
    /// Summary carrying only an identifier (legacy listing)
    pub fn from_arn(cluster_arn: impl Into<String>) -> Self {
        Self {
            cluster_arn: cluster_arn.into(),
            cluster_name: None,
        }
    }
}

// =============================================================================
// Raw Cluster Description
// =============================================================================

/// Client authentication flags as reported by the description API.
///
/// Each flag is `None` when its sub-structure is missing, which is treated
/// the same as disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClientAuthentication {
    pub iam: Option<bool>,
    pub scram: Option<bool>,
    pub tls: Option<bool>,
    pub unauthenticated: Option<bool>,
}

/// Broker node group layout of a provisioned cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBrokerNodeGroup {
    /// Broker instance class (e.g. kafka.m5.large)
    pub instance_type: Option<String>,
    /// Client subnet identifiers
    pub client_subnets: Vec<String>,
    /// Explicit availability zone ids, when the API reports them
    pub zone_ids: Vec<String>,
    /// EBS volume size per broker in GiB
    pub ebs_volume_size_gb: Option<i32>,
}

/// Provisioned (fixed-capacity) sub-structure.
///
/// The legacy description API returns the same fields untagged at the top
/// level; adapters map them into this shape under [`RawClusterInfo::legacy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProvisioned {
    pub kafka_version: Option<String>,
    pub number_of_broker_nodes: Option<i32>,
    pub broker_node_group: Option<RawBrokerNodeGroup>,
    pub client_authentication: Option<RawClientAuthentication>,
}

/// Serverless (on-demand) sub-structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawServerless {
    pub client_authentication: Option<RawClientAuthentication>,
}

/// Cluster description as returned by either description API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClusterInfo {
    pub cluster_name: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    /// Tagged provisioned structure (version-aware API)
    pub provisioned: Option<RawProvisioned>,
    /// Tagged serverless structure (version-aware API)
    pub serverless: Option<RawServerless>,
    /// Untagged fields (legacy API)
    pub legacy: Option<RawProvisioned>,
}

// =============================================================================
// Metrics
// =============================================================================

/// Statistic requested from the metrics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Maximum,
}

/// Unit attached to a metric query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricUnit {
    Percent,
    Count,
    Bytes,
    BytesPerSecond,
    CountPerSecond,
}

impl MetricUnit {
    /// Unit name as understood by CloudWatch
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Percent => "Percent",
            MetricUnit::Count => "Count",
            MetricUnit::Bytes => "Bytes",
            MetricUnit::BytesPerSecond => "Bytes/Second",
            MetricUnit::CountPerSecond => "Count/Second",
        }
    }
}

impl std::fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One metric dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A statistics query against the metrics backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Aggregation period in seconds
    pub period_secs: i32,
    pub statistics: Vec<Statistic>,
    pub unit: MetricUnit,
}

impl MetricQuery {
    /// Value of the named dimension, if set
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// One timestamped statistical sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub average: Option<f64>,
    pub maximum: Option<f64>,
}

// =============================================================================
// Cluster Catalog Port
// =============================================================================

/// Port for the managed Kafka control plane in one region
#[async_trait]
pub trait ClusterCatalog: Send + Sync {
    /// List clusters with the richer, type-aware listing API
    async fn list_clusters_v2(&self) -> Result<Vec<ClusterSummary>>;

    /// List clusters with the legacy listing API
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>>;

    /// Describe a cluster with the version-aware API (tagged shape)
    async fn describe_cluster_v2(&self, cluster_arn: &str) -> Result<Option<RawClusterInfo>>;

    /// Describe a cluster with the legacy API (untagged shape)
    async fn describe_cluster(&self, cluster_arn: &str) -> Result<Option<RawClusterInfo>>;
}

// =============================================================================
// Subnet Directory Port
// =============================================================================

/// Maximum subnet ids per lookup call
pub const SUBNET_BATCH_SIZE: usize = 100;

/// Port for resolving subnets to availability zones
#[async_trait]
pub trait SubnetDirectory: Send + Sync {
    /// Resolve a batch of at most [`SUBNET_BATCH_SIZE`] subnet ids to the
    /// availability zone of each subnet found
    async fn availability_zones(&self, subnet_ids: &[String]) -> Result<Vec<String>>;
}

// =============================================================================
// Metrics Source Port
// =============================================================================

/// Port for the metrics backend
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Run a statistics query, returning zero or more datapoints
    async fn get_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>>;
}

// =============================================================================
// Cloud Provider Port
// =============================================================================

/// Service clients bound to one region
#[derive(Clone)]
pub struct RegionClients {
    pub region: String,
    pub clusters: ClusterCatalogRef,
    pub subnets: SubnetDirectoryRef,
    pub metrics: MetricsSourceRef,
}

/// Port for account-wide operations
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Account id of the caller (the one identity check)
    async fn account_id(&self) -> Result<String>;

    /// Every region the provider knows about, enabled or not
    async fn known_regions(&self) -> Result<Vec<String>>;

    /// Regions enabled for this account
    async fn enabled_regions(&self) -> Result<Vec<String>>;

    /// Construct service clients for a region
    async fn region_clients(&self, region: &str) -> Result<RegionClients>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type ClusterCatalogRef = Arc<dyn ClusterCatalog>;
pub type SubnetDirectoryRef = Arc<dyn SubnetDirectory>;
pub type MetricsSourceRef = Arc<dyn MetricsSource>;
pub type CloudProviderRef = Arc<dyn CloudProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_unit_names() {
        assert_eq!(MetricUnit::BytesPerSecond.as_str(), "Bytes/Second");
        assert_eq!(MetricUnit::CountPerSecond.to_string(), "Count/Second");
        assert_eq!(MetricUnit::Percent.as_str(), "Percent");
    }

    #[test]
    fn test_query_dimension_lookup() {
        let now = Utc::now();
        let query = MetricQuery {
            namespace: "AWS/Kafka".into(),
            metric_name: "BytesInPerSec".into(),
            dimensions: vec![
                Dimension::new("Cluster Name", "orders"),
                Dimension::new("Broker ID", "2"),
            ],
            start: now,
            end: now,
            period_secs: 60,
            statistics: vec![Statistic::Average],
            unit: MetricUnit::BytesPerSecond,
        };

        assert_eq!(query.dimension("Broker ID"), Some("2"));
        assert_eq!(query.dimension("Topic"), None);
    }
}
