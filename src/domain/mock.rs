//! In-memory port implementations for tests

use crate::domain::ports::*;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Canned response for one query
#[derive(Debug, Clone)]
pub enum Canned<T> {
    Ok(T),
    Fail,
}

impl<T: Clone> Canned<T> {
    fn get(&self, what: &str) -> Result<T> {
        match self {
            Canned::Ok(v) => Ok(v.clone()),
            Canned::Fail => Err(Error::aws("mock", what, "simulated failure")),
        }
    }
}

pub fn point(timestamp: DateTime<Utc>, average: Option<f64>, maximum: Option<f64>) -> Datapoint {
    Datapoint {
        timestamp,
        average,
        maximum,
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Metrics keyed by (metric name, broker id)
#[derive(Default)]
pub struct MockMetrics {
    responses: HashMap<(String, Option<String>), Canned<Vec<Datapoint>>>,
    pub queries: Mutex<Vec<MetricQuery>>,
}

impl MockMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cluster(mut self, metric: &str, points: Vec<Datapoint>) -> Self {
        self.responses
            .insert((metric.to_string(), None), Canned::Ok(points));
        self
    }

    pub fn broker(mut self, metric: &str, broker: u32, points: Vec<Datapoint>) -> Self {
        self.responses
            .insert((metric.to_string(), Some(broker.to_string())), Canned::Ok(points));
        self
    }

    pub fn fail_broker(mut self, metric: &str, broker: u32) -> Self {
        self.responses
            .insert((metric.to_string(), Some(broker.to_string())), Canned::Fail);
        self
    }

    pub fn fail_cluster(mut self, metric: &str) -> Self {
        self.responses.insert((metric.to_string(), None), Canned::Fail);
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl MetricsSource for MockMetrics {
    async fn get_statistics(&self, query: &MetricQuery) -> Result<Vec<Datapoint>> {
        self.queries.lock().push(query.clone());
        let key = (
            query.metric_name.clone(),
            query.dimension("Broker ID").map(str::to_string),
        );
        match self.responses.get(&key) {
            Some(canned) => canned.get(&query.metric_name),
            None => Ok(Vec::new()),
        }
    }
}

// =============================================================================
// Subnets
// =============================================================================

#[derive(Default)]
pub struct MockSubnets {
    zones: HashMap<String, String>,
    fail: bool,
    pub calls: Mutex<Vec<usize>>,
}

impl MockSubnets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subnet(mut self, subnet_id: &str, zone: &str) -> Self {
        self.zones.insert(subnet_id.to_string(), zone.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl SubnetDirectory for MockSubnets {
    async fn availability_zones(&self, subnet_ids: &[String]) -> Result<Vec<String>> {
        self.calls.lock().push(subnet_ids.len());
        if self.fail {
            return Err(Error::aws("ec2", "DescribeSubnets", "simulated failure"));
        }
        Ok(subnet_ids
            .iter()
            .filter_map(|id| self.zones.get(id).cloned())
            .collect())
    }
}

// =============================================================================
// Cluster Catalog
// =============================================================================

#[derive(Default)]
pub struct MockCatalog {
    pub list_v2: Option<Canned<Vec<ClusterSummary>>>,
    pub list_v1: Option<Canned<Vec<ClusterSummary>>>,
    pub describe_v2: HashMap<String, Canned<Option<RawClusterInfo>>>,
    pub describe_v1: HashMap<String, Canned<Option<RawClusterInfo>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog listing and describing a single cluster through the v2 APIs
    pub fn single(arn: &str, info: RawClusterInfo) -> Self {
        let mut catalog = Self::new();
        catalog.list_v2 = Some(Canned::Ok(vec![ClusterSummary {
            cluster_arn: arn.to_string(),
            cluster_name: info.cluster_name.clone(),
        }]));
        catalog
            .describe_v2
            .insert(arn.to_string(), Canned::Ok(Some(info)));
        catalog
    }
}

#[async_trait]
impl ClusterCatalog for MockCatalog {
    async fn list_clusters_v2(&self) -> Result<Vec<ClusterSummary>> {
        self.list_v2
            .as_ref()
            .unwrap_or(&Canned::Fail)
            .get("ListClustersV2")
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>> {
        self.list_v1
            .as_ref()
            .unwrap_or(&Canned::Fail)
            .get("ListClusters")
    }

    async fn describe_cluster_v2(&self, cluster_arn: &str) -> Result<Option<RawClusterInfo>> {
        self.describe_v2
            .get(cluster_arn)
            .unwrap_or(&Canned::Fail)
            .get("DescribeClusterV2")
    }

    async fn describe_cluster(&self, cluster_arn: &str) -> Result<Option<RawClusterInfo>> {
        self.describe_v1
            .get(cluster_arn)
            .unwrap_or(&Canned::Fail)
            .get("DescribeCluster")
    }
}

// =============================================================================
// Provider
// =============================================================================

pub struct MockProvider {
    pub account: Canned<String>,
    pub known: Canned<Vec<String>>,
    pub enabled: Canned<Vec<String>>,
    pub regions: HashMap<String, RegionClients>,
}

impl MockProvider {
    pub fn new(account: &str) -> Self {
        Self {
            account: Canned::Ok(account.to_string()),
            known: Canned::Ok(Vec::new()),
            enabled: Canned::Ok(Vec::new()),
            regions: HashMap::new(),
        }
    }

    pub fn region(
        mut self,
        region: &str,
        catalog: MockCatalog,
        subnets: MockSubnets,
        metrics: MockMetrics,
    ) -> Self {
        self.regions.insert(
            region.to_string(),
            RegionClients {
                region: region.to_string(),
                clusters: Arc::new(catalog),
                subnets: Arc::new(subnets),
                metrics: Arc::new(metrics),
            },
        );
        self
    }
}

#[async_trait]
impl CloudProvider for MockProvider {
    async fn account_id(&self) -> Result<String> {
        self.account.get("GetCallerIdentity")
    }

    async fn known_regions(&self) -> Result<Vec<String>> {
        self.known.get("DescribeRegions")
    }

    async fn enabled_regions(&self) -> Result<Vec<String>> {
        self.enabled.get("DescribeRegions")
    }

    async fn region_clients(&self, region: &str) -> Result<RegionClients> {
        self.regions
            .get(region)
            .cloned()
            .ok_or_else(|| Error::ClientConstruction {
                region: region.to_string(),
                reason: "no clients configured".to_string(),
            })
    }
}
