//! Cluster Descriptor Resolver
//!
//! Turns the raw output of either description API into one normalized
//! [`ClusterDescriptor`], whichever capacity model the cluster uses.

use crate::domain::ports::{
    ClusterCatalogRef, RawBrokerNodeGroup, RawClientAuthentication, RawClusterInfo,
    RawProvisioned, SubnetDirectoryRef, SUBNET_BATCH_SIZE,
};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Software version reported for serverless clusters
pub const MANAGED_SOFTWARE_VERSION: &str = "Managed (Serverless)";

// =============================================================================
// Authentication
// =============================================================================

/// Client authentication mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMethod {
    Iam,
    Scram,
    MutualTls,
    Unauthenticated,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Iam => write!(f, "IAM"),
            AuthMethod::Scram => write!(f, "SCRAM"),
            AuthMethod::MutualTls => write!(f, "mTLS"),
            AuthMethod::Unauthenticated => write!(f, "Unauthenticated"),
        }
    }
}

/// Authentication state of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authentication {
    /// The description carried no authentication structure at all
    Unavailable,
    /// The structure is present but every mechanism is disabled
    NoneEnabled,
    /// Enabled mechanisms, in IAM, SCRAM, mTLS, Unauthenticated order
    Enabled(Vec<AuthMethod>),
}

impl Authentication {
    /// Collect enabled mechanisms from the raw flags
    pub fn from_raw(raw: Option<&RawClientAuthentication>) -> Self {
        let Some(raw) = raw else {
            return Authentication::Unavailable;
        };

        let methods: Vec<AuthMethod> = [
            (raw.iam, AuthMethod::Iam),
            (raw.scram, AuthMethod::Scram),
            (raw.tls, AuthMethod::MutualTls),
            (raw.unauthenticated, AuthMethod::Unauthenticated),
        ]
        .into_iter()
        .filter(|(enabled, _)| enabled.unwrap_or(false))
        .map(|(_, method)| method)
        .collect();

        if methods.is_empty() {
            Authentication::NoneEnabled
        } else {
            Authentication::Enabled(methods)
        }
    }
}

impl std::fmt::Display for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authentication::Unavailable => write!(f, "N/A"),
            Authentication::NoneEnabled => write!(f, "None Enabled"),
            Authentication::Enabled(methods) => {
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", method)?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Shape-specific attributes of a provisioned cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedCapacity {
    pub instance_type: Option<String>,
    /// Broker count; brokers are numbered 1..=count
    pub broker_count: Option<u32>,
    pub storage_per_broker_gb: Option<u32>,
    pub availability_zone_count: Option<usize>,
}

/// Capacity model of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityShape {
    FixedCapacity(FixedCapacity),
    OnDemand,
}

impl CapacityShape {
    /// Cluster type label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            CapacityShape::FixedCapacity(_) => "Provisioned",
            CapacityShape::OnDemand => "Serverless",
        }
    }

    pub fn fixed(&self) -> Option<&FixedCapacity> {
        match self {
            CapacityShape::FixedCapacity(fixed) => Some(fixed),
            CapacityShape::OnDemand => None,
        }
    }
}

/// Normalized view of one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    pub cluster_id: String,
    pub display_name: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub capacity: CapacityShape,
    pub software_version: Option<String>,
    pub authentication: Authentication,
}

impl ClusterDescriptor {
    /// Usable broker count; `None` when absent or zero
    pub fn broker_count(&self) -> Option<u32> {
        self.capacity
            .fixed()
            .and_then(|f| f.broker_count)
            .filter(|&n| n > 0)
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves cluster identifiers to descriptors within one region
pub struct DescriptorResolver {
    catalog: ClusterCatalogRef,
    subnets: SubnetDirectoryRef,
}

impl DescriptorResolver {
    pub fn new(catalog: ClusterCatalogRef, subnets: SubnetDirectoryRef) -> Self {
        Self { catalog, subnets }
    }

    /// Resolve a cluster, logging and swallowing any failure.
    ///
    /// `None` means the cluster is skipped; the scan continues.
    pub async fn resolve(&self, cluster_id: &str) -> Option<ClusterDescriptor> {
        match self.try_resolve(cluster_id).await {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!("Could not resolve cluster {}: {}", cluster_id, e);
                None
            }
        }
    }

    /// Resolve a cluster, surfacing the failure reason
    pub async fn try_resolve(&self, cluster_id: &str) -> Result<ClusterDescriptor> {
        let raw = self.describe(cluster_id).await?;
        self.normalize(cluster_id, raw).await
    }

    /// Fetch the raw description, preferring the version-aware API
    async fn describe(&self, cluster_id: &str) -> Result<RawClusterInfo> {
        let described = match self.catalog.describe_cluster_v2(cluster_id).await {
            Ok(info) => info,
            Err(v2_err) => {
                debug!(
                    "DescribeClusterV2 failed for {}, falling back to legacy API: {}",
                    cluster_id, v2_err
                );
                self.catalog
                    .describe_cluster(cluster_id)
                    .await
                    .map_err(|e| Error::DescribeCluster {
                        cluster_id: cluster_id.to_string(),
                        reason: format!("both description APIs failed: {}", e),
                    })?
            }
        };

        described.ok_or_else(|| Error::DescribeCluster {
            cluster_id: cluster_id.to_string(),
            reason: "empty cluster info".to_string(),
        })
    }

    async fn normalize(&self, cluster_id: &str, raw: RawClusterInfo) -> Result<ClusterDescriptor> {
        let RawClusterInfo {
            cluster_name,
            creation_time,
            provisioned,
            serverless,
            legacy,
        } = raw;

        let (capacity, software_version, authentication) = match (provisioned, serverless, legacy)
        {
            (Some(_), Some(_), _) => {
                return Err(Error::AmbiguousCapacity {
                    cluster_id: cluster_id.to_string(),
                })
            }
            (Some(provisioned), None, legacy) => {
                let version = provisioned
                    .kafka_version
                    .clone()
                    .or_else(|| legacy.as_ref().and_then(|l| l.kafka_version.clone()));
                self.fixed_capacity(cluster_id, provisioned, version, legacy.as_ref())
                    .await
            }
            (None, Some(serverless), _) => (
                CapacityShape::OnDemand,
                Some(MANAGED_SOFTWARE_VERSION.to_string()),
                Authentication::from_raw(serverless.client_authentication.as_ref()),
            ),
            (None, None, Some(legacy)) if looks_provisioned(&legacy) => {
                let version = legacy.kafka_version.clone();
                self.fixed_capacity(cluster_id, legacy, version, None).await
            }
            (None, None, _) => {
                return Err(Error::UnknownCapacity {
                    cluster_id: cluster_id.to_string(),
                })
            }
        };

        Ok(ClusterDescriptor {
            cluster_id: cluster_id.to_string(),
            display_name: cluster_name.filter(|n| !n.is_empty()),
            creation_time,
            capacity,
            software_version,
            authentication,
        })
    }

    async fn fixed_capacity(
        &self,
        cluster_id: &str,
        provisioned: RawProvisioned,
        software_version: Option<String>,
        generic: Option<&RawProvisioned>,
    ) -> (CapacityShape, Option<String>, Authentication) {
        let broker_count = provisioned
            .number_of_broker_nodes
            .or_else(|| generic.and_then(|g| g.number_of_broker_nodes))
            .and_then(|n| u32::try_from(n).ok());

        let group = provisioned.broker_node_group.unwrap_or_default();
        let availability_zone_count = Some(self.zone_count(cluster_id, &group).await);

        let fixed = FixedCapacity {
            instance_type: group.instance_type,
            broker_count,
            storage_per_broker_gb: group.ebs_volume_size_gb.and_then(|n| u32::try_from(n).ok()),
            availability_zone_count,
        };

        (
            CapacityShape::FixedCapacity(fixed),
            software_version,
            Authentication::from_raw(provisioned.client_authentication.as_ref()),
        )
    }

    /// Count availability zones, resolving subnets when no zone ids are given.
    ///
    /// If subnet resolution fails the raw subnet count is used instead, which
    /// overcounts when several subnets share a zone.
    async fn zone_count(&self, cluster_id: &str, group: &RawBrokerNodeGroup) -> usize {
        if !group.zone_ids.is_empty() {
            return group.zone_ids.len();
        }
        if group.client_subnets.is_empty() {
            return 0;
        }

        match self.resolve_zones(&group.client_subnets).await {
            Ok(zones) => zones.len(),
            Err(e) => {
                warn!(
                    "Could not describe subnets for cluster {}, using subnet count: {}",
                    cluster_id, e
                );
                group.client_subnets.len()
            }
        }
    }

    async fn resolve_zones(&self, subnet_ids: &[String]) -> Result<BTreeSet<String>> {
        let mut zones = BTreeSet::new();
        for chunk in subnet_ids.chunks(SUBNET_BATCH_SIZE) {
            let found = self
                .subnets
                .availability_zones(chunk)
                .await
                .map_err(|e| Error::SubnetLookup(e.to_string()))?;
            zones.extend(found);
        }
        Ok(zones)
    }
}

/// Whether an untagged legacy record describes a provisioned cluster
fn looks_provisioned(legacy: &RawProvisioned) -> bool {
    legacy.broker_node_group.is_some() || legacy.number_of_broker_nodes.is_some()
}
