//! MSK control plane adapter
//!
//! Implements [`ClusterCatalog`] over both generations of the MSK listing and
//! description APIs.

use crate::aws::to_chrono;
use crate::domain::ports::{
    ClusterCatalog, ClusterSummary, RawBrokerNodeGroup, RawClientAuthentication, RawClusterInfo,
    RawProvisioned, RawServerless,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_kafka::error::DisplayErrorContext;
use aws_sdk_kafka::types::{BrokerNodeGroupInfo, ClientAuthentication, Cluster, ClusterInfo};
use aws_sdk_kafka::Client;
use tracing::debug;

const SERVICE: &str = "kafka";

/// MSK client bound to one region
pub struct MskCatalog {
    client: Client,
}

impl MskCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterCatalog for MskCatalog {
    async fn list_clusters_v2(&self) -> Result<Vec<ClusterSummary>> {
        let mut pages = self.client.list_clusters_v2().into_paginator().send();
        let mut clusters = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|e| Error::aws(SERVICE, "ListClustersV2", DisplayErrorContext(&e)))?;
            clusters.extend(page.cluster_info_list().iter().filter_map(|c| {
                c.cluster_arn().map(|arn| ClusterSummary {
                    cluster_arn: arn.to_string(),
                    cluster_name: c.cluster_name().map(str::to_string),
                })
            }));
        }

        debug!("ListClustersV2 returned {} clusters", clusters.len());
        Ok(clusters)
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>> {
        let mut pages = self.client.list_clusters().into_paginator().send();
        let mut clusters = Vec::new();

        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| Error::aws(SERVICE, "ListClusters", DisplayErrorContext(&e)))?;
            clusters.extend(
                page.cluster_info_list()
                    .iter()
                    .filter_map(|c| c.cluster_arn())
                    .map(ClusterSummary::from_arn),
            );
        }

        debug!("ListClusters returned {} clusters", clusters.len());
        Ok(clusters)
    }

    async fn describe_cluster_v2(&self, cluster_arn: &str) -> Result<Option<RawClusterInfo>> {
        let output = self
            .client
            .describe_cluster_v2()
            .cluster_arn(cluster_arn)
            .send()
            .await
            .map_err(|e| Error::aws(SERVICE, "DescribeClusterV2", DisplayErrorContext(&e)))?;

        Ok(output.cluster_info().map(from_cluster))
    }

    async fn describe_cluster(&self, cluster_arn: &str) -> Result<Option<RawClusterInfo>> {
        let output = self
            .client
            .describe_cluster()
            .cluster_arn(cluster_arn)
            .send()
            .await
            .map_err(|e| Error::aws(SERVICE, "DescribeCluster", DisplayErrorContext(&e)))?;

        Ok(output.cluster_info().map(from_legacy))
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn from_cluster(cluster: &Cluster) -> RawClusterInfo {
    RawClusterInfo {
        cluster_name: cluster.cluster_name().map(str::to_string),
        creation_time: cluster.creation_time().and_then(to_chrono),
        provisioned: cluster.provisioned().map(|p| {
            let brokers: Option<i32> = p.number_of_broker_nodes().into();
            RawProvisioned {
                kafka_version: p
                    .current_broker_software_info()
                    .and_then(|s| s.kafka_version())
                    .map(str::to_string),
                number_of_broker_nodes: brokers,
                broker_node_group: p.broker_node_group_info().map(from_node_group),
                client_authentication: p.client_authentication().map(from_client_auth),
            }
        }),
        serverless: cluster.serverless().map(|s| RawServerless {
            client_authentication: s.client_authentication().map(|auth| {
                RawClientAuthentication {
                    iam: auth.sasl().and_then(|sasl| sasl.iam()).and_then(|iam| iam.enabled()),
                    ..Default::default()
                }
            }),
        }),
        legacy: None,
    }
}

fn from_legacy(info: &ClusterInfo) -> RawClusterInfo {
    let brokers: Option<i32> = info.number_of_broker_nodes().into();
    RawClusterInfo {
        cluster_name: info.cluster_name().map(str::to_string),
        creation_time: info.creation_time().and_then(to_chrono),
        provisioned: None,
        serverless: None,
        legacy: Some(RawProvisioned {
            kafka_version: info
                .current_broker_software_info()
                .and_then(|s| s.kafka_version())
                .map(str::to_string),
            number_of_broker_nodes: brokers,
            broker_node_group: info.broker_node_group_info().map(from_node_group),
            client_authentication: info.client_authentication().map(from_client_auth),
        }),
    }
}

fn from_node_group(group: &BrokerNodeGroupInfo) -> RawBrokerNodeGroup {
    let instance_type: Option<&str> = group.instance_type().into();
    RawBrokerNodeGroup {
        instance_type: instance_type.map(str::to_string),
        client_subnets: group.client_subnets().to_vec(),
        zone_ids: group.zone_ids().to_vec(),
        ebs_volume_size_gb: group
            .storage_info()
            .and_then(|s| s.ebs_storage_info())
            .and_then(|ebs| ebs.volume_size()),
    }
}

fn from_client_auth(auth: &ClientAuthentication) -> RawClientAuthentication {
    let sasl = auth.sasl();
    RawClientAuthentication {
        iam: sasl.and_then(|s| s.iam()).and_then(|iam| iam.enabled()),
        scram: sasl.and_then(|s| s.scram()).and_then(|scram| scram.enabled()),
        tls: auth.tls().and_then(|tls| tls.enabled()),
        unauthenticated: auth.unauthenticated().and_then(|u| u.enabled()),
    }
}
