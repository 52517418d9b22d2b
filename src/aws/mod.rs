//! AWS Module
//!
//! SDK-backed implementations of the domain ports. One shared
//! [`SdkConfig`] is loaded per run; per-region clients are derived from it.

pub mod cloudwatch;
pub mod ec2;
pub mod kafka;

pub use cloudwatch::CloudWatchMetrics;
pub use ec2::Ec2Subnets;
pub use kafka::MskCatalog;

use crate::domain::ports::{CloudProvider, RegionClients};
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Region used for account-level calls when the profile names none
pub const HOME_REGION_FALLBACK: &str = "us-east-1";

/// Shared credentials and configuration for every regional client
pub struct AwsProvider {
    config: SdkConfig,
}

impl AwsProvider {
    /// Load credentials from the default chain, optionally pinned to a
    /// named profile
    pub async fn connect(profile: Option<String>) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile.as_deref() {
            info!("Using AWS profile {}", profile);
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        if config.credentials_provider().is_none() {
            return Err(Error::Session("no credentials provider configured".to_string()));
        }

        Ok(Self { config })
    }

    fn home_region(&self) -> Region {
        self.config
            .region()
            .cloned()
            .unwrap_or_else(|| Region::new(HOME_REGION_FALLBACK))
    }

    fn ec2_client(&self, region: Region) -> aws_sdk_ec2::Client {
        let conf = aws_sdk_ec2::config::Builder::from(&self.config)
            .region(region)
            .build();
        aws_sdk_ec2::Client::from_conf(conf)
    }
}

#[async_trait]
impl CloudProvider for AwsProvider {
    async fn account_id(&self) -> Result<String> {
        let conf = aws_sdk_sts::config::Builder::from(&self.config)
            .region(self.home_region())
            .build();
        let output = aws_sdk_sts::Client::from_conf(conf)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                Error::Session(aws_sdk_sts::error::DisplayErrorContext(&e).to_string())
            })?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| Error::Session("caller identity has no account".to_string()))
    }

    async fn known_regions(&self) -> Result<Vec<String>> {
        ec2::describe_regions(&self.ec2_client(self.home_region()), true).await
    }

    async fn enabled_regions(&self) -> Result<Vec<String>> {
        ec2::describe_regions(&self.ec2_client(self.home_region()), false).await
    }

    async fn region_clients(&self, region: &str) -> Result<RegionClients> {
        debug!("Building clients for {}", region);
        let region_name = Region::new(region.to_string());

        let kafka_conf = aws_sdk_kafka::config::Builder::from(&self.config)
            .region(region_name.clone())
            .build();
        let metrics_conf = aws_sdk_cloudwatch::config::Builder::from(&self.config)
            .region(region_name.clone())
            .build();

        Ok(RegionClients {
            region: region.to_string(),
            clusters: Arc::new(MskCatalog::new(aws_sdk_kafka::Client::from_conf(kafka_conf))),
            subnets: Arc::new(Ec2Subnets::new(self.ec2_client(region_name))),
            metrics: Arc::new(CloudWatchMetrics::new(aws_sdk_cloudwatch::Client::from_conf(
                metrics_conf,
            ))),
        })
    }
}

// =============================================================================
// Time conversion
// =============================================================================

pub(crate) fn to_chrono(dt: &aws_sdk_kafka::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

pub(crate) fn to_smithy(dt: DateTime<Utc>) -> aws_sdk_cloudwatch::primitives::DateTime {
    aws_sdk_cloudwatch::primitives::DateTime::from_secs(dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_conversion_keeps_seconds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let smithy = to_smithy(now);
        assert_eq!(to_chrono(&smithy), Some(now));
    }
}
