//! EC2 adapter: subnet zones and the region catalogue

use crate::domain::ports::{SubnetDirectory, SUBNET_BATCH_SIZE};
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::Client;

/// EC2 client bound to one region
pub struct Ec2Subnets {
    client: Client,
}

impl Ec2Subnets {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubnetDirectory for Ec2Subnets {
    async fn availability_zones(&self, subnet_ids: &[String]) -> Result<Vec<String>> {
        if subnet_ids.len() > SUBNET_BATCH_SIZE {
            return Err(Error::Internal(format!(
                "subnet batch of {} exceeds {}",
                subnet_ids.len(),
                SUBNET_BATCH_SIZE
            )));
        }

        let output = self
            .client
            .describe_subnets()
            .set_subnet_ids(Some(subnet_ids.to_vec()))
            .send()
            .await
            .map_err(|e| Error::aws("ec2", "DescribeSubnets", DisplayErrorContext(&e)))?;

        Ok(output
            .subnets()
            .iter()
            .filter_map(|s| s.availability_zone())
            .map(str::to_string)
            .collect())
    }
}

/// Region names from DescribeRegions; `all` includes regions not enabled
/// for the account
pub async fn describe_regions(client: &Client, all: bool) -> Result<Vec<String>> {
    let output = client
        .describe_regions()
        .all_regions(all)
        .send()
        .await
        .map_err(|e| Error::aws("ec2", "DescribeRegions", DisplayErrorContext(&e)))?;

    let mut regions: Vec<String> = output
        .regions()
        .iter()
        .filter_map(|r| r.region_name())
        .map(str::to_string)
        .collect();
    regions.sort();
    Ok(regions)
}
