//! Availability zone catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::Client;

use super::api_error;
use super::filters::ec2_filter;
use crate::catalog::ZoneCatalog;
use crate::error::Result;

/// EC2-backed availability zone catalog.
#[derive(Debug, Clone)]
pub struct AwsZoneCatalog {
    client: Client,
}

impl AwsZoneCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ZoneCatalog for AwsZoneCatalog {
    async fn list(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_availability_zones()
            .filters(ec2_filter("state", "available"))
            .send()
            .await
            .map_err(|err| api_error("DescribeAvailabilityZones", &err))?;

        let zones = response
            .availability_zones()
            .iter()
            .filter_map(|zone| zone.zone_name().map(str::to_string))
            .collect();
        Ok(zones)
    }
}
