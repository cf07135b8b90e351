//! VPC catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, ResourceType, Vpc};
use aws_sdk_ec2::Client;
use tracing::info;

use super::api_error;
use super::filters::{plan_filters, tag_map, tag_specification};
use crate::catalog::{dedup_by_id, Kind, Resource, VpcCatalog};
use crate::error::{ProviderError, Result};
use crate::filter::KeySchema;
use crate::selector::SelectorSet;

const VPC_KEYS: KeySchema = KeySchema::new("vpc", &["id"]);

/// EC2-backed VPC catalog.
#[derive(Debug, Clone)]
pub struct AwsVpcCatalog {
    client: Client,
}

impl AwsVpcCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, ids: Vec<String>, filters: Vec<Filter>) -> Result<Vec<Resource>> {
        let mut request = self.client.describe_vpcs();
        if !ids.is_empty() {
            request = request.set_vpc_ids(Some(ids));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let vpc = item.map_err(|err| api_error("DescribeVpcs", &err))?;
            resources.push(to_resource(&vpc));
        }
        Ok(resources)
    }
}

#[async_trait]
impl VpcCatalog for AwsVpcCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = VPC_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            let plan = plan_filters(group, &[]);
            resources.extend(self.describe(plan.ids, plan.filters).await?);
        }

        Ok(dedup_by_id(resources))
    }

    async fn create(&self, namespace: &str, cidr: &str) -> Result<Resource> {
        info!("Creating VPC for namespace {namespace} with CIDR {cidr}");

        let response = self
            .client
            .create_vpc()
            .cidr_block(cidr)
            .tag_specifications(tag_specification(ResourceType::Vpc, namespace, None))
            .send()
            .await
            .map_err(|err| api_error("CreateVpc", &err))?;

        let vpc = response
            .vpc()
            .ok_or_else(|| ProviderError::missing_field("CreateVpc", "vpc"))?;
        Ok(to_resource(vpc))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        info!("Deleting VPC {id}");
        self.client
            .delete_vpc()
            .vpc_id(id)
            .send()
            .await
            .map_err(|err| api_error("DeleteVpc", &err))?;
        Ok(())
    }
}

fn to_resource(vpc: &Vpc) -> Resource {
    let mut resource =
        Resource::new(Kind::Vpc, vpc.vpc_id().unwrap_or_default()).with_tags(tag_map(vpc.tags()));
    if let Some(state) = vpc.state() {
        resource = resource.with_state(state.as_str());
    }
    resource
}
