//! Subnet catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::types::{AttributeBooleanValue, Filter, ResourceType, Subnet};
use aws_sdk_ec2::Client;
use tracing::info;

use super::api_error;
use super::filters::{plan_filters, tag_map, tag_specification};
use crate::catalog::{dedup_by_id, Kind, Resource, SubnetCatalog};
use crate::error::{ProviderError, Result};
use crate::filter::KeySchema;
use crate::selector::SelectorSet;

const SUBNET_KEYS: KeySchema = KeySchema::new("subnet", &["id"]);

/// EC2-backed subnet catalog.
#[derive(Debug, Clone)]
pub struct AwsSubnetCatalog {
    client: Client,
}

impl AwsSubnetCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, ids: Vec<String>, filters: Vec<Filter>) -> Result<Vec<Resource>> {
        let mut request = self.client.describe_subnets();
        if !ids.is_empty() {
            request = request.set_subnet_ids(Some(ids));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let subnet = item.map_err(|err| api_error("DescribeSubnets", &err))?;
            resources.push(to_resource(&subnet));
        }
        Ok(resources)
    }
}

#[async_trait]
impl SubnetCatalog for AwsSubnetCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = SUBNET_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            let plan = plan_filters(group, &[]);
            resources.extend(self.describe(plan.ids, plan.filters).await?);
        }

        Ok(dedup_by_id(resources))
    }

    async fn create(
        &self,
        namespace: &str,
        vpc_id: &str,
        zone: &str,
        cidr: &str,
    ) -> Result<Resource> {
        info!("Creating subnet in {zone} ({cidr}) for namespace {namespace}");

        let response = self
            .client
            .create_subnet()
            .vpc_id(vpc_id)
            .availability_zone(zone)
            .cidr_block(cidr)
            .tag_specifications(tag_specification(ResourceType::Subnet, namespace, None))
            .send()
            .await
            .map_err(|err| api_error("CreateSubnet", &err))?;

        let subnet = response
            .subnet()
            .ok_or_else(|| ProviderError::missing_field("CreateSubnet", "subnet"))?;
        let resource = to_resource(subnet);

        // Public-IP assignment cannot be set at creation time.
        self.client
            .modify_subnet_attribute()
            .subnet_id(&resource.id)
            .map_public_ip_on_launch(AttributeBooleanValue::builder().value(true).build())
            .send()
            .await
            .map_err(|err| api_error("ModifySubnetAttribute", &err))?;

        Ok(resource)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        info!("Deleting subnet {id}");
        self.client
            .delete_subnet()
            .subnet_id(id)
            .send()
            .await
            .map_err(|err| api_error("DeleteSubnet", &err))?;
        Ok(())
    }
}

fn to_resource(subnet: &Subnet) -> Resource {
    let mut resource = Resource::new(Kind::Subnet, subnet.subnet_id().unwrap_or_default())
        .with_tags(tag_map(subnet.tags()));
    if let Some(vpc_id) = subnet.vpc_id() {
        resource = resource.with_vpc(vpc_id);
    }
    if let Some(zone) = subnet.availability_zone() {
        resource = resource.with_zone(zone);
    }
    if let Some(state) = subnet.state() {
        resource = resource.with_state(state.as_str());
    }
    resource
}
