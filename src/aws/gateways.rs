//! Internet gateway catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, InternetGateway, ResourceType};
use aws_sdk_ec2::Client;
use tracing::{debug, info};

use super::api_error;
use super::filters::{plan_filters, tag_map, tag_specification};
use crate::catalog::{converge, dedup_by_id, InternetGatewayCatalog, Kind, Resource, WaitPolicy};
use crate::error::{ProviderError, Result};
use crate::filter::KeySchema;
use crate::selector::SelectorSet;

const GATEWAY_KEYS: KeySchema = KeySchema::new("internet-gateway", &["id"]);

/// EC2-backed internet gateway catalog.
#[derive(Debug, Clone)]
pub struct AwsInternetGatewayCatalog {
    client: Client,
}

impl AwsInternetGatewayCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, ids: Vec<String>, filters: Vec<Filter>) -> Result<Vec<Resource>> {
        let mut request = self.client.describe_internet_gateways();
        if !ids.is_empty() {
            request = request.set_internet_gateway_ids(Some(ids));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let gateway = item.map_err(|err| api_error("DescribeInternetGateways", &err))?;
            resources.push(to_resource(&gateway));
        }
        Ok(resources)
    }

    /// Probes whether the gateway's attachment to the VPC is usable.
    ///
    /// EC2 reports the legacy state string "available" here, which the
    /// SDK's attachment-status enum does not model, so the comparison goes
    /// through the raw string.
    async fn attachment_ready(&self, gateway_id: &str, vpc_id: &str) -> Result<bool> {
        let response = self
            .client
            .describe_internet_gateways()
            .internet_gateway_ids(gateway_id)
            .send()
            .await
            .map_err(|err| api_error("DescribeInternetGateways", &err))?;

        let ready = response.internet_gateways().iter().any(|gateway| {
            gateway.attachments().iter().any(|attachment| {
                attachment.vpc_id() == Some(vpc_id)
                    && attachment
                        .state()
                        .is_some_and(|state| matches!(state.as_str(), "available" | "attached"))
            })
        });
        Ok(ready)
    }
}

#[async_trait]
impl InternetGatewayCatalog for AwsInternetGatewayCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = GATEWAY_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            let plan = plan_filters(group, &[]);
            resources.extend(self.describe(plan.ids, plan.filters).await?);
        }

        Ok(dedup_by_id(resources))
    }

    async fn create(&self, namespace: &str, vpc_id: &str) -> Result<Resource> {
        info!("Creating internet gateway for namespace {namespace}");

        let response = self
            .client
            .create_internet_gateway()
            .tag_specifications(tag_specification(
                ResourceType::InternetGateway,
                namespace,
                None,
            ))
            .send()
            .await
            .map_err(|err| api_error("CreateInternetGateway", &err))?;

        let mut resource = response
            .internet_gateway()
            .map(to_resource)
            .ok_or_else(|| {
                ProviderError::missing_field("CreateInternetGateway", "internetGateway")
            })?;

        info!("Attaching internet gateway {} to {vpc_id}", resource.id);
        self.client
            .attach_internet_gateway()
            .internet_gateway_id(&resource.id)
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|err| api_error("AttachInternetGateway", &err))?;

        let gateway_id = resource.id.clone();
        converge(
            WaitPolicy::gateway_attachment(),
            Kind::InternetGateway,
            &gateway_id,
            "available",
            || self.attachment_ready(&gateway_id, vpc_id),
        )
        .await?;

        resource.attachments = vec![vpc_id.to_string()];
        Ok(resource)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let gateways = self.describe(vec![id.to_string()], Vec::new()).await?;

        for gateway in &gateways {
            for vpc_id in &gateway.attachments {
                debug!("Detaching internet gateway {id} from {vpc_id}");
                self.client
                    .detach_internet_gateway()
                    .internet_gateway_id(id)
                    .vpc_id(vpc_id)
                    .send()
                    .await
                    .map_err(|err| api_error("DetachInternetGateway", &err))?;
            }
        }

        info!("Deleting internet gateway {id}");
        self.client
            .delete_internet_gateway()
            .internet_gateway_id(id)
            .send()
            .await
            .map_err(|err| api_error("DeleteInternetGateway", &err))?;
        Ok(())
    }
}

fn to_resource(gateway: &InternetGateway) -> Resource {
    let attachments = gateway
        .attachments()
        .iter()
        .filter_map(|attachment| attachment.vpc_id().map(str::to_string))
        .collect();
    Resource::new(
        Kind::InternetGateway,
        gateway.internet_gateway_id().unwrap_or_default(),
    )
    .with_tags(tag_map(gateway.tags()))
    .with_attachments(attachments)
}
