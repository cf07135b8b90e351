//! Security group catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, ResourceType, SecurityGroup};
use aws_sdk_ec2::Client;
use tracing::info;

use super::filters::{plan_filters, tag_map, tag_specification};
use super::{api_error, error_code};
use crate::catalog::{dedup_by_id, Kind, Resource, SecurityGroupCatalog};
use crate::error::{ProviderError, Result};
use crate::filter::KeySchema;
use crate::selector::SelectorSet;

const SECURITY_GROUP_KEYS: KeySchema = KeySchema::new("security-group", &["id", "name"]);

const DUPLICATE_GROUP_CODE: &str = "InvalidGroup.Duplicate";

/// EC2-backed security group catalog.
#[derive(Debug, Clone)]
pub struct AwsSecurityGroupCatalog {
    client: Client,
}

impl AwsSecurityGroupCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, ids: Vec<String>, filters: Vec<Filter>) -> Result<Vec<Resource>> {
        let mut request = self.client.describe_security_groups();
        if !ids.is_empty() {
            request = request.set_group_ids(Some(ids));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let group = item.map_err(|err| api_error("DescribeSecurityGroups", &err))?;
            resources.push(to_resource(&group));
        }
        Ok(resources)
    }
}

#[async_trait]
impl SecurityGroupCatalog for AwsSecurityGroupCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = SECURITY_GROUP_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            let plan = plan_filters(group, &[("name", "group-name")]);
            resources.extend(self.describe(plan.ids, plan.filters).await?);
        }

        Ok(dedup_by_id(resources))
    }

    async fn create(&self, namespace: &str, vpc_id: &str) -> Result<Resource> {
        let group_name = format!("stratus-{namespace}");
        info!("Creating security group {group_name} in {vpc_id}");

        let response = self
            .client
            .create_security_group()
            .group_name(&group_name)
            .description("stratus generated security group")
            .vpc_id(vpc_id)
            .tag_specifications(tag_specification(
                ResourceType::SecurityGroup,
                namespace,
                None,
            ))
            .send()
            .await
            .map_err(|err| {
                if error_code(&err) == Some(DUPLICATE_GROUP_CODE) {
                    ProviderError::AlreadyExists {
                        kind: Kind::SecurityGroup.to_string(),
                        name: group_name.clone(),
                    }
                    .into()
                } else {
                    api_error("CreateSecurityGroup", &err)
                }
            })?;

        let group_id = response
            .group_id()
            .ok_or_else(|| ProviderError::missing_field("CreateSecurityGroup", "groupId"))?;
        Ok(Resource::new(Kind::SecurityGroup, group_id)
            .with_tags(
                crate::tags::ownership_tags(namespace, None)
                    .into_iter()
                    .collect(),
            )
            .with_vpc(vpc_id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        info!("Deleting security group {id}");
        self.client
            .delete_security_group()
            .group_id(id)
            .send()
            .await
            .map_err(|err| api_error("DeleteSecurityGroup", &err))?;
        Ok(())
    }
}

fn to_resource(group: &SecurityGroup) -> Resource {
    let mut resource = Resource::new(Kind::SecurityGroup, group.group_id().unwrap_or_default())
        .with_tags(tag_map(group.tags()));
    if let Some(vpc_id) = group.vpc_id() {
        resource = resource.with_vpc(vpc_id);
    }
    resource
}
