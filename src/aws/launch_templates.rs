//! Launch template catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::types::{
    Filter, LaunchTemplate, LaunchTemplateIamInstanceProfileSpecificationRequest,
    RequestLaunchTemplateData, ResourceType,
};
use aws_sdk_ec2::Client;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::info;

use super::filters::{plan_filters, tag_map, tag_specification};
use super::{api_error, error_code};
use crate::catalog::{
    dedup_by_id, Kind, LaunchTemplateCatalog, LaunchTemplateRequest, Resource,
};
use crate::error::{ProviderError, Result};
use crate::filter::KeySchema;
use crate::selector::SelectorSet;
use crate::tags;

const LAUNCH_TEMPLATE_KEYS: KeySchema = KeySchema::new("launch-template", &["id", "name"]);

const DUPLICATE_TEMPLATE_CODE: &str = "InvalidLaunchTemplateName.AlreadyExistsException";

/// EC2-backed launch template catalog.
#[derive(Debug, Clone)]
pub struct AwsLaunchTemplateCatalog {
    client: Client,
}

impl AwsLaunchTemplateCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, ids: Vec<String>, filters: Vec<Filter>) -> Result<Vec<Resource>> {
        let mut request = self.client.describe_launch_templates();
        if !ids.is_empty() {
            request = request.set_launch_template_ids(Some(ids));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let template = item.map_err(|err| api_error("DescribeLaunchTemplates", &err))?;
            resources.push(to_resource(&template));
        }
        Ok(resources)
    }
}

#[async_trait]
impl LaunchTemplateCatalog for AwsLaunchTemplateCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = LAUNCH_TEMPLATE_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            let plan = plan_filters(group, &[("name", "launch-template-name")]);
            resources.extend(self.describe(plan.ids, plan.filters).await?);
        }

        Ok(dedup_by_id(resources))
    }

    async fn create(&self, request: &LaunchTemplateRequest) -> Result<()> {
        let template_name = tags::display_name(&request.namespace, Some(&request.name));
        info!("Creating launch template {template_name}");

        let mut data = RequestLaunchTemplateData::builder()
            .user_data(BASE64.encode(&request.user_data))
            .set_security_group_ids(Some(request.security_group_ids.clone()));
        if let Some(iam_role) = &request.iam_role {
            data = data.iam_instance_profile(
                LaunchTemplateIamInstanceProfileSpecificationRequest::builder()
                    .name(iam_role)
                    .build(),
            );
        }

        self.client
            .create_launch_template()
            .launch_template_name(&template_name)
            .launch_template_data(data.build())
            .tag_specifications(tag_specification(
                ResourceType::LaunchTemplate,
                &request.namespace,
                Some(&request.name),
            ))
            .send()
            .await
            .map_err(|err| {
                if error_code(&err) == Some(DUPLICATE_TEMPLATE_CODE) {
                    ProviderError::AlreadyExists {
                        kind: Kind::LaunchTemplate.to_string(),
                        name: template_name.clone(),
                    }
                    .into()
                } else {
                    api_error("CreateLaunchTemplate", &err)
                }
            })?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        info!("Deleting launch template {id}");
        self.client
            .delete_launch_template()
            .launch_template_id(id)
            .send()
            .await
            .map_err(|err| api_error("DeleteLaunchTemplate", &err))?;
        Ok(())
    }
}

fn to_resource(template: &LaunchTemplate) -> Resource {
    Resource::new(
        Kind::LaunchTemplate,
        template.launch_template_id().unwrap_or_default(),
    )
    .with_tags(tag_map(template.tags()))
}
