//! Compute instance catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, Instance};
use aws_sdk_ec2::Client;
use tracing::{debug, info};

use super::filters::{ec2_filter_any, plan_filters, tag_map};
use super::{api_error, error_code};
use crate::catalog::{converge, dedup_by_id, InstanceCatalog, Kind, Resource, WaitPolicy};
use crate::error::Result;
use crate::filter::KeySchema;
use crate::selector::SelectorSet;

const INSTANCE_KEYS: KeySchema = KeySchema::new("instance", &["id"]);

const NOT_FOUND_CODE: &str = "InvalidInstanceID.NotFound";
const TERMINATED_STATE: &str = "terminated";

/// Lifecycle states matched by selector-based discovery. Terminated
/// instances linger in describe results for hours and would otherwise
/// reappear in every teardown plan.
const ACTIVE_STATES: [&str; 5] = ["pending", "running", "shutting-down", "stopping", "stopped"];

/// EC2-backed compute instance catalog.
#[derive(Debug, Clone)]
pub struct AwsInstanceCatalog {
    client: Client,
}

impl AwsInstanceCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, filters: Vec<Filter>) -> Result<Vec<Resource>> {
        let mut request = self.client.describe_instances();
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let reservation = item.map_err(|err| api_error("DescribeInstances", &err))?;
            resources.extend(reservation.instances().iter().map(to_resource));
        }
        Ok(resources)
    }

    /// Probes whether the instance has reached the target state. A
    /// describe that no longer finds the instance counts as terminated.
    async fn state_reached(&self, id: &str, target: &str) -> Result<bool> {
        let response = self
            .client
            .describe_instances()
            .instance_ids(id)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(err) if error_code(&err) == Some(NOT_FOUND_CODE) => {
                return Ok(target == TERMINATED_STATE);
            }
            Err(err) => return Err(api_error("DescribeInstances", &err)),
        };

        let states: Vec<&str> = output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .filter_map(|instance| instance.state().and_then(|state| state.name()))
            .map(|name| name.as_str())
            .collect();

        if states.is_empty() {
            return Ok(target == TERMINATED_STATE);
        }
        Ok(states.iter().all(|state| *state == target))
    }
}

#[async_trait]
impl InstanceCatalog for AwsInstanceCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = INSTANCE_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            let plan = plan_filters(group, &[]);
            let mut filters = plan.filters;
            if !plan.ids.is_empty() {
                let ids: Vec<&str> = plan.ids.iter().map(String::as_str).collect();
                filters.push(ec2_filter_any("instance-id", &ids));
            }
            filters.push(ec2_filter_any("instance-state-name", &ACTIVE_STATES));
            resources.extend(self.describe(filters).await?);
        }

        Ok(dedup_by_id(resources))
    }

    async fn resolve_ids(&self, ids: &[String]) -> Result<Vec<Resource>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .describe_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .send()
            .await
            .map_err(|err| api_error("DescribeInstances", &err))?;

        let resources = response
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .map(to_resource)
            .collect();
        Ok(resources)
    }

    async fn terminate(&self, id: &str) -> Result<()> {
        info!("Terminating instance {id}");
        self.client
            .terminate_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(|err| api_error("TerminateInstances", &err))?;
        Ok(())
    }

    async fn wait_for_state(&self, id: &str, target: &str, policy: WaitPolicy) -> Result<()> {
        debug!("Waiting for instance {id} to reach {target}");
        converge(policy, Kind::Instance, id, target, || {
            self.state_reached(id, target)
        })
        .await
    }
}

fn to_resource(instance: &Instance) -> Resource {
    let mut resource = Resource::new(Kind::Instance, instance.instance_id().unwrap_or_default())
        .with_tags(tag_map(instance.tags()));
    if let Some(vpc_id) = instance.vpc_id() {
        resource = resource.with_vpc(vpc_id);
    }
    if let Some(zone) = instance
        .placement()
        .and_then(|placement| placement.availability_zone())
    {
        resource = resource.with_zone(zone);
    }
    if let Some(architecture) = instance.architecture() {
        resource = resource.with_architectures(vec![crate::catalog::CpuArch::from_provider(
            architecture.as_str(),
        )]);
    }
    if let Some(state) = instance.state().and_then(|state| state.name()) {
        resource = resource.with_state(state.as_str());
    }
    resource
}
