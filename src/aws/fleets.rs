//! Capacity request adapter over EC2 instant fleets.

use async_trait::async_trait;
use aws_sdk_ec2::types::{
    DefaultTargetCapacityType, FleetLaunchTemplateConfigRequest,
    FleetLaunchTemplateOverridesRequest, FleetLaunchTemplateSpecificationRequest,
    FleetOnDemandAllocationStrategy, FleetType, InstanceType, OnDemandOptionsRequest,
    ResourceType, SpotAllocationStrategy, SpotOptionsRequest, TargetCapacitySpecificationRequest,
};
use aws_sdk_ec2::Client;
use tracing::{info, warn};

use super::api_error;
use super::filters::tag_specification;
use crate::catalog::{FleetCatalog, FleetOverride, FleetRequest};
use crate::error::{ProviderError, Result};
use crate::plan::CapacityType;

/// The launch template version every override references.
const TEMPLATE_VERSION: &str = "$Latest";

/// EC2-backed capacity request catalog.
#[derive(Debug, Clone)]
pub struct AwsFleetCatalog {
    client: Client,
}

impl AwsFleetCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FleetCatalog for AwsFleetCatalog {
    async fn submit(&self, request: &FleetRequest) -> Result<Vec<String>> {
        info!(
            "Submitting instant fleet for {} with {} overrides",
            crate::tags::display_name(&request.namespace, Some(&request.name)),
            request.overrides.len()
        );

        let configs: Vec<FleetLaunchTemplateConfigRequest> = request
            .overrides
            .iter()
            .map(|launch_override| template_config(&request.launch_template_id, launch_override))
            .collect();

        let response = self
            .client
            .create_fleet()
            .r#type(FleetType::Instant)
            .set_launch_template_configs(Some(configs))
            .target_capacity_specification(
                TargetCapacitySpecificationRequest::builder()
                    .total_target_capacity(1)
                    .default_target_capacity_type(capacity_type(request.capacity_type))
                    .build(),
            )
            .on_demand_options(
                OnDemandOptionsRequest::builder()
                    .allocation_strategy(FleetOnDemandAllocationStrategy::LowestPrice)
                    .build(),
            )
            .spot_options(
                SpotOptionsRequest::builder()
                    .allocation_strategy(SpotAllocationStrategy::PriceCapacityOptimized)
                    .build(),
            )
            .tag_specifications(tag_specification(
                ResourceType::Fleet,
                &request.namespace,
                Some(&request.name),
            ))
            .tag_specifications(tag_specification(
                ResourceType::Instance,
                &request.namespace,
                Some(&request.name),
            ))
            .send()
            .await
            .map_err(|err| api_error("CreateFleet", &err))?;

        let instance_ids: Vec<String> = response
            .instances()
            .iter()
            .flat_map(|fleet_instance| fleet_instance.instance_ids().iter().cloned())
            .collect();

        let launch_errors: Vec<String> = response
            .errors()
            .iter()
            .map(|fleet_error| {
                format!(
                    "{}: {}",
                    fleet_error.error_code().unwrap_or("unknown"),
                    fleet_error.error_message().unwrap_or("no message")
                )
            })
            .collect();

        if instance_ids.is_empty() {
            let message = if launch_errors.is_empty() {
                String::from("fleet launched no instances")
            } else {
                launch_errors.join("; ")
            };
            return Err(ProviderError::api("CreateFleet", message).into());
        }

        for launch_error in &launch_errors {
            warn!("Fleet reported a partial launch error: {launch_error}");
        }

        Ok(instance_ids)
    }
}

fn template_config(
    launch_template_id: &str,
    launch_override: &FleetOverride,
) -> FleetLaunchTemplateConfigRequest {
    FleetLaunchTemplateConfigRequest::builder()
        .launch_template_specification(
            FleetLaunchTemplateSpecificationRequest::builder()
                .launch_template_id(launch_template_id)
                .version(TEMPLATE_VERSION)
                .build(),
        )
        .overrides(
            FleetLaunchTemplateOverridesRequest::builder()
                .image_id(&launch_override.image_id)
                .instance_type(InstanceType::from(launch_override.instance_type.as_str()))
                .subnet_id(&launch_override.subnet_id)
                .build(),
        )
        .build()
}

const fn capacity_type(value: CapacityType) -> DefaultTargetCapacityType {
    match value {
        CapacityType::OnDemand => DefaultTargetCapacityType::OnDemand,
        CapacityType::Spot => DefaultTargetCapacityType::Spot,
        CapacityType::CapacityBlock => DefaultTargetCapacityType::CapacityBlock,
    }
}
