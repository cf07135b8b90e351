//! EC2-backed catalog adapters.
//!
//! One adapter per resource kind, each holding a clone of the shared EC2
//! client (image resolution also holds an SSM client for alias lookup).
//! [`AwsCatalog`] bundles the clients and boxes the adapters into the
//! provider-neutral [`Catalog`].

mod filters;
mod fleets;
mod gateways;
mod images;
mod instance_types;
mod instances;
mod launch_templates;
mod route_tables;
mod security_groups;
mod subnets;
mod vpcs;
mod zones;

pub use fleets::AwsFleetCatalog;
pub use gateways::AwsInternetGatewayCatalog;
pub use images::AwsImageCatalog;
pub use instance_types::AwsInstanceTypeCatalog;
pub use instances::AwsInstanceCatalog;
pub use launch_templates::AwsLaunchTemplateCatalog;
pub use route_tables::AwsRouteTableCatalog;
pub use security_groups::AwsSecurityGroupCatalog;
pub use subnets::AwsSubnetCatalog;
pub use vpcs::AwsVpcCatalog;
pub use zones::AwsZoneCatalog;

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};

use crate::catalog::Catalog;
use crate::error::{ProviderError, StratusError};

/// The AWS client bundle behind the catalog adapters.
#[derive(Debug, Clone)]
pub struct AwsCatalog {
    ec2: aws_sdk_ec2::Client,
    ssm: aws_sdk_ssm::Client,
}

impl AwsCatalog {
    /// Creates the bundle from existing clients.
    #[must_use]
    pub const fn new(ec2: aws_sdk_ec2::Client, ssm: aws_sdk_ssm::Client) -> Self {
        Self { ec2, ssm }
    }

    /// Loads AWS configuration from the environment and connects, honoring
    /// the standard credential and region chain.
    pub async fn connect(region: Option<&str>) -> Self {
        let config = if let Some(region) = region {
            aws_config::from_env()
                .region(aws_config::Region::new(region.to_string()))
                .load()
                .await
        } else {
            aws_config::load_from_env().await
        };

        Self::new(
            aws_sdk_ec2::Client::new(&config),
            aws_sdk_ssm::Client::new(&config),
        )
    }

    /// Boxes one adapter per resource kind into the aggregate catalog.
    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        Catalog {
            vpcs: Box::new(AwsVpcCatalog::new(self.ec2.clone())),
            subnets: Box::new(AwsSubnetCatalog::new(self.ec2.clone())),
            gateways: Box::new(AwsInternetGatewayCatalog::new(self.ec2.clone())),
            route_tables: Box::new(AwsRouteTableCatalog::new(self.ec2.clone())),
            security_groups: Box::new(AwsSecurityGroupCatalog::new(self.ec2.clone())),
            images: Box::new(AwsImageCatalog::new(self.ec2.clone(), self.ssm)),
            instance_types: Box::new(AwsInstanceTypeCatalog::new(self.ec2.clone())),
            launch_templates: Box::new(AwsLaunchTemplateCatalog::new(self.ec2.clone())),
            fleets: Box::new(AwsFleetCatalog::new(self.ec2.clone())),
            instances: Box::new(AwsInstanceCatalog::new(self.ec2.clone())),
            zones: Box::new(AwsZoneCatalog::new(self.ec2)),
        }
    }
}

/// The provider's error code for a failed call, when the failure carries
/// service-level metadata.
pub(crate) fn error_code<E, R>(err: &SdkError<E, R>) -> Option<&str>
where
    E: ProvideErrorMetadata,
{
    err.as_service_error().and_then(ProvideErrorMetadata::code)
}

/// Maps an SDK error onto [`ProviderError::Api`], keeping the provider's
/// code and message when the failure reached the service.
pub(crate) fn api_error<E, R>(operation: &str, err: &SdkError<E, R>) -> StratusError
where
    E: ProvideErrorMetadata,
{
    let service_message = err
        .as_service_error()
        .and_then(ProvideErrorMetadata::message);
    let message = match (error_code(err), service_message) {
        (Some(code), Some(text)) => format!("{code}: {text}"),
        (Some(code), None) => code.to_string(),
        _ => err.to_string(),
    };
    ProviderError::api(operation, message).into()
}
