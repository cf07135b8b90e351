//! Per-kind catalog traits and the aggregate catalog.

use async_trait::async_trait;

use super::resource::Resource;
use super::wait::WaitPolicy;
use crate::error::Result;
use crate::plan::CapacityType;
use crate::selector::SelectorSet;

/// Parameters for creating a launch template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTemplateRequest {
    /// Owning namespace.
    pub namespace: String,
    /// Plan name within the namespace.
    pub name: String,
    /// Instance user data, plain text. Adapters encode it as the provider
    /// requires.
    pub user_data: String,
    /// Security groups to attach to launched instances.
    pub security_group_ids: Vec<String>,
    /// Instance profile name to attach, if any.
    pub iam_role: Option<String>,
}

/// One launch override in a capacity request: a valid (image,
/// instance type, subnet) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetOverride {
    /// Image to launch.
    pub image_id: String,
    /// Instance type to launch it on.
    pub instance_type: String,
    /// Subnet to place it in.
    pub subnet_id: String,
}

/// Parameters for submitting a capacity request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetRequest {
    /// Owning namespace.
    pub namespace: String,
    /// Plan name within the namespace.
    pub name: String,
    /// Launch template every override references.
    pub launch_template_id: String,
    /// Purchasing model for the requested capacity.
    pub capacity_type: CapacityType,
    /// Valid launch combinations, from the architecture cross product.
    pub overrides: Vec<FleetOverride>,
}

/// VPC catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VpcCatalog: Send + Sync {
    /// Resolves VPCs matching any of the selectors.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
    /// Creates a namespace-tagged VPC with the given CIDR block.
    async fn create(&self, namespace: &str, cidr: &str) -> Result<Resource>;
    /// Deletes a VPC.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Subnet catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubnetCatalog: Send + Sync {
    /// Resolves subnets matching any of the selectors.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
    /// Creates a namespace-tagged subnet in the given zone.
    async fn create(&self, namespace: &str, vpc_id: &str, zone: &str, cidr: &str)
        -> Result<Resource>;
    /// Deletes a subnet.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Internet gateway catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InternetGatewayCatalog: Send + Sync {
    /// Resolves internet gateways matching any of the selectors.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
    /// Creates a namespace-tagged gateway, attaches it to the VPC, and
    /// waits for the attachment to become available.
    async fn create(&self, namespace: &str, vpc_id: &str) -> Result<Resource>;
    /// Detaches the gateway from any attached VPCs and deletes it.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Route table catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteTableCatalog: Send + Sync {
    /// Resolves route tables matching any of the selectors.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
    /// Creates a namespace-tagged public route table: a default route to
    /// the gateway plus an association per subnet.
    async fn create_public(
        &self,
        namespace: &str,
        vpc_id: &str,
        gateway_id: &str,
        subnet_ids: &[String],
    ) -> Result<Resource>;
    /// Removes gateway routes and associations, then deletes the table.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Security group catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecurityGroupCatalog: Send + Sync {
    /// Resolves security groups matching any of the selectors.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
    /// Creates the namespace-scoped security group in the VPC.
    async fn create(&self, namespace: &str, vpc_id: &str) -> Result<Resource>;
    /// Deletes a security group.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Machine image catalog. Read-only: images are never created or deleted
/// by this system.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageCatalog: Send + Sync {
    /// Resolves images matching any of the selectors. Every selector must
    /// carry at least one criterion; when none of them names an owner, the
    /// adapter restricts results to trusted publishers.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
}

/// Instance type catalog. Read-only capability lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceTypeCatalog: Send + Sync {
    /// Resolves instance types matching any of the selectors, including
    /// client-side range criteria.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
}

/// Launch template catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LaunchTemplateCatalog: Send + Sync {
    /// Resolves launch templates matching any of the selectors.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
    /// Creates a launch template. Reports the provider's "already exists"
    /// conflict as [`crate::error::ProviderError::AlreadyExists`]; whether
    /// that is tolerated is the caller's decision.
    async fn create(&self, request: &LaunchTemplateRequest) -> Result<()>;
    /// Deletes a launch template.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Capacity request catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FleetCatalog: Send + Sync {
    /// Submits an instant capacity request and returns the launched
    /// instance IDs.
    async fn submit(&self, request: &FleetRequest) -> Result<Vec<String>>;
}

/// Compute instance catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceCatalog: Send + Sync {
    /// Resolves non-terminated instances matching any of the selectors.
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>>;
    /// Fetches instances by ID.
    async fn resolve_ids(&self, ids: &[String]) -> Result<Vec<Resource>>;
    /// Requests termination of an instance.
    async fn terminate(&self, id: &str) -> Result<()>;
    /// Blocks until the instance reaches the target lifecycle state or the
    /// policy's timeout elapses.
    async fn wait_for_state(&self, id: &str, target: &str, policy: WaitPolicy) -> Result<()>;
}

/// Availability zone catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneCatalog: Send + Sync {
    /// Lists the zone names usable in this region, in provider order.
    async fn list(&self) -> Result<Vec<String>>;
}

/// One catalog implementation per resource kind.
///
/// Built over a live provider by [`crate::aws::AwsCatalog::into_catalog`]
/// and over mocks in orchestrator tests.
pub struct Catalog {
    /// VPC operations.
    pub vpcs: Box<dyn VpcCatalog>,
    /// Subnet operations.
    pub subnets: Box<dyn SubnetCatalog>,
    /// Internet gateway operations.
    pub gateways: Box<dyn InternetGatewayCatalog>,
    /// Route table operations.
    pub route_tables: Box<dyn RouteTableCatalog>,
    /// Security group operations.
    pub security_groups: Box<dyn SecurityGroupCatalog>,
    /// Image lookups.
    pub images: Box<dyn ImageCatalog>,
    /// Instance type lookups.
    pub instance_types: Box<dyn InstanceTypeCatalog>,
    /// Launch template operations.
    pub launch_templates: Box<dyn LaunchTemplateCatalog>,
    /// Capacity request submission.
    pub fleets: Box<dyn FleetCatalog>,
    /// Instance operations.
    pub instances: Box<dyn InstanceCatalog>,
    /// Availability zone lookups.
    pub zones: Box<dyn ZoneCatalog>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}
