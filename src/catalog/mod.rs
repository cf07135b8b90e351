//! The resource catalog contract.
//!
//! The orchestrators never talk to a cloud SDK directly. Each resource
//! kind is reached through an async trait defined here, implemented by the
//! provider adapters in [`crate::aws`] and by mocks in tests. The
//! [`Catalog`] aggregate bundles one implementation per kind.

mod resource;
mod traits;
mod wait;

pub use resource::{dedup_by_id, CpuArch, Kind, Resource};
pub use traits::{
    Catalog, FleetCatalog, FleetOverride, FleetRequest, ImageCatalog, InstanceCatalog,
    InstanceTypeCatalog, InternetGatewayCatalog, LaunchTemplateCatalog, LaunchTemplateRequest,
    RouteTableCatalog, SecurityGroupCatalog, SubnetCatalog, VpcCatalog, ZoneCatalog,
};
pub use wait::{converge, WaitPolicy};

#[cfg(test)]
pub use traits::{
    MockFleetCatalog, MockImageCatalog, MockInstanceCatalog, MockInstanceTypeCatalog,
    MockInternetGatewayCatalog, MockLaunchTemplateCatalog, MockRouteTableCatalog,
    MockSecurityGroupCatalog, MockSubnetCatalog, MockVpcCatalog, MockZoneCatalog,
};
