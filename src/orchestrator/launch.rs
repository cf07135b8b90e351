//! The provisioning sequence.
//!
//! Provisioning runs a fixed dependency chain: resolve images and instance
//! types, resolve or bootstrap the network, resolve or create the security
//! group, create and resolve the launch template, then submit one capacity
//! request whose overrides enumerate every valid (image, instance type,
//! subnet) combination. Each step records what it resolved or created in
//! the plan's status before the next step runs, so a failure leaves the
//! partial status behind for inspection. Nothing is rolled back on
//! failure; compensation is a separate teardown invocation.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, FleetOverride, FleetRequest, LaunchTemplateRequest, Resource};
use crate::cidr;
use crate::error::{ProvisionError, Result, StratusError};
use crate::plan::LaunchPlan;
use crate::selector::{self, SelectorSet};
use crate::tags;

/// CIDR block for VPCs created by the network bootstrap.
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// How many availability zones the bootstrap spreads subnets across.
pub const BOOTSTRAP_ZONE_COUNT: usize = 3;

/// Runs the provisioning sequence against a resource catalog.
pub struct Provisioner<'a> {
    /// Catalog the sequence resolves and creates through.
    catalog: &'a Catalog,
}

impl<'a> Provisioner<'a> {
    /// Creates a provisioner over a catalog.
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Provisions the resources a launch plan asks for, populating
    /// `plan.status` as it goes.
    ///
    /// # Errors
    ///
    /// Fails fast on the first error; everything resolved or created up to
    /// that point stays recorded in `plan.status`. Selector and spec
    /// validation errors are returned before any resource is created.
    pub async fn launch(&self, plan: &mut LaunchPlan) -> Result<()> {
        let namespace = plan.metadata.namespace.clone();
        let name = plan.metadata.name.clone();
        info!("Launching {namespace}/{name}");

        // Grammar errors are fatal before any provider call.
        let image_selectors = selector::parse_all(&plan.spec.image_selectors)?;
        let type_selectors = selector::parse_all(&plan.spec.instance_type_selectors)?;
        let subnet_selectors = selector::parse_all(&plan.spec.subnet_selectors)?;
        let group_selectors = selector::parse_all(&plan.spec.security_group_selectors)?;

        // Images and instance types have no dependency on each other.
        let (images, instance_types) = tokio::join!(
            self.catalog.images.resolve(&image_selectors),
            self.catalog.instance_types.resolve(&type_selectors),
        );
        let images = images?;
        let instance_types = instance_types?;
        if images.is_empty() {
            return Err(ProvisionError::EmptyResolution {
                kind: String::from("image"),
            }
            .into());
        }
        if instance_types.is_empty() {
            return Err(ProvisionError::EmptyResolution {
                kind: String::from("instance type"),
            }
            .into());
        }
        debug!(
            "Resolved {} images and {} instance types",
            images.len(),
            instance_types.len()
        );
        plan.status.images = images;
        plan.status.instance_types = instance_types;

        // Placement is all-or-nothing: picking subnets without saying
        // which security groups to use (or the reverse) is rejected before
        // anything is created.
        match (subnet_selectors.is_empty(), group_selectors.is_empty()) {
            (false, true) => {
                return Err(ProvisionError::IncompleteNetworkSelection {
                    message: String::from(
                        "subnet selectors supplied without security-group selectors",
                    ),
                }
                .into());
            }
            (true, false) => {
                return Err(ProvisionError::IncompleteNetworkSelection {
                    message: String::from(
                        "security-group selectors supplied without subnet selectors",
                    ),
                }
                .into());
            }
            _ => {}
        }

        if subnet_selectors.is_empty() {
            self.bootstrap_network(&namespace, plan).await?;
        } else {
            let subnets = self.catalog.subnets.resolve(&subnet_selectors).await?;
            if subnets.is_empty() {
                return Err(ProvisionError::EmptyResolution {
                    kind: String::from("subnet"),
                }
                .into());
            }
            debug!("Resolved {} subnets", subnets.len());
            plan.status.subnets = subnets;
        }

        // Explicit security-group selection always overrides the
        // namespace-scoped group.
        if group_selectors.is_empty() {
            let vpc_id = plan
                .status
                .vpc
                .as_ref()
                .map(|vpc| vpc.id.clone())
                .ok_or_else(|| {
                    StratusError::internal("network bootstrap did not record a VPC")
                })?;
            let group = self.resolve_or_create_security_group(&namespace, &vpc_id).await?;
            plan.status.security_groups = vec![group];
        } else {
            let groups = self.catalog.security_groups.resolve(&group_selectors).await?;
            if groups.is_empty() {
                return Err(ProvisionError::EmptyResolution {
                    kind: String::from("security group"),
                }
                .into());
            }
            debug!("Resolved {} security groups", groups.len());
            plan.status.security_groups = groups;
        }

        let template = self.ensure_launch_template(&namespace, &name, plan).await?;
        plan.status.launch_template = Some(template.clone());

        let overrides = build_overrides(
            &plan.status.images,
            &plan.status.instance_types,
            &plan.status.subnets,
        );
        if overrides.is_empty() {
            return Err(ProvisionError::EmptyResolution {
                kind: String::from("compatible (image, instance type, subnet) combination"),
            }
            .into());
        }
        info!(
            "Requesting capacity with {} launch overrides",
            overrides.len()
        );

        let request = FleetRequest {
            namespace: namespace.clone(),
            name: name.clone(),
            launch_template_id: template.id,
            capacity_type: plan.spec.capacity_type,
            overrides,
        };
        let instance_ids = self.catalog.fleets.submit(&request).await?;
        let instances = self.catalog.instances.resolve_ids(&instance_ids).await?;
        info!(
            "Launched {namespace}/{name}: {} instances",
            instances.len()
        );
        plan.status.instances = instances;
        plan.status.launched_at = Some(Utc::now());

        Ok(())
    }

    /// Resolves the namespace VPC and its subnets, creating the whole
    /// public network (VPC, subnets across zones, internet gateway, route
    /// table) when the namespace has none yet.
    async fn bootstrap_network(&self, namespace: &str, plan: &mut LaunchPlan) -> Result<()> {
        let ns_selector = SelectorSet::from(vec![tags::namespace_selector(namespace, None)]);

        let existing = self.catalog.vpcs.resolve(&ns_selector).await?;
        if existing.len() > 1 {
            return Err(ProvisionError::ResolutionAmbiguous {
                kind: String::from("vpc"),
                found: existing.len(),
            }
            .into());
        }

        if let Some(vpc) = existing.into_iter().next() {
            info!("Reusing VPC {} for namespace {namespace}", vpc.id);
            plan.status.vpc = Some(vpc);

            let subnets = self.catalog.subnets.resolve(&ns_selector).await?;
            if subnets.is_empty() {
                return Err(ProvisionError::EmptyResolution {
                    kind: String::from("subnet"),
                }
                .into());
            }
            debug!("Resolved {} namespace subnets", subnets.len());
            plan.status.subnets = subnets;
            return Ok(());
        }

        info!("Creating network for namespace {namespace}");
        let vpc = self.catalog.vpcs.create(namespace, DEFAULT_VPC_CIDR).await?;
        let vpc_id = vpc.id.clone();
        plan.status.vpc = Some(vpc);

        let zones = self.catalog.zones.list().await?;
        if zones.is_empty() {
            return Err(ProvisionError::EmptyResolution {
                kind: String::from("availability zone"),
            }
            .into());
        }

        for (index, zone) in zones.iter().take(BOOTSTRAP_ZONE_COUNT).enumerate() {
            let block = cidr::subnet_cidr(DEFAULT_VPC_CIDR, index)?;
            debug!("Creating subnet {block} in {zone}");
            let subnet = self
                .catalog
                .subnets
                .create(namespace, &vpc_id, zone, &block)
                .await?;
            plan.status.subnets.push(subnet);
        }

        let gateway = self.catalog.gateways.create(namespace, &vpc_id).await?;
        let gateway_id = gateway.id.clone();
        plan.status.internet_gateway = Some(gateway);

        let subnet_ids: Vec<String> =
            plan.status.subnets.iter().map(|s| s.id.clone()).collect();
        let route_table = self
            .catalog
            .route_tables
            .create_public(namespace, &vpc_id, &gateway_id, &subnet_ids)
            .await?;
        plan.status.route_tables.push(route_table);

        Ok(())
    }

    /// Finds the namespace security group, creating it on first use.
    async fn resolve_or_create_security_group(
        &self,
        namespace: &str,
        vpc_id: &str,
    ) -> Result<Resource> {
        let ns_selector = SelectorSet::from(vec![tags::namespace_selector(namespace, None)]);
        let existing = self.catalog.security_groups.resolve(&ns_selector).await?;

        if let Some(group) = existing.into_iter().next() {
            debug!("Reusing security group {} for namespace {namespace}", group.id);
            return Ok(group);
        }

        info!("Creating security group for namespace {namespace}");
        self.catalog.security_groups.create(namespace, vpc_id).await
    }

    /// Creates the plan's launch template, tolerating a pre-existing one,
    /// then resolves it by tag. Exactly one template must match; zero or
    /// several mean the namespace is in a state this system did not
    /// produce.
    async fn ensure_launch_template(
        &self,
        namespace: &str,
        name: &str,
        plan: &LaunchPlan,
    ) -> Result<Resource> {
        let request = LaunchTemplateRequest {
            namespace: namespace.to_string(),
            name: name.to_string(),
            user_data: plan.spec.user_data.clone(),
            security_group_ids: plan
                .status
                .security_groups
                .iter()
                .map(|group| group.id.clone())
                .collect(),
            iam_role: plan.spec.iam_role.clone(),
        };

        match self.catalog.launch_templates.create(&request).await {
            Ok(()) => debug!("Created launch template for {namespace}/{name}"),
            Err(err) if err.is_already_exists() => {
                warn!("Launch template for {namespace}/{name} already exists, reusing it");
            }
            Err(err) => return Err(err),
        }

        let template_selector =
            SelectorSet::from(vec![tags::namespace_selector(namespace, Some(name))]);
        let mut templates = self.catalog.launch_templates.resolve(&template_selector).await?;
        if templates.len() != 1 {
            return Err(ProvisionError::ResolutionAmbiguous {
                kind: String::from("launch template"),
                found: templates.len(),
            }
            .into());
        }
        Ok(templates.remove(0))
    }
}

/// Enumerates every launchable (image, instance type, subnet) triple: an
/// image pairs only with instance types supporting its architecture, and
/// each such pair is placed in every subnet.
#[must_use]
pub fn build_overrides(
    images: &[Resource],
    instance_types: &[Resource],
    subnets: &[Resource],
) -> Vec<FleetOverride> {
    let mut overrides = Vec::new();

    for image in images {
        let Some(arch) = image.architecture() else {
            continue;
        };
        for instance_type in instance_types
            .iter()
            .filter(|candidate| candidate.supports_architecture(arch))
        {
            for subnet in subnets {
                overrides.push(FleetOverride {
                    image_id: image.id.clone(),
                    instance_type: instance_type.id.clone(),
                    subnet_id: subnet.id.clone(),
                });
            }
        }
    }

    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        CpuArch, Kind, MockFleetCatalog, MockImageCatalog, MockInstanceCatalog,
        MockInstanceTypeCatalog, MockInternetGatewayCatalog, MockLaunchTemplateCatalog,
        MockRouteTableCatalog, MockSecurityGroupCatalog, MockSubnetCatalog, MockVpcCatalog,
        MockZoneCatalog,
    };
    use crate::error::ProviderError;
    use crate::plan::LaunchSpec;

    /// All eleven mocks, unconfigured. A call on a mock without an
    /// expectation panics, which is how the "no mutation" assertions work.
    struct Mocks {
        vpcs: MockVpcCatalog,
        subnets: MockSubnetCatalog,
        gateways: MockInternetGatewayCatalog,
        route_tables: MockRouteTableCatalog,
        security_groups: MockSecurityGroupCatalog,
        images: MockImageCatalog,
        instance_types: MockInstanceTypeCatalog,
        launch_templates: MockLaunchTemplateCatalog,
        fleets: MockFleetCatalog,
        instances: MockInstanceCatalog,
        zones: MockZoneCatalog,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                vpcs: MockVpcCatalog::new(),
                subnets: MockSubnetCatalog::new(),
                gateways: MockInternetGatewayCatalog::new(),
                route_tables: MockRouteTableCatalog::new(),
                security_groups: MockSecurityGroupCatalog::new(),
                images: MockImageCatalog::new(),
                instance_types: MockInstanceTypeCatalog::new(),
                launch_templates: MockLaunchTemplateCatalog::new(),
                fleets: MockFleetCatalog::new(),
                instances: MockInstanceCatalog::new(),
                zones: MockZoneCatalog::new(),
            }
        }

        fn into_catalog(self) -> Catalog {
            Catalog {
                vpcs: Box::new(self.vpcs),
                subnets: Box::new(self.subnets),
                gateways: Box::new(self.gateways),
                route_tables: Box::new(self.route_tables),
                security_groups: Box::new(self.security_groups),
                images: Box::new(self.images),
                instance_types: Box::new(self.instance_types),
                launch_templates: Box::new(self.launch_templates),
                fleets: Box::new(self.fleets),
                instances: Box::new(self.instances),
                zones: Box::new(self.zones),
            }
        }
    }

    fn image(id: &str, arch: CpuArch) -> Resource {
        Resource::new(Kind::Image, id).with_architectures(vec![arch])
    }

    fn instance_type(id: &str, arch: CpuArch) -> Resource {
        Resource::new(Kind::InstanceType, id).with_architectures(vec![arch])
    }

    fn subnet(id: &str) -> Resource {
        Resource::new(Kind::Subnet, id)
    }

    fn plan_with_network_selectors() -> LaunchPlan {
        LaunchPlan::new(
            "batch",
            "workers",
            LaunchSpec {
                image_selectors: vec![String::from("tag:Release=2024")],
                instance_type_selectors: vec![String::from("id:m7g.large")],
                subnet_selectors: vec![String::from("tag:Tier=public")],
                security_group_selectors: vec![String::from("tag:Team=infra")],
                ..LaunchSpec::default()
            },
        )
    }

    fn stub_resolutions(mocks: &mut Mocks) {
        mocks.images.expect_resolve().returning(|_| {
            Ok(vec![image("ami-arm", CpuArch::Arm64)])
        });
        mocks.instance_types.expect_resolve().returning(|_| {
            Ok(vec![instance_type("m7g.large", CpuArch::Arm64)])
        });
    }

    fn stub_template_and_fleet(mocks: &mut Mocks) {
        mocks.launch_templates.expect_create().returning(|_| Ok(()));
        mocks.launch_templates.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::LaunchTemplate, "lt-1")])
        });
        mocks
            .fleets
            .expect_submit()
            .returning(|_| Ok(vec![String::from("i-1")]));
        mocks.instances.expect_resolve_ids().returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| Resource::new(Kind::Instance, id).with_state("pending"))
                .collect())
        });
    }

    #[tokio::test]
    async fn subnet_selectors_without_group_selectors_fail_before_any_creation() {
        let mut mocks = Mocks::new();
        stub_resolutions(&mut mocks);
        // Everything mutating is left unexpected; a call would panic.
        let catalog = mocks.into_catalog();

        let mut plan = plan_with_network_selectors();
        plan.spec.security_group_selectors.clear();

        let err = Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            StratusError::Provision(ProvisionError::IncompleteNetworkSelection { .. })
        ));
        // Step 1 results are still recorded.
        assert_eq!(plan.status.images.len(), 1);
        assert_eq!(plan.status.instance_types.len(), 1);
        assert!(plan.status.subnets.is_empty());
        assert!(plan.status.instances.is_empty());
    }

    #[tokio::test]
    async fn group_selectors_without_subnet_selectors_fail_symmetrically() {
        let mut mocks = Mocks::new();
        stub_resolutions(&mut mocks);
        let catalog = mocks.into_catalog();

        let mut plan = plan_with_network_selectors();
        plan.spec.subnet_selectors.clear();

        let err = Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            StratusError::Provision(ProvisionError::IncompleteNetworkSelection { .. })
        ));
    }

    #[tokio::test]
    async fn launches_through_an_explicitly_selected_network() {
        let mut mocks = Mocks::new();
        stub_resolutions(&mut mocks);
        mocks
            .subnets
            .expect_resolve()
            .returning(|_| Ok(vec![subnet("subnet-a"), subnet("subnet-b")]));
        mocks.security_groups.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::SecurityGroup, "sg-1")])
        });
        mocks
            .launch_templates
            .expect_create()
            .withf(|request| {
                request.namespace == "batch"
                    && request.name == "workers"
                    && request.security_group_ids == vec![String::from("sg-1")]
            })
            .times(1)
            .returning(|_| Ok(()));
        mocks.launch_templates.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::LaunchTemplate, "lt-1")])
        });
        mocks
            .fleets
            .expect_submit()
            .withf(|request| {
                request.launch_template_id == "lt-1" && request.overrides.len() == 2
            })
            .times(1)
            .returning(|_| Ok(vec![String::from("i-1"), String::from("i-2")]));
        mocks.instances.expect_resolve_ids().returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| Resource::new(Kind::Instance, id).with_state("pending"))
                .collect())
        });
        let catalog = mocks.into_catalog();

        let mut plan = plan_with_network_selectors();
        Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect("should launch");

        assert_eq!(plan.status.subnets.len(), 2);
        assert_eq!(plan.status.security_groups.len(), 1);
        assert_eq!(
            plan.status.launch_template.as_ref().map(|t| t.id.as_str()),
            Some("lt-1")
        );
        assert_eq!(plan.status.instances.len(), 2);
        assert!(plan.status.launched_at.is_some());
        // Explicit placement never touches the VPC machinery.
        assert!(plan.status.vpc.is_none());
        assert!(plan.status.internet_gateway.is_none());
    }

    #[tokio::test]
    async fn bootstraps_the_namespace_network_when_nothing_is_selected() {
        let mut mocks = Mocks::new();
        stub_resolutions(&mut mocks);
        stub_template_and_fleet(&mut mocks);

        mocks.vpcs.expect_resolve().returning(|_| Ok(vec![]));
        mocks
            .vpcs
            .expect_create()
            .withf(|namespace, cidr| namespace == "batch" && cidr == DEFAULT_VPC_CIDR)
            .times(1)
            .returning(|_, _| Ok(Resource::new(Kind::Vpc, "vpc-1")));
        // Four zones available; only the first three are used.
        mocks.zones.expect_list().returning(|| {
            Ok(vec![
                String::from("us-east-1a"),
                String::from("us-east-1b"),
                String::from("us-east-1c"),
                String::from("us-east-1d"),
            ])
        });
        mocks
            .subnets
            .expect_create()
            .withf(|_, vpc_id, zone, block| {
                vpc_id == "vpc-1"
                    && matches!(
                        (zone, block),
                        ("us-east-1a", "10.0.0.0/24")
                            | ("us-east-1b", "10.0.1.0/24")
                            | ("us-east-1c", "10.0.2.0/24")
                    )
            })
            .times(3)
            .returning(|_, vpc_id, zone, _| {
                Ok(Resource::new(Kind::Subnet, format!("subnet-{zone}"))
                    .with_vpc(vpc_id)
                    .with_zone(zone))
            });
        mocks
            .gateways
            .expect_create()
            .withf(|_, vpc_id| vpc_id == "vpc-1")
            .times(1)
            .returning(|_, _| Ok(Resource::new(Kind::InternetGateway, "igw-1")));
        mocks
            .route_tables
            .expect_create_public()
            .withf(|_, vpc_id, gateway_id, subnet_ids| {
                vpc_id == "vpc-1" && gateway_id == "igw-1" && subnet_ids.len() == 3
            })
            .times(1)
            .returning(|_, _, _, _| Ok(Resource::new(Kind::RouteTable, "rtb-1")));
        mocks.security_groups.expect_resolve().returning(|_| Ok(vec![]));
        mocks
            .security_groups
            .expect_create()
            .withf(|namespace, vpc_id| namespace == "batch" && vpc_id == "vpc-1")
            .times(1)
            .returning(|_, _| Ok(Resource::new(Kind::SecurityGroup, "sg-1")));
        let catalog = mocks.into_catalog();

        let mut plan = LaunchPlan::new(
            "batch",
            "workers",
            LaunchSpec {
                image_selectors: vec![String::from("id:al2023")],
                instance_type_selectors: vec![String::from("id:m7g.large")],
                ..LaunchSpec::default()
            },
        );
        Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect("should launch");

        assert_eq!(plan.status.vpc.as_ref().map(|v| v.id.as_str()), Some("vpc-1"));
        assert_eq!(plan.status.subnets.len(), 3);
        assert_eq!(
            plan.status.internet_gateway.as_ref().map(|g| g.id.as_str()),
            Some("igw-1")
        );
        assert_eq!(plan.status.route_tables.len(), 1);
        assert_eq!(plan.status.security_groups.len(), 1);
    }

    #[tokio::test]
    async fn reuses_an_existing_namespace_vpc_and_security_group() {
        let mut mocks = Mocks::new();
        stub_resolutions(&mut mocks);
        stub_template_and_fleet(&mut mocks);

        mocks.vpcs.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::Vpc, "vpc-old")])
        });
        mocks.subnets.expect_resolve().returning(|_| {
            Ok(vec![subnet("subnet-a"), subnet("subnet-b")])
        });
        mocks.security_groups.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::SecurityGroup, "sg-old")])
        });
        // No create expectations: creating anything network-side panics.
        let catalog = mocks.into_catalog();

        let mut plan = LaunchPlan::new(
            "batch",
            "workers",
            LaunchSpec {
                image_selectors: vec![String::from("id:al2023")],
                instance_type_selectors: vec![String::from("id:m7g.large")],
                ..LaunchSpec::default()
            },
        );
        Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect("should launch");

        assert_eq!(plan.status.vpc.as_ref().map(|v| v.id.as_str()), Some("vpc-old"));
        assert_eq!(plan.status.subnets.len(), 2);
        assert_eq!(
            plan.status.security_groups[0].id.as_str(),
            "sg-old"
        );
        assert!(plan.status.internet_gateway.is_none());
    }

    #[tokio::test]
    async fn tolerates_a_pre_existing_launch_template() {
        let mut mocks = Mocks::new();
        stub_resolutions(&mut mocks);
        mocks
            .subnets
            .expect_resolve()
            .returning(|_| Ok(vec![subnet("subnet-a")]));
        mocks.security_groups.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::SecurityGroup, "sg-1")])
        });
        mocks.launch_templates.expect_create().returning(|request| {
            Err(ProviderError::AlreadyExists {
                kind: String::from("launch-template"),
                name: format!("{}/{}", request.namespace, request.name),
            }
            .into())
        });
        mocks.launch_templates.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::LaunchTemplate, "lt-kept")])
        });
        mocks
            .fleets
            .expect_submit()
            .withf(|request| request.launch_template_id == "lt-kept")
            .returning(|_| Ok(vec![String::from("i-1")]));
        mocks.instances.expect_resolve_ids().returning(|ids| {
            Ok(ids.iter().map(|id| Resource::new(Kind::Instance, id)).collect())
        });
        let catalog = mocks.into_catalog();

        let mut plan = plan_with_network_selectors();
        Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect("already-exists must not fail the launch");
    }

    #[tokio::test]
    async fn ambiguous_launch_template_resolution_is_fatal() {
        let mut mocks = Mocks::new();
        stub_resolutions(&mut mocks);
        mocks
            .subnets
            .expect_resolve()
            .returning(|_| Ok(vec![subnet("subnet-a")]));
        mocks.security_groups.expect_resolve().returning(|_| {
            Ok(vec![Resource::new(Kind::SecurityGroup, "sg-1")])
        });
        mocks.launch_templates.expect_create().returning(|_| Ok(()));
        mocks.launch_templates.expect_resolve().returning(|_| {
            Ok(vec![
                Resource::new(Kind::LaunchTemplate, "lt-1"),
                Resource::new(Kind::LaunchTemplate, "lt-2"),
            ])
        });
        let catalog = mocks.into_catalog();

        let mut plan = plan_with_network_selectors();
        let err = Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            StratusError::Provision(ProvisionError::ResolutionAmbiguous { ref kind, found: 2 })
                if kind == "launch template"
        ));
    }

    #[tokio::test]
    async fn empty_image_resolution_is_fatal() {
        let mut mocks = Mocks::new();
        mocks.images.expect_resolve().returning(|_| Ok(vec![]));
        mocks
            .instance_types
            .expect_resolve()
            .returning(|_| Ok(vec![instance_type("m7g.large", CpuArch::Arm64)]));
        let catalog = mocks.into_catalog();

        let mut plan = plan_with_network_selectors();
        let err = Provisioner::new(&catalog)
            .launch(&mut plan)
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            StratusError::Provision(ProvisionError::EmptyResolution { ref kind }) if kind == "image"
        ));
    }

    #[test]
    fn overrides_pair_images_with_architecture_capable_types_across_subnets() {
        let images = vec![
            image("ami-arm", CpuArch::Arm64),
            image("ami-x86", CpuArch::X86_64),
        ];
        let instance_types = vec![
            instance_type("m7g.large", CpuArch::Arm64),
            instance_type("c7g.xlarge", CpuArch::Arm64),
            instance_type("m7i.large", CpuArch::X86_64),
        ];
        let subnets = vec![subnet("subnet-a"), subnet("subnet-b")];

        let overrides = build_overrides(&images, &instance_types, &subnets);

        // 2 arm64 types x 2 subnets + 1 x86_64 type x 2 subnets.
        assert_eq!(overrides.len(), 6);
        assert_eq!(
            overrides
                .iter()
                .filter(|o| o.image_id == "ami-arm")
                .count(),
            4
        );
        assert_eq!(
            overrides
                .iter()
                .filter(|o| o.image_id == "ami-x86")
                .count(),
            2
        );
        assert!(overrides.iter().all(|o| {
            (o.image_id == "ami-arm") != (o.instance_type == "m7i.large")
        }));
    }

    #[test]
    fn overrides_skip_images_without_a_reported_architecture() {
        let images = vec![Resource::new(Kind::Image, "ami-unknown")];
        let instance_types = vec![instance_type("m7i.large", CpuArch::X86_64)];
        let subnets = vec![subnet("subnet-a")];

        assert!(build_overrides(&images, &instance_types, &subnets).is_empty());
    }
}
