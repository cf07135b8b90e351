//! The deprovisioning sequence.
//!
//! Teardown is two phases. Discovery ([`Deprovisioner::plan`]) finds every
//! resource carrying the namespace ownership tags, one query per kind, and
//! returns them as a [`DeletionSpec`] without touching anything. Execution
//! ([`Deprovisioner::execute`]) walks [`DELETION_ORDER`] leaves first,
//! deleting each discovered resource and recording it in the caller's
//! [`DeletionStatus`]. A failed deletion stops the run; re-running with the
//! same status skips everything already deleted, so execution is resumable.

use tracing::{debug, info};

use crate::catalog::{Catalog, Kind, Resource, WaitPolicy};
use crate::error::{Result, StratusError};
use crate::plan::{DeletionSpec, DeletionStatus, DELETION_ORDER};
use crate::selector::SelectorSet;
use crate::tags;

/// Instance lifecycle state that confirms a termination.
const TERMINATED_STATE: &str = "terminated";

/// Runs the deprovisioning sequence against a resource catalog.
pub struct Deprovisioner<'a> {
    /// Catalog the sequence discovers and deletes through.
    catalog: &'a Catalog,
    /// Bound on each instance-termination wait.
    wait_policy: WaitPolicy,
}

impl<'a> Deprovisioner<'a> {
    /// Creates a deprovisioner over a catalog with the default
    /// instance-termination wait policy.
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            wait_policy: WaitPolicy::instance_termination(),
        }
    }

    /// Overrides the instance-termination wait policy.
    #[must_use]
    pub const fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    /// Discovers every deletable resource owned by the namespace, narrowed
    /// to one plan name when given. Discovery is tag-only and mutates
    /// nothing.
    ///
    /// # Errors
    ///
    /// Fails if any per-kind query fails; no partial spec is returned.
    pub async fn plan(&self, namespace: &str, name: Option<&str>) -> Result<DeletionSpec> {
        let selectors =
            SelectorSet::from(vec![tags::namespace_selector(namespace, name)]);
        let mut spec = DeletionSpec::new(namespace, name.map(str::to_string));

        spec.insert(
            Kind::Instance,
            self.catalog.instances.resolve(&selectors).await?,
        );
        spec.insert(
            Kind::LaunchTemplate,
            self.catalog.launch_templates.resolve(&selectors).await?,
        );
        spec.insert(
            Kind::SecurityGroup,
            self.catalog.security_groups.resolve(&selectors).await?,
        );
        spec.insert(
            Kind::InternetGateway,
            self.catalog.gateways.resolve(&selectors).await?,
        );
        spec.insert(
            Kind::RouteTable,
            self.catalog.route_tables.resolve(&selectors).await?,
        );
        spec.insert(Kind::Subnet, self.catalog.subnets.resolve(&selectors).await?);
        spec.insert(Kind::Vpc, self.catalog.vpcs.resolve(&selectors).await?);

        info!(
            "Discovered {} resources in {}",
            spec.total(),
            tags::display_name(namespace, name)
        );
        Ok(spec)
    }

    /// Deletes the spec's resources leaves first, marking each in `status`
    /// as it completes.
    ///
    /// # Errors
    ///
    /// Stops at the first failed deletion. `status` keeps every completion
    /// recorded up to that point, so the same call can be retried to pick
    /// up where it stopped.
    pub async fn execute(&self, spec: &DeletionSpec, status: &mut DeletionStatus) -> Result<()> {
        for stage in DELETION_ORDER {
            for resource in spec.resources_of(stage.kind) {
                if status.is_completed(stage.kind, &resource.id) {
                    debug!("Skipping already-deleted {} {}", stage.kind, resource.id);
                    continue;
                }
                self.delete_resource(resource).await?;
                status.mark_completed(stage.kind, &resource.id);
            }
        }

        info!(
            "Deleted {} resources in {}",
            status.completed_count(),
            tags::display_name(&spec.namespace, spec.name.as_deref())
        );
        Ok(())
    }

    async fn delete_resource(&self, resource: &Resource) -> Result<()> {
        info!("Deleting {} {}", resource.kind, resource.id);
        match resource.kind {
            Kind::Instance => {
                self.catalog.instances.terminate(&resource.id).await?;
                self.catalog
                    .instances
                    .wait_for_state(&resource.id, TERMINATED_STATE, self.wait_policy)
                    .await
            }
            Kind::LaunchTemplate => self.catalog.launch_templates.delete(&resource.id).await,
            Kind::SecurityGroup => self.catalog.security_groups.delete(&resource.id).await,
            Kind::InternetGateway => self.catalog.gateways.delete(&resource.id).await,
            Kind::RouteTable => self.catalog.route_tables.delete(&resource.id).await,
            Kind::Subnet => self.catalog.subnets.delete(&resource.id).await,
            Kind::Vpc => self.catalog.vpcs.delete(&resource.id).await,
            Kind::Image | Kind::InstanceType | Kind::Fleet => Err(StratusError::internal(
                format!("{} resources are not deletable", resource.kind),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;

    use crate::catalog::{
        MockFleetCatalog, MockImageCatalog, MockInstanceCatalog, MockInstanceTypeCatalog,
        MockInternetGatewayCatalog, MockLaunchTemplateCatalog, MockRouteTableCatalog,
        MockSecurityGroupCatalog, MockSubnetCatalog, MockVpcCatalog, MockZoneCatalog,
    };
    use crate::error::ProviderError;
    use crate::tags::NAMESPACE_TAG;

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

    fn resource(kind: Kind, id: &str) -> Resource {
        Resource::new(kind, id)
    }

    fn full_spec() -> DeletionSpec {
        let mut spec = DeletionSpec::new("batch", None);
        spec.insert(Kind::Instance, vec![resource(Kind::Instance, "i-1")]);
        spec.insert(
            Kind::LaunchTemplate,
            vec![resource(Kind::LaunchTemplate, "lt-1")],
        );
        spec.insert(
            Kind::SecurityGroup,
            vec![resource(Kind::SecurityGroup, "sg-1")],
        );
        spec.insert(
            Kind::InternetGateway,
            vec![resource(Kind::InternetGateway, "igw-1")],
        );
        spec.insert(Kind::RouteTable, vec![resource(Kind::RouteTable, "rtb-1")]);
        spec.insert(Kind::Subnet, vec![resource(Kind::Subnet, "subnet-1")]);
        spec.insert(Kind::Vpc, vec![resource(Kind::Vpc, "vpc-1")]);
        spec
    }

    #[tokio::test]
    async fn discovery_queries_every_kind_by_namespace_tag() {
        fn tagged_with_namespace(selectors: &SelectorSet) -> bool {
            selectors.len() == 1
                && selectors.selectors[0].tags.get(NAMESPACE_TAG).map(String::as_str)
                    == Some("batch")
        }

        let mut mocks = Mocks::new();
        mocks
            .instances
            .expect_resolve()
            .withf(tagged_with_namespace)
            .returning(|_| Ok(vec![resource(Kind::Instance, "i-1")]));
        mocks
            .launch_templates
            .expect_resolve()
            .withf(tagged_with_namespace)
            .returning(|_| Ok(vec![]));
        mocks
            .security_groups
            .expect_resolve()
            .withf(tagged_with_namespace)
            .returning(|_| Ok(vec![resource(Kind::SecurityGroup, "sg-1")]));
        mocks
            .gateways
            .expect_resolve()
            .withf(tagged_with_namespace)
            .returning(|_| Ok(vec![]));
        mocks
            .route_tables
            .expect_resolve()
            .withf(tagged_with_namespace)
            .returning(|_| Ok(vec![]));
        mocks
            .subnets
            .expect_resolve()
            .withf(tagged_with_namespace)
            .returning(|_| Ok(vec![]));
        mocks
            .vpcs
            .expect_resolve()
            .withf(tagged_with_namespace)
            .returning(|_| Ok(vec![resource(Kind::Vpc, "vpc-1")]));
        let catalog = mocks.into_catalog();

        let spec = Deprovisioner::new(&catalog)
            .plan("batch", None)
            .await
            .expect("discovery should succeed");

        assert_eq!(spec.total(), 3);
        assert_eq!(spec.resources_of(Kind::Instance).len(), 1);
        assert_eq!(spec.resources_of(Kind::Vpc).len(), 1);
        // Kinds with nothing discovered are absent entirely.
        assert!(spec.resources_of(Kind::Subnet).is_empty());
        assert!(!spec.resources.contains_key(&Kind::Subnet));
    }

    #[tokio::test]
    async fn executes_deletions_leaves_first() {
        let mut mocks = Mocks::new();
        let mut order = Sequence::new();

        mocks
            .instances
            .expect_terminate()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));
        mocks
            .instances
            .expect_wait_for_state()
            .withf(|id, target, _| id == "i-1" && target == "terminated")
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _, _| Ok(()));
        mocks
            .launch_templates
            .expect_delete()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));
        mocks
            .security_groups
            .expect_delete()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));
        mocks
            .gateways
            .expect_delete()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));
        mocks
            .route_tables
            .expect_delete()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));
        mocks
            .subnets
            .expect_delete()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));
        mocks
            .vpcs
            .expect_delete()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));
        let catalog = mocks.into_catalog();

        let spec = full_spec();
        let mut status = DeletionStatus::default();
        Deprovisioner::new(&catalog)
            .execute(&spec, &mut status)
            .await
            .expect("teardown should succeed");

        assert_eq!(status.completed_count(), 7);
    }

    #[tokio::test]
    async fn a_failed_deletion_stops_the_run_and_keeps_progress() {
        let mut mocks = Mocks::new();
        mocks.instances.expect_terminate().returning(|_| Ok(()));
        mocks
            .instances
            .expect_wait_for_state()
            .returning(|_, _, _| Ok(()));
        mocks
            .launch_templates
            .expect_delete()
            .returning(|_| Ok(()));
        mocks
            .security_groups
            .expect_delete()
            .returning(|_| Ok(()));
        mocks.gateways.expect_delete().returning(|_| Ok(()));
        mocks.route_tables.expect_delete().returning(|_| Ok(()));
        mocks.subnets.expect_delete().returning(|_| {
            Err(ProviderError::api("DeleteSubnet", "dependency violation").into())
        });
        // No VPC expectation: reaching it would panic.
        let catalog = mocks.into_catalog();

        let spec = full_spec();
        let mut status = DeletionStatus::default();
        let err = Deprovisioner::new(&catalog)
            .execute(&spec, &mut status)
            .await
            .expect_err("subnet deletion should fail");

        assert!(matches!(err, StratusError::Provider(ProviderError::Api { .. })));
        assert_eq!(status.completed_count(), 5);
        assert!(status.is_completed(Kind::Instance, "i-1"));
        assert!(status.is_completed(Kind::RouteTable, "rtb-1"));
        assert!(!status.is_completed(Kind::Subnet, "subnet-1"));
        assert!(!status.is_completed(Kind::Vpc, "vpc-1"));
    }

    #[tokio::test]
    async fn resuming_skips_resources_already_deleted() {
        // Fresh mocks with no instance, template, group, gateway, or route
        // table expectations: touching any of them again panics.
        let mut mocks = Mocks::new();
        mocks
            .subnets
            .expect_delete()
            .withf(|id| id == "subnet-1")
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .vpcs
            .expect_delete()
            .withf(|id| id == "vpc-1")
            .times(1)
            .returning(|_| Ok(()));
        let catalog = mocks.into_catalog();

        let spec = full_spec();
        let mut status = DeletionStatus::default();
        status.mark_completed(Kind::Instance, "i-1");
        status.mark_completed(Kind::LaunchTemplate, "lt-1");
        status.mark_completed(Kind::SecurityGroup, "sg-1");
        status.mark_completed(Kind::InternetGateway, "igw-1");
        status.mark_completed(Kind::RouteTable, "rtb-1");

        Deprovisioner::new(&catalog)
            .execute(&spec, &mut status)
            .await
            .expect("resume should finish the teardown");

        assert_eq!(status.completed_count(), 7);
        assert!(status.is_completed(Kind::Vpc, "vpc-1"));
    }

    #[tokio::test]
    async fn a_second_execution_with_the_same_status_deletes_nothing() {
        let mut mocks = Mocks::new();
        mocks.instances.expect_terminate().times(1).returning(|_| Ok(()));
        mocks
            .instances
            .expect_wait_for_state()
            .times(1)
            .returning(|_, _, _| Ok(()));
        mocks.launch_templates.expect_delete().times(1).returning(|_| Ok(()));
        mocks.security_groups.expect_delete().times(1).returning(|_| Ok(()));
        mocks.gateways.expect_delete().times(1).returning(|_| Ok(()));
        mocks.route_tables.expect_delete().times(1).returning(|_| Ok(()));
        mocks.subnets.expect_delete().times(1).returning(|_| Ok(()));
        mocks.vpcs.expect_delete().times(1).returning(|_| Ok(()));
        let catalog = mocks.into_catalog();

        let spec = full_spec();
        let mut status = DeletionStatus::default();
        let deprovisioner = Deprovisioner::new(&catalog);

        deprovisioner
            .execute(&spec, &mut status)
            .await
            .expect("first run should succeed");
        // Every delete expectation is exhausted; one more call panics.
        deprovisioner
            .execute(&spec, &mut status)
            .await
            .expect("second run should be a no-op");

        assert_eq!(status.completed_count(), 7);
    }

    #[tokio::test]
    async fn termination_waits_with_the_configured_policy() {
        let custom = WaitPolicy::new(
            std::time::Duration::from_millis(1),
            std::time::Duration::from_millis(10),
        );

        let mut mocks = Mocks::new();
        mocks.instances.expect_terminate().returning(|_| Ok(()));
        mocks
            .instances
            .expect_wait_for_state()
            .withf(move |_, _, policy| *policy == custom)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let catalog = mocks.into_catalog();

        let mut spec = DeletionSpec::new("batch", None);
        spec.insert(Kind::Instance, vec![resource(Kind::Instance, "i-1")]);
        let mut status = DeletionStatus::default();

        Deprovisioner::new(&catalog)
            .with_wait_policy(custom)
            .execute(&spec, &mut status)
            .await
            .expect("teardown should succeed");
    }
}
