//! Route table catalog adapter.

use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, ResourceType, RouteTable};
use aws_sdk_ec2::Client;
use tracing::{debug, info};

use super::api_error;
use super::filters::{plan_filters, tag_map, tag_specification};
use crate::catalog::{dedup_by_id, Kind, Resource, RouteTableCatalog};
use crate::error::{ProviderError, Result};
use crate::filter::KeySchema;
use crate::selector::SelectorSet;

const ROUTE_TABLE_KEYS: KeySchema = KeySchema::new("route-table", &["id"]);

const DEFAULT_ROUTE_CIDR: &str = "0.0.0.0/0";

/// EC2-backed route table catalog.
#[derive(Debug, Clone)]
pub struct AwsRouteTableCatalog {
    client: Client,
}

impl AwsRouteTableCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(&self, ids: Vec<String>, filters: Vec<Filter>) -> Result<Vec<RouteTable>> {
        let mut request = self.client.describe_route_tables();
        if !ids.is_empty() {
            request = request.set_route_table_ids(Some(ids));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut tables = Vec::new();
        while let Some(item) = pages.next().await {
            tables.push(item.map_err(|err| api_error("DescribeRouteTables", &err))?);
        }
        Ok(tables)
    }
}

#[async_trait]
impl RouteTableCatalog for AwsRouteTableCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = ROUTE_TABLE_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            let plan = plan_filters(group, &[]);
            let tables = self.describe(plan.ids, plan.filters).await?;
            resources.extend(tables.iter().map(to_resource));
        }

        Ok(dedup_by_id(resources))
    }

    async fn create_public(
        &self,
        namespace: &str,
        vpc_id: &str,
        gateway_id: &str,
        subnet_ids: &[String],
    ) -> Result<Resource> {
        info!("Creating public route table for namespace {namespace}");

        let response = self
            .client
            .create_route_table()
            .vpc_id(vpc_id)
            .tag_specifications(tag_specification(ResourceType::RouteTable, namespace, None))
            .send()
            .await
            .map_err(|err| api_error("CreateRouteTable", &err))?;

        let resource = response
            .route_table()
            .map(to_resource)
            .ok_or_else(|| ProviderError::missing_field("CreateRouteTable", "routeTable"))?;

        debug!(
            "Adding default route {DEFAULT_ROUTE_CIDR} -> {gateway_id} to {}",
            resource.id
        );
        self.client
            .create_route()
            .route_table_id(&resource.id)
            .destination_cidr_block(DEFAULT_ROUTE_CIDR)
            .gateway_id(gateway_id)
            .send()
            .await
            .map_err(|err| api_error("CreateRoute", &err))?;

        for subnet_id in subnet_ids {
            debug!("Associating subnet {subnet_id} with route table {}", resource.id);
            self.client
                .associate_route_table()
                .route_table_id(&resource.id)
                .subnet_id(subnet_id)
                .send()
                .await
                .map_err(|err| api_error("AssociateRouteTable", &err))?;
        }

        Ok(resource)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let tables = self.describe(vec![id.to_string()], Vec::new()).await?;

        for table in &tables {
            for route in table.routes() {
                let is_gateway_route = route
                    .gateway_id()
                    .is_some_and(|gateway| gateway.starts_with("igw-"));
                if !is_gateway_route {
                    continue;
                }
                if let Some(destination) = route.destination_cidr_block() {
                    debug!("Deleting route {destination} from route table {id}");
                    self.client
                        .delete_route()
                        .route_table_id(id)
                        .destination_cidr_block(destination)
                        .send()
                        .await
                        .map_err(|err| api_error("DeleteRoute", &err))?;
                }
            }

            for association in table.associations() {
                if association.main().unwrap_or(false) {
                    continue;
                }
                if let Some(association_id) = association.route_table_association_id() {
                    debug!("Disassociating {association_id} from route table {id}");
                    self.client
                        .disassociate_route_table()
                        .association_id(association_id)
                        .send()
                        .await
                        .map_err(|err| api_error("DisassociateRouteTable", &err))?;
                }
            }
        }

        info!("Deleting route table {id}");
        self.client
            .delete_route_table()
            .route_table_id(id)
            .send()
            .await
            .map_err(|err| api_error("DeleteRouteTable", &err))?;
        Ok(())
    }
}

fn to_resource(table: &RouteTable) -> Resource {
    let associations = table
        .associations()
        .iter()
        .filter_map(|association| association.subnet_id().map(str::to_string))
        .collect();
    let mut resource = Resource::new(Kind::RouteTable, table.route_table_id().unwrap_or_default())
        .with_tags(tag_map(table.tags()))
        .with_attachments(associations);
    if let Some(vpc_id) = table.vpc_id() {
        resource = resource.with_vpc(vpc_id);
    }
    resource
}
