//! Machine image catalog adapter.
//!
//! Image selectors are the richest in the system: `id` accepts either a
//! direct `ami-` identifier or a distribution alias resolved through
//! public SSM parameters, `ssm` takes an explicit parameter path, and the
//! remaining criteria become server-side describe filters. When no
//! selector names an owner, results are restricted to `self,amazon` so a
//! look-alike image published by an arbitrary account can never satisfy a
//! name-based selector.

use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, Image};
use aws_sdk_ec2::Client;
use tracing::{debug, warn};

use super::api_error;
use super::filters::{ec2_filter, ec2_filter_any, plan_filters, tag_map};
use crate::catalog::{dedup_by_id, CpuArch, ImageCatalog, Kind, Resource};
use crate::error::{Result, SelectorError};
use crate::filter::{KeySchema, PredicateGroup};
use crate::selector::SelectorSet;

const IMAGE_KEYS: KeySchema = KeySchema::new("image", &["id", "name", "owner", "architecture", "ssm"]);

/// Publishers trusted when no selector names an owner.
const DEFAULT_OWNERS: [&str; 2] = ["self", "amazon"];

/// Distribution aliases and the public SSM parameters they resolve
/// through, one per architecture.
static ALIASES: [(&str, [&str; 2]); 3] = [
    (
        "al2023",
        [
            "/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-arm64",
            "/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64",
        ],
    ),
    (
        "al2023-minimal",
        [
            "/aws/service/ami-amazon-linux-latest/al2023-ami-minimal-kernel-default-arm64",
            "/aws/service/ami-amazon-linux-latest/al2023-ami-minimal-kernel-default-x86_64",
        ],
    ),
    (
        "al2",
        [
            "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-arm64-gp2",
            "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2",
        ],
    ),
];

/// EC2-backed machine image catalog.
#[derive(Debug, Clone)]
pub struct AwsImageCatalog {
    ec2: Client,
    ssm: aws_sdk_ssm::Client,
}

impl AwsImageCatalog {
    /// Creates the adapter over EC2 and SSM clients.
    #[must_use]
    pub const fn new(ec2: Client, ssm: aws_sdk_ssm::Client) -> Self {
        Self { ec2, ssm }
    }

    /// Resolves one predicate group into image resources.
    async fn resolve_group(&self, group: &PredicateGroup) -> Result<Vec<Resource>> {
        let plan = plan_filters(group, &[("name", "name"), ("architecture", "architecture")]);

        let (mut image_ids, aliases) = partition_image_ids(&plan.ids)?;
        let mut parameter_paths: Vec<String> = aliases
            .iter()
            .flat_map(|alias| alias_paths(alias))
            .map(|path| (*path).to_string())
            .collect();
        if let Some(path) = group.key_value("ssm") {
            parameter_paths.push(path.to_string());
        }

        // An owner alone is not a criterion; it would match everything the
        // owner publishes.
        if image_ids.is_empty() && parameter_paths.is_empty() && plan.filters.is_empty() {
            return Err(SelectorError::CriteriaRequired {
                kind: Kind::Image.to_string(),
            }
            .into());
        }

        if !parameter_paths.is_empty() {
            image_ids.extend(self.resolve_parameters(parameter_paths).await?);
            // Paths that resolved to nothing must not widen the query to
            // every owner image.
            if image_ids.is_empty() && plan.filters.is_empty() {
                return Ok(Vec::new());
            }
        }

        let mut filters = plan.filters;
        match group.key_value("owner") {
            Some(owner) => filters.push(ec2_filter("owner-alias", owner)),
            None => filters.push(ec2_filter_any("owner-alias", &DEFAULT_OWNERS)),
        }

        self.describe(image_ids, filters).await
    }

    /// Resolves SSM parameter paths into the image IDs they point at.
    async fn resolve_parameters(&self, paths: Vec<String>) -> Result<Vec<String>> {
        debug!("Resolving {} image parameter paths", paths.len());
        let response = self
            .ssm
            .get_parameters()
            .set_names(Some(paths))
            .send()
            .await
            .map_err(|err| api_error("GetParameters", &err))?;

        for invalid in response.invalid_parameters() {
            warn!("Image parameter path {invalid} did not resolve");
        }

        let ids = response
            .parameters()
            .iter()
            .filter_map(|parameter| parameter.value().map(str::to_string))
            .collect();
        Ok(ids)
    }

    async fn describe(&self, ids: Vec<String>, filters: Vec<Filter>) -> Result<Vec<Resource>> {
        let mut request = self.ec2.describe_images();
        if !ids.is_empty() {
            request = request.set_image_ids(Some(ids));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let image = item.map_err(|err| api_error("DescribeImages", &err))?;
            resources.push(to_resource(&image));
        }
        Ok(resources)
    }
}

#[async_trait]
impl ImageCatalog for AwsImageCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = IMAGE_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            resources.extend(self.resolve_group(group).await?);
        }

        Ok(dedup_by_id(resources))
    }
}

/// Splits id values into direct image IDs and alias names, rejecting
/// values that are neither.
fn partition_image_ids(ids: &[String]) -> Result<(Vec<String>, Vec<String>)> {
    let mut direct = Vec::new();
    let mut aliases = Vec::new();
    for id in ids {
        if id.starts_with("ami-") {
            direct.push(id.clone());
        } else if alias_paths(id).is_empty() {
            return Err(SelectorError::UnknownImageAlias { alias: id.clone() }.into());
        } else {
            aliases.push(id.clone());
        }
    }
    Ok((direct, aliases))
}

/// The SSM parameter paths behind a distribution alias, empty for unknown
/// aliases.
fn alias_paths(alias: &str) -> &'static [&'static str] {
    ALIASES
        .iter()
        .find(|(candidate, _)| *candidate == alias)
        .map_or(&[], |(_, paths)| paths.as_slice())
}

fn to_resource(image: &Image) -> Resource {
    let mut resource = Resource::new(Kind::Image, image.image_id().unwrap_or_default())
        .with_tags(tag_map(image.tags()));
    if let Some(architecture) = image.architecture() {
        resource =
            resource.with_architectures(vec![CpuArch::from_provider(architecture.as_str())]);
    }
    if let Some(state) = image.state() {
        resource = resource.with_state(state.as_str());
    }
    resource
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::StratusError;

    #[test]
    fn every_alias_resolves_to_one_path_per_architecture() {
        for alias in ["al2023", "al2023-minimal", "al2"] {
            let paths = alias_paths(alias);
            assert_eq!(paths.len(), 2, "{alias}");
            assert!(paths.iter().any(|path| path.contains("arm64")));
            assert!(paths.iter().any(|path| path.contains("x86_64")));
        }
        assert!(alias_paths("windows").is_empty());
    }

    #[test]
    fn id_values_partition_into_direct_ids_and_aliases() {
        let ids = vec![String::from("ami-0123456789abcdef0"), String::from("al2023")];
        let (direct, aliases) = partition_image_ids(&ids).expect("should partition");

        assert_eq!(direct, vec![String::from("ami-0123456789abcdef0")]);
        assert_eq!(aliases, vec![String::from("al2023")]);
    }

    #[test]
    fn unknown_alias_is_rejected() {
        let ids = vec![String::from("ubuntu-pro")];
        let err = partition_image_ids(&ids).expect_err("should fail");

        assert!(matches!(
            err,
            StratusError::Selector(SelectorError::UnknownImageAlias { ref alias })
                if alias == "ubuntu-pro"
        ));
    }
}
