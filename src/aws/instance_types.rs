//! Instance type catalog adapter.
//!
//! Architecture and hypervisor criteria are pushed down as server-side
//! filters; the numeric range criteria have no describe filter and are
//! matched client-side against the capability data in each page.

use async_trait::async_trait;
use aws_sdk_ec2::types::{Filter, InstanceType, InstanceTypeInfo};
use aws_sdk_ec2::Client;

use super::api_error;
use super::filters::plan_filters;
use crate::catalog::{dedup_by_id, CpuArch, InstanceTypeCatalog, Kind, Resource};
use crate::error::{Result, SelectorError};
use crate::filter::{KeySchema, Predicate};
use crate::quantity::Range;
use crate::selector::SelectorSet;

const INSTANCE_TYPE_KEYS: KeySchema = KeySchema::new(
    "instance-type",
    &[
        "id",
        "vcpus",
        "memory",
        "generation",
        "gpus",
        "gpu-memory",
        "network-bandwidth",
        "architecture",
        "hypervisor",
        "local-storage",
    ],
);

const SERVER_FILTERS: &[(&str, &str)] = &[
    ("architecture", "processor-info.supported-architecture"),
    ("hypervisor", "hypervisor"),
];

/// EC2-backed instance type catalog.
#[derive(Debug, Clone)]
pub struct AwsInstanceTypeCatalog {
    client: Client,
}

impl AwsInstanceTypeCatalog {
    /// Creates the adapter over an EC2 client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn describe(
        &self,
        ids: Vec<String>,
        filters: Vec<Filter>,
        constraints: &TypeConstraints,
    ) -> Result<Vec<Resource>> {
        let mut request = self.client.describe_instance_types();
        if !ids.is_empty() {
            let types = ids.iter().map(|id| InstanceType::from(id.as_str())).collect();
            request = request.set_instance_types(Some(types));
        }
        if !filters.is_empty() {
            request = request.set_filters(Some(filters));
        }

        let mut pages = request.into_paginator().items().send();
        let mut resources = Vec::new();
        while let Some(item) = pages.next().await {
            let info = item.map_err(|err| api_error("DescribeInstanceTypes", &err))?;
            if constraints.matches(&info) {
                resources.push(to_resource(&info));
            }
        }
        Ok(resources)
    }
}

#[async_trait]
impl InstanceTypeCatalog for AwsInstanceTypeCatalog {
    async fn resolve(&self, selectors: &SelectorSet) -> Result<Vec<Resource>> {
        let groups = INSTANCE_TYPE_KEYS.compile(selectors)?;

        let mut resources = Vec::new();
        for group in &groups {
            // Instance types carry no tags, so tag criteria can never match.
            let has_tags = group.predicates.iter().any(|predicate| {
                matches!(
                    predicate,
                    Predicate::TagEquals { .. } | Predicate::TagPresent { .. }
                )
            });
            if has_tags {
                return Err(SelectorError::unsupported_key("tag", "instance-type").into());
            }

            let plan = plan_filters(group, SERVER_FILTERS);
            let constraints = TypeConstraints::parse(&plan.deferred)?;
            resources.extend(self.describe(plan.ids, plan.filters, &constraints).await?);
        }

        Ok(dedup_by_id(resources))
    }
}

/// The client-side range criteria compiled from one predicate group.
#[derive(Debug, Default, Clone, Copy)]
struct TypeConstraints {
    vcpus: Option<Range>,
    memory: Option<Range>,
    generation: Option<Range>,
    gpus: Option<Range>,
    gpu_memory: Option<Range>,
    network_bandwidth: Option<Range>,
    local_storage: Option<Range>,
}

impl TypeConstraints {
    fn parse(deferred: &[(String, String)]) -> Result<Self> {
        let mut constraints = Self::default();
        for (key, value) in deferred {
            match key.as_str() {
                "vcpus" => constraints.vcpus = Some(Range::parse(value)?),
                "memory" => constraints.memory = Some(Range::parse_mebibytes(value)?),
                "generation" => constraints.generation = Some(Range::parse(value)?),
                "gpus" => constraints.gpus = Some(Range::parse(value)?),
                "gpu-memory" => constraints.gpu_memory = Some(Range::parse_mebibytes(value)?),
                "network-bandwidth" => {
                    constraints.network_bandwidth = Some(Range::parse(value)?);
                }
                "local-storage" => {
                    constraints.local_storage = Some(Range::parse_mebibytes(value)?);
                }
                other => {
                    return Err(
                        SelectorError::unsupported_key(other, Kind::InstanceType.as_str()).into()
                    );
                }
            }
        }
        Ok(constraints)
    }

    fn matches(&self, info: &InstanceTypeInfo) -> bool {
        self.vcpus.is_none_or(|range| range.contains(default_vcpus(info)))
            && self.memory.is_none_or(|range| range.contains(memory_mib(info)))
            && self
                .generation
                .is_none_or(|range| range.contains(generation(info)))
            && self.gpus.is_none_or(|range| range.contains(gpu_count(info)))
            && self
                .gpu_memory
                .is_none_or(|range| range.contains(gpu_memory_mib(info)))
            && self
                .network_bandwidth
                .is_none_or(|range| range.contains(network_bandwidth_gbps(info)))
            && self
                .local_storage
                .is_none_or(|range| range.contains(local_storage_mib(info)))
    }
}

fn default_vcpus(info: &InstanceTypeInfo) -> u64 {
    info.v_cpu_info()
        .and_then(|vcpu| vcpu.default_v_cpus())
        .map_or(0, |count| u64::try_from(count).unwrap_or(0))
}

fn memory_mib(info: &InstanceTypeInfo) -> u64 {
    info.memory_info()
        .and_then(|memory| memory.size_in_mib())
        .map_or(0, |size| u64::try_from(size).unwrap_or(0))
}

/// The numeric generation embedded in the family name (`m7g` -> 7).
fn generation(info: &InstanceTypeInfo) -> u64 {
    let name = info
        .instance_type()
        .map(InstanceType::as_str)
        .unwrap_or_default();
    let family = name.split('.').next().unwrap_or_default();
    let digits: String = family
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

fn gpu_count(info: &InstanceTypeInfo) -> u64 {
    info.gpu_info().map_or(0, |gpu| {
        gpu.gpus()
            .iter()
            .filter_map(|device| device.count())
            .map(|count| u64::try_from(count).unwrap_or(0))
            .sum()
    })
}

fn gpu_memory_mib(info: &InstanceTypeInfo) -> u64 {
    info.gpu_info()
        .and_then(|gpu| gpu.total_gpu_memory_in_mib())
        .map_or(0, |size| u64::try_from(size).unwrap_or(0))
}

fn network_bandwidth_gbps(info: &InstanceTypeInfo) -> u64 {
    let total: f64 = info.network_info().map_or(0.0, |network| {
        network
            .network_cards()
            .iter()
            .filter_map(|card| card.peak_bandwidth_in_gbps())
            .sum()
    });
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        total.max(0.0) as u64
    }
}

fn local_storage_mib(info: &InstanceTypeInfo) -> u64 {
    info.instance_storage_info()
        .and_then(|storage| storage.total_size_in_gb())
        .map_or(0, |size| u64::try_from(size).unwrap_or(0) * 1024)
}

fn to_resource(info: &InstanceTypeInfo) -> Resource {
    let architectures = info
        .processor_info()
        .map(|processor| {
            processor
                .supported_architectures()
                .iter()
                .map(|arch| CpuArch::from_provider(arch.as_str()))
                .collect()
        })
        .unwrap_or_default();
    Resource::new(
        Kind::InstanceType,
        info.instance_type().map(InstanceType::as_str).unwrap_or_default(),
    )
    .with_architectures(architectures)
}
