//! Translation from compiled predicate groups into EC2 query inputs.
//!
//! Every describe-style adapter funnels its predicate groups through
//! [`plan_filters`]. Tag predicates become `tag:{key}` / `tag-key` filters,
//! named criteria become server-side filters through a per-kind lookup
//! table, and criteria without a server-side filter are handed back for
//! client-side matching.

use std::collections::BTreeMap;

use aws_sdk_ec2::types::{Filter, ResourceType, Tag, TagSpecification};

use crate::filter::{Predicate, PredicateGroup};
use crate::tags;

/// The provider-side query compiled from one predicate group.
#[derive(Debug, Default)]
pub(crate) struct FilterPlan {
    /// Resource IDs for the API's dedicated id parameter.
    pub ids: Vec<String>,
    /// Server-side filters.
    pub filters: Vec<Filter>,
    /// Named criteria with no server-side filter, matched client-side by
    /// the adapter.
    pub deferred: Vec<(String, String)>,
}

/// Translates one predicate group using the adapter's key-to-filter-name
/// table. Keys absent from the table land in `deferred`.
pub(crate) fn plan_filters(group: &PredicateGroup, filter_names: &[(&str, &str)]) -> FilterPlan {
    let mut plan = FilterPlan::default();

    for predicate in &group.predicates {
        match predicate {
            Predicate::Id(id) => plan.ids.push(id.clone()),
            Predicate::KeyValue { key, value } => {
                let server_name = filter_names
                    .iter()
                    .find(|(candidate, _)| *candidate == key.as_str())
                    .map(|(_, name)| *name);
                match server_name {
                    Some(name) => plan.filters.push(ec2_filter(name, value)),
                    None => plan.deferred.push((key.clone(), value.clone())),
                }
            }
            Predicate::TagEquals { key, value } => {
                plan.filters.push(ec2_filter(&format!("tag:{key}"), value));
            }
            Predicate::TagPresent { key } => {
                plan.filters.push(ec2_filter("tag-key", key));
            }
        }
    }

    plan
}

/// A single-value EC2 filter.
pub(crate) fn ec2_filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

/// A multi-value EC2 filter; values are OR-ed by the provider.
pub(crate) fn ec2_filter_any(name: &str, values: &[&str]) -> Filter {
    let mut builder = Filter::builder().name(name);
    for value in values {
        builder = builder.values(*value);
    }
    builder.build()
}

/// The ownership tag specification stamped onto resources at creation.
pub(crate) fn tag_specification(
    resource_type: ResourceType,
    namespace: &str,
    name: Option<&str>,
) -> TagSpecification {
    let mut builder = TagSpecification::builder().resource_type(resource_type);
    for (key, value) in tags::ownership_tags(namespace, name) {
        builder = builder.tags(Tag::builder().key(key).value(value).build());
    }
    builder.build()
}

/// Collects the provider's tag list into a map.
pub(crate) fn tag_map(sdk_tags: &[Tag]) -> BTreeMap<String, String> {
    sdk_tags
        .iter()
        .filter_map(|tag| match (tag.key(), tag.value()) {
            (Some(key), Some(value)) => Some((key.to_string(), value.to_string())),
            _ => None,
        })
        .collect()
}
