//! Ownership tag conventions.
//!
//! Every resource this system creates carries a namespace tag, an optional
//! name tag, and a created-by marker. Discovery (teardown and `get`) keys
//! exclusively off these tags; resources missing them are invisible to the
//! system even when a reference chain would reach them.

use crate::selector::Selector;

/// Tag key holding the owning namespace.
pub const NAMESPACE_TAG: &str = "stratus-Namespace";

/// Tag key holding the plan name within the namespace.
pub const NAME_TAG: &str = "stratus-Name";

/// Tag key marking resources created by this system.
pub const CREATED_BY_TAG: &str = "stratus-CreatedBy";

/// Value written under [`CREATED_BY_TAG`].
pub const CREATED_BY_VALUE: &str = "stratus";

/// Provider-visible display name tag.
pub const DISPLAY_NAME_TAG: &str = "Name";

/// The console display name for a namespace-scoped or named resource.
#[must_use]
pub fn display_name(namespace: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{namespace}/{name}"),
        _ => namespace.to_string(),
    }
}

/// The full tag set stamped onto every created resource.
#[must_use]
pub fn ownership_tags(namespace: &str, name: Option<&str>) -> Vec<(String, String)> {
    let mut tags = vec![
        (
            DISPLAY_NAME_TAG.to_string(),
            display_name(namespace, name),
        ),
        (NAMESPACE_TAG.to_string(), namespace.to_string()),
        (CREATED_BY_TAG.to_string(), CREATED_BY_VALUE.to_string()),
    ];
    if let Some(name) = name {
        if !name.is_empty() {
            tags.push((NAME_TAG.to_string(), name.to_string()));
        }
    }
    tags
}

/// The discovery selector matching resources owned by a namespace, and
/// optionally narrowed to one plan name.
#[must_use]
pub fn namespace_selector(namespace: &str, name: Option<&str>) -> Selector {
    let mut selector = Selector::default();
    selector
        .tags
        .insert(NAMESPACE_TAG.to_string(), namespace.to_string());
    selector
        .tags
        .insert(CREATED_BY_TAG.to_string(), CREATED_BY_VALUE.to_string());
    if let Some(name) = name {
        if !name.is_empty() {
            selector.tags.insert(NAME_TAG.to_string(), name.to_string());
        }
    }
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_resources_carry_all_four_tags() {
        let tags = ownership_tags("batch", Some("workers"));

        assert!(tags.contains(&(String::from("Name"), String::from("batch/workers"))));
        assert!(tags.contains(&(String::from(NAMESPACE_TAG), String::from("batch"))));
        assert!(tags.contains(&(String::from(NAME_TAG), String::from("workers"))));
        assert!(tags.contains(&(String::from(CREATED_BY_TAG), String::from("stratus"))));
    }

    #[test]
    fn namespace_scoped_resources_omit_the_name_tag() {
        let tags = ownership_tags("batch", None);

        assert!(tags.contains(&(String::from("Name"), String::from("batch"))));
        assert!(!tags.iter().any(|(k, _)| k == NAME_TAG));
    }

    #[test]
    fn discovery_selector_matches_namespace_and_marker() {
        let selector = namespace_selector("batch", None);

        assert_eq!(selector.tags.get(NAMESPACE_TAG).map(String::as_str), Some("batch"));
        assert_eq!(
            selector.tags.get(CREATED_BY_TAG).map(String::as_str),
            Some(CREATED_BY_VALUE)
        );
        assert!(!selector.tags.contains_key(NAME_TAG));
    }

    #[test]
    fn discovery_selector_narrows_by_name_when_given() {
        let selector = namespace_selector("batch", Some("workers"));
        assert_eq!(selector.tags.get(NAME_TAG).map(String::as_str), Some("workers"));
    }

    #[test]
    fn empty_name_is_treated_as_absent() {
        assert_eq!(display_name("batch", Some("")), "batch");
        let selector = namespace_selector("batch", Some(""));
        assert!(!selector.tags.contains_key(NAME_TAG));
    }
}
