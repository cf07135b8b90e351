//! Selector grammar for locating cloud resources.
//!
//! A selector string describes which resources an operation applies to
//! without hard-coding identifiers. The grammar is compact: `;` separates
//! alternative selectors (OR), `,` separates criteria within one selector
//! (AND), and each criterion is `keyword:value`. The `tag` keyword nests a
//! `Key=Value` pair in its value; omitting `=Value` matches any value for
//! that key.
//!
//! Examples:
//!
//! ```text
//! tag:Team=infra,tag:Env=prod        one selector, two AND-ed tag criteria
//! id:subnet-abc;tag:Tier=public      two selectors, OR-ed
//! tag:Owner                          key-presence wildcard
//! ```

use std::collections::BTreeMap;

use crate::error::{Result, SelectorError};

/// One AND-group of match criteria.
///
/// A resource matches a `Selector` only if every populated criterion
/// matches. Criteria are held in ordered maps so compiled filter output is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    /// Tag criteria. An empty or `"*"` value means "key present, any
    /// value".
    pub tags: BTreeMap<String, String>,
    /// Kind-specific named criteria (`id`, `owner`, `vcpus`, ...), keyed by
    /// lower-cased keyword.
    pub key_vals: BTreeMap<String, String>,
}

impl Selector {
    /// Returns true if the selector carries no criteria at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.key_vals.is_empty()
    }

    /// Looks up a named criterion by its lower-cased keyword.
    #[must_use]
    pub fn key_val(&self, key: &str) -> Option<&str> {
        self.key_vals.get(key).map(String::as_str)
    }
}

/// An ordered OR-combination of selectors parsed from one input string.
///
/// Resources matching any member selector are included. An empty set is
/// legal at parse time; call sites that require at least one criterion
/// enforce that themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorSet {
    /// Member selectors, in input order.
    pub selectors: Vec<Selector>,
}

impl SelectorSet {
    /// Returns true if the set contains no selectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Number of member selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Iterates over the member selectors.
    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.selectors.iter()
    }

    /// Appends every selector from `other`, preserving order.
    pub fn extend(&mut self, other: Self) {
        self.selectors.extend(other.selectors);
    }
}

impl From<Vec<Selector>> for SelectorSet {
    fn from(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }
}

impl<'a> IntoIterator for &'a SelectorSet {
    type Item = &'a Selector;
    type IntoIter = std::slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.selectors.iter()
    }
}

/// Parses a selector string into a [`SelectorSet`].
///
/// The input is split on `;` into selector terms, each term on `,` into
/// criteria, each criterion on the first `:` into `keyword:value`.
/// Whitespace around terms and criteria is trimmed; empty terms and
/// criteria are dropped silently, so `""` parses to an empty set.
///
/// # Errors
///
/// Returns [`SelectorError::MalformedCriterion`] when a criterion has no
/// `:` separator, and [`SelectorError::MalformedTagCriterion`] when a tag
/// value contains more than one `=`.
pub fn parse(input: &str) -> Result<SelectorSet> {
    let mut selectors = Vec::new();

    for term in input.split(';') {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }

        let mut selector = Selector::default();
        for criterion in term.split(',') {
            let criterion = criterion.trim();
            if criterion.is_empty() {
                continue;
            }

            let Some((keyword, value)) = criterion.split_once(':') else {
                return Err(SelectorError::MalformedCriterion {
                    criterion: criterion.to_string(),
                }
                .into());
            };

            if keyword.eq_ignore_ascii_case("tag") {
                let (tag_key, tag_value) = parse_tag_value(criterion, value)?;
                selector.tags.insert(tag_key, tag_value);
            } else {
                selector
                    .key_vals
                    .insert(keyword.to_ascii_lowercase(), value.to_string());
            }
        }

        if !selector.is_empty() {
            selectors.push(selector);
        }
    }

    Ok(SelectorSet { selectors })
}

/// Parses several selector strings and concatenates the resulting sets in
/// input order.
///
/// # Errors
///
/// Returns the first grammar error encountered.
pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<SelectorSet> {
    let mut set = SelectorSet::default();
    for input in inputs {
        set.extend(parse(input.as_ref())?);
    }
    Ok(set)
}

/// Splits a tag criterion value on its first `=` into key and value.
/// No `=` means a key-presence wildcard, stored as an empty value.
fn parse_tag_value(criterion: &str, value: &str) -> Result<(String, String)> {
    let mut parts = value.splitn(3, '=');
    let key = parts.next().unwrap_or_default().to_string();
    let tag_value = parts.next();
    if parts.next().is_some() {
        return Err(SelectorError::MalformedTagCriterion {
            criterion: criterion.to_string(),
        }
        .into());
    }
    Ok((key, tag_value.unwrap_or_default().to_string()))
}
