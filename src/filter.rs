//! Compilation of selectors into provider-neutral query predicates.
//!
//! Cloud list APIs AND their filters within a single call, so an OR of
//! selectors becomes one query per selector with results unioned by the
//! caller. This module performs the per-selector half of that contract:
//! one [`PredicateGroup`] per selector, every predicate in a group AND-ed.
//!
//! There is a single compiler for all resource kinds. What varies per kind
//! is only which named criteria it accepts, captured by a [`KeySchema`]
//! that each catalog adapter declares for itself.

use crate::error::{Result, SelectorError};
use crate::selector::{Selector, SelectorSet};

/// One provider-neutral match predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Match the provider-assigned resource identifier exactly.
    Id(String),
    /// Match a kind-specific named attribute (`owner`, `architecture`,
    /// `vcpus`, ...). Interpretation is up to the adapter; range-valued
    /// criteria are matched client-side.
    KeyValue {
        /// Lower-cased attribute keyword.
        key: String,
        /// Raw attribute value.
        value: String,
    },
    /// Match resources carrying the tag with exactly this value.
    TagEquals {
        /// Tag key.
        key: String,
        /// Required tag value.
        value: String,
    },
    /// Match resources carrying the tag key with any value.
    TagPresent {
        /// Tag key.
        key: String,
    },
}

/// The AND-set of predicates compiled from one selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateGroup {
    /// Member predicates; a resource must satisfy every one.
    pub predicates: Vec<Predicate>,
}

impl PredicateGroup {
    /// Returns true if the group carries no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The id-equality predicate value, if the group has one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Id(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// The value of a named attribute predicate, if present.
    #[must_use]
    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::KeyValue { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }
}

/// The named-criteria whitelist for one resource kind.
///
/// Tag criteria are always accepted; only `key_vals` keywords are
/// validated. Unknown keywords fail compilation with
/// [`SelectorError::UnsupportedKey`].
#[derive(Debug, Clone, Copy)]
pub struct KeySchema {
    kind: &'static str,
    keys: &'static [&'static str],
}

impl KeySchema {
    /// Declares the schema for a resource kind.
    #[must_use]
    pub const fn new(kind: &'static str, keys: &'static [&'static str]) -> Self {
        Self { kind, keys }
    }

    /// The resource kind this schema belongs to.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Checks every named criterion in the set against the whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::UnsupportedKey`] for the first unknown
    /// keyword.
    pub fn validate(&self, set: &SelectorSet) -> Result<()> {
        for selector in set {
            for key in selector.key_vals.keys() {
                if !self.keys.contains(&key.as_str()) {
                    return Err(
                        SelectorError::unsupported_key(key.clone(), self.kind).into()
                    );
                }
            }
        }
        Ok(())
    }

    /// Compiles a selector set into predicate groups, one per selector.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::UnsupportedKey`] if any selector carries a
    /// keyword outside this schema.
    pub fn compile(&self, set: &SelectorSet) -> Result<Vec<PredicateGroup>> {
        self.validate(set)?;
        Ok(set.iter().map(compile_selector).collect())
    }
}

fn compile_selector(selector: &Selector) -> PredicateGroup {
    let mut predicates = Vec::new();

    for (key, value) in &selector.key_vals {
        if key == "id" {
            predicates.push(Predicate::Id(value.clone()));
        } else {
            predicates.push(Predicate::KeyValue {
                key: key.clone(),
                value: value.clone(),
            });
        }
    }

    for (key, value) in &selector.tags {
        if value.is_empty() || value == "*" {
            predicates.push(Predicate::TagPresent { key: key.clone() });
        } else {
            predicates.push(Predicate::TagEquals {
                key: key.clone(),
                value: value.clone(),
            });
        }
    }

    PredicateGroup { predicates }
}
