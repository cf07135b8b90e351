//! Deletion plan: discovered resources and resumable completion tracking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Kind, Resource};

/// One stage of the deletion sequence: a kind and the kinds that must be
/// gone before it can be deleted safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionStage {
    /// The kind deleted at this stage.
    pub kind: Kind,
    /// Kinds whose resources block deletion of this kind while they exist.
    pub depends_on: &'static [Kind],
}

/// The deletion sequence, leaves first. Execution walks this list in
/// order; the `depends_on` sets document why the order is what it is and
/// are checked by tests, not consulted at runtime.
pub const DELETION_ORDER: &[DeletionStage] = &[
    DeletionStage {
        kind: Kind::Instance,
        depends_on: &[],
    },
    DeletionStage {
        kind: Kind::LaunchTemplate,
        depends_on: &[],
    },
    DeletionStage {
        kind: Kind::SecurityGroup,
        depends_on: &[Kind::Instance],
    },
    DeletionStage {
        kind: Kind::InternetGateway,
        depends_on: &[Kind::Instance],
    },
    DeletionStage {
        kind: Kind::RouteTable,
        depends_on: &[Kind::InternetGateway],
    },
    DeletionStage {
        kind: Kind::Subnet,
        depends_on: &[Kind::Instance, Kind::RouteTable],
    },
    DeletionStage {
        kind: Kind::Vpc,
        depends_on: &[
            Kind::Subnet,
            Kind::SecurityGroup,
            Kind::InternetGateway,
            Kind::RouteTable,
        ],
    },
];

/// Everything discovery found under one namespace (and optionally one plan
/// name), grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionSpec {
    /// Namespace the discovery ran against.
    pub namespace: String,
    /// Plan name the discovery was narrowed to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Discovered resources per kind. Kinds with nothing discovered are
    /// absent.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<Kind, Vec<Resource>>,
}

impl DeletionSpec {
    /// Creates an empty spec for a namespace and optional name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: Option<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name,
            resources: BTreeMap::new(),
        }
    }

    /// Records discovered resources for a kind. Empty lists are dropped.
    pub fn insert(&mut self, kind: Kind, resources: Vec<Resource>) {
        if !resources.is_empty() {
            self.resources.insert(kind, resources);
        }
    }

    /// The discovered resources of one kind, in discovery order.
    #[must_use]
    pub fn resources_of(&self, kind: Kind) -> &[Resource] {
        self.resources.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Total number of discovered resources.
    #[must_use]
    pub fn total(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }

    /// Returns true if discovery found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Per-resource completion tracking for one deletion run.
///
/// Execution consults this before every deletion and updates it after
/// every success, so re-submitting a partially completed status skips the
/// work already done. The map lives only as long as the caller keeps it;
/// nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionStatus {
    /// Completion flags per kind and resource ID.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub completed: BTreeMap<Kind, BTreeMap<String, bool>>,
}

impl DeletionStatus {
    /// Returns true if the resource was already deleted in this run or a
    /// prior one sharing this status.
    #[must_use]
    pub fn is_completed(&self, kind: Kind, id: &str) -> bool {
        self.completed
            .get(&kind)
            .and_then(|ids| ids.get(id))
            .copied()
            .unwrap_or(false)
    }

    /// Marks a resource as deleted.
    pub fn mark_completed(&mut self, kind: Kind, id: &str) {
        self.completed
            .entry(kind)
            .or_default()
            .insert(id.to_string(), true);
    }

    /// Number of resources marked deleted.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed
            .values()
            .map(|ids| ids.values().filter(|done| **done).count())
            .sum()
    }
}
