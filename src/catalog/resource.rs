//! The provider-neutral resource model.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// The resource kinds the system provisions and tears down.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// Virtual private cloud.
    Vpc,
    /// Subnet within a VPC.
    Subnet,
    /// Internet gateway.
    InternetGateway,
    /// Route table.
    RouteTable,
    /// Security group.
    SecurityGroup,
    /// Machine image.
    Image,
    /// Instance type (capability description, never created or deleted).
    InstanceType,
    /// Launch template.
    LaunchTemplate,
    /// Capacity request.
    Fleet,
    /// Compute instance.
    Instance,
}

impl Kind {
    /// The lower-case identifier used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet-gateway",
            Self::RouteTable => "route-table",
            Self::SecurityGroup => "security-group",
            Self::Image => "image",
            Self::InstanceType => "instance-type",
            Self::LaunchTemplate => "launch-template",
            Self::Fleet => "fleet",
            Self::Instance => "instance",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuArch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Arm64,
    /// Any other architecture string the provider reports.
    #[serde(untagged)]
    Other(String),
}

impl CpuArch {
    /// Parses the provider's architecture string.
    #[must_use]
    pub fn from_provider(value: &str) -> Self {
        match value {
            "x86_64" => Self::X86_64,
            "arm64" => Self::Arm64,
            other => Self::Other(other.to_string()),
        }
    }

    /// The provider-side architecture string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cloud resource reference.
///
/// The catalog adapters own the full provider representation; the
/// orchestrators hold only the identifier, tags, and the few fields needed
/// to wire dependencies (a subnet's VPC, an image's architecture, an
/// instance's state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource kind.
    pub kind: Kind,
    /// Provider-assigned identifier.
    pub id: String,
    /// Tags on the resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Owning VPC, for kinds nested inside one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    /// Availability zone, for zonal kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Supported CPU architectures. Images carry one entry; instance types
    /// may carry several.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architectures: Vec<CpuArch>,
    /// Provider lifecycle state, for kinds that report one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Attached resource IDs (an internet gateway's VPC attachments).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl Resource {
    /// Creates a resource reference with only kind and identifier set.
    #[must_use]
    pub fn new(kind: Kind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            tags: BTreeMap::new(),
            vpc_id: None,
            zone: None,
            architectures: Vec::new(),
            state: None,
            attachments: Vec::new(),
        }
    }

    /// Sets the tag map.
    #[must_use]
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the owning VPC.
    #[must_use]
    pub fn with_vpc(mut self, vpc_id: impl Into<String>) -> Self {
        self.vpc_id = Some(vpc_id.into());
        self
    }

    /// Sets the availability zone.
    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Sets the supported architectures.
    #[must_use]
    pub fn with_architectures(mut self, architectures: Vec<CpuArch>) -> Self {
        self.architectures = architectures;
        self
    }

    /// Sets the lifecycle state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the attached resource IDs.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Looks up a tag value.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// The display name tag, if present.
    #[must_use]
    pub fn name_tag(&self) -> Option<&str> {
        self.tag(crate::tags::DISPLAY_NAME_TAG)
    }

    /// The primary architecture, for kinds that carry exactly one.
    #[must_use]
    pub fn architecture(&self) -> Option<&CpuArch> {
        self.architectures.first()
    }

    /// Returns true if the resource supports the given architecture.
    #[must_use]
    pub fn supports_architecture(&self, arch: &CpuArch) -> bool {
        self.architectures.contains(arch)
    }
}

/// Unions resolution results from several predicate groups, dropping
/// resources already seen. First occurrence wins; order is preserved.
#[must_use]
pub fn dedup_by_id(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen = HashSet::new();
    resources
        .into_iter()
        .filter(|resource| seen.insert(resource.id.clone()))
        .collect()
}
