//! Launch plan: the caller-declared desired state and its resolved status.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::capacity::CapacityType;
use crate::catalog::Resource;
use crate::error::{PlanError, Result, StratusError};

/// Identity of a plan: which namespace owns it and its name within that
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Logical grouping every created resource is tagged with.
    pub namespace: String,
    /// Plan name within the namespace.
    pub name: String,
}

/// Desired state: selectors locating existing resources plus scalar launch
/// options. Selector fields hold raw selector strings; they are parsed
/// when provisioning starts, so grammar errors surface before any cloud
/// call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Purchasing model for the requested capacity.
    #[serde(default)]
    pub capacity_type: CapacityType,
    /// Selectors for machine images. At least one is required.
    #[serde(default)]
    pub image_selectors: Vec<String>,
    /// Selectors for instance types. At least one is required.
    #[serde(default)]
    pub instance_type_selectors: Vec<String>,
    /// Selectors for subnets. Supplied together with security-group
    /// selectors, or not at all.
    #[serde(default)]
    pub subnet_selectors: Vec<String>,
    /// Selectors for security groups. Supplied together with subnet
    /// selectors, or not at all.
    #[serde(default)]
    pub security_group_selectors: Vec<String>,
    /// Instance profile name to attach to launched instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_role: Option<String>,
    /// Plain-text user data passed to launched instances.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_data: String,
}

/// Resources resolved or created while provisioning. Populated by the
/// orchestrator; partial on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchStatus {
    /// The VPC instances land in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc: Option<Resource>,
    /// Subnets instances may be placed in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<Resource>,
    /// Route tables created by the network bootstrap.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_tables: Vec<Resource>,
    /// Internet gateway created by the network bootstrap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_gateway: Option<Resource>,
    /// Security groups attached to launched instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<Resource>,
    /// Resolved machine images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Resource>,
    /// Resolved instance types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instance_types: Vec<Resource>,
    /// The launch template instances reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template: Option<Resource>,
    /// Launched instances.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Resource>,
    /// When provisioning completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launched_at: Option<DateTime<Utc>>,
}

/// A launch plan: metadata, desired state, and resolved status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    /// Plan identity.
    pub metadata: Metadata,
    /// Desired state.
    pub spec: LaunchSpec,
    /// Resolution outcome. Never read from plan files.
    #[serde(default)]
    pub status: LaunchStatus,
}

impl LaunchPlan {
    /// Creates a plan with an empty status.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: LaunchSpec) -> Self {
        Self {
            metadata: Metadata {
                namespace: namespace.into(),
                name: name.into(),
            },
            spec,
            status: LaunchStatus::default(),
        }
    }

    /// Loads and validates a plan from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::FileNotFound`] if the path does not exist,
    /// [`PlanError::ParseError`] for malformed YAML, and a validation
    /// error for a plan that parses but is not launchable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading launch plan from: {}", path.display());

        if !path.exists() {
            return Err(StratusError::Plan(PlanError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parses and validates a plan from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ParseError`] for malformed YAML and a
    /// validation error for a plan that parses but is not launchable.
    pub fn from_yaml(content: &str) -> Result<Self> {
        debug!("Parsing launch plan YAML");

        let plan: Self = serde_yaml::from_str(content).map_err(|e| {
            StratusError::Plan(PlanError::ParseError {
                message: format!("YAML parse error: {e}"),
            })
        })?;

        plan.validate()?;
        Ok(plan)
    }

    /// Renders the plan, including status, as YAML.
    ///
    /// # Errors
    ///
    /// Returns an internal error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| StratusError::internal(format!("failed to render plan: {e}")))
    }

    /// Checks that the plan identifies itself and asks for something to
    /// launch.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.namespace.trim().is_empty() {
            return Err(PlanError::validation("namespace must not be empty", "metadata.namespace").into());
        }
        if self.metadata.name.trim().is_empty() {
            return Err(PlanError::validation("name must not be empty", "metadata.name").into());
        }
        if self.spec.image_selectors.is_empty() {
            return Err(PlanError::validation(
                "at least one image selector is required",
                "spec.image_selectors",
            )
            .into());
        }
        if self.spec.instance_type_selectors.is_empty() {
            return Err(PlanError::validation(
                "at least one instance type selector is required",
                "spec.instance_type_selectors",
            )
            .into());
        }
        Ok(())
    }
}
