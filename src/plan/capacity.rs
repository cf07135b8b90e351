//! Purchasing model for requested capacity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// How requested capacity is purchased.
///
/// Plan files and CLI flags accept the canonical kebab-case spellings plus
/// the common squashed and underscored variants, case-insensitively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(try_from = "String", into = "String")]
pub enum CapacityType {
    /// On-demand capacity.
    #[default]
    OnDemand,
    /// Spot capacity.
    Spot,
    /// Capacity block reservation.
    CapacityBlock,
}

impl CapacityType {
    /// The canonical kebab-case spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnDemand => "on-demand",
            Self::Spot => "spot",
            Self::CapacityBlock => "capacity-block",
        }
    }
}

impl fmt::Display for CapacityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapacityType {
    type Err = PlanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "on-demand" | "ondemand" | "on_demand" => Ok(Self::OnDemand),
            "capacity-block" | "capacityblock" | "capacity_block" => Ok(Self::CapacityBlock),
            _ => Err(PlanError::InvalidCapacityType {
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for CapacityType {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CapacityType> for String {
    fn from(value: CapacityType) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_documented_spellings() {
        assert_eq!("spot".parse::<CapacityType>().expect("spot"), CapacityType::Spot);
        for spelling in ["on-demand", "ondemand", "on_demand", "On-Demand"] {
            assert_eq!(
                spelling.parse::<CapacityType>().expect(spelling),
                CapacityType::OnDemand
            );
        }
        for spelling in ["capacity-block", "capacityblock", "CAPACITY_BLOCK"] {
            assert_eq!(
                spelling.parse::<CapacityType>().expect(spelling),
                CapacityType::CapacityBlock
            );
        }
    }

    #[test]
    fn rejects_unknown_spellings() {
        let err = "reserved".parse::<CapacityType>().expect_err("should fail");
        assert!(matches!(err, PlanError::InvalidCapacityType { ref value } if value == "reserved"));
    }

    #[test]
    fn serializes_as_canonical_kebab_case() {
        let yaml = serde_yaml::to_string(&CapacityType::CapacityBlock).expect("serialize");
        assert_eq!(yaml.trim(), "capacity-block");

        let parsed: CapacityType = serde_yaml::from_str("ON_DEMAND").expect("deserialize");
        assert_eq!(parsed, CapacityType::OnDemand);
    }

    #[test]
    fn defaults_to_on_demand() {
        assert_eq!(CapacityType::default(), CapacityType::OnDemand);
    }
}
