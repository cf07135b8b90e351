//! Launch and deletion plans.
//!
//! A launch plan is the caller-declared desired state: a namespace/name
//! pair plus selectors and scalar options. A deletion plan is never
//! written by hand; it is discovered from ownership tags. Both carry a
//! status side the orchestrators populate.

mod capacity;
mod deletion;
mod launch;

pub use capacity::CapacityType;
pub use deletion::{DeletionSpec, DeletionStage, DeletionStatus, DELETION_ORDER};
pub use launch::{LaunchPlan, LaunchSpec, LaunchStatus, Metadata};
