//! Provisioning and deprovisioning orchestration.
//!
//! Two single-shot sequences over the resource catalog: [`Provisioner`]
//! resolves or creates the dependency chain a launch plan asks for, and
//! [`Deprovisioner`] discovers a namespace's resources and deletes them in
//! safe order. Both fail fast and leave partial progress recorded for the
//! caller; neither runs as a control loop, and neither is safe to invoke
//! concurrently against the same namespace/name.

mod launch;
mod teardown;

pub use launch::Provisioner;
pub use teardown::Deprovisioner;
