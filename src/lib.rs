// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Stratus
//!
//! A namespace-scoped provisioning and teardown engine for EC2 capacity.
//!
//! ## Overview
//!
//! Stratus launches compute capacity described by a small declarative plan
//! and later tears down everything it created, without keeping any state of
//! its own:
//!
//! - Resources are located with a compact selector grammar instead of
//!   hard-coded identifiers
//! - Missing network infrastructure is bootstrapped on first launch
//! - Every created resource carries ownership tags, and teardown is driven
//!   entirely by discovering those tags
//!
//! ## Architecture
//!
//! The system is built around **selector resolution over tagged cloud
//! resources**:
//!
//! 1. **Launch plan**: namespace, name, selectors, and launch options
//! 2. **Resolution**: selectors compile to predicates and resolve against
//!    the provider catalogs
//! 3. **Orchestration**: resolved resources are wired into a launch
//!    template and an instant fleet, or deleted leaves-first
//!
//! ## Modules
//!
//! - [`selector`]: Selector grammar parsing
//! - [`filter`]: Selector-to-predicate compilation
//! - [`catalog`]: Provider-neutral resource model and catalog traits
//! - [`aws`]: EC2 and SSM catalog adapters
//! - [`plan`]: Launch and deletion plans
//! - [`orchestrator`]: Provisioning and teardown sequencing
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! metadata:
//!   namespace: batch
//!   name: workers
//! spec:
//!   capacity_type: spot
//!   image_selectors:
//!     - 'id:al2023'
//!   instance_type_selectors:
//!     - 'vcpus:4-8,memory:8GiB-'
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod aws;
pub mod catalog;
pub mod cidr;
pub mod cli;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod plan;
pub mod quantity;
pub mod selector;
pub mod tags;

// ============================================================================
// Re-exports
// ============================================================================

pub use aws::AwsCatalog;
pub use catalog::{Catalog, Kind, Resource};
pub use cli::{Cli, Commands, OutputFormatter};
pub use error::{Result, StratusError};
pub use orchestrator::{Deprovisioner, Provisioner};
pub use plan::{CapacityType, DeletionSpec, DeletionStatus, LaunchPlan, LaunchSpec};
pub use selector::{Selector, SelectorSet};
