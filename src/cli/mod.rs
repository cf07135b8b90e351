//! CLI module for the stratus tool.
//!
//! This module provides the command-line interface for launching and
//! tearing down namespace-scoped capacity.

mod commands;
mod output;

pub use commands::{Cli, Commands, LaunchArgs, OutputFormat};
pub use output::OutputFormatter;
