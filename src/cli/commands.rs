//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::Kind;
use crate::plan::CapacityType;

/// Stratus - Namespace-scoped EC2 capacity provisioning.
#[derive(Parser, Debug)]
#[command(name = "stratus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// AWS region to operate in (defaults to the environment's region).
    #[arg(short, long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (table, json, yaml).
    #[arg(long, global = true, default_value = "table")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the capacity a plan describes.
    Launch(LaunchArgs),

    /// Tear down every resource a namespace owns.
    Delete {
        /// Namespace whose resources are deleted.
        #[arg(short, long)]
        namespace: String,

        /// Restrict deletion to resources of one plan name.
        #[arg(long)]
        name: Option<String>,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// List the resources a namespace owns.
    Get {
        /// Namespace to list.
        #[arg(short, long)]
        namespace: String,

        /// Restrict output to one resource kind.
        #[arg(short, long, value_enum)]
        kind: Option<Kind>,
    },
}

/// Arguments for the launch command.
///
/// A plan file and the flag form are mutually exclusive; the flag form
/// requires at least a namespace, a name, and one selector for images and
/// instance types.
#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Launch plan file (YAML).
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Namespace every created resource is tagged with.
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Plan name within the namespace.
    #[arg(long)]
    pub name: Option<String>,

    /// AMI selector (repeatable; occurrences are alternatives).
    #[arg(long = "ami", value_name = "SELECTOR")]
    pub amis: Vec<String>,

    /// Instance type selector (repeatable; occurrences are alternatives).
    #[arg(long = "instance-type", value_name = "SELECTOR")]
    pub instance_types: Vec<String>,

    /// Subnet selector (repeatable; supply together with --security-group).
    #[arg(long = "subnet", value_name = "SELECTOR")]
    pub subnets: Vec<String>,

    /// Security group selector (repeatable; supply together with --subnet).
    #[arg(long = "security-group", value_name = "SELECTOR")]
    pub security_groups: Vec<String>,

    /// Purchasing model for the requested capacity.
    #[arg(long, value_enum, default_value = "on-demand")]
    pub capacity_type: CapacityType,

    /// Instance profile name to attach to launched instances.
    #[arg(long)]
    pub iam_role: Option<String>,

    /// File whose contents become instance user data.
    #[arg(long, value_name = "PATH")]
    pub user_data_file: Option<PathBuf>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
    /// YAML output, mirroring the plan file format.
    Yaml,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
