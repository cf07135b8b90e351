//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::collections::BTreeMap;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::catalog::{Kind, Resource};
use crate::plan::{DeletionSpec, DeletionStatus, LaunchPlan};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Launched instance row for table display.
#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "State")]
    state: String,
}

/// Generic resource row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "VPC")]
    vpc: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&Resource> for InstanceRow {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.clone(),
            name: resource.name_tag().unwrap_or("-").to_string(),
            zone: resource.zone.as_deref().unwrap_or("-").to_string(),
            state: colorize_state(resource.state.as_deref().unwrap_or("-")),
        }
    }
}

impl From<&Resource> for ResourceRow {
    fn from(resource: &Resource) -> Self {
        Self {
            kind: resource.kind.to_string(),
            id: resource.id.clone(),
            name: OutputFormatter::truncate(resource.name_tag().unwrap_or("-"), 40),
            vpc: resource.vpc_id.as_deref().unwrap_or("-").to_string(),
            state: colorize_state(resource.state.as_deref().unwrap_or("-")),
        }
    }
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a launched plan, status included.
    #[must_use]
    pub fn format_launch(&self, plan: &LaunchPlan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Yaml => serde_yaml::to_string(plan).unwrap_or_default(),
            OutputFormat::Table => Self::format_launch_text(plan),
        }
    }

    /// Formats a launched plan as text.
    fn format_launch_text(plan: &LaunchPlan) -> String {
        let mut output = String::new();

        let _ = write!(
            output,
            "\n{} Launched {}/{}\n\n",
            "\u{2713}".green(),
            plan.metadata.namespace,
            plan.metadata.name
        );

        let rows: Vec<InstanceRow> = plan.status.instances.iter().map(InstanceRow::from).collect();
        if rows.is_empty() {
            output.push_str("   No instances launched.\n");
        } else {
            let table = Table::new(rows).to_string();
            output.push_str(&table);
            output.push('\n');
        }

        let _ = write!(
            output,
            "\nResolved: {} image(s), {} instance type(s), {} subnet(s), {} security group(s)\n",
            plan.status.images.len(),
            plan.status.instance_types.len(),
            plan.status.subnets.len(),
            plan.status.security_groups.len()
        );

        if let Some(launched_at) = plan.status.launched_at {
            let _ = writeln!(output, "Launched at: {}", launched_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }

        output
    }

    /// Formats discovered resources, optionally narrowed to one kind.
    #[must_use]
    pub fn format_resources(&self, spec: &DeletionSpec, kind: Option<Kind>) -> String {
        let selected: BTreeMap<Kind, &Vec<Resource>> = spec
            .resources
            .iter()
            .filter(|(candidate, _)| kind.is_none_or(|wanted| **candidate == wanted))
            .map(|(candidate, resources)| (*candidate, resources))
            .collect();

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&selected).unwrap_or_default(),
            OutputFormat::Yaml => serde_yaml::to_string(&selected).unwrap_or_default(),
            OutputFormat::Table => Self::format_resources_text(&spec.namespace, &selected),
        }
    }

    /// Formats discovered resources as a flat table.
    fn format_resources_text(namespace: &str, selected: &BTreeMap<Kind, &Vec<Resource>>) -> String {
        let mut output = String::new();

        let _ = write!(output, "\nNamespace: {namespace}\n\n");

        let rows: Vec<ResourceRow> = selected
            .values()
            .flat_map(|resources| resources.iter())
            .map(ResourceRow::from)
            .collect();

        if rows.is_empty() {
            output.push_str("   No resources found.\n");
            return output;
        }

        let count = rows.len();
        let table = Table::new(rows).to_string();
        output.push_str(&table);
        output.push('\n');

        let _ = write!(output, "\n{count} resource(s)\n");

        output
    }

    /// Formats the outcome of a deletion run.
    #[must_use]
    pub fn format_deletion(&self, spec: &DeletionSpec, status: &DeletionStatus) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&deletion_report(spec, status)).unwrap_or_default()
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&deletion_report(spec, status)).unwrap_or_default()
            }
            OutputFormat::Table => Self::format_deletion_text(spec, status),
        }
    }

    /// Formats a deletion outcome as text.
    fn format_deletion_text(spec: &DeletionSpec, status: &DeletionStatus) -> String {
        let total = spec.total();
        let deleted = status.completed_count();

        if deleted >= total {
            return format!(
                "{} Deleted {total} resource(s) from namespace '{}'.\n",
                "\u{2713}".green(),
                spec.namespace
            );
        }

        let mut output = format!(
            "{} Deleted {deleted}/{total} resource(s) from namespace '{}'; remaining:\n",
            "\u{26a0}".yellow(),
            spec.namespace
        );
        for (kind, resources) in &spec.resources {
            for resource in resources {
                if !status.is_completed(*kind, &resource.id) {
                    let _ = writeln!(output, "   - {kind} {}", resource.id);
                }
            }
        }

        output
    }

    /// Truncates a string to a maximum length.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.len() <= max_len {
            s.to_string()
        } else {
            format!("{}...", &s[..max_len - 3])
        }
    }
}

/// Colors a provider state string by lifecycle phase.
fn colorize_state(state: &str) -> String {
    match state {
        "running" | "available" | "attached" | "active" => state.green().to_string(),
        "pending" | "creating" | "starting" => state.yellow().to_string(),
        "shutting-down" | "stopping" | "stopped" | "terminated" | "deleting" | "deleted" => {
            state.red().to_string()
        }
        _ => state.dimmed().to_string(),
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct DeletionJson {
    namespace: String,
    name: Option<String>,
    total: usize,
    deleted: usize,
    remaining: Vec<RemainingJson>,
}

#[derive(serde::Serialize)]
struct RemainingJson {
    kind: Kind,
    id: String,
}

fn deletion_report(spec: &DeletionSpec, status: &DeletionStatus) -> DeletionJson {
    let remaining = spec
        .resources
        .iter()
        .flat_map(|(kind, resources)| resources.iter().map(move |resource| (*kind, resource)))
        .filter(|(kind, resource)| !status.is_completed(*kind, &resource.id))
        .map(|(kind, resource)| RemainingJson {
            kind,
            id: resource.id.clone(),
        })
        .collect();

    DeletionJson {
        namespace: spec.namespace.clone(),
        name: spec.name.clone(),
        total: spec.total(),
        deleted: status.completed_count(),
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::plan::{LaunchSpec, Metadata};

    fn plan_with_instance() -> LaunchPlan {
        let mut plan = LaunchPlan {
            metadata: Metadata {
                namespace: "batch".to_string(),
                name: "workers".to_string(),
            },
            spec: LaunchSpec::default(),
            status: crate::plan::LaunchStatus::default(),
        };
        plan.status.instances.push(
            Resource::new(Kind::Instance, "i-0abc")
                .with_zone("us-east-1a")
                .with_state("running"),
        );
        plan
    }

    #[test]
    fn launch_table_lists_instances() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Table);

        let output = formatter.format_launch(&plan_with_instance());

        assert!(output.contains("Launched batch/workers"));
        assert!(output.contains("i-0abc"));
        assert!(output.contains("us-east-1a"));
    }

    #[test]
    fn launch_json_is_the_serialized_plan() {
        let formatter = OutputFormatter::new(OutputFormat::Json);

        let output = formatter.format_launch(&plan_with_instance());
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(parsed["metadata"]["namespace"], "batch");
        assert_eq!(parsed["status"]["instances"][0]["id"], "i-0abc");
    }

    #[test]
    fn resource_listing_narrows_to_one_kind() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Table);

        let mut spec = DeletionSpec::new("batch", None);
        spec.insert(Kind::Vpc, vec![Resource::new(Kind::Vpc, "vpc-1")]);
        spec.insert(Kind::Subnet, vec![Resource::new(Kind::Subnet, "subnet-1")]);

        let all = formatter.format_resources(&spec, None);
        assert!(all.contains("vpc-1"));
        assert!(all.contains("subnet-1"));

        let vpcs_only = formatter.format_resources(&spec, Some(Kind::Vpc));
        assert!(vpcs_only.contains("vpc-1"));
        assert!(!vpcs_only.contains("subnet-1"));
    }

    #[test]
    fn deletion_text_reports_partial_runs() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Table);

        let mut spec = DeletionSpec::new("batch", None);
        spec.insert(
            Kind::Instance,
            vec![
                Resource::new(Kind::Instance, "i-1"),
                Resource::new(Kind::Instance, "i-2"),
            ],
        );

        let mut status = DeletionStatus::default();
        status.mark_completed(Kind::Instance, "i-1");

        let output = formatter.format_deletion(&spec, &status);
        assert!(output.contains("1/2"));
        assert!(output.contains("i-2"));
        assert!(!output.contains("- instance i-1"));
    }

    #[test]
    fn deletion_json_counts_remaining_resources() {
        let formatter = OutputFormatter::new(OutputFormat::Json);

        let mut spec = DeletionSpec::new("batch", Some("workers".to_string()));
        spec.insert(Kind::Vpc, vec![Resource::new(Kind::Vpc, "vpc-1")]);

        let output = formatter.format_deletion(&spec, &DeletionStatus::default());
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(parsed["total"], 1);
        assert_eq!(parsed["deleted"], 0);
        assert_eq!(parsed["remaining"][0]["kind"], "vpc");
    }
}
