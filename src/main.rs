//! Stratus CLI entrypoint.
//!
//! This is the main entrypoint for the stratus command-line tool.

use std::io::Write;
use std::process::ExitCode;

use stratus::aws::AwsCatalog;
use stratus::catalog::Kind;
use stratus::cli::{Cli, Commands, LaunchArgs, OutputFormatter};
use stratus::error::{PlanError, Result};
use stratus::orchestrator::{Deprovisioner, Provisioner};
use stratus::plan::{DeletionStatus, LaunchPlan, LaunchSpec};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Launch(args) => cmd_launch(args, cli.region.as_deref(), &formatter).await,
        Commands::Delete {
            namespace,
            name,
            yes,
        } => cmd_delete(&namespace, name.as_deref(), yes, cli.region.as_deref(), &formatter).await,
        Commands::Get { namespace, kind } => {
            cmd_get(&namespace, kind, cli.region.as_deref(), &formatter).await
        }
    }
}

/// Launch capacity.
async fn cmd_launch(
    args: LaunchArgs,
    region: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut plan = resolve_plan(args)?;
    info!(
        "Launching {}/{}",
        plan.metadata.namespace, plan.metadata.name
    );

    let catalog = AwsCatalog::connect(region).await.into_catalog();
    let provisioner = Provisioner::new(&catalog);
    provisioner.launch(&mut plan).await?;

    let output = formatter.format_launch(&plan);
    eprintln!("{output}");

    Ok(())
}

/// Tear down a namespace.
async fn cmd_delete(
    namespace: &str,
    name: Option<&str>,
    auto_approve: bool,
    region: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let catalog = AwsCatalog::connect(region).await.into_catalog();
    let deprovisioner = Deprovisioner::new(&catalog);

    let spec = deprovisioner.plan(namespace, name).await?;
    if spec.is_empty() {
        eprintln!("Nothing to delete in namespace '{namespace}'.");
        return Ok(());
    }

    eprintln!("The following resources will be deleted:");
    for (kind, resources) in &spec.resources {
        for resource in resources {
            eprintln!("  - {kind} {}", resource.id);
        }
    }

    // Confirm
    if !auto_approve {
        eprint!("\nThis action is IRREVERSIBLE. Type 'delete' to confirm: ");
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != "delete" {
            eprintln!("Deletion cancelled.");
            return Ok(());
        }
    }

    let mut status = DeletionStatus::default();
    let result = deprovisioner.execute(&spec, &mut status).await;
    if let Err(ref e) = result {
        error!("Deletion stopped early: {e}");
    }

    let output = formatter.format_deletion(&spec, &status);
    eprintln!("{output}");

    result
}

/// List owned resources.
async fn cmd_get(
    namespace: &str,
    kind: Option<Kind>,
    region: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let catalog = AwsCatalog::connect(region).await.into_catalog();
    let deprovisioner = Deprovisioner::new(&catalog);

    // Listing asks the same question teardown planning does: what does
    // this namespace own?
    let spec = deprovisioner.plan(namespace, None).await?;

    let output = formatter.format_resources(&spec, kind);
    eprintln!("{output}");

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds the launch plan from either a plan file or the flag form.
fn resolve_plan(args: LaunchArgs) -> Result<LaunchPlan> {
    if let Some(path) = args.file {
        let flag_form = args.namespace.is_some()
            || args.name.is_some()
            || !args.amis.is_empty()
            || !args.instance_types.is_empty()
            || !args.subnets.is_empty()
            || !args.security_groups.is_empty()
            || args.iam_role.is_some()
            || args.user_data_file.is_some();
        if flag_form {
            return Err(PlanError::validation(
                "--file cannot be combined with the selector flags",
                "file",
            )
            .into());
        }
        return LaunchPlan::load(path);
    }

    let namespace = args.namespace.ok_or_else(|| {
        PlanError::validation("--namespace is required without --file", "metadata.namespace")
    })?;
    let name = args
        .name
        .ok_or_else(|| PlanError::validation("--name is required without --file", "metadata.name"))?;

    let user_data = match args.user_data_file {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let plan = LaunchPlan::new(
        namespace,
        name,
        LaunchSpec {
            capacity_type: args.capacity_type,
            image_selectors: args.amis,
            instance_type_selectors: args.instance_types,
            subnet_selectors: args.subnets,
            security_group_selectors: args.security_groups,
            iam_role: args.iam_role,
            user_data,
        },
    );
    plan.validate()?;
    Ok(plan)
}
