//! `grantplan` — apply a precomputed role-assignment plan.
//!
//! Loads a plan JSON document, connects to the configured cloud's
//! authorization surface with an already-issued access token, and drives
//! the plan-application engine. Exit code 0 means every addition was
//! created or already existed; 1 means at least one addition exhausted its
//! retry budget or could not be resolved.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use grantplan_arm::{ArmClient, CloudEnvironment};
use grantplan_core::{Plan, PlanApplier, PlanStatus, RetryConfig};

/// Environment variable holding the bearer token for the management
/// endpoint. Authentication itself is out of scope for this tool.
const TOKEN_ENV_VAR: &str = "GRANTPLAN_ACCESS_TOKEN";

#[derive(Debug, Parser)]
#[command(name = "grantplan", version, about = "Apply precomputed role-assignment plans")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply the removals and additions encoded in a plan file.
    Apply(ApplyArgs),
}

#[derive(Debug, clap::Args)]
struct ApplyArgs {
    /// Path to the plan JSON document. A missing file means no plan was
    /// produced for this run and the deployment is skipped.
    #[arg(long)]
    plan: PathBuf,

    /// Cloud environment to target.
    #[arg(long, default_value_t = CloudEnvironment::Public)]
    cloud: CloudEnvironment,

    /// Tenant the session was established against (diagnostic).
    #[arg(long)]
    tenant: Option<String>,

    /// Whether the session was established interactively (diagnostic).
    #[arg(long)]
    interactive: bool,

    /// Total creation attempts per addition, including the first.
    #[arg(long, default_value_t = grantplan_core::DEFAULT_MAX_ATTEMPTS)]
    retry_attempts: u32,

    /// Fixed delay between failed creation attempts, in seconds.
    #[arg(long, default_value_t = grantplan_core::DEFAULT_RETRY_INTERVAL.as_secs())]
    retry_interval_secs: u64,

    /// Print what would be applied without touching the backend.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Apply(args) => apply(args).await,
    }
}

async fn apply(args: ApplyArgs) -> anyhow::Result<ExitCode> {
    info!(
        cloud = %args.cloud,
        tenant = args.tenant.as_deref().unwrap_or("<default>"),
        interactive = args.interactive,
        "starting role-assignment deployment"
    );

    let plan = Plan::load_from_path(&args.plan)
        .with_context(|| format!("loading plan from {}", args.plan.display()))?;

    if args.dry_run {
        return Ok(dry_run(plan.as_ref()));
    }

    let report = match plan {
        Some(ref plan) => {
            let token = std::env::var(TOKEN_ENV_VAR)
                .with_context(|| format!("{TOKEN_ENV_VAR} must hold a management access token"))?;
            let backend = ArmClient::for_environment(args.cloud, token)
                .context("constructing management client")?;
            let retry = RetryConfig::new()
                .with_max_attempts(args.retry_attempts)
                .with_interval(Duration::from_secs(args.retry_interval_secs));
            PlanApplier::new(&backend)
                .with_retry(retry)
                .apply(Some(plan))
                .await
        }
        None => grantplan_core::ApplyReport::skipped(),
    };

    match report.status {
        PlanStatus::Skipped => {
            info!("deployment skipped: no plan file at {}", args.plan.display());
        }
        PlanStatus::Applied { created_on } => {
            let created = report
                .additions
                .iter()
                .filter(|r| r.outcome.is_success())
                .count();
            info!(
                plan_created_on = %created_on,
                removals = report.removals.len(),
                additions_ok = created,
                additions_total = report.additions.len(),
                "deployment finished"
            );
        }
    }

    if report.is_degraded() {
        warn!("one or more additions could not be applied; see warnings above");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn dry_run(plan: Option<&Plan>) -> ExitCode {
    let Some(plan) = plan else {
        println!("no plan file; nothing to apply");
        return ExitCode::SUCCESS;
    };

    println!("plan created on {}", plan.created_on);
    for record in &plan.role_assignments.removed {
        println!(
            "would remove: {} from '{}' at {}",
            record.role_display_name,
            record.display_name,
            record.scope
        );
    }
    for record in &plan.role_assignments.added {
        let principal = record.principal_id.as_ref().map_or_else(
            || {
                record
                    .assignment_id
                    .as_ref()
                    .map_or("<unknown>".to_string(), |id| format!("identity of {id}"))
            },
            ToString::to_string,
        );
        println!(
            "would add: {} to {} at {}",
            record.role_display_name, principal, record.scope
        );
    }
    ExitCode::SUCCESS
}
