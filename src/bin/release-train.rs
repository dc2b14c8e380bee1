//! release-train CLI
//!
//! Dependency-ordered multi-registry release orchestrator

use anyhow::Result;
use clap::{Parser, Subcommand};
use release_train::{
    DEFAULT_PLAN_FILE, Orchestrator, OrchestratorOptions, PlanLoader, RetryOptions,
    SecureTokenManager,
};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::process;

/// Dependency-ordered multi-registry release orchestrator
#[derive(Parser)]
#[command(name = "release-train")]
#[command(version = "0.1.0")]
#[command(about = "Dependency-ordered multi-registry release orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a release plan
    Run {
        /// Plan file (defaults to release-plan.yml)
        #[arg(value_name = "PLAN")]
        plan: Option<PathBuf>,

        /// Keep going after a failed unit
        #[arg(long)]
        continue_on_error: bool,

        /// Maximum publish attempts per unit for transient network failures
        #[arg(long, default_value = "3")]
        max_attempts: u32,
    },

    /// Validate a plan and its credentials without publishing
    Check {
        /// Plan file (defaults to release-plan.yml)
        #[arg(value_name = "PLAN")]
        plan: Option<PathBuf>,
    },

    /// Print the ordered publish units of a plan
    Show {
        /// Plan file (defaults to release-plan.yml)
        #[arg(value_name = "PLAN")]
        plan: Option<PathBuf>,
    },
}

fn plan_path(plan: Option<PathBuf>) -> PathBuf {
    plan.unwrap_or_else(|| PathBuf::from(DEFAULT_PLAN_FILE))
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            plan,
            continue_on_error,
            max_attempts,
        } => run_command(plan_path(plan), continue_on_error, max_attempts).await,
        Commands::Check { plan } => check_command(plan_path(plan)).await,
        Commands::Show { plan } => show_command(plan_path(plan)).await,
    }
}

async fn run_command(
    plan_path: PathBuf,
    continue_on_error: bool,
    max_attempts: u32,
) -> Result<i32> {
    println!("\n🚂 release-train\n");

    let plan = PlanLoader::load(&plan_path).await?;
    println!(
        "Plan: {} units across {} registries",
        plan.units.len(),
        plan.registries.len()
    );

    let options = OrchestratorOptions {
        continue_on_error,
        retry: RetryOptions {
            max_attempts,
            ..RetryOptions::default()
        },
        ..OrchestratorOptions::default()
    };

    let orchestrator = Orchestrator::from_plan(plan, options);

    // Ctrl-C requests a stop at the next unit boundary; a publish already
    // in flight is never interrupted
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⚠️  Stop requested; the in-flight unit will finish first");
            cancel.cancel();
        }
    });

    let report = orchestrator.run().await?;

    println!("\n{}", report.summary());

    Ok(report.exit_code())
}

async fn check_command(plan_path: PathBuf) -> Result<i32> {
    println!("\n🔍 Plan Check\n");

    let plan = match PlanLoader::load(&plan_path).await {
        Ok(plan) => plan,
        Err(e) => {
            println!("❌ {}", e);
            return Ok(1);
        }
    };

    println!("✅ Plan valid: {} units\n", plan.units.len());

    let tokens = SecureTokenManager::new();
    let mut all_present = true;

    let mut registries: Vec<_> = plan.registries.values().collect();
    registries.sort_by(|a, b| a.name.cmp(&b.name));

    for registry in registries {
        let env_name = tokens.token_env(registry);
        match tokens.get_token(registry) {
            Some(token) => {
                println!(
                    "  ✅ {}: token {} ({})",
                    registry.name,
                    tokens.mask_token(token.expose_secret()),
                    env_name
                );
            }
            None => {
                println!("  ❌ {}: no token in {}", registry.name, env_name);
                all_present = false;
            }
        }
    }

    println!();
    Ok(if all_present { 0 } else { 1 })
}

async fn show_command(plan_path: PathBuf) -> Result<i32> {
    println!("\n📦 Release Plan\n");

    let plan = PlanLoader::load(&plan_path).await?;
    let total = plan.units.len();

    for (index, unit) in plan.units.iter().enumerate() {
        let build = unit
            .build
            .map(|kind| format!(", build: {}", kind.as_str()))
            .unwrap_or_default();

        println!(
            "  [{}/{}] {} {} → {} (settle: {}s{}, on_failure: {:?})",
            index + 1,
            total,
            unit.package.name,
            unit.package.version,
            unit.registry,
            unit.settle_delay.as_secs(),
            build,
            unit.on_failure
        );
    }

    println!();
    Ok(0)
}
