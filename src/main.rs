use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use gridiron_sync::clock::SystemClock;
use gridiron_sync::config::SyncConfig;
use gridiron_sync::scheduler::JobScheduler;
use gridiron_sync::store::JsonFileStore;
use gridiron_sync::sync::{register_default_jobs, SyncService};

#[derive(Debug, Parser)]
#[command(name = "gridiron-sync", about = "Season schedule reconciliation engine")]
struct Cli {
    /// Path of the JSON game store.
    #[arg(long, default_value = "games.json")]
    games_file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One comprehensive pass: schedule + scores + log entry.
    Sync,
    /// One schedule-only pass.
    Schedule,
    /// One score-only pass.
    Scores,
    /// Run the job scheduler until interrupted.
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured logging with tracing
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_current_span(false)
        .with_target(false)
        .with_ansi(false)
        .try_init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error; refusing to start");
            return ExitCode::from(2);
        }
    };

    let store = match JsonFileStore::open(&cli.games_file) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, path = %cli.games_file.display(), "Failed to open game store");
            return ExitCode::from(2);
        }
    };

    let clock = Arc::new(SystemClock);
    let service = Arc::new(SyncService::new(config.clone(), store, clock.clone()));

    match cli.command {
        Command::Sync => {
            let report = service.run_comprehensive_sync().await;
            info!(
                added = report.schedule.added + report.scores.added,
                updated = report.schedule.updated + report.scores.updated,
                errors = report.errors().len(),
                "Sync finished"
            );
            exit_for_errors(&report.errors())
        }
        Command::Schedule => {
            let outcome = service.run_schedule_sync().await;
            info!(
                added = outcome.added,
                updated = outcome.updated,
                errors = outcome.errors.len(),
                "Schedule sync finished"
            );
            exit_for_errors(&outcome.errors)
        }
        Command::Scores => {
            let outcome = service.run_score_sync().await;
            info!(
                updated = outcome.updated,
                errors = outcome.errors.len(),
                source = ?outcome.source,
                "Score sync finished"
            );
            exit_for_errors(&outcome.errors)
        }
        Command::Serve => {
            let scheduler = JobScheduler::new(config.timezone, clock);
            register_default_jobs(&scheduler, service.clone());

            if config.sync_on_startup {
                info!("Running startup sync");
                let report = service.run_comprehensive_sync().await;
                info!(total = report.total_changes(), "Startup sync complete");
            }

            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            scheduler.shutdown();
            ExitCode::SUCCESS
        }
    }
}

fn exit_for_errors(errors: &[String]) -> ExitCode {
    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        for e in errors {
            error!(error = %e, "Sync error");
        }
        ExitCode::FAILURE
    }
}
