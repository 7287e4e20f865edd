use anyhow::Result;
use chrono::Local;
use gold_watcher::orchestrator::EXIT_ABORTED;
use gold_watcher::{AppConfig, Orchestrator, RunOutcome, RunState};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting Gold Watcher...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Run state {} -> {}: {}", RunState::Init, RunState::FailedFatal, e);
            return ExitCode::from(RunOutcome::fatal(&e).exit_code());
        }
    };

    // A panic inside the run surfaces as a JoinError instead of tearing down main.
    let now = Local::now().naive_local();
    let handle = tokio::spawn(async move { Orchestrator::start(&config, now).await });

    match handle.await {
        Ok(outcome) => {
            if outcome.state == RunState::Done {
                info!(
                    "Finished: {}/{} products scanned, report {}",
                    outcome.report.success_count,
                    outcome.report.catalog_count,
                    if outcome.notified { "delivered" } else { "not delivered" }
                );
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            error!("Run aborted unexpectedly: {}", e);
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gold_watcher=info".parse()?),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
