//! Worker loop: claims pending runs from the queue and executes them.

use std::time::Duration;

use sqlx::PgPool;

use crate::coordinator::RunManager;
use crate::models::run::ScrapeRun;
use crate::sources;

/// Poll for pending runs and process them until interrupted. Recovers
/// stale runs on startup and exits gracefully on SIGTERM/SIGINT.
pub async fn run(pool: PgPool, manager: RunManager, poll_interval: u64) -> anyhow::Result<()> {
    let stale = ScrapeRun::recover_stale(&pool).await?;
    if stale > 0 {
        tracing::warn!("Recovered {stale} stale 'running' runs");
    }

    tracing::info!("Worker started, polling every {poll_interval}s");

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, exiting gracefully");
                break;
            }
            result = async {
                if let Some(run) = ScrapeRun::claim_next(&pool).await? {
                    tracing::info!("Claimed run {}", run.id);
                    process_run(&pool, &manager, &run).await;
                }
                tokio::time::sleep(Duration::from_secs(poll_interval)).await;
                Ok::<(), anyhow::Error>(())
            } => {
                result?;
            }
        }
    }

    Ok(())
}

async fn process_run(pool: &PgPool, manager: &RunManager, run: &ScrapeRun) {
    let spec = match run.search_spec() {
        Ok(spec) => spec,
        Err(e) => {
            let msg = e.to_string();
            tracing::error!("{msg}");
            let _ = ScrapeRun::mark_failed(pool, run.id, &msg).await;
            return;
        }
    };

    let sources = sources::resolve(&spec.sources);
    manager.execute(run.id, &spec, sources).await;
}
