mod config;
mod coordinator;
mod db;
mod enrich;
mod error;
mod fetch;
mod models;
mod persist;
mod sources;
mod store;
#[cfg(test)]
mod testing;
mod validate;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config, ScrapeArgs};
use crate::coordinator::{RunConfig, RunManager};
use crate::enrich::{Enrichment, HttpEnrichment, NoopEnrichment};
use crate::fetch::browser::{BrowserFetcher, BrowserOptions};
use crate::fetch::identity::IdentityPool;
use crate::fetch::{FetchConfig, Fetcher, PageFetcher};
use crate::models::run::ScrapeRun;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobscout=info")),
        )
        .init();

    let config = Config::parse();

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
        tracing::info!("Migrations complete");
    }

    match config.command {
        Command::Run { search, scrape } => {
            let spec = search.into_spec();
            let run = ScrapeRun::enqueue(&pool, &spec).await?;
            tracing::info!("Starting run {}", run.id);
            let manager = build_manager(pool.clone(), &scrape)?;
            let sources = sources::resolve(&spec.sources);
            manager.execute(run.id, &spec, sources).await;
        }
        Command::Enqueue { search } => {
            let run = ScrapeRun::enqueue(&pool, &search.into_spec()).await?;
            tracing::info!("Enqueued run {}", run.id);
        }
        Command::Cancel { run_id } => {
            ScrapeRun::request_cancel(&pool, run_id).await?;
            tracing::info!("Cancellation requested for run {run_id}");
        }
        Command::Recent { limit } => {
            for run in ScrapeRun::recent(&pool, limit).await? {
                println!(
                    "run {:>5}  {:<10} requested {}  saved={} sources_ok={} sources_failed={}{}",
                    run.id,
                    run.status,
                    run.requested_at.format("%Y-%m-%d %H:%M:%S"),
                    run.jobs_saved.unwrap_or(0),
                    run.sources_succeeded.unwrap_or(0),
                    run.sources_failed.unwrap_or(0),
                    run.error
                        .as_deref()
                        .map(|e| format!("  error: {e}"))
                        .unwrap_or_default()
                );
            }
        }
        Command::Worker {
            poll_interval,
            scrape,
        } => {
            let manager = build_manager(pool.clone(), &scrape)?;
            worker::run(pool, manager, poll_interval).await?;
        }
    }

    Ok(())
}

fn build_manager(pool: PgPool, scrape: &ScrapeArgs) -> anyhow::Result<RunManager> {
    let store = Arc::new(PgStore::new(pool));

    let identity = Arc::new(IdentityPool::new(scrape.proxies.clone()));
    let fetch_config = FetchConfig {
        max_attempts: scrape.fetch_attempts,
        ..FetchConfig::default()
    };
    let mut fetcher = Fetcher::new(fetch_config, identity);
    if scrape.enable_browser {
        fetcher = fetcher.with_browser(BrowserFetcher::new(BrowserOptions::default()));
    }
    let fetcher: Arc<dyn PageFetcher> = Arc::new(fetcher);

    let enrichment: Arc<dyn Enrichment> = match &scrape.enrichment_url {
        Some(url) => Arc::new(HttpEnrichment::new(url.clone())?),
        None => Arc::new(NoopEnrichment),
    };

    let run_config = RunConfig {
        max_workers: scrape.max_workers,
        source_timeout: Duration::from_secs(scrape.source_timeout),
        ..RunConfig::default()
    };

    Ok(RunManager::new(
        fetcher,
        store.clone(),
        store,
        enrichment,
        run_config,
    ))
}
