use clap::Parser;

use crate::models::search::{JobTypeFilter, LocationFilter, SearchSpec, TimeWindow};

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscout", about = "Concurrent job-posting scrape engine")]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute one search immediately and report the outcome
    Run {
        #[command(flatten)]
        search: SearchArgs,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },
    /// Insert a pending run for a worker to pick up
    Enqueue {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Request cancellation of a pending or running run
    Cancel {
        /// Run id to cancel
        #[arg(long)]
        run_id: i32,
    },
    /// Show recent runs and their statistics
    Recent {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Poll the run queue and execute claimed runs until interrupted
    Worker {
        /// Poll interval in seconds
        #[arg(long, env = "POLL_INTERVAL", default_value = "10")]
        poll_interval: u64,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Keyword to match against posting titles; repeatable
    #[arg(long = "keyword", required = true)]
    pub keywords: Vec<String>,

    /// Job type filter
    #[arg(long, value_enum, default_value = "all")]
    pub job_type: JobTypeFilter,

    /// Posting age window
    #[arg(long, value_enum, default_value = "all")]
    pub time_window: TimeWindow,

    /// Market filter
    #[arg(long, value_enum, default_value = "all")]
    pub location: LocationFilter,

    /// Source id to scrape; repeatable, empty means all sources
    #[arg(long = "source")]
    pub sources: Vec<String>,
}

impl SearchArgs {
    pub fn into_spec(self) -> SearchSpec {
        SearchSpec {
            keywords: self.keywords,
            job_type: self.job_type,
            time_window: self.time_window,
            location: self.location,
            sources: self.sources,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Worker-pool cap for concurrent source tasks
    #[arg(long, env = "MAX_WORKERS", default_value = "6")]
    pub max_workers: usize,

    /// Hard timeout per source task, in seconds
    #[arg(long, env = "SOURCE_TIMEOUT", default_value = "120")]
    pub source_timeout: u64,

    /// Plain-HTTP attempts per fetch before giving up or escalating
    #[arg(long, env = "FETCH_ATTEMPTS", default_value = "3")]
    pub fetch_attempts: u32,

    /// Proxy URLs to rotate through; repeatable or comma-separated
    #[arg(long = "proxy", env = "PROXIES", value_delimiter = ',')]
    pub proxies: Vec<String>,

    /// Enable the headless-browser fallback for JS-rendered sources
    #[arg(long, env = "ENABLE_BROWSER", default_value = "false")]
    pub enable_browser: bool,

    /// Base URL of the company-size/contact lookup service
    #[arg(long, env = "ENRICHMENT_URL")]
    pub enrichment_url: Option<String>,
}
