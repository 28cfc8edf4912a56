//! Store and run-control interfaces, plus their Postgres implementation.
//!
//! The store is the single source of truth for canonical-link
//! uniqueness: a violation of the unique constraint is surfaced as
//! `InsertOutcome::DuplicateLink` so the persister can record a
//! duplicate skip instead of failing the run.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::enrich::Contact;
use crate::error::AppError;
use crate::models::job::{NewJob, PersistedJob};
use crate::models::run::{RunOutcome, RunStatus};

#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(PersistedJob),
    /// The canonical link already exists; mapped to a duplicate skip.
    DuplicateLink,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn exists(&self, canonical_link: &str) -> Result<bool, AppError>;
    async fn insert(&self, job: NewJob) -> Result<InsertOutcome, AppError>;
    async fn set_company_size(&self, job_id: i32, size: &str) -> Result<(), AppError>;
    async fn add_contacts(&self, job_id: i32, contacts: &[Contact]) -> Result<(), AppError>;
}

/// Authoritative run status, polled by the coordinator for cancellation
/// and written during finalization.
#[async_trait]
pub trait RunControl: Send + Sync {
    /// None means the run record has disappeared, which the coordinator
    /// treats as cancellation.
    async fn status(&self, run_id: i32) -> Result<Option<RunStatus>, AppError>;
    async fn mark_running(&self, run_id: i32) -> Result<(), AppError>;
    async fn finalize(&self, run_id: i32, outcome: &RunOutcome) -> Result<(), AppError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn exists(&self, canonical_link: &str) -> Result<bool, AppError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM jobs WHERE canonical_link = $1)")
                .bind(canonical_link)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    async fn insert(&self, job: NewJob) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query_as::<_, PersistedJob>(
            "INSERT INTO jobs (title, company, company_url, canonical_link, location, description, job_type, salary, source, posted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.company_url)
        .bind(&job.canonical_link)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.job_type)
        .bind(&job.salary)
        .bind(&job.source)
        .bind(job.posted_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(persisted) => Ok(InsertOutcome::Inserted(persisted)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::DuplicateLink)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_company_size(&self, job_id: i32, size: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE jobs SET company_size = $2 WHERE id = $1")
            .bind(job_id)
            .bind(size)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_contacts(&self, job_id: i32, contacts: &[Contact]) -> Result<(), AppError> {
        for contact in contacts {
            sqlx::query(
                "INSERT INTO job_contacts (job_id, name, title, email, profile_url) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(job_id)
            .bind(&contact.name)
            .bind(&contact.title)
            .bind(&contact.email)
            .bind(&contact.profile_url)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RunControl for PgStore {
    async fn status(&self, run_id: i32) -> Result<Option<RunStatus>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM scrape_runs WHERE id = $1")
                .bind(run_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(status,)| RunStatus::parse(&status)))
    }

    async fn mark_running(&self, run_id: i32) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE scrape_runs SET status = 'running', started_at = COALESCE(started_at, NOW()) WHERE id = $1 AND status IN ('pending', 'running')",
        )
        .bind(run_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn finalize(&self, run_id: i32, outcome: &RunOutcome) -> Result<(), AppError> {
        // A terminal status is never overwritten with a different one:
        // only pending/running rows, or rows already in the same
        // terminal state (operator-cancelled), accept the update.
        sqlx::query(
            "UPDATE scrape_runs
             SET status = $2, jobs_saved = $3, sources_succeeded = $4, sources_failed = $5,
                 skip_reasons = $6, error = $7, finished_at = NOW(), duration_ms = $8
             WHERE id = $1 AND (status IN ('pending', 'running') OR status = $2)",
        )
        .bind(run_id)
        .bind(outcome.status.as_str())
        .bind(outcome.jobs_saved)
        .bind(outcome.sources_succeeded)
        .bind(outcome.sources_failed)
        .bind(outcome.skip_reasons_json())
        .bind(&outcome.error)
        .bind(outcome.duration.as_millis() as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
