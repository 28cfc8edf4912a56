use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::search::SearchSpec;

/// Lifecycle of a run: pending -> running -> {completed, failed, cancelled}.
/// The terminal states never transition further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<RunStatus> {
        match s {
            "pending" => Some(RunStatus::Pending),
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            "cancelled" => Some(RunStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// Classification for candidates discarded during a run. Recorded in the
/// run's histogram so a caller can tell "ran but found nothing" apart from
/// "threw everything away".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkipReason {
    FilterMismatch,
    Duplicate,
    MissingCompanyOrTitle,
    UnreliableCompanyName,
    Exception,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::FilterMismatch => "filter_mismatch",
            SkipReason::Duplicate => "duplicate",
            SkipReason::MissingCompanyOrTitle => "missing_company_or_title",
            SkipReason::UnreliableCompanyName => "unreliable_company_name",
            SkipReason::Exception => "exception",
        }
    }
}

/// Terminal result of one run, written back through the run-control
/// interface during finalization.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub jobs_saved: i32,
    pub sources_succeeded: i32,
    pub sources_failed: i32,
    pub skip_reasons: BTreeMap<String, i64>,
    pub error: Option<String>,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn skip_reasons_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.skip_reasons).unwrap_or(serde_json::Value::Null)
    }
}

/// One row in the run queue. Mirrors the scrape_runs table.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ScrapeRun {
    pub id: i32,
    pub spec: serde_json::Value,
    pub status: String,
    pub jobs_saved: Option<i32>,
    pub sources_succeeded: Option<i32>,
    pub sources_failed: Option<i32>,
    pub skip_reasons: Option<serde_json::Value>,
    pub error: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl ScrapeRun {
    /// Deserialize the stored search spec.
    pub fn search_spec(&self) -> Result<SearchSpec, AppError> {
        serde_json::from_value(self.spec.clone())
            .map_err(|e| AppError::InvalidSpec(format!("run {} has a malformed spec: {e}", self.id)))
    }

    /// Insert a new pending run into the queue.
    pub async fn enqueue(pool: &PgPool, spec: &SearchSpec) -> Result<ScrapeRun, AppError> {
        let spec_json = serde_json::to_value(spec)
            .map_err(|e| AppError::InvalidSpec(format!("spec not serializable: {e}")))?;
        let run = sqlx::query_as::<_, ScrapeRun>(
            "INSERT INTO scrape_runs (spec) VALUES ($1) RETURNING *",
        )
        .bind(spec_json)
        .fetch_one(pool)
        .await?;
        Ok(run)
    }

    /// Atomically claim the next pending run. Uses SELECT FOR UPDATE
    /// SKIP LOCKED so concurrent workers never contend over one row.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<ScrapeRun>, AppError> {
        let run = sqlx::query_as::<_, ScrapeRun>(
            "UPDATE scrape_runs SET status = 'running', started_at = NOW()
             WHERE id = (
                 SELECT id FROM scrape_runs
                 WHERE status = 'pending'
                 ORDER BY requested_at
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING *",
        )
        .fetch_optional(pool)
        .await?;
        Ok(run)
    }

    /// Reset runs left in 'running' by a previous crash back to pending.
    pub async fn recover_stale(pool: &PgPool) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE scrape_runs SET status = 'pending', started_at = NULL WHERE status = 'running'",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark a run as failed before the coordinator ever took it, e.g. when
    /// its stored spec does not deserialize.
    pub async fn mark_failed(pool: &PgPool, id: i32, error: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE scrape_runs SET status = 'failed', error = $2, finished_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Operator-triggered cancellation. Only non-terminal runs are touched.
    pub async fn request_cancel(pool: &PgPool, id: i32) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE scrape_runs SET status = 'cancelled' WHERE id = $1 AND status IN ('pending', 'running')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Run {id} not found or already terminal"
            )));
        }
        Ok(())
    }

    /// Get recent runs for inspection.
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<ScrapeRun>, AppError> {
        let runs = sqlx::query_as::<_, ScrapeRun>(
            "SELECT * FROM scrape_runs ORDER BY requested_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(runs)
    }
}
