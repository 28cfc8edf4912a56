use chrono::{DateTime, Utc};
use serde::Serialize;

/// The durable, deduplicated, validated record. The canonical link is
/// unique across all persisted jobs for the lifetime of the store.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PersistedJob {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub company_url: Option<String>,
    pub canonical_link: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
    /// Filled in by the enrichment hooks after persistence.
    pub company_size: Option<String>,
    pub found_at: DateTime<Utc>,
}

/// Insert payload produced by the persister once a candidate has passed
/// validation, inference and sanitization.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub company_url: Option<String>,
    pub canonical_link: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
}
