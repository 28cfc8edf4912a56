use chrono::{DateTime, Utc};

use crate::models::search::JobType;

/// A single scraped posting as produced by a source extractor, before
/// validation and deduplication. Ephemeral: either promoted to a
/// persisted job or discarded with a recorded skip reason.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    /// May be empty; the persister attempts to infer it from the link.
    pub company: String,
    pub company_url: Option<String>,
    /// Canonical link, the deduplication key. Candidates without one
    /// are discarded.
    pub link: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<JobType>,
    pub salary: Option<String>,
    /// Id of the source that produced this candidate.
    pub source: String,
}
