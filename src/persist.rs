//! Deduplication and persistence of validated candidates.
//!
//! Data-quality problems are always skip outcomes, never errors; only
//! genuine store failures propagate and abort the run.

use std::sync::Arc;

use url::Url;

use crate::error::AppError;
use crate::models::candidate::Candidate;
use crate::models::job::{NewJob, PersistedJob};
use crate::models::run::SkipReason;
use crate::store::{InsertOutcome, JobStore};

/// Hosts that identify a job board or ATS rather than an employer.
/// Links on these hosts never yield a company name, and company URLs
/// pointing at them are dropped.
const JOB_BOARD_HOSTS: &[&str] = &[
    "linkedin.com",
    "indeed.com",
    "glassdoor.com",
    "monster.com",
    "ziprecruiter.com",
    "remoteok.com",
    "remotive.com",
    "weworkremotely.com",
    "wellfound.com",
    "angel.co",
    "greenhouse.io",
    "lever.co",
    "workable.com",
    "ashbyhq.com",
    "bamboohr.com",
    "smartrecruiters.com",
    "myworkdayjobs.com",
    "icims.com",
    "jobvite.com",
];

/// Host labels that are registry suffixes rather than names, stepped
/// over when inferring a company from a hostname.
const GENERIC_HOST_LABELS: &[&str] = &["www", "co", "com", "org", "net", "ac", "gov", "edu", "jobs", "careers"];

/// Company names that carry no identity once lowercased and stripped of
/// non-alphanumerics.
const GENERIC_COMPANY_TOKENS: &[&str] = &[
    "company",
    "unknown",
    "na",
    "confidential",
    "various",
    "multiple",
    "hiring",
    "careers",
    "jobs",
    "recruiting",
    "staffing",
];

#[derive(Debug)]
pub enum PersistOutcome {
    Saved(PersistedJob),
    Skipped(SkipReason),
}

pub struct Persister {
    store: Arc<dyn JobStore>,
}

impl Persister {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// At-most-once persistence per canonical link. Concurrent calls for
    /// the same link cannot both succeed: the store's unique constraint
    /// serializes the race and the loser is reported as a duplicate.
    pub async fn try_persist(&self, candidate: &Candidate) -> Result<PersistOutcome, AppError> {
        let Some(link) = normalize_link(&candidate.link) else {
            tracing::warn!(
                "Candidate '{}' from {} has no usable canonical link, discarding",
                candidate.title,
                candidate.source
            );
            return Ok(PersistOutcome::Skipped(SkipReason::Exception));
        };

        let title = candidate.title.trim();
        if title.is_empty() {
            return Ok(PersistOutcome::Skipped(SkipReason::MissingCompanyOrTitle));
        }

        let company = match resolve_company(candidate, &link) {
            CompanyResolution::Named(name) => name,
            CompanyResolution::Missing => {
                return Ok(PersistOutcome::Skipped(SkipReason::MissingCompanyOrTitle));
            }
            CompanyResolution::Unreliable => {
                return Ok(PersistOutcome::Skipped(SkipReason::UnreliableCompanyName));
            }
        };

        let company_url = candidate
            .company_url
            .as_deref()
            .and_then(|u| sanitize_company_url(u, &company));

        if self.store.exists(&link).await? {
            return Ok(PersistOutcome::Skipped(SkipReason::Duplicate));
        }

        let job = NewJob {
            title: title.to_string(),
            company,
            company_url,
            canonical_link: link,
            location: candidate.location.clone(),
            description: candidate.description.clone(),
            job_type: candidate.job_type.map(|t| t.as_str().to_string()),
            salary: candidate.salary.clone(),
            source: candidate.source.clone(),
            posted_at: candidate.posted_at,
        };

        match self.store.insert(job).await? {
            InsertOutcome::Inserted(persisted) => Ok(PersistOutcome::Saved(persisted)),
            InsertOutcome::DuplicateLink => Ok(PersistOutcome::Skipped(SkipReason::Duplicate)),
        }
    }
}

enum CompanyResolution {
    Named(String),
    Missing,
    Unreliable,
}

fn resolve_company(candidate: &Candidate, link: &str) -> CompanyResolution {
    let given = candidate.company.trim();
    let name = if given.is_empty() {
        match Url::parse(link).ok().and_then(|u| infer_company(&u)) {
            Some(inferred) => inferred,
            None => return CompanyResolution::Missing,
        }
    } else {
        given.to_string()
    };

    if reliable_company_name(&name) {
        CompanyResolution::Named(name)
    } else {
        CompanyResolution::Unreliable
    }
}

/// Normalize a canonical link for use as the dedup key. Scheme and host
/// casing only; path and query are significant and left untouched.
pub fn normalize_link(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;
    Some(url.to_string())
}

/// Derive a company name from a link's hostname: strip generic labels
/// from the left and title-case the first real one. Job-board hosts
/// never name an employer.
pub fn infer_company(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    if is_job_board(&host) {
        return None;
    }
    let label = host
        .split('.')
        .find(|label| !label.is_empty() && !GENERIC_HOST_LABELS.contains(label))?;
    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}

fn is_job_board(host: &str) -> bool {
    JOB_BOARD_HOSTS
        .iter()
        .any(|board| host == *board || host.ends_with(&format!(".{board}")))
}

/// Reduce a name to lowercase alphanumerics and check it still carries
/// identity.
pub fn reliable_company_name(name: &str) -> bool {
    let reduced: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    reduced.len() >= 2 && !GENERIC_COMPANY_TOKENS.contains(&reduced.as_str())
}

/// Accept a company URL only when it plausibly belongs to the employer:
/// http(s), not a job board, and the host mentions a company-name token
/// or the company's initials. Anything else is dropped rather than
/// stored.
pub fn sanitize_company_url(raw: &str, company: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    let host = url.host_str()?.to_lowercase();
    if is_job_board(&host) {
        return None;
    }

    let tokens: Vec<String> = company
        .split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| t.len() >= 2)
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let initials: String = tokens.iter().filter_map(|t| t.chars().next()).collect();
    let token_match = tokens.iter().any(|t| host.contains(t.as_str()));
    let initials_match = initials.len() >= 2 && host.contains(initials.as_str());
    if token_match || initials_match {
        Some(url.to_string())
    } else {
        None
    }
}
