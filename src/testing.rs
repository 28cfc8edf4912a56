//! Test doubles shared across module tests: an in-memory store and run
//! control, scripted sources, and stub fetchers.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::enrich::Contact;
use crate::error::AppError;
use crate::fetch::{FetchError, FetchOptions, PageFetcher};
use crate::models::candidate::Candidate;
use crate::models::job::{NewJob, PersistedJob};
use crate::models::run::{RunOutcome, RunStatus};
use crate::sources::Source;
use crate::store::{InsertOutcome, JobStore, RunControl};

pub fn candidate(title: &str, company: &str, link: &str) -> Candidate {
    Candidate {
        title: title.to_string(),
        company: company.to_string(),
        company_url: None,
        link: link.to_string(),
        posted_at: None,
        location: None,
        description: None,
        job_type: None,
        salary: None,
        source: "scripted".to_string(),
    }
}

#[derive(Default)]
struct StoreInner {
    jobs: Vec<PersistedJob>,
    links: HashSet<String>,
    next_id: i32,
    inserts: usize,
    sizes: HashMap<i32, String>,
    contacts: HashMap<i32, Vec<Contact>>,
}

/// In-memory job store with the same at-most-once-per-link contract the
/// Postgres store gets from its unique constraint.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_count(&self) -> usize {
        self.inner.lock().unwrap().jobs.len()
    }

    pub fn insert_count(&self) -> usize {
        self.inner.lock().unwrap().inserts
    }

    pub fn jobs(&self) -> Vec<PersistedJob> {
        self.inner.lock().unwrap().jobs.clone()
    }

    pub fn company_size_of(&self, job_id: i32) -> Option<String> {
        self.inner.lock().unwrap().sizes.get(&job_id).cloned()
    }

    pub fn contacts_of(&self, job_id: i32) -> Vec<Contact> {
        self.inner
            .lock()
            .unwrap()
            .contacts
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn exists(&self, canonical_link: &str) -> Result<bool, AppError> {
        Ok(self.inner.lock().unwrap().links.contains(canonical_link))
    }

    async fn insert(&self, job: NewJob) -> Result<InsertOutcome, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.links.contains(&job.canonical_link) {
            return Ok(InsertOutcome::DuplicateLink);
        }
        inner.next_id += 1;
        inner.inserts += 1;
        let persisted = PersistedJob {
            id: inner.next_id,
            title: job.title,
            company: job.company,
            company_url: job.company_url,
            canonical_link: job.canonical_link.clone(),
            location: job.location,
            description: job.description,
            job_type: job.job_type,
            salary: job.salary,
            source: job.source,
            posted_at: job.posted_at,
            company_size: None,
            found_at: Utc::now(),
        };
        inner.links.insert(job.canonical_link);
        inner.jobs.push(persisted.clone());
        Ok(InsertOutcome::Inserted(persisted))
    }

    async fn set_company_size(&self, job_id: i32, size: &str) -> Result<(), AppError> {
        self.inner
            .lock()
            .unwrap()
            .sizes
            .insert(job_id, size.to_string());
        Ok(())
    }

    async fn add_contacts(&self, job_id: i32, contacts: &[Contact]) -> Result<(), AppError> {
        self.inner
            .lock()
            .unwrap()
            .contacts
            .entry(job_id)
            .or_default()
            .extend(contacts.iter().cloned());
        Ok(())
    }
}

/// In-memory run control that can flip a run to cancelled after a fixed
/// number of status polls.
pub struct MemoryRunControl {
    runs: Mutex<HashMap<i32, RunStatus>>,
    outcomes: Mutex<HashMap<i32, RunOutcome>>,
    polls: AtomicUsize,
    cancel_after: Option<usize>,
}

impl MemoryRunControl {
    pub fn with_run(run_id: i32) -> Self {
        let mut runs = HashMap::new();
        runs.insert(run_id, RunStatus::Pending);
        Self {
            runs: Mutex::new(runs),
            outcomes: Mutex::new(HashMap::new()),
            polls: AtomicUsize::new(0),
            cancel_after: None,
        }
    }

    /// A control with no run rows at all; every status poll reports the
    /// record as missing.
    pub fn empty() -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            outcomes: Mutex::new(HashMap::new()),
            polls: AtomicUsize::new(0),
            cancel_after: None,
        }
    }

    /// Report the run as cancelled on every poll after the first
    /// `polls` calls.
    pub fn cancel_after_polls(mut self, polls: usize) -> Self {
        self.cancel_after = Some(polls);
        self
    }

    pub fn final_status(&self, run_id: i32) -> Option<RunStatus> {
        self.outcomes.lock().unwrap().get(&run_id).map(|o| o.status)
    }

    pub fn outcome(&self, run_id: i32) -> Option<RunOutcome> {
        self.outcomes.lock().unwrap().get(&run_id).cloned()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunControl for MemoryRunControl {
    async fn status(&self, run_id: i32) -> Result<Option<RunStatus>, AppError> {
        let count = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut runs = self.runs.lock().unwrap();
        if let Some(limit) = self.cancel_after
            && count > limit
            && runs.contains_key(&run_id)
        {
            runs.insert(run_id, RunStatus::Cancelled);
        }
        Ok(runs.get(&run_id).copied())
    }

    async fn mark_running(&self, run_id: i32) -> Result<(), AppError> {
        let mut runs = self.runs.lock().unwrap();
        if let Some(status) = runs.get_mut(&run_id)
            && *status == RunStatus::Pending
        {
            *status = RunStatus::Running;
        }
        Ok(())
    }

    async fn finalize(&self, run_id: i32, outcome: &RunOutcome) -> Result<(), AppError> {
        let mut runs = self.runs.lock().unwrap();
        // Record gone: nothing to update, mirroring the SQL path. A
        // terminal status is never overwritten with a different one.
        let Some(current) = runs.get(&run_id).copied() else {
            return Ok(());
        };
        if !current.is_terminal() || current == outcome.status {
            runs.insert(run_id, outcome.status);
            self.outcomes
                .lock()
                .unwrap()
                .insert(run_id, outcome.clone());
        }
        Ok(())
    }
}

/// Source returning a fixed candidate list regardless of content.
pub struct ScriptedSource {
    id: &'static str,
    candidates: Vec<Candidate>,
}

impl ScriptedSource {
    pub fn new(id: &'static str, candidates: Vec<Candidate>) -> Self {
        Self { id, candidates }
    }
}

impl Source for ScriptedSource {
    fn id(&self) -> &'static str {
        self.id
    }

    fn search_urls(&self, keyword: &str) -> Vec<String> {
        vec![format!(
            "https://{}.example/search?q={}",
            self.id,
            utf8_percent_encode(keyword, NON_ALPHANUMERIC)
        )]
    }

    fn extract(&self, _content: &str) -> Vec<Candidate> {
        self.candidates.clone()
    }
}

/// Fetcher that always succeeds, optionally failing URLs containing a
/// marker substring.
pub struct OkFetcher {
    calls: AtomicUsize,
    fail_marker: Option<&'static str>,
}

impl OkFetcher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_marker: None,
        }
    }

    pub fn failing_urls_containing(marker: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_marker: Some(marker),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for OkFetcher {
    async fn fetch(&self, url: &str, _opts: FetchOptions) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = self.fail_marker
            && url.contains(marker)
        {
            return Err(FetchError::Network(format!("stubbed failure for {url}")));
        }
        Ok("<html><body>stub listing</body></html>".to_string())
    }
}

/// Enrichment double returning fixed results.
pub struct StaticEnrichment {
    pub size: crate::enrich::SizeCategory,
    pub contacts: Vec<Contact>,
}

#[async_trait]
impl crate::enrich::Enrichment for StaticEnrichment {
    async fn company_size(
        &self,
        _name: &str,
        _website: Option<&str>,
    ) -> crate::enrich::SizeCategory {
        self.size
    }

    async fn find_contacts(
        &self,
        _name: &str,
        _website: Option<&str>,
        max: usize,
    ) -> Vec<Contact> {
        self.contacts.iter().take(max).cloned().collect()
    }
}

/// Fetcher simulating a permanently blocked environment.
pub struct BlockedFetcher {
    calls: AtomicUsize,
}

impl BlockedFetcher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for BlockedFetcher {
    async fn fetch(&self, _url: &str, _opts: FetchOptions) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::Blocked("captcha".to_string()))
    }
}
