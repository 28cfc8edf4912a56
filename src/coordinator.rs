//! Run coordinator.
//!
//! Owns one execution of a search spec: fans the enabled sources out
//! across a bounded worker pool, polls the authoritative run record for
//! cancellation, streams each completed source's candidates through
//! validation and persistence as they arrive, and finalizes the run with
//! aggregated statistics. One source's failure never aborts its siblings
//! or the run; only precondition violations and store failures do.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::enrich::{Enrichment, SizeCategory};
use crate::error::AppError;
use crate::fetch::{FetchOptions, PageFetcher};
use crate::models::candidate::Candidate;
use crate::models::job::PersistedJob;
use crate::models::run::{RunOutcome, RunStatus, SkipReason};
use crate::models::search::SearchSpec;
use crate::persist::{PersistOutcome, Persister};
use crate::sources::{self, Source};
use crate::store::{JobStore, RunControl};
use crate::validate;

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Worker-pool cap; effective pool size is min(cap, source count).
    pub max_workers: usize,
    /// Hard timeout per source task, independent of run-level
    /// cancellation.
    pub source_timeout: Duration,
    /// Contacts requested per persisted job from the enrichment hook.
    pub max_contacts: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_workers: 6,
            source_timeout: Duration::from_secs(120),
            max_contacts: 5,
        }
    }
}

#[derive(Debug, Default)]
struct RunStats {
    jobs_saved: i32,
    sources_succeeded: i32,
    sources_failed: i32,
    skips: BTreeMap<String, i64>,
    errors: Vec<String>,
}

impl RunStats {
    fn record_skip(&mut self, reason: SkipReason) {
        *self.skips.entry(reason.as_str().to_string()).or_insert(0) += 1;
    }

    fn into_outcome(self, status: RunStatus, duration: Duration) -> RunOutcome {
        RunOutcome {
            status,
            jobs_saved: self.jobs_saved,
            sources_succeeded: self.sources_succeeded,
            sources_failed: self.sources_failed,
            skip_reasons: self.skips,
            error: if self.errors.is_empty() {
                None
            } else {
                Some(self.errors.join("\n"))
            },
            duration,
        }
    }
}

pub struct RunManager {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn JobStore>,
    control: Arc<dyn RunControl>,
    enrichment: Arc<dyn Enrichment>,
    persister: Persister,
    fallback_sources: Vec<Arc<dyn Source>>,
    config: RunConfig,
}

impl RunManager {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn JobStore>,
        control: Arc<dyn RunControl>,
        enrichment: Arc<dyn Enrichment>,
        config: RunConfig,
    ) -> Self {
        Self {
            fetcher,
            persister: Persister::new(store.clone()),
            store,
            control,
            enrichment,
            fallback_sources: sources::reliable_sources(),
            config,
        }
    }

    /// Replace the fallback source set used when a run persists nothing.
    pub fn with_fallback_sources(mut self, fallback: Vec<Arc<dyn Source>>) -> Self {
        self.fallback_sources = fallback;
        self
    }

    /// Execute one run to a terminal state. Always finalizes the run
    /// record with counts and the skip histogram; never panics out to
    /// the caller.
    pub async fn execute(
        &self,
        run_id: i32,
        spec: &SearchSpec,
        sources: Vec<Arc<dyn Source>>,
    ) -> RunOutcome {
        let started = Instant::now();
        let mut stats = RunStats::default();

        let status = match self.run_inner(run_id, spec, sources, &mut stats).await {
            Ok(terminal) => terminal,
            Err(e) => {
                tracing::error!("Run {run_id} failed: {e}");
                stats.errors.push(e.to_string());
                RunStatus::Failed
            }
        };

        let outcome = stats.into_outcome(status, started.elapsed());
        if let Err(e) = self.control.finalize(run_id, &outcome).await {
            tracing::error!("Run {run_id}: failed to write terminal state: {e}");
        }
        tracing::info!(
            "Run {run_id} {} in {:.1}s: {} jobs saved, {} sources ok, {} failed",
            outcome.status.as_str(),
            outcome.duration.as_secs_f64(),
            outcome.jobs_saved,
            outcome.sources_succeeded,
            outcome.sources_failed
        );
        outcome
    }

    async fn run_inner(
        &self,
        run_id: i32,
        spec: &SearchSpec,
        sources: Vec<Arc<dyn Source>>,
        stats: &mut RunStats,
    ) -> Result<RunStatus, AppError> {
        if !spec.has_keywords() {
            return Err(AppError::InvalidSpec(
                "at least one keyword is required".to_string(),
            ));
        }
        if sources.is_empty() {
            return Err(AppError::InvalidSpec(
                "no enabled sources to scrape".to_string(),
            ));
        }

        self.control.mark_running(run_id).await?;

        // Best-effort ordering: API-backed sources first shortens
        // time-to-first-result. Stable sort keeps registry priority
        // within each group.
        let mut ordered = sources;
        ordered.sort_by_key(|s| s.requires_browser());

        let cap = self.config.max_workers.min(ordered.len()).max(1);
        tracing::info!(
            "Run {run_id}: dispatching {} sources across {cap} workers",
            ordered.len()
        );

        let mut queue = ordered.into_iter();
        let mut tasks: JoinSet<(String, Result<Vec<Candidate>, String>)> = JoinSet::new();
        let mut in_flight = 0usize;
        let mut cancelled = false;

        loop {
            // Refill the pool, polling for cancellation before each
            // submission. Already-dispatched tasks always run to
            // completion or their own timeout.
            while !cancelled && in_flight < cap {
                let Some(source) = queue.next() else { break };
                if self.poll_cancelled(run_id).await? {
                    cancelled = true;
                    break;
                }
                let fetcher = self.fetcher.clone();
                let keywords = spec.keywords.clone();
                let timeout = self.config.source_timeout;
                tasks.spawn(async move {
                    let id = source.id().to_string();
                    let outcome =
                        match tokio::time::timeout(timeout, scrape_source(fetcher, source, &keywords))
                            .await
                        {
                            Ok(Ok(candidates)) => Ok(candidates),
                            Ok(Err(e)) => Err(e.to_string()),
                            Err(_) => Err(format!("exceeded {}s task timeout", timeout.as_secs())),
                        };
                    (id, outcome)
                });
                in_flight += 1;
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            in_flight -= 1;

            // Poll before touching the completed task's results: once
            // cancellation is observed, nothing more is persisted.
            if !cancelled && self.poll_cancelled(run_id).await? {
                cancelled = true;
            }

            match joined {
                Ok((source_id, Ok(candidates))) => {
                    stats.sources_succeeded += 1;
                    if cancelled {
                        tracing::debug!(
                            "Run {run_id}: dropping {} candidates from '{source_id}' after cancellation",
                            candidates.len()
                        );
                    } else {
                        tracing::info!(
                            "Run {run_id}: source '{source_id}' yielded {} candidates",
                            candidates.len()
                        );
                        self.process_candidates(run_id, spec, candidates, stats).await?;
                    }
                }
                Ok((source_id, Err(error))) => {
                    stats.sources_failed += 1;
                    tracing::warn!("Run {run_id}: source '{source_id}' failed: {error}");
                    stats.errors.push(format!("{source_id}: {error}"));
                }
                Err(join_error) => {
                    stats.sources_failed += 1;
                    tracing::error!("Run {run_id}: source task panicked: {join_error}");
                    stats.errors.push(format!("source task panicked: {join_error}"));
                }
            }
        }

        if cancelled {
            return Ok(RunStatus::Cancelled);
        }

        // One extra pass over the known-reliable API-backed sources when
        // nothing was persisted, so a run does not come back empty
        // purely because of transient scraping failures. A heuristic: it
        // cannot tell "everything was blocked" from "genuinely no
        // matches", and the run completes either way.
        if stats.jobs_saved == 0
            && !self.fallback_sources.is_empty()
            && self.fallback_pass(run_id, spec, stats).await?
        {
            return Ok(RunStatus::Cancelled);
        }

        Ok(RunStatus::Completed)
    }

    /// Returns true when cancellation was observed mid-pass.
    async fn fallback_pass(
        &self,
        run_id: i32,
        spec: &SearchSpec,
        stats: &mut RunStats,
    ) -> Result<bool, AppError> {
        tracing::info!("Run {run_id}: nothing persisted, retrying reliable sources");
        for source in &self.fallback_sources {
            if self.poll_cancelled(run_id).await? {
                return Ok(true);
            }
            let attempt = tokio::time::timeout(
                self.config.source_timeout,
                scrape_source(self.fetcher.clone(), source.clone(), &spec.keywords),
            )
            .await;
            match attempt {
                Ok(Ok(candidates)) => {
                    self.process_candidates(run_id, spec, candidates, stats).await?;
                }
                Ok(Err(e)) => {
                    tracing::warn!("Run {run_id}: fallback source '{}' failed: {e}", source.id());
                }
                Err(_) => {
                    tracing::warn!("Run {run_id}: fallback source '{}' timed out", source.id());
                }
            }
        }
        Ok(false)
    }

    /// Push one source's candidates through validation and persistence,
    /// in extraction order. Data-quality outcomes land in the skip
    /// histogram; only store failures propagate.
    async fn process_candidates(
        &self,
        run_id: i32,
        spec: &SearchSpec,
        candidates: Vec<Candidate>,
        stats: &mut RunStats,
    ) -> Result<(), AppError> {
        for candidate in candidates {
            if !validate::matches(spec, &candidate) {
                stats.record_skip(SkipReason::FilterMismatch);
                continue;
            }
            match self.persister.try_persist(&candidate).await? {
                PersistOutcome::Saved(job) => {
                    stats.jobs_saved += 1;
                    tracing::debug!(
                        "Run {run_id}: saved '{}' at {} ({})",
                        job.title,
                        job.company,
                        job.source
                    );
                    self.enrich(&job).await;
                }
                PersistOutcome::Skipped(reason) => stats.record_skip(reason),
            }
        }
        Ok(())
    }

    /// Best-effort enrichment after persistence. Lookup and write-back
    /// failures are logged and swallowed, never fatal to the run.
    async fn enrich(&self, job: &PersistedJob) {
        let size = self
            .enrichment
            .company_size(&job.company, job.company_url.as_deref())
            .await;
        if size != SizeCategory::Unknown
            && let Err(e) = self.store.set_company_size(job.id, size.as_str()).await
        {
            tracing::warn!("Failed to record company size for job {}: {e}", job.id);
        }

        let contacts = self
            .enrichment
            .find_contacts(&job.company, job.company_url.as_deref(), self.config.max_contacts)
            .await;
        if !contacts.is_empty()
            && let Err(e) = self.store.add_contacts(job.id, &contacts).await
        {
            tracing::warn!("Failed to record contacts for job {}: {e}", job.id);
        }
    }

    async fn poll_cancelled(&self, run_id: i32) -> Result<bool, AppError> {
        match self.control.status(run_id).await? {
            None => {
                tracing::warn!("Run {run_id}: record disappeared, treating as cancelled");
                Ok(true)
            }
            Some(RunStatus::Cancelled) => Ok(true),
            Some(_) => Ok(false),
        }
    }
}

/// Scrape one source: every search URL for every keyword, extracting
/// candidates in order. The first fetch failure fails the whole source;
/// isolation happens one level up.
async fn scrape_source(
    fetcher: Arc<dyn PageFetcher>,
    source: Arc<dyn Source>,
    keywords: &[String],
) -> Result<Vec<Candidate>, AppError> {
    let opts = FetchOptions {
        force_browser: source.requires_browser(),
    };
    let mut candidates = Vec::new();
    for keyword in keywords.iter().filter(|k| !k.trim().is_empty()) {
        for url in source.search_urls(keyword) {
            let content = fetcher.fetch(&url, opts).await?;
            let extracted = source.extract(&content);
            tracing::debug!(
                "Source '{}': {} candidates from {url}",
                source.id(),
                extracted.len()
            );
            candidates.extend(extracted);
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::NoopEnrichment;
    use crate::models::search::{JobType, JobTypeFilter, LocationFilter, TimeWindow};
    use crate::testing::{
        BlockedFetcher, MemoryRunControl, MemoryStore, OkFetcher, ScriptedSource, candidate,
    };

    fn spec(keywords: &[&str]) -> SearchSpec {
        SearchSpec {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            job_type: JobTypeFilter::All,
            time_window: TimeWindow::All,
            location: LocationFilter::All,
            sources: vec![],
        }
    }

    fn manager(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<MemoryStore>,
        control: Arc<MemoryRunControl>,
    ) -> RunManager {
        RunManager::new(
            fetcher,
            store,
            control,
            Arc::new(NoopEnrichment),
            RunConfig {
                max_workers: 4,
                source_timeout: Duration::from_secs(5),
                max_contacts: 3,
            },
        )
        // Tests opt into fallback sources explicitly.
        .with_fallback_sources(vec![])
    }

    #[tokio::test]
    async fn duplicate_links_within_a_source_persist_once() {
        // One source yields three candidates: two unique links, one
        // repeated. Expect two persisted jobs and one duplicate skip.
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(1));
        let source = ScriptedSource::new(
            "scripted",
            vec![
                candidate("AI Engineer", "Acme", "https://acme.example/jobs/1"),
                candidate("Senior AI Engineer", "Initech", "https://initech.example/jobs/2"),
                candidate("AI Engineer", "Acme", "https://acme.example/jobs/1"),
            ],
        );

        let outcome = manager(Arc::new(OkFetcher::new()), store.clone(), control.clone())
            .execute(1, &spec(&["AI Engineer"]), vec![Arc::new(source)])
            .await;

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.jobs_saved, 2);
        assert_eq!(outcome.skip_reasons.get("duplicate"), Some(&1));
        assert_eq!(outcome.sources_succeeded, 1);
        assert_eq!(outcome.sources_failed, 0);
        assert_eq!(store.job_count(), 2);
        assert_eq!(control.final_status(1), Some(RunStatus::Completed));
        let recorded = control.outcome(1).expect("outcome written to run control");
        assert_eq!(recorded.jobs_saved, 2);
    }

    #[tokio::test]
    async fn one_failing_source_does_not_abort_siblings() {
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(7));
        // The blocked fetcher fails URLs containing "fail".
        let fetcher = Arc::new(OkFetcher::failing_urls_containing("fail"));
        let good = ScriptedSource::new(
            "good",
            vec![candidate("AI Engineer", "Acme", "https://acme.example/jobs/1")],
        );
        let bad = ScriptedSource::new("fail", vec![]);

        let outcome = manager(fetcher, store.clone(), control)
            .execute(7, &spec(&["AI Engineer"]), vec![Arc::new(good), Arc::new(bad)])
            .await;

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.sources_succeeded, 1);
        assert_eq!(outcome.sources_failed, 1);
        assert_eq!(outcome.jobs_saved, 1);
        assert!(outcome.error.as_deref().unwrap_or("").contains("fail"));
        assert_eq!(store.job_count(), 1);
    }

    #[tokio::test]
    async fn all_sources_blocked_is_a_degraded_completion() {
        // Every fetch is blocked: the run still completes, with failure
        // counts and a fallback attempt, never a FAILED state.
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(3));
        let fetcher = Arc::new(BlockedFetcher::new());
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(ScriptedSource::new("alpha", vec![])),
            Arc::new(ScriptedSource::new("beta", vec![])),
        ];
        let fallback: Vec<Arc<dyn Source>> =
            vec![Arc::new(ScriptedSource::new("reliable", vec![]))];

        let outcome = RunManager::new(
            fetcher.clone(),
            store.clone(),
            control.clone(),
            Arc::new(NoopEnrichment),
            RunConfig::default(),
        )
        .with_fallback_sources(fallback)
        .execute(3, &spec(&["AI Engineer"]), sources)
        .await;

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.sources_failed, 2);
        assert_eq!(outcome.sources_succeeded, 0);
        assert_eq!(outcome.jobs_saved, 0);
        assert_eq!(store.job_count(), 0);
        // Two main-pass fetches plus one fallback fetch.
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(control.final_status(3), Some(RunStatus::Completed));
    }

    #[tokio::test]
    async fn cancellation_stops_submissions_and_inserts() {
        // The control reports Running on the first poll and Cancelled on
        // every poll after it: only the first source is ever dispatched,
        // and its results arrive after cancellation so nothing persists.
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(9).cancel_after_polls(1));
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(ScriptedSource::new(
                "first",
                vec![candidate("AI Engineer", "Acme", "https://acme.example/jobs/1")],
            )),
            Arc::new(ScriptedSource::new(
                "second",
                vec![candidate("AI Engineer", "Initech", "https://initech.example/jobs/2")],
            )),
            Arc::new(ScriptedSource::new(
                "third",
                vec![candidate("AI Engineer", "Umbrella", "https://umbrella.example/jobs/3")],
            )),
        ];

        let config = RunConfig {
            // One worker so the second submission happens after the
            // first poll flipped the status.
            max_workers: 1,
            source_timeout: Duration::from_secs(5),
            max_contacts: 0,
        };
        let outcome = RunManager::new(
            Arc::new(OkFetcher::new()),
            store.clone(),
            control.clone(),
            Arc::new(NoopEnrichment),
            config,
        )
        .with_fallback_sources(vec![])
        .execute(9, &spec(&["AI Engineer"]), sources)
        .await;

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert_eq!(store.insert_count(), 0, "no inserts after cancellation poll");
        assert_eq!(control.final_status(9), Some(RunStatus::Cancelled));
    }

    #[tokio::test]
    async fn already_cancelled_run_dispatches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(4).cancel_after_polls(0));
        let fetcher = Arc::new(OkFetcher::new());
        let source = ScriptedSource::new(
            "scripted",
            vec![candidate("AI Engineer", "Acme", "https://acme.example/jobs/1")],
        );

        let outcome = manager(fetcher.clone(), store.clone(), control.clone())
            .execute(4, &spec(&["AI Engineer"]), vec![Arc::new(source)])
            .await;

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(store.job_count(), 0);
        assert_eq!(control.final_status(4), Some(RunStatus::Cancelled));
        assert!(control.poll_count() >= 1);
    }

    #[tokio::test]
    async fn missing_run_record_counts_as_cancelled() {
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::empty());
        let source = ScriptedSource::new(
            "scripted",
            vec![candidate("AI Engineer", "Acme", "https://acme.example/jobs/1")],
        );

        let outcome = manager(Arc::new(OkFetcher::new()), store.clone(), control)
            .execute(42, &spec(&["AI Engineer"]), vec![Arc::new(source)])
            .await;

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert_eq!(store.job_count(), 0);
    }

    #[tokio::test]
    async fn empty_keywords_fail_before_dispatch() {
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(5));
        let fetcher = Arc::new(OkFetcher::new());
        let source = ScriptedSource::new("scripted", vec![]);

        let outcome = manager(fetcher.clone(), store, control.clone())
            .execute(5, &spec(&[]), vec![Arc::new(source)])
            .await;

        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(outcome.error.as_deref().unwrap_or("").contains("keyword"));
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(control.final_status(5), Some(RunStatus::Failed));
    }

    #[tokio::test]
    async fn no_sources_fail_before_dispatch() {
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(6));

        let outcome = manager(Arc::new(OkFetcher::new()), store, control.clone())
            .execute(6, &spec(&["AI Engineer"]), vec![])
            .await;

        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(outcome.error.as_deref().unwrap_or("").contains("source"));
    }

    #[tokio::test]
    async fn remote_filter_only_persists_remote_candidates() {
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(8));
        let mut remote = candidate("AI Engineer", "Acme", "https://acme.example/jobs/1");
        remote.job_type = Some(JobType::Remote);
        let mut hybrid = candidate("AI Engineer", "Initech", "https://initech.example/jobs/2");
        hybrid.job_type = Some(JobType::Hybrid);
        let untyped = candidate("AI Engineer", "Umbrella", "https://umbrella.example/jobs/3");
        let source = ScriptedSource::new("scripted", vec![remote, hybrid, untyped]);

        let mut search = spec(&["AI Engineer"]);
        search.job_type = JobTypeFilter::Remote;

        let outcome = manager(Arc::new(OkFetcher::new()), store.clone(), control)
            .execute(8, &search, vec![Arc::new(source)])
            .await;

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.jobs_saved, 1);
        assert_eq!(outcome.skip_reasons.get("filter_mismatch"), Some(&2));
        let saved = store.jobs();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].company, "Acme");
    }

    #[tokio::test]
    async fn enrichment_results_are_recorded_after_persistence() {
        use crate::testing::StaticEnrichment;

        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(11));
        let enrichment = StaticEnrichment {
            size: SizeCategory::Small,
            contacts: vec![crate::enrich::Contact {
                name: "Pat Doe".to_string(),
                title: Some("Head of Engineering".to_string()),
                email: None,
                profile_url: None,
            }],
        };
        let source = ScriptedSource::new(
            "scripted",
            vec![candidate("AI Engineer", "Acme", "https://acme.example/jobs/1")],
        );

        let outcome = RunManager::new(
            Arc::new(OkFetcher::new()),
            store.clone(),
            control,
            Arc::new(enrichment),
            RunConfig::default(),
        )
        .with_fallback_sources(vec![])
        .execute(11, &spec(&["AI Engineer"]), vec![Arc::new(source)])
        .await;

        assert_eq!(outcome.jobs_saved, 1);
        let job_id = store.jobs()[0].id;
        assert_eq!(store.company_size_of(job_id).as_deref(), Some("small"));
        assert_eq!(store.contacts_of(job_id).len(), 1);
    }

    #[tokio::test]
    async fn fallback_rescues_an_empty_main_pass() {
        // Main source yields nothing; the reliable fallback source has a
        // matching posting.
        let store = Arc::new(MemoryStore::new());
        let control = Arc::new(MemoryRunControl::with_run(10));
        let empty = ScriptedSource::new("empty", vec![]);
        let reliable: Vec<Arc<dyn Source>> = vec![Arc::new(ScriptedSource::new(
            "reliable",
            vec![candidate("AI Engineer", "Acme", "https://acme.example/jobs/9")],
        ))];

        let outcome = RunManager::new(
            Arc::new(OkFetcher::new()),
            store.clone(),
            control,
            Arc::new(NoopEnrichment),
            RunConfig::default(),
        )
        .with_fallback_sources(reliable)
        .execute(10, &spec(&["AI Engineer"]), vec![Arc::new(empty)])
        .await;

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.jobs_saved, 1);
        // Fallback persistence counts jobs, not source statistics.
        assert_eq!(outcome.sources_succeeded, 1);
        assert_eq!(store.job_count(), 1);
    }
}
