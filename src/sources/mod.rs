//! Pluggable source extractors.
//!
//! Each source implements the small capability contract the coordinator
//! depends on: search URLs per keyword, whether fetching needs a
//! browser, and extraction of candidates from fetched content. The
//! selector-level heuristics inside each extractor are best-effort and
//! carry no correctness guarantee for the remote site's markup.

pub mod remoteok;
pub mod remotive;
pub mod wellfound;
pub mod weworkremotely;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::candidate::Candidate;

pub trait Source: Send + Sync {
    /// Stable id matching the registry and the run spec's source list.
    fn id(&self) -> &'static str;

    /// Search URLs to fetch for one keyword.
    fn search_urls(&self, keyword: &str) -> Vec<String>;

    /// True when the source is JS-rendered and needs the browser path.
    fn requires_browser(&self) -> bool {
        false
    }

    /// Parse fetched content into candidates. Candidates without a
    /// title and canonical link are not eligible for persistence.
    fn extract(&self, content: &str) -> Vec<Candidate>;
}

/// Registry order doubles as dispatch priority: API-backed sources
/// first.
pub const ALL_SOURCE_IDS: &[&str] = &["remotive", "remoteok", "weworkremotely", "wellfound"];

/// API-backed sources retried by the coordinator's fallback pass when a
/// run persists nothing.
pub const RELIABLE_SOURCE_IDS: &[&str] = &["remotive", "remoteok"];

pub fn get_source(id: &str) -> Option<Arc<dyn Source>> {
    match id {
        "remotive" => Some(Arc::new(remotive::Remotive)),
        "remoteok" => Some(Arc::new(remoteok::RemoteOk)),
        "weworkremotely" => Some(Arc::new(weworkremotely::WeWorkRemotely)),
        "wellfound" => Some(Arc::new(wellfound::Wellfound)),
        _ => None,
    }
}

pub fn all_sources() -> Vec<Arc<dyn Source>> {
    ALL_SOURCE_IDS.iter().filter_map(|id| get_source(id)).collect()
}

pub fn reliable_sources() -> Vec<Arc<dyn Source>> {
    RELIABLE_SOURCE_IDS
        .iter()
        .filter_map(|id| get_source(id))
        .collect()
}

/// Resolve the spec's source list. An empty list means every registered
/// source; unknown ids are logged and skipped.
pub fn resolve(names: &[String]) -> Vec<Arc<dyn Source>> {
    if names.is_empty() {
        return all_sources();
    }
    names
        .iter()
        .filter_map(|name| {
            let source = get_source(name);
            if source.is_none() {
                tracing::warn!("Unknown source '{name}' in spec, skipping");
            }
            source
        })
        .collect()
}

/// Parse the posting-date formats seen across sources: RFC 3339, bare
/// datetime, bare date.
pub(crate) fn parse_posted_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_all_ids() {
        for id in ALL_SOURCE_IDS {
            let source = get_source(id).unwrap_or_else(|| panic!("missing source {id}"));
            assert_eq!(source.id(), *id);
        }
        assert!(get_source("nonexistent").is_none());
    }

    #[test]
    fn empty_spec_list_means_all_sources() {
        assert_eq!(resolve(&[]).len(), ALL_SOURCE_IDS.len());
    }

    #[test]
    fn unknown_names_are_skipped() {
        let names = vec!["remotive".to_string(), "myspace".to_string()];
        let resolved = resolve(&names);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id(), "remotive");
    }

    #[test]
    fn reliable_sources_are_api_backed() {
        for source in reliable_sources() {
            assert!(!source.requires_browser());
        }
    }

    #[test]
    fn posted_date_formats() {
        assert!(parse_posted_date("2026-08-01T10:30:00+00:00").is_some());
        assert!(parse_posted_date("2026-08-01T10:30:00").is_some());
        assert!(parse_posted_date("2026-08-01").is_some());
        assert!(parse_posted_date("yesterday").is_none());
    }
}
