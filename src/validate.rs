//! Pure filter rules applied to candidates before persistence.
//!
//! All four rules are conjunctive; evaluation stops at the first
//! failure. No I/O, no retries.

use chrono::Utc;

use crate::models::candidate::Candidate;
use crate::models::search::{Market, SearchSpec};

/// Full conjunction of the keyword, job-type, location and time-window
/// rules.
pub fn matches(spec: &SearchSpec, candidate: &Candidate) -> bool {
    matches_keywords(&spec.keywords, &candidate.title)
        && spec.job_type.accepts(candidate.job_type)
        && spec.location.accepts(
            candidate
                .location
                .as_deref()
                .and_then(infer_market),
        )
        && matches_time_window(spec, candidate)
}

/// An empty keyword list matches everything; otherwise the title must
/// contain at least one keyword as a case-insensitive substring.
pub fn matches_keywords(keywords: &[String], title: &str) -> bool {
    let active: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if active.is_empty() {
        return true;
    }
    let title = title.to_lowercase();
    active.iter().any(|k| title.contains(&k.to_lowercase()))
}

/// A candidate with no posted date passes any window: absence of data is
/// not grounds for rejection. Otherwise the age in days must not exceed
/// the window's bound.
pub fn matches_time_window(spec: &SearchSpec, candidate: &Candidate) -> bool {
    let Some(max_days) = spec.time_window.max_age_days() else {
        return true;
    };
    let Some(posted_at) = candidate.posted_at else {
        return true;
    };
    let age_days = (Utc::now() - posted_at).num_days();
    age_days <= max_days
}

/// Infer the market a location string refers to. Token-based so that
/// "UK" never matches inside "Ukraine".
pub fn infer_market(location: &str) -> Option<Market> {
    let lowered = location.to_lowercase();

    const USA_PHRASES: &[&str] = &["united states", "north america"];
    const UK_PHRASES: &[&str] = &["united kingdom", "great britain"];
    const USA_TOKENS: &[&str] = &[
        "us", "usa", "america", "california", "texas", "washington", "colorado",
    ];
    const UK_TOKENS: &[&str] = &[
        "uk", "england", "scotland", "wales", "london", "manchester", "edinburgh",
    ];

    if USA_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Market::Usa);
    }
    if UK_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Some(Market::Uk);
    }

    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.iter().any(|t| USA_TOKENS.contains(t)) {
        return Some(Market::Usa);
    }
    if tokens.iter().any(|t| UK_TOKENS.contains(t)) {
        return Some(Market::Uk);
    }
    None
}
