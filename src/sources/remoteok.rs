//! RemoteOK public JSON API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::models::candidate::Candidate;
use crate::models::search::JobType;
use crate::sources::{Source, parse_posted_date};

pub struct RemoteOk;

impl Source for RemoteOk {
    fn id(&self) -> &'static str {
        "remoteok"
    }

    fn search_urls(&self, keyword: &str) -> Vec<String> {
        // The API filters by tag slug: lowercase, hyphen-separated.
        let tag = keyword.trim().to_lowercase().replace(' ', "-");
        vec![format!(
            "https://remoteok.com/api?tag={}",
            utf8_percent_encode(&tag, NON_ALPHANUMERIC)
        )]
    }

    fn extract(&self, content: &str) -> Vec<Candidate> {
        let data: Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("RemoteOK response is not JSON: {e}");
                return Vec::new();
            }
        };
        let Some(entries) = data.as_array() else {
            tracing::warn!("RemoteOK response is not an array");
            return Vec::new();
        };
        // The first array element is a legal notice, not a posting; it
        // has no "position" field and falls out of parse_job naturally.
        entries.iter().filter_map(parse_job).collect()
    }
}

fn parse_job(raw: &Value) -> Option<Candidate> {
    let title = raw.get("position")?.as_str()?.trim().to_string();
    let link = raw.get("url")?.as_str()?.trim().to_string();
    if title.is_empty() || link.is_empty() {
        return None;
    }

    let salary = match (
        raw.get("salary_min").and_then(|v| v.as_u64()),
        raw.get("salary_max").and_then(|v| v.as_u64()),
    ) {
        (Some(min), Some(max)) if max > 0 => Some(format!("${min} - ${max}")),
        _ => None,
    };

    Some(Candidate {
        title,
        company: raw
            .get("company")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string(),
        company_url: None,
        link,
        posted_at: raw
            .get("date")
            .and_then(|v| v.as_str())
            .and_then(parse_posted_date),
        location: raw
            .get("location")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(String::from),
        description: raw
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from),
        // Everything on the board is remote.
        job_type: Some(JobType::Remote),
        salary,
        source: "remoteok".to_string(),
    })
}
