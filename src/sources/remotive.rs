//! Remotive public job API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::models::candidate::Candidate;
use crate::models::search::JobType;
use crate::sources::{Source, parse_posted_date};

pub struct Remotive;

impl Source for Remotive {
    fn id(&self) -> &'static str {
        "remotive"
    }

    fn search_urls(&self, keyword: &str) -> Vec<String> {
        vec![format!(
            "https://remotive.com/api/remote-jobs?search={}",
            utf8_percent_encode(keyword, NON_ALPHANUMERIC)
        )]
    }

    fn extract(&self, content: &str) -> Vec<Candidate> {
        let data: Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Remotive response is not JSON: {e}");
                return Vec::new();
            }
        };
        let Some(jobs) = data.get("jobs").and_then(|v| v.as_array()) else {
            tracing::warn!("Remotive response missing 'jobs' array");
            return Vec::new();
        };
        jobs.iter().filter_map(parse_job).collect()
    }
}

fn parse_job(raw: &Value) -> Option<Candidate> {
    let title = raw.get("title")?.as_str()?.trim().to_string();
    let link = raw.get("url")?.as_str()?.trim().to_string();
    if title.is_empty() || link.is_empty() {
        return None;
    }

    // Remotive postings are remote by definition; the commitment field
    // refines full-time/part-time/contract.
    let job_type = raw
        .get("job_type")
        .and_then(|v| v.as_str())
        .and_then(JobType::parse)
        .or(Some(JobType::Remote));

    Some(Candidate {
        title,
        company: raw
            .get("company_name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string(),
        company_url: None,
        link,
        posted_at: raw
            .get("publication_date")
            .and_then(|v| v.as_str())
            .and_then(parse_posted_date),
        location: raw
            .get("candidate_required_location")
            .and_then(|v| v.as_str())
            .map(String::from),
        description: raw
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from),
        job_type,
        salary: raw
            .get("salary")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(String::from),
        source: "remotive".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "job-count": 2,
        "jobs": [
            {
                "id": 1001,
                "url": "https://remotive.com/remote-jobs/software-dev/ai-engineer-1001",
                "title": "AI Engineer",
                "company_name": "Acme Labs",
                "job_type": "full_time",
                "publication_date": "2026-08-01T10:30:00",
                "candidate_required_location": "USA Only",
                "salary": "$150k - $190k",
                "description": "<p>Build things.</p>"
            },
            {
                "id": 1002,
                "url": "https://remotive.com/remote-jobs/software-dev/rust-dev-1002",
                "title": "Rust Developer",
                "company_name": "",
                "job_type": "contract",
                "publication_date": "bad date",
                "candidate_required_location": "Worldwide",
                "salary": ""
            },
            {
                "id": 1003,
                "title": "No link, dropped"
            }
        ]
    }"#;

    #[test]
    fn parses_api_response() {
        let candidates = Remotive.extract(SAMPLE);
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.title, "AI Engineer");
        assert_eq!(first.company, "Acme Labs");
        assert_eq!(first.job_type, Some(JobType::FullTime));
        assert!(first.posted_at.is_some());
        assert_eq!(first.salary.as_deref(), Some("$150k - $190k"));

        let second = &candidates[1];
        assert_eq!(second.job_type, Some(JobType::Freelance));
        assert!(second.posted_at.is_none());
        assert!(second.salary.is_none());
        assert!(second.company.is_empty());
    }

    #[test]
    fn garbage_content_yields_nothing() {
        assert!(Remotive.extract("<html>not json</html>").is_empty());
        assert!(Remotive.extract("{}").is_empty());
    }

    #[test]
    fn search_url_encodes_keyword() {
        let urls = Remotive.search_urls("AI Engineer");
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("search=AI%20Engineer"));
    }
}
