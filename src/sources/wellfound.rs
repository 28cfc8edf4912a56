//! Wellfound (AngelList Talent) role listings. JS-rendered: fetched
//! through the browser fallback.

use scraper::{Html, Selector};
use url::Url;

use crate::models::candidate::Candidate;
use crate::sources::Source;

const BASE_URL: &str = "https://wellfound.com";

pub struct Wellfound;

impl Source for Wellfound {
    fn id(&self) -> &'static str {
        "wellfound"
    }

    fn search_urls(&self, keyword: &str) -> Vec<String> {
        let slug = keyword
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        vec![format!("{BASE_URL}/role/r/{slug}")]
    }

    fn requires_browser(&self) -> bool {
        true
    }

    fn extract(&self, content: &str) -> Vec<Candidate> {
        let document = Html::parse_document(content);
        let Ok(result_sel) = Selector::parse("div[data-test='StartupResult']") else {
            return Vec::new();
        };
        let company_sel = Selector::parse("h2").ok();
        let job_sel = Selector::parse("a[href*='/jobs/']").ok();
        let location_sel = Selector::parse("span[data-test='JobLocation']").ok();

        let base = match Url::parse(BASE_URL) {
            Ok(u) => u,
            Err(_) => return Vec::new(),
        };

        let mut candidates = Vec::new();
        for result in document.select(&result_sel) {
            let company = company_sel
                .as_ref()
                .and_then(|sel| result.select(sel).next())
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let location = location_sel
                .as_ref()
                .and_then(|sel| result.select(sel).next())
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|l| !l.is_empty());

            let Some(job_sel) = job_sel.as_ref() else {
                continue;
            };
            for anchor in result.select(job_sel) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let Ok(link) = base.join(href) else {
                    continue;
                };
                let title = anchor.text().collect::<String>().trim().to_string();
                if title.is_empty() {
                    continue;
                }
                candidates.push(Candidate {
                    title,
                    company: company.clone(),
                    company_url: None,
                    link: link.to_string(),
                    posted_at: None,
                    location: location.clone(),
                    description: None,
                    job_type: None,
                    salary: None,
                    source: "wellfound".to_string(),
                });
            }
        }
        candidates
    }
}
