//! We Work Remotely search pages (static HTML).

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::{Html, Selector};
use url::Url;

use crate::models::candidate::Candidate;
use crate::models::search::JobType;
use crate::sources::Source;

const BASE_URL: &str = "https://weworkremotely.com";

pub struct WeWorkRemotely;

impl Source for WeWorkRemotely {
    fn id(&self) -> &'static str {
        "weworkremotely"
    }

    fn search_urls(&self, keyword: &str) -> Vec<String> {
        vec![format!(
            "{BASE_URL}/remote-jobs/search?term={}",
            utf8_percent_encode(keyword, NON_ALPHANUMERIC)
        )]
    }

    fn extract(&self, content: &str) -> Vec<Candidate> {
        let document = Html::parse_document(content);
        let Ok(listing) = Selector::parse("section.jobs li a[href*='/remote-jobs/']") else {
            return Vec::new();
        };
        let title_sel = Selector::parse("span.title").ok();
        let company_sel = Selector::parse("span.company").ok();
        let region_sel = Selector::parse("span.region").ok();

        let base = match Url::parse(BASE_URL) {
            Ok(u) => u,
            Err(_) => return Vec::new(),
        };

        let mut candidates = Vec::new();
        for anchor in document.select(&listing) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(link) = base.join(href) else {
                continue;
            };

            let text_of = |selector: &Option<Selector>| {
                selector.as_ref().and_then(|sel| {
                    anchor
                        .select(sel)
                        .next()
                        .map(|el| el.text().collect::<String>().trim().to_string())
                })
            };

            let Some(title) = text_of(&title_sel).filter(|t| !t.is_empty()) else {
                continue;
            };

            candidates.push(Candidate {
                title,
                company: text_of(&company_sel).unwrap_or_default(),
                company_url: None,
                link: link.to_string(),
                posted_at: None,
                location: text_of(&region_sel).filter(|r| !r.is_empty()),
                description: None,
                job_type: Some(JobType::Remote),
                salary: None,
                source: "weworkremotely".to_string(),
            });
        }
        candidates
    }
}
