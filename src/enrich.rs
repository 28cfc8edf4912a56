//! Best-effort enrichment hooks called after a candidate is persisted.
//!
//! Both lookups are infallible by contract: any internal failure
//! degrades to an unknown/empty result and is logged, never surfaced to
//! the run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCategory {
    Unknown,
    Micro,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl SizeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeCategory::Unknown => "unknown",
            SizeCategory::Micro => "micro",
            SizeCategory::Small => "small",
            SizeCategory::Medium => "medium",
            SizeCategory::Large => "large",
            SizeCategory::Enterprise => "enterprise",
        }
    }

    pub fn from_headcount(headcount: u64) -> SizeCategory {
        match headcount {
            0 => SizeCategory::Unknown,
            1..=9 => SizeCategory::Micro,
            10..=49 => SizeCategory::Small,
            50..=249 => SizeCategory::Medium,
            250..=999 => SizeCategory::Large,
            _ => SizeCategory::Enterprise,
        }
    }
}

#[async_trait]
pub trait Enrichment: Send + Sync {
    /// Company-size lookup. Safe with empty/unknown inputs.
    async fn company_size(&self, name: &str, website: Option<&str>) -> SizeCategory;

    /// Decision-maker lookup, capped at `max` contacts.
    async fn find_contacts(&self, name: &str, website: Option<&str>, max: usize) -> Vec<Contact>;
}

/// Used when no enrichment service is configured.
pub struct NoopEnrichment;

#[async_trait]
impl Enrichment for NoopEnrichment {
    async fn company_size(&self, _name: &str, _website: Option<&str>) -> SizeCategory {
        SizeCategory::Unknown
    }

    async fn find_contacts(&self, _name: &str, _website: Option<&str>, _max: usize) -> Vec<Contact> {
        Vec::new()
    }
}

/// Thin adapter over an external HTTP lookup service.
pub struct HttpEnrichment {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEnrichment {
    pub fn new(base_url: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("enrichment client build failed: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Enrichment for HttpEnrichment {
    async fn company_size(&self, name: &str, website: Option<&str>) -> SizeCategory {
        if name.is_empty() {
            return SizeCategory::Unknown;
        }
        let result = self
            .client
            .get(format!("{}/v1/company-size", self.base_url))
            .query(&[("name", name), ("website", website.unwrap_or(""))])
            .send()
            .await;
        let response = match result {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!("Company-size lookup for '{name}' returned {}", r.status());
                return SizeCategory::Unknown;
            }
            Err(e) => {
                tracing::debug!("Company-size lookup for '{name}' failed: {e}");
                return SizeCategory::Unknown;
            }
        };
        match response.json::<serde_json::Value>().await {
            Ok(data) => data
                .get("headcount")
                .and_then(|v| v.as_u64())
                .map(SizeCategory::from_headcount)
                .unwrap_or(SizeCategory::Unknown),
            Err(e) => {
                tracing::debug!("Company-size response for '{name}' unparseable: {e}");
                SizeCategory::Unknown
            }
        }
    }

    async fn find_contacts(&self, name: &str, website: Option<&str>, max: usize) -> Vec<Contact> {
        if name.is_empty() || max == 0 {
            return Vec::new();
        }
        let limit = max.to_string();
        let result = self
            .client
            .get(format!("{}/v1/contacts", self.base_url))
            .query(&[
                ("name", name),
                ("website", website.unwrap_or("")),
                ("limit", limit.as_str()),
            ])
            .send()
            .await;
        let response = match result {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!("Contact lookup for '{name}' returned {}", r.status());
                return Vec::new();
            }
            Err(e) => {
                tracing::debug!("Contact lookup for '{name}' failed: {e}");
                return Vec::new();
            }
        };
        match response.json::<serde_json::Value>().await {
            Ok(data) => data
                .get("contacts")
                .and_then(|v| v.as_array())
                .map(|contacts| {
                    contacts
                        .iter()
                        .filter_map(|c| serde_json::from_value(c.clone()).ok())
                        .take(max)
                        .collect()
                })
                .unwrap_or_default(),
            Err(e) => {
                tracing::debug!("Contact response for '{name}' unparseable: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_enrichment_degrades_cleanly() {
        let enrichment = NoopEnrichment;
        assert_eq!(enrichment.company_size("", None).await, SizeCategory::Unknown);
        assert_eq!(
            enrichment.company_size("Acme", Some("https://acme.example")).await,
            SizeCategory::Unknown
        );
        assert!(enrichment.find_contacts("Acme", None, 5).await.is_empty());
    }

    #[test]
    fn headcount_buckets() {
        assert_eq!(SizeCategory::from_headcount(0), SizeCategory::Unknown);
        assert_eq!(SizeCategory::from_headcount(5), SizeCategory::Micro);
        assert_eq!(SizeCategory::from_headcount(49), SizeCategory::Small);
        assert_eq!(SizeCategory::from_headcount(100), SizeCategory::Medium);
        assert_eq!(SizeCategory::from_headcount(500), SizeCategory::Large);
        assert_eq!(SizeCategory::from_headcount(10_000), SizeCategory::Enterprise);
    }
}
