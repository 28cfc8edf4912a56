//! Resilient fetch layer.
//!
//! Every logical retrieval goes through a retry loop with exponential
//! backoff and a fresh identity (user-agent, optionally proxy) per
//! attempt. Responses are scanned for block/CAPTCHA indicators before
//! being accepted; a positive match is a retryable failure, never a
//! success. When the plain HTTP path is exhausted the fetcher can
//! escalate to a scripted headless-browser session for JS-rendered
//! sources.

pub mod browser;
pub mod identity;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use url::Url;

use crate::fetch::browser::BrowserFetcher;
use crate::fetch::identity::IdentityPool;

/// Typed failure of a single logical fetch, reported after all retries
/// are exhausted. Never fatal to a run; the coordinator records it
/// against the source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("blocked by anti-bot measures: {0}")]
    Blocked(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("empty response body")]
    EmptyResponse,
    #[error("browser session failed: {0}")]
    Browser(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Content markers that indicate a block page or CAPTCHA interstitial
/// rather than real content. Matched case-insensitively.
const BLOCK_INDICATORS: &[&str] = &[
    "captcha",
    "cloudflare",
    "cf-chl",
    "access denied",
    "too many requests",
    "unusual traffic",
    "request blocked",
    "verify you are human",
    "are you a robot",
    "attention required",
    "enable javascript and cookies to continue",
];

/// Scan content for block indicators, returning the first match.
pub fn detect_block(content: &str) -> Option<&'static str> {
    let lowered = content.to_lowercase();
    BLOCK_INDICATORS
        .iter()
        .find(|indicator| lowered.contains(**indicator))
        .copied()
}

/// Backoff before re-attempting after failed attempt number `attempt`
/// (zero-based): base * 2^attempt plus jitter bounded by min(base, 250ms).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_cap = base.as_millis().min(250) as u64;
    let jitter = if jitter_cap == 0 {
        0
    } else {
        rand::rng().random_range(0..=jitter_cap)
    };
    exponential + Duration::from_millis(jitter)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Skip the plain HTTP path entirely; the source is known to be
    /// JS-rendered.
    pub force_browser: bool,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum plain-HTTP attempts per logical fetch.
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts.
    pub base_backoff: Duration,
    /// Per-request timeout on the plain HTTP path.
    pub request_timeout: Duration,
    /// Hard cap on one browser-session fallback.
    pub browser_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
            browser_timeout: Duration::from_secs(90),
        }
    }
}

/// Abstraction over the fetch layer so the coordinator can be exercised
/// with stubs.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, opts: FetchOptions) -> Result<String, FetchError>;
}

/// The production fetcher. Safe to share across concurrent source tasks:
/// identity state is synchronized inside the pool.
pub struct Fetcher {
    config: FetchConfig,
    identity: Arc<IdentityPool>,
    browser: Option<BrowserFetcher>,
}

impl Fetcher {
    pub fn new(config: FetchConfig, identity: Arc<IdentityPool>) -> Self {
        Self {
            config,
            identity,
            browser: None,
        }
    }

    /// Enable the headless-browser fallback. Strictly more expensive than
    /// the HTTP path; used for forced-browser sources and as a last
    /// resort once plain attempts are exhausted.
    pub fn with_browser(mut self, browser: BrowserFetcher) -> Self {
        self.browser = Some(browser);
        self
    }

    async fn fetch_via_browser(&self, url: &str) -> Result<String, FetchError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser fallback not configured".to_string()))?;
        let content = tokio::time::timeout(self.config.browser_timeout, browser.fetch(url))
            .await
            .map_err(|_| FetchError::Timeout)??;
        if let Some(indicator) = detect_block(&content) {
            return Err(FetchError::Blocked(indicator.to_string()));
        }
        Ok(content)
    }

    /// One plain HTTP attempt under a freshly drawn identity.
    async fn attempt(&self, url: &Url) -> Result<String, FetchError> {
        let identity = self.identity.draw();
        let proxy_index = identity.proxy.as_ref().map(|(index, _)| *index);

        let result = self.attempt_with_identity(url, &identity).await;
        if result.is_err()
            && let Some(index) = proxy_index
        {
            self.identity.mark_bad(index);
        }
        result
    }

    async fn attempt_with_identity(
        &self,
        url: &Url,
        identity: &identity::Identity,
    ) -> Result<String, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(identity.user_agent)
            .timeout(self.config.request_timeout);
        if let Some((_, proxy_url)) = &identity.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| FetchError::InvalidUrl(format!("proxy {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Network(format!("client build failed: {e}")))?;

        let response = client
            .get(url.as_str())
            .header("Accept", "text/html,application/json,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 429 {
            return Err(FetchError::Blocked(format!("HTTP {status}")));
        }
        if status.as_u16() == 408 {
            return Err(FetchError::Timeout);
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(classify_reqwest_error)?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        if let Some(indicator) = detect_block(&body) {
            return Err(FetchError::Blocked(indicator.to_string()));
        }
        Ok(body)
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}

#[async_trait]
impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str, opts: FetchOptions) -> Result<String, FetchError> {
        if opts.force_browser && self.browser.is_some() {
            return self.fetch_via_browser(url).await;
        }

        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let mut last_error = FetchError::Network("no attempt made".to_string());
        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(self.config.base_backoff, attempt - 1)).await;
            }
            match self.attempt(&parsed).await {
                Ok(body) => return Ok(body),
                Err(FetchError::InvalidUrl(msg)) => return Err(FetchError::InvalidUrl(msg)),
                Err(e) => {
                    tracing::debug!(
                        "Attempt {}/{} for {url} failed: {e}",
                        attempt + 1,
                        self.config.max_attempts
                    );
                    last_error = e;
                }
            }
        }

        if self.browser.is_some() {
            tracing::warn!("Plain fetch of {url} exhausted retries ({last_error}), escalating to browser");
            return self.fetch_via_browser(url).await;
        }
        Err(last_error)
    }
}
