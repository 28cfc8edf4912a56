//! Headless-browser fallback for JS-rendered sources.
//!
//! Launches a chromium session with automation signals suppressed, loads
//! the page, performs a bounded number of incremental scrolls to trigger
//! lazy-loaded listings, and returns the rendered document.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;

use crate::fetch::FetchError;

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Number of scroll-to-bottom passes after initial load.
    pub scroll_passes: usize,
    /// Settle time after navigation and after each scroll.
    pub settle: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            scroll_passes: 3,
            settle: Duration::from_millis(1500),
        }
    }
}

pub struct BrowserFetcher {
    options: BrowserOptions,
}

impl BrowserFetcher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    /// Load a page in a fresh headless session and return the rendered
    /// content. Each call owns its own browser process; sessions are not
    /// pooled.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let config = BrowserConfig::builder()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .build()
            .map_err(FetchError::Browser)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(format!("launch failed: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.render(&browser, url).await;

        if let Err(e) = browser.close().await {
            tracing::debug!("Browser close failed for {url}: {e}");
        }
        handler_task.abort();

        result
    }

    async fn render(&self, browser: &Browser, url: &str) -> Result<String, FetchError> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| FetchError::Browser(format!("navigation to {url} failed: {e}")))?;

        if let Err(e) = page.wait_for_navigation().await {
            tracing::debug!("Navigation wait for {url}: {e}");
        }
        tokio::time::sleep(self.options.settle).await;

        for pass in 0..self.options.scroll_passes {
            if let Err(e) = page
                .evaluate("window.scrollTo(0, document.body.scrollHeight)")
                .await
            {
                tracing::debug!("Scroll pass {pass} on {url} failed: {e}");
                break;
            }
            tokio::time::sleep(self.options.settle).await;
        }

        let content = page
            .content()
            .await
            .map_err(|e| FetchError::Browser(format!("content read failed: {e}")))?;

        if let Err(e) = page.close().await {
            tracing::debug!("Page close failed for {url}: {e}");
        }

        if content.trim().is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        Ok(content)
    }
}
