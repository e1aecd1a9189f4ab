use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use crate::rate_limit::{extract_domain, RateLimiter};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

/// Rendered HTML of a page and the URL it ended up on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
}

/// Anything that can turn a URL into rendered HTML
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage>;
}

/// Browser automation engine
///
/// One Chromium process shared by a bounded number of concurrent pages.
pub struct BrowserEngine {
    browser: Browser,
    handler: JoinHandle<()>,
    fingerprint: FingerprintConfig,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    sessions: Arc<Semaphore>,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chromium according to the browser settings
    pub async fn launch(
        settings: &tcgprice_core::BrowserConfig,
        request_delay: Duration,
    ) -> Result<Self> {
        let fingerprint =
            FingerprintConfig::randomized(settings.window_width, settings.window_height);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .arg(fingerprint.user_agent_arg());
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        tracing::info!(
            "Browser launched (headless: {}, sessions: {})",
            settings.headless,
            settings.max_sessions
        );

        Ok(Self {
            browser,
            handler,
            fingerprint,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(request_delay))),
            sessions: Arc::new(Semaphore::new(settings.max_sessions.max(1))),
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
        })
    }

    pub fn fingerprint(&self) -> &FingerprintConfig {
        &self.fingerprint
    }

    /// Shut the browser down
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        self.handler.abort();
    }

    async fn wait_for_turn(&self, domain: &str) {
        let wait = self.rate_limiter.lock().await.reserve(domain, Instant::now());
        if !wait.is_zero() {
            tracing::debug!("Waiting {:?} before next request to {}", wait, domain);
            tokio::time::sleep(wait).await;
        }
    }

    async fn render(&self, page: &Page, url: &str) -> Result<FetchedPage> {
        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;

        let html = page
            .content()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        let final_url = page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            .unwrap_or_else(|| url.to_string());

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

#[async_trait]
impl PageSource for BrowserEngine {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let domain = extract_domain(url)?;

        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("session pool closed: {e}")))?;
        self.wait_for_turn(&domain).await;

        tracing::debug!("Navigating to {}", url);
        let page = tokio::time::timeout(self.navigation_timeout, self.browser.new_page(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("opening {url}")))?
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;

        let rendered = tokio::time::timeout(self.navigation_timeout, self.render(&page, url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("rendering {url}")));

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        rendered?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Chrome browser - run with --ignored"]
    async fn test_launch_and_fetch() {
        let settings = tcgprice_core::BrowserConfig::default();
        let engine = BrowserEngine::launch(&settings, Duration::from_millis(10))
            .await
            .expect("launch browser");

        let page = engine
            .fetch_page("https://example.com")
            .await
            .expect("fetch page");
        assert!(page.html.contains("Example Domain"));

        engine.close().await;
    }
}
