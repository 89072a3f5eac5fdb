//! Scoped fetch session
//!
//! A [`BrowserSession`] owns a cookie-holding HTTP client for the duration of
//! one fetch. It is released when dropped, which covers early returns,
//! timeouts and cancelled futures alike.

use crate::config::ScrapeConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Upper bound on connection setup, independent of the fetch budget
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum redirect hops followed during navigation
const MAX_REDIRECTS: usize = 10;

/// A single-use navigation session
#[derive(Debug)]
pub struct BrowserSession {
    client: Client,
    slow_mo: Duration,
    opened_at: Instant,
}

impl BrowserSession {
    /// Opens a session configured from the scrape settings
    ///
    /// # Arguments
    ///
    /// * `config` - Scrape settings (user agent, timeout, slow-mo)
    ///
    /// # Returns
    ///
    /// * `Ok(BrowserSession)` - Session ready to navigate
    /// * `Err(reqwest::Error)` - The HTTP client could not be built
    pub fn open(config: &ScrapeConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.7,en;q=0.5"),
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.timeout())
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        tracing::trace!("Fetch session opened");

        Ok(Self {
            client,
            slow_mo: config.slow_mo(),
            opened_at: Instant::now(),
        })
    }

    /// Waits for the configured slow-mo delay between session actions
    pub async fn pause(&self) {
        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
    }

    /// Navigates to a URL, following redirects
    pub async fn navigate(&self, url: &Url) -> Result<Response, reqwest::Error> {
        self.client.get(url.clone()).send().await
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        tracing::trace!(
            "Fetch session released after {:?}",
            self.opened_at.elapsed()
        );
    }
}
