//! Page fetcher
//!
//! This module handles navigating to forum pages, including:
//! - Bounding every fetch by the configured timeout
//! - Settling after navigation before content is read
//! - Detecting anti-bot challenge pages
//! - Mapping HTTP statuses and transport errors to [`FetchErrorKind`]
//!
//! Retries are not performed here; the orchestrator decides.

use crate::config::ScrapeConfig;
use crate::crawler::session::BrowserSession;
use crate::{FetchError, FetchErrorKind};
use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use tokio::time::Instant;
use url::Url;

/// Challenge markers served by common anti-bot front ends
const GENERIC_BLOCK_MARKERS: &[&str] = &[
    "cf-chl",
    "challenge-platform",
    "cf-browser-verification",
    "captcha-delivery",
];

/// What a ready page looks like, per page kind
#[derive(Debug, Clone, Copy)]
pub struct Readiness {
    /// Selector that exists once the page is usable
    pub selector: &'static str,

    /// Site-specific substrings of a block page
    pub block_markers: &'static [&'static str],
}

impl Readiness {
    /// Checks fetched markup against the readiness rule
    ///
    /// A page without the ready selector is only an error when it also looks
    /// like a challenge page; otherwise the extractor gets to decide.
    pub fn check(&self, url: &Url, body: &str) -> Result<(), FetchError> {
        let document = Html::parse_document(body);
        let ready = Selector::parse(self.selector)
            .map(|selector| document.select(&selector).next().is_some())
            .unwrap_or(false);

        if ready {
            return Ok(());
        }

        if let Some(marker) = self
            .block_markers
            .iter()
            .chain(GENERIC_BLOCK_MARKERS)
            .find(|marker| body.contains(**marker))
        {
            return Err(FetchError::new(
                FetchErrorKind::Blocked,
                url.as_str(),
                format!("challenge page detected (marker: {})", marker),
            ));
        }

        tracing::debug!("Ready selector '{}' absent on {}", self.selector, url);
        Ok(())
    }
}

/// Markup of a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent {
    pub requested_url: Url,
    /// URL after redirects
    pub final_url: Url,
    pub status: u16,
    pub body: String,
}

/// Navigates to a page and returns its markup once ready
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page
    ///
    /// # Arguments
    ///
    /// * `url` - Page to navigate to
    /// * `readiness` - Ready selector and block markers for this page kind
    /// * `config` - Scrape settings (timeout, settle time, slow-mo)
    ///
    /// # Returns
    ///
    /// * `Ok(RawContent)` - The page markup
    /// * `Err(FetchError)` - Timeout, not found, blocked or network failure
    async fn fetch(
        &self,
        url: &Url,
        readiness: &Readiness,
        config: &ScrapeConfig,
    ) -> Result<RawContent, FetchError>;
}

/// HTTP implementation of [`PageFetcher`]
///
/// Every call opens its own [`BrowserSession`], so cookies never leak
/// between fetches. Sessions are always headless.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &Url,
        readiness: &Readiness,
        config: &ScrapeConfig,
    ) -> Result<RawContent, FetchError> {
        let deadline = Instant::now() + config.timeout();

        match tokio::time::timeout_at(deadline, fetch_page(url, readiness, config, deadline)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(
                FetchErrorKind::Timeout,
                url.as_str(),
                format!("page not ready within {}ms", config.timeout),
            )),
        }
    }
}

async fn fetch_page(
    url: &Url,
    readiness: &Readiness,
    config: &ScrapeConfig,
    deadline: Instant,
) -> Result<RawContent, FetchError> {
    let session = BrowserSession::open(config).map_err(|e| {
        FetchError::new(
            FetchErrorKind::Network,
            url.as_str(),
            format!("failed to open session: {}", e),
        )
    })?;

    session.pause().await;
    tracing::debug!("Navigating to {}", url);

    let response = session
        .navigate(url)
        .await
        .map_err(|e| classify_transport_error(url, &e))?;

    let status = response.status();
    let final_url = response.url().clone();

    if let Some(kind) = classify_status(status) {
        return Err(FetchError::new(kind, url.as_str(), format!("HTTP {}", status))
            .with_status(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify_transport_error(url, &e))?;

    session.pause().await;

    // Settle, but never past the fetch budget
    let settle = config
        .wait_time()
        .min(deadline.saturating_duration_since(Instant::now()));
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    readiness.check(&final_url, &body)?;

    Ok(RawContent {
        requested_url: url.clone(),
        final_url,
        status: status.as_u16(),
        body,
    })
}

/// Maps a final HTTP status to a failure class
///
/// | Status | Kind |
/// |--------|------|
/// | 2xx, 3xx | success |
/// | 401, 403, 429 | Blocked |
/// | other 4xx (404, 410, ...) | NotFound |
/// | 5xx | Network |
pub fn classify_status(status: StatusCode) -> Option<FetchErrorKind> {
    match status.as_u16() {
        100..=399 => None,
        401 | 403 | 429 => Some(FetchErrorKind::Blocked),
        400..=499 => Some(FetchErrorKind::NotFound),
        _ => Some(FetchErrorKind::Network),
    }
}

fn classify_transport_error(url: &Url, error: &reqwest::Error) -> FetchError {
    let kind = if error.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        FetchErrorKind::Network
    };
    FetchError::new(kind, url.as_str(), error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://www.clien.net/service/board/park/1").unwrap()
    }

    const READINESS: Readiness = Readiness {
        selector: "div.post_view",
        block_markers: &["접근이 차단되었습니다"],
    };

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), None);
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            Some(FetchErrorKind::NotFound)
        );
        assert_eq!(
            classify_status(StatusCode::GONE),
            Some(FetchErrorKind::NotFound)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            Some(FetchErrorKind::Blocked)
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(FetchErrorKind::Blocked)
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            Some(FetchErrorKind::Network)
        );
    }

    #[test]
    fn test_ready_page_passes() {
        let body = r#"<html><body><div class="post_view">ok</div></body></html>"#;
        assert!(READINESS.check(&url(), body).is_ok());
    }

    #[test]
    fn test_ready_page_with_marker_text_passes() {
        // A post quoting the marker is still a post
        let body = r#"<div class="post_view">접근이 차단되었습니다</div>"#;
        assert!(READINESS.check(&url(), body).is_ok());
    }

    #[test]
    fn test_site_marker_is_blocked() {
        let body = "<html><body><h1>접근이 차단되었습니다</h1></body></html>";
        let err = READINESS.check(&url(), body).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Blocked);
    }

    #[test]
    fn test_generic_challenge_is_blocked() {
        let body = r#"<html><body><div id="challenge-platform"></div></body></html>"#;
        let err = READINESS.check(&url(), body).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Blocked);
    }

    #[test]
    fn test_missing_selector_without_marker_passes() {
        let body = "<html><body><p>unexpected layout</p></body></html>";
        assert!(READINESS.check(&url(), body).is_ok());
    }
}
