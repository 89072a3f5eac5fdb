//! Scrape orchestration
//!
//! The orchestrator is the single entry point for a scrape. It:
//! - Routes each URL to its site adapter before anything is fetched
//! - Walks board listings and fetches posts one at a time through the pacer
//! - Retries transient fetch failures
//! - Aggregates one result per URL and delivers posts to the sinks
//! - Stops between URLs when cancelled

use crate::config::ScrapeConfig;
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pacer::Pacer;
use crate::crawler::walker;
use crate::model::{BatchReport, FailureReason, ScrapeFailure, ScrapeResult};
use crate::output::PostSink;
use crate::sites::{Site, SiteRegistry};
use crate::ScrapeError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Fetch attempts per URL, the first one included
pub const MAX_FETCH_ATTEMPTS: u32 = 2;

/// Wait before retrying a transient failure
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Main scrape orchestrator
pub struct Orchestrator {
    fetcher: Arc<dyn PageFetcher>,
    config: ScrapeConfig,
    registry: SiteRegistry,
    sinks: Vec<Box<dyn PostSink>>,

    /// Shared by listing and post fetches, and across calls
    pacer: Pacer,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Page fetcher used for every listing and post page
    /// * `config` - Scrape settings
    /// * `registry` - Host to site routing
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig, registry: SiteRegistry) -> Self {
        let pacer = Pacer::from_config(&config);
        Self {
            fetcher,
            config,
            registry,
            sinks: Vec::new(),
            pacer,
            cancel: CancellationToken::new(),
        }
    }

    /// Adds a sink receiving every successfully extracted post
    pub fn with_sink(mut self, sink: Box<dyn PostSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Replaces the cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle that cancels running batches between URLs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Scrapes a single post
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeResult)` - The post, or why it could not be scraped
    /// * `Err(ScrapeError)` - The URL is invalid or no site adapter claims it
    pub async fn scrape_post(&mut self, url: &str) -> Result<ScrapeResult, ScrapeError> {
        let (url, site) = self.route(url)?;

        let result = scrape_one(
            self.fetcher.as_ref(),
            &self.config,
            &mut self.pacer,
            &url,
            site,
        )
        .await;
        deliver(&self.sinks, &result).await;

        Ok(result)
    }

    /// Scrapes a list of post URLs in order
    ///
    /// Every URL is routed before the first fetch, so one unsupported URL
    /// fails the whole call without touching the network.
    pub async fn scrape_posts<I>(&mut self, urls: I) -> Result<BatchReport, ScrapeError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let targets = urls
            .into_iter()
            .map(|url| self.route(url.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Scraping {} post URLs", targets.len());

        let fetcher = self.fetcher.as_ref();
        let mut report = BatchReport::default();

        for (url, site) in &targets {
            if self.cancel.is_cancelled() {
                info!("Batch cancelled after {} of {} URLs", report.len(), targets.len());
                report.cancelled = true;
                break;
            }

            let result = scrape_one(fetcher, &self.config, &mut self.pacer, url, *site).await;
            deliver(&self.sinks, &result).await;
            report.results.push(result);
        }

        log_report(&report);
        Ok(report)
    }

    /// Scrapes up to `post_limit` posts listed on a board
    ///
    /// # Returns
    ///
    /// * `Ok(BatchReport)` - One result per discovered post, in listing order
    /// * `Err(ScrapeError)` - Routing failed or the first listing page could
    ///   not be fetched
    pub async fn scrape_board(&mut self, board_url: &str) -> Result<BatchReport, ScrapeError> {
        let (board, site) = self.route(board_url)?;
        info!("Scraping board {} ({}), limit {}", board, site, self.config.post_limit);

        let fetcher = self.fetcher.as_ref();
        let config = &self.config;
        let pacer = &mut self.pacer;

        let mut listing = walker::walk(&board, site.rules(), fetcher, pacer, config).await?;
        let mut report = BatchReport::default();

        loop {
            if self.cancel.is_cancelled() {
                info!("Board scrape cancelled after {} posts", report.len());
                report.cancelled = true;
                break;
            }

            let Some(url) = listing.next_url(pacer).await else {
                break;
            };

            let result = scrape_one(fetcher, config, pacer, &url, site).await;
            deliver(&self.sinks, &result).await;
            report.results.push(result);
        }

        debug!("Read {} listing pages of {}", listing.pages_read(), board);
        log_report(&report);
        Ok(report)
    }

    fn route(&self, url: &str) -> Result<(Url, Site), ScrapeError> {
        let parsed = Url::parse(url).map_err(|source| ScrapeError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let site = self.registry.resolve(&parsed)?;
        Ok((parsed, site))
    }
}

/// Fetches and extracts one post, retrying transient fetch failures
async fn scrape_one(
    fetcher: &dyn PageFetcher,
    config: &ScrapeConfig,
    pacer: &mut Pacer,
    url: &Url,
    site: Site,
) -> ScrapeResult {
    let readiness = site.rules().post_readiness();
    let mut attempts = 0;

    let raw = loop {
        attempts += 1;
        pacer.wait_turn().await;

        match fetcher.fetch(url, &readiness, config).await {
            Ok(raw) => break raw,
            Err(e) if e.is_transient() && attempts < MAX_FETCH_ATTEMPTS => {
                warn!(
                    "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                    attempts, MAX_FETCH_ATTEMPTS, url, e.kind, RETRY_BACKOFF
                );
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(e) => {
                warn!("Giving up on {}: {}", url, e);
                return failure(url, FailureReason::Fetch(e), attempts);
            }
        }
    };

    match extract(&raw, site) {
        Ok(post) => {
            debug!(
                "Extracted {}/{} ({} comments)",
                post.site,
                post.post_id,
                post.comments.len()
            );
            ScrapeResult::Success(post)
        }
        Err(e) => {
            warn!("Could not extract {}: {}", url, e);
            failure(url, FailureReason::Extract(e), attempts)
        }
    }
}

fn failure(url: &Url, reason: FailureReason, attempts: u32) -> ScrapeResult {
    ScrapeResult::Failure(ScrapeFailure {
        url: url.to_string(),
        reason,
        attempts,
    })
}

/// Hands a successful post to every sink; sink errors are only logged
async fn deliver(sinks: &[Box<dyn PostSink>], result: &ScrapeResult) {
    let Some(post) = result.post() else {
        return;
    };

    for sink in sinks {
        if let Err(e) = sink.accept(post).await {
            warn!(
                "Sink '{}' rejected {}/{}: {}",
                sink.name(),
                post.site,
                post.post_id,
                e
            );
        }
    }
}

fn log_report(report: &BatchReport) {
    info!(
        "Batch finished: {} succeeded, {} failed{}",
        report.success_count(),
        report.failure_count(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{
        clien_listing, clien_post, clien_post_without_title, Reply, ScriptedFetcher,
    };
    use crate::model::Post;
    use crate::output::{SinkError, SinkResult};
    use crate::{ExtractErrorKind, FetchErrorKind};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;

    const BOARD: &str = "https://www.clien.net/service/board/park";

    fn listing_page(index: u32) -> String {
        format!("{}?po={}", BOARD, index)
    }

    fn post_url(id: u32) -> String {
        format!("{}/{}", BOARD, id)
    }

    fn config(delay: f64) -> ScrapeConfig {
        ScrapeConfig {
            delay_between_requests: delay,
            wait_time: 0,
            ..ScrapeConfig::default()
        }
    }

    fn orchestrator(fetcher: &Arc<ScriptedFetcher>, config: ScrapeConfig) -> Orchestrator {
        Orchestrator::new(fetcher.clone(), config, SiteRegistry::new())
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PostSink for Arc<RecordingSink> {
        fn name(&self) -> &str {
            "recording"
        }

        async fn accept(&self, post: &Post) -> SinkResult<()> {
            self.seen.lock().unwrap().push(post.post_id.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl PostSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn accept(&self, _post: &Post) -> SinkResult<()> {
            Err(SinkError::Status {
                status: 500,
                url: "http://sink.invalid/".to_string(),
            })
        }
    }

    /// Cancels the batch once it has seen a post
    struct CancellingSink(CancellationToken);

    #[async_trait]
    impl PostSink for CancellingSink {
        fn name(&self) -> &str {
            "cancelling"
        }

        async fn accept(&self, _post: &Post) -> SinkResult<()> {
            self.0.cancel();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_board_keeps_order_and_isolates_failure() {
        let ids: Vec<u32> = (1..=8).collect();
        let mut fetcher = ScriptedFetcher::new().page(&listing_page(0), clien_listing(&ids));
        for id in &ids {
            let body = if *id == 5 {
                clien_post_without_title()
            } else {
                clien_post(&format!("post {}", id))
            };
            fetcher = fetcher.page(&post_url(*id), body);
        }
        let fetcher = Arc::new(fetcher);

        let mut orchestrator = orchestrator(&fetcher, ScrapeConfig {
            post_limit: 8,
            ..config(0.0)
        });
        let report = orchestrator.scrape_board(BOARD).await.unwrap();

        assert_eq!(report.len(), 8);
        assert_eq!(report.success_count(), 7);
        assert!(!report.cancelled);

        let failure = report.results[4].failure().unwrap();
        assert_eq!(failure.url, post_url(5));
        match &failure.reason {
            FailureReason::Extract(e) => assert_eq!(e.kind, ExtractErrorKind::MissingField),
            other => panic!("unexpected failure reason: {:?}", other),
        }

        let ids: Vec<&str> = report.posts().map(|p| p.post_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "6", "7", "8"]);
    }

    #[tokio::test]
    async fn test_board_stops_at_post_limit() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .page(&listing_page(0), clien_listing(&[1, 2, 3]))
                .page(&post_url(1), clien_post("a"))
                .page(&post_url(2), clien_post("b")),
        );

        let mut orchestrator = orchestrator(&fetcher, ScrapeConfig {
            post_limit: 2,
            ..config(0.0)
        });
        let report = orchestrator.scrape_board(BOARD).await.unwrap();

        assert_eq!(report.success_count(), 2);
        assert_eq!(fetcher.call_count(&post_url(3)), 0);
    }

    #[tokio::test]
    async fn test_unreadable_board_is_an_error() {
        let fetcher = Arc::new(
            ScriptedFetcher::new().fail(&listing_page(0), FetchErrorKind::Blocked),
        );

        let mut orchestrator = orchestrator(&fetcher, config(0.0));
        let result = orchestrator.scrape_board(BOARD).await;

        assert!(matches!(
            result,
            Err(ScrapeError::Listing(ref e)) if e.kind == FetchErrorKind::Blocked
        ));
    }

    #[tokio::test]
    async fn test_empty_board_is_empty_report() {
        let fetcher = Arc::new(ScriptedFetcher::new().page(&listing_page(0), clien_listing(&[])));

        let mut orchestrator = orchestrator(&fetcher, config(0.0));
        let report = orchestrator.scrape_board(BOARD).await.unwrap();

        assert!(report.is_empty());
        assert!(!report.cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_starts_are_paced() {
        let mut fetcher = ScriptedFetcher::new();
        let urls: Vec<String> = (1..=5).map(post_url).collect();
        for url in &urls {
            fetcher = fetcher.page(url, clien_post("paced"));
        }
        let fetcher = Arc::new(fetcher);

        let mut orchestrator = orchestrator(&fetcher, config(2.0));
        let start = Instant::now();
        let report = orchestrator.scrape_posts(&urls).await.unwrap();

        assert_eq!(report.success_count(), 5);
        assert!(start.elapsed() >= Duration::from_secs(8));

        let calls = fetcher.calls();
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_secs(2));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let url = post_url(11);
        let fetcher = Arc::new(ScriptedFetcher::new().script(
            &url,
            vec![
                Reply::Fail(FetchErrorKind::Network),
                Reply::Page(clien_post("second time lucky")),
            ],
        ));

        let mut orchestrator = orchestrator(&fetcher, config(0.0));
        let start = Instant::now();
        let result = orchestrator.scrape_post(&url).await.unwrap();

        assert_eq!(result.post().unwrap().metadata.title, "second time lucky");
        assert_eq!(fetcher.call_count(&url), 2);
        assert!(start.elapsed() >= RETRY_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let url = post_url(12);
        let fetcher = Arc::new(ScriptedFetcher::new().fail(&url, FetchErrorKind::Timeout));

        let mut orchestrator = orchestrator(&fetcher, config(0.0));
        let result = orchestrator.scrape_post(&url).await.unwrap();

        let failure = result.failure().unwrap();
        assert_eq!(failure.attempts, MAX_FETCH_ATTEMPTS);
        assert_eq!(fetcher.call_count(&url), MAX_FETCH_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        let blocked = post_url(13);
        let missing = post_url(14);
        let fetcher = Arc::new(ScriptedFetcher::new().fail(&blocked, FetchErrorKind::Blocked));

        let mut orchestrator = orchestrator(&fetcher, config(0.0));
        let report = orchestrator
            .scrape_posts([&blocked, &missing])
            .await
            .unwrap();

        assert_eq!(report.failure_count(), 2);
        assert_eq!(fetcher.call_count(&blocked), 1);
        assert_eq!(fetcher.call_count(&missing), 1);

        match &report.results[1].failure().unwrap().reason {
            FailureReason::Fetch(e) => assert_eq!(e.kind, FetchErrorKind::NotFound),
            other => panic!("unexpected failure reason: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_is_not_retried() {
        let url = post_url(15);
        let fetcher = Arc::new(ScriptedFetcher::new().page(&url, clien_post_without_title()));

        let mut orchestrator = orchestrator(&fetcher, config(0.0));
        let result = orchestrator.scrape_post(&url).await.unwrap();

        assert_eq!(result.failure().unwrap().attempts, 1);
        assert_eq!(fetcher.call_count(&url), 1);
    }

    #[tokio::test]
    async fn test_unsupported_site_fails_before_fetching() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut orchestrator = orchestrator(&fetcher, config(0.0));

        let result = orchestrator
            .scrape_posts([post_url(1), "https://example.com/post/1".to_string()])
            .await;

        assert!(matches!(result, Err(ScrapeError::UnsupportedSite(_))));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut orchestrator = orchestrator(&fetcher, config(0.0));

        let result = orchestrator.scrape_post("not a url").await;
        assert!(matches!(result, Err(ScrapeError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_each_post_reaches_sinks_once() {
        let urls: Vec<String> = vec![post_url(21), post_url(22), post_url(23)];
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .page(&urls[0], clien_post("a"))
                .page(&urls[1], clien_post_without_title())
                .page(&urls[2], clien_post("c")),
        );
        let recording = Arc::new(RecordingSink::default());

        let mut orchestrator = orchestrator(&fetcher, config(0.0))
            .with_sink(Box::new(FailingSink))
            .with_sink(Box::new(recording.clone()));
        let report = orchestrator.scrape_posts(&urls).await.unwrap();

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(*recording.seen.lock().unwrap(), vec!["21", "23"]);
    }

    #[tokio::test]
    async fn test_cancellation_between_urls() {
        let urls: Vec<String> = (31..=34).map(post_url).collect();
        let mut fetcher = ScriptedFetcher::new();
        for url in &urls {
            fetcher = fetcher.page(url, clien_post("x"));
        }
        let fetcher = Arc::new(fetcher);

        let token = CancellationToken::new();
        let mut orchestrator = orchestrator(&fetcher, config(0.0))
            .with_cancellation(token.clone())
            .with_sink(Box::new(CancellingSink(token)));
        let report = orchestrator.scrape_posts(&urls).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.len(), 1);
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_board_returns_partial_report() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .page(&listing_page(0), clien_listing(&[1, 2]))
                .page(&post_url(1), clien_post("a"))
                .page(&post_url(2), clien_post("b")),
        );

        let orchestrator = orchestrator(&fetcher, config(0.0));
        let token = orchestrator.cancellation_token();
        let mut orchestrator = orchestrator.with_sink(Box::new(CancellingSink(token)));
        let report = orchestrator.scrape_board(BOARD).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.len(), 1);
        assert_eq!(fetcher.call_count(&post_url(2)), 0);
    }
}
