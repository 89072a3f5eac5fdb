use crate::sites::{Site, SiteRegistry};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Extra host patterns routed to a known site
    #[serde(default, rename = "alias")]
    pub aliases: Vec<SiteAlias>,
}

impl Config {
    /// Builds the site registry, including configured aliases
    pub fn registry(&self) -> SiteRegistry {
        let mut registry = SiteRegistry::new();
        for alias in &self.aliases {
            registry.add_alias(alias.domain.clone(), alias.site);
        }
        registry
    }
}

/// Scrape behavior configuration
///
/// Immutable once loaded; every batch reads it by reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Run the fetch session without a visible UI
    pub headless: bool,

    /// Artificial delay between session actions (milliseconds)
    #[serde(rename = "slow-mo")]
    pub slow_mo: u64,

    /// Maximum number of posts taken from a board listing
    #[serde(rename = "post-limit")]
    pub post_limit: usize,

    /// Minimum interval between consecutive fetches (seconds)
    #[serde(rename = "delay-between-requests")]
    pub delay_between_requests: f64,

    /// Settle time after navigation before content is read (milliseconds)
    #[serde(rename = "wait-time")]
    pub wait_time: u64,

    /// Hard budget for one fetch (milliseconds)
    pub timeout: u64,

    /// Endpoint receiving scraped posts; forwarding is off when unset
    #[serde(rename = "api-url")]
    pub api_url: Option<String>,

    /// Upper bound on listing pages read for one board
    #[serde(rename = "max-listing-pages")]
    pub max_listing_pages: u32,

    /// User-Agent header sent by fetch sessions
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            slow_mo: 0,
            post_limit: 20,
            delay_between_requests: 2.0,
            wait_time: 1_000,
            timeout: 30_000,
            api_url: None,
            max_listing_pages: 20,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl ScrapeConfig {
    pub fn slow_mo(&self) -> Duration {
        Duration::from_millis(self.slow_mo)
    }

    pub fn delay_between_requests(&self) -> Duration {
        Duration::from_secs_f64(self.delay_between_requests.max(0.0))
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Settings that were given but have no effect on HTTP sessions
    ///
    /// Sessions never show a UI, so only `headless = false` is reported.
    pub fn ignored_settings(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if !self.headless {
            ignored.push("headless");
        }
        ignored
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./board-harvest.db".to_string(),
        }
    }
}

/// Routes a host pattern (mirror, test server) to a known site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteAlias {
    /// Host pattern (e.g., "mirror.example.com" or "*.example.com")
    pub domain: String,

    pub site: Site,
}
