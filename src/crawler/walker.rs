//! Board listing traversal
//!
//! Enumerates post URLs from a board's paginated listing, in the order the
//! listing shows them, without duplicates and up to `post_limit`.

use crate::config::ScrapeConfig;
use crate::crawler::fetcher::{PageFetcher, RawContent};
use crate::crawler::pacer::Pacer;
use crate::sites::SiteRules;
use crate::url::resolve_link;
use crate::FetchError;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Starts walking a board listing
///
/// The first listing page is fetched before returning, so a board that
/// cannot be read at all fails here.
///
/// # Arguments
///
/// * `board_url` - URL of the board's listing
/// * `rules` - Rules of the site hosting the board
/// * `fetcher` - Page fetcher used for listing pages
/// * `pacer` - Pacer shared with the post fetches of the same batch
/// * `config` - Scrape settings (`post_limit`, `max_listing_pages`)
///
/// # Returns
///
/// * `Ok(ListingWalk)` - Walk positioned before the first post URL
/// * `Err(FetchError)` - The first listing page could not be fetched
pub async fn walk<'a>(
    board_url: &Url,
    rules: &'static SiteRules,
    fetcher: &'a dyn PageFetcher,
    pacer: &mut Pacer,
    config: &'a ScrapeConfig,
) -> Result<ListingWalk<'a>, FetchError> {
    let mut listing = ListingWalk {
        board_url: board_url.clone(),
        rules,
        fetcher,
        config,
        pending: VecDeque::new(),
        seen: HashSet::new(),
        yielded: 0,
        pages_read: 0,
        exhausted: false,
    };
    listing.read_next_page(pacer).await?;
    Ok(listing)
}

/// A listing walk in progress
///
/// Further listing pages are fetched lazily, only when the URLs found so far
/// have been handed out.
pub struct ListingWalk<'a> {
    board_url: Url,
    rules: &'static SiteRules,
    fetcher: &'a dyn PageFetcher,
    config: &'a ScrapeConfig,

    /// Discovered URLs not yet handed out
    pending: VecDeque<Url>,

    /// Post ids discovered so far, across pages
    seen: HashSet<String>,

    yielded: usize,
    pages_read: u32,
    exhausted: bool,
}

impl<'a> ListingWalk<'a> {
    /// Returns the next post URL, or None once the walk is over
    ///
    /// A listing page failing after the first one ends the walk; URLs
    /// already discovered are still returned.
    pub async fn next_url(&mut self, pacer: &mut Pacer) -> Option<Url> {
        loop {
            if self.yielded >= self.config.post_limit {
                return None;
            }

            if let Some(url) = self.pending.pop_front() {
                self.yielded += 1;
                return Some(url);
            }

            if self.exhausted {
                return None;
            }

            if let Err(e) = self.read_next_page(pacer).await {
                tracing::warn!("Listing walk of {} stopped early: {}", self.board_url, e);
                self.exhausted = true;
            }
        }
    }

    /// Drains the walk into a list of URLs
    pub async fn collect(mut self, pacer: &mut Pacer) -> Vec<Url> {
        let mut urls = Vec::new();
        while let Some(url) = self.next_url(pacer).await {
            urls.push(url);
        }
        urls
    }

    /// Number of listing pages fetched so far
    pub fn pages_read(&self) -> u32 {
        self.pages_read
    }

    async fn read_next_page(&mut self, pacer: &mut Pacer) -> Result<(), FetchError> {
        if self.pages_read >= self.config.max_listing_pages {
            tracing::debug!(
                "Listing page cap ({}) reached for {}",
                self.config.max_listing_pages,
                self.board_url
            );
            self.exhausted = true;
            return Ok(());
        }

        let page_url = self.rules.listing.page_url(&self.board_url, self.pages_read);
        pacer.wait_turn().await;
        let raw = self
            .fetcher
            .fetch(&page_url, &self.rules.listing_readiness(), self.config)
            .await?;
        self.pages_read += 1;

        let added = self.add_links(&raw);
        tracing::debug!(
            "Listing page {} of {}: {} new post URLs",
            self.pages_read,
            self.board_url,
            added
        );

        if added == 0 {
            self.exhausted = true;
        }
        Ok(())
    }

    /// Queues unseen post URLs from a listing page, returning how many
    fn add_links(&mut self, raw: &RawContent) -> usize {
        let mut added = 0;
        for url in post_links(raw, self.rules) {
            let Some(post_id) = self.rules.post_id_from_url(&url) else {
                continue;
            };
            if self.seen.insert(post_id) {
                self.pending.push_back(url);
                added += 1;
            }
        }
        added
    }
}

/// Extracts post links from a listing page in document order
fn post_links(raw: &RawContent, rules: &SiteRules) -> Vec<Url> {
    let Ok(selector) = Selector::parse(rules.listing.anchors) else {
        tracing::warn!("Invalid listing selector for {}", rules.site);
        return Vec::new();
    };

    let document = Html::parse_document(&raw.body);
    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_link(href, &raw.final_url))
        .filter(|url| rules.post_id_from_url(url).is_some())
        .collect()
}
