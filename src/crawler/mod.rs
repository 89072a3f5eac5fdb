//! Crawler module for fetching and extracting forum posts
//!
//! This module contains the core scraping logic, including:
//! - Page fetching with per-fetch sessions, readiness checks and timeouts
//! - Post extraction driven by per-site rules
//! - Board listing traversal
//! - Request pacing
//! - Overall scrape orchestration with retries

mod extractor;
mod fetcher;
mod orchestrator;
mod pacer;
mod session;
mod walker;

#[cfg(test)]
pub(crate) mod testing;

pub use extractor::{extract, parse_count, ParsedCount};
pub use fetcher::{classify_status, HttpFetcher, PageFetcher, RawContent, Readiness};
pub use orchestrator::{Orchestrator, MAX_FETCH_ATTEMPTS, RETRY_BACKOFF};
pub use pacer::Pacer;
pub use session::BrowserSession;
pub use walker::{walk, ListingWalk};
