//! Canonical records produced by a scrape
//!
//! # Components
//!
//! - `Post`, `Comment`, `ContentElement`: immutable values built by the extractor
//! - `ExtractionFlag`: best-effort discrepancies recorded on a post
//! - `ScrapeResult`, `ScrapeFailure`, `BatchReport`: per-item outcomes of a batch

mod post;
mod result;

pub use post::{Comment, ContentElement, CountField, ExtractionFlag, Metadata, Post};
pub use result::{BatchReport, FailureReason, ScrapeFailure, ScrapeResult};
