//! Output module for delivering scraped posts
//!
//! This module handles:
//! - The `PostSink` interface the orchestrator delivers posts through
//! - Persisting posts into a `PostStore`
//! - Forwarding posts to an HTTP endpoint
//! - Reporting harvest statistics

mod api;
pub mod stats;
mod store_sink;
mod traits;

pub use api::ApiForwarder;
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use store_sink::StoreSink;
pub use traits::{PostSink, SinkError, SinkResult};
