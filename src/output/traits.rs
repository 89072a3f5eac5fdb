//! Post sink traits and error types
//!
//! This module defines the trait interface for consumers of scraped posts
//! and the errors they report.

use crate::model::Post;
use crate::storage::StorageError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while delivering a post
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint {url} answered {status}")]
    Status { status: u16, url: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for post sinks
///
/// The orchestrator hands every successfully extracted post to each sink
/// once. Failures are reported back but never change the batch outcome.
#[async_trait]
pub trait PostSink: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Delivers one post
    ///
    /// # Arguments
    ///
    /// * `post` - The post to deliver
    async fn accept(&self, post: &Post) -> SinkResult<()>;
}
