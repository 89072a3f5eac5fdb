//! Storage traits and error types
//!
//! This module defines the trait interface for post stores and
//! associated error types.

use crate::model::Post;
use crate::sites::Site;
use crate::storage::{RunRecord, RunStatus, UpsertOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for post store implementations
///
/// Posts are keyed by `(site, post_id)`; storing the same key twice keeps one
/// record holding the latest content.
pub trait PostStore {
    // ===== Posts =====

    /// Inserts a post or replaces the stored one with the same key
    ///
    /// # Arguments
    ///
    /// * `post` - The post to store, comments included
    ///
    /// # Returns
    ///
    /// Whether the key was new or already present
    fn upsert_post(&mut self, post: &Post) -> StorageResult<UpsertOutcome>;

    /// Gets a stored post with its comments
    fn get_post(&self, site: Site, post_id: &str) -> StorageResult<Option<Post>>;

    /// Deletes every post of a site, returning how many were removed
    fn delete_site(&mut self, site: Site) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new scrape run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Records the outcome of a run with a finish timestamp
    fn complete_run(
        &mut self,
        run_id: i64,
        successes: u64,
        failures: u64,
        status: RunStatus,
    ) -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Statistics =====

    /// Counts stored posts, optionally for one site
    fn count_posts(&self, site: Option<Site>) -> StorageResult<u64>;

    /// Counts stored comments
    fn count_comments(&self) -> StorageResult<u64>;

    /// Post counts per site, for sites with at least one post
    fn posts_by_site(&self) -> StorageResult<Vec<(Site, u64)>>;
}
