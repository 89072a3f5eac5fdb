//! Store-backed post sink

use crate::model::Post;
use crate::output::traits::{PostSink, SinkResult};
use crate::storage::{PostStore, StorageError, UpsertOutcome};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

/// Writes every accepted post into a [`PostStore`]
pub struct StoreSink {
    store: Mutex<Box<dyn PostStore + Send>>,
}

impl StoreSink {
    pub fn new(store: Box<dyn PostStore + Send>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Runs `f` with exclusive access to the underlying store
    pub fn with_store<T>(
        &self,
        f: impl FnOnce(&mut dyn PostStore) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| StorageError::InvalidValue("store lock poisoned".to_string()))?;
        f(store.as_mut())
    }
}

#[async_trait]
impl PostSink for StoreSink {
    fn name(&self) -> &str {
        "store"
    }

    async fn accept(&self, post: &Post) -> SinkResult<()> {
        let outcome = self.with_store(|store| store.upsert_post(post))?;
        match outcome {
            UpsertOutcome::Inserted => debug!("Stored new post {}/{}", post.site, post.post_id),
            UpsertOutcome::Updated => debug!("Refreshed post {}/{}", post.site, post.post_id),
        }
        Ok(())
    }
}
