//! Request pacing
//!
//! Enforces a minimum interval between the starts of consecutive fetches.
//! Uses `tokio::time::Instant`, so a paused test clock drives it.

use crate::config::ScrapeConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Spaces out fetch starts by a fixed interval
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,

    /// Start time of the previous fetch
    last_start: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: None,
        }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(config.delay_between_requests())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Calculates the time until the next fetch may start
    ///
    /// Returns None if a fetch can start now.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        let last = self.last_start?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.interval {
            None
        } else {
            Some(self.interval - elapsed)
        }
    }

    /// Waits until a fetch may start, then records the start
    pub async fn wait_turn(&mut self) {
        if let Some(wait) = self.time_until_next(Instant::now()) {
            tracing::trace!("Pacing: waiting {:?} before next fetch", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_start = Some(Instant::now());
    }
}
