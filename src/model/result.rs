use crate::model::Post;
use crate::{ExtractError, FetchError};
use serde::Serialize;
use std::fmt;

/// Why a URL did not produce a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "error", rename_all = "snake_case")]
pub enum FailureReason {
    Fetch(FetchError),
    Extract(ExtractError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {}", e),
            Self::Extract(e) => write!(f, "extraction failed: {}", e),
        }
    }
}

/// A URL that was attempted and failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeFailure {
    pub url: String,
    pub reason: FailureReason,
    /// Fetch attempts made before giving up
    pub attempts: u32,
}

/// Outcome for one URL: a post or a failure, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeResult {
    Success(Post),
    Failure(ScrapeFailure),
}

impl ScrapeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn post(&self) -> Option<&Post> {
        match self {
            Self::Success(post) => Some(post),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ScrapeFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// Ordered results of a batch, in discovery order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<ScrapeResult>,

    /// True when the batch stopped early on a cancellation signal
    pub cancelled: bool,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.results.iter().filter_map(ScrapeResult::post)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScrapeFailure> {
        self.results.iter().filter_map(ScrapeResult::failure)
    }

    pub fn success_count(&self) -> usize {
        self.posts().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}
