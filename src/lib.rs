//! Board Harvest: a paced scraper for Korean community forums
//!
//! This crate turns forum post URLs and board listings into canonical [`Post`]
//! records with their comment threads, and hands them to a store or an HTTP
//! endpoint deduplicated by `(site, post_id)`.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod sites;
pub mod storage;
pub mod url;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for calls that fail as a whole
///
/// Per-URL problems never surface here; they are recorded as
/// [`model::ScrapeFailure`] entries inside a batch.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    UnsupportedSite(#[from] UnsupportedSiteError),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Failed to read board listing: {0}")]
    Listing(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Raised when no site adapter claims the host of a URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No site adapter for {url} (host: {})", host.as_deref().unwrap_or("none"))]
pub struct UnsupportedSiteError {
    pub url: String,
    pub host: Option<String>,
}

/// Transport/availability failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The per-fetch budget ran out
    Timeout,
    /// The page does not exist (or another permanent 4xx)
    NotFound,
    /// Access denied or an anti-bot challenge page was served
    Blocked,
    /// Connection problems and server-side 5xx
    Network,
}

impl FetchErrorKind {
    /// Returns true for failures that may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::Blocked => "blocked",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed page fetch
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} while fetching {url}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Parsing failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractErrorKind {
    /// A required field (post_id, title, author) is absent
    MissingField,
    /// The page does not have the structure the site rules expect
    MalformedStructure,
}

impl fmt::Display for ExtractErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => f.write_str("missing field"),
            Self::MalformedStructure => f.write_str("malformed structure"),
        }
    }
}

/// A page that was fetched but could not become a [`Post`]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {detail}")]
pub struct ExtractError {
    pub kind: ExtractErrorKind,
    pub detail: String,
}

impl ExtractError {
    pub fn missing_field(field: &str) -> Self {
        Self {
            kind: ExtractErrorKind::MissingField,
            detail: field.to_string(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: ExtractErrorKind::MalformedStructure,
            detail: detail.into(),
        }
    }
}

/// Result type alias for whole-call operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, ScrapeConfig};
pub use crawler::{HttpFetcher, Orchestrator, PageFetcher};
pub use model::{BatchReport, Comment, ContentElement, Post, ScrapeFailure, ScrapeResult};
pub use sites::{Site, SiteRegistry};
