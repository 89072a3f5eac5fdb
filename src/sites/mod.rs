//! Site adapters
//!
//! Each supported forum is one [`SiteRules`] record. Adapter selection is a
//! single dispatch on the [`Site`] tag, resolved from the URL host by
//! [`SiteRegistry`].

mod clien;
mod dcinside;
mod fmkorea;
mod rules;
mod ruliweb;

pub use rules::{
    CommentIdRule, CommentRules, CommentShape, FieldSelector, IdRule, ListingRules,
    MetadataRules, SiteRules,
};

use crate::url::{extract_domain, matches_wildcard};
use crate::UnsupportedSiteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Source forum tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    DcInside,
    FmKorea,
    Ruliweb,
    Clien,
}

impl Site {
    pub const ALL: [Site; 4] = [Site::DcInside, Site::FmKorea, Site::Ruliweb, Site::Clien];

    /// Returns the extraction rules for this site
    pub fn rules(&self) -> &'static SiteRules {
        match self {
            Self::DcInside => &dcinside::RULES,
            Self::FmKorea => &fmkorea::RULES,
            Self::Ruliweb => &ruliweb::RULES,
            Self::Clien => &clien::RULES,
        }
    }

    /// Tag used in storage and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DcInside => "dcinside",
            Self::FmKorea => "fmkorea",
            Self::Ruliweb => "ruliweb",
            Self::Clien => "clien",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::ALL
            .into_iter()
            .find(|site| site.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown site '{}'", s))
    }
}

/// Resolves URLs to sites
///
/// Extra host patterns (mirrors, test servers) are checked before the
/// built-in patterns of each site.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    aliases: Vec<(String, Site)>,
}

impl SiteRegistry {
    /// Creates a registry with only the built-in host patterns
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes hosts matching `pattern` to `site`
    pub fn add_alias(&mut self, pattern: impl Into<String>, site: Site) {
        self.aliases.push((pattern.into().to_lowercase(), site));
    }

    /// Finds the site claiming a (lowercase) host
    pub fn site_for_host(&self, host: &str) -> Option<Site> {
        self.aliases
            .iter()
            .find(|(pattern, _)| matches_wildcard(pattern, host))
            .map(|(_, site)| *site)
            .or_else(|| {
                Site::ALL.into_iter().find(|site| {
                    site.rules()
                        .host_patterns
                        .iter()
                        .any(|pattern| matches_wildcard(pattern, host))
                })
            })
    }

    /// Resolves the site adapter for a URL
    pub fn resolve(&self, url: &Url) -> Result<Site, UnsupportedSiteError> {
        let host = extract_domain(url);
        host.as_deref()
            .and_then(|h| self.site_for_host(h))
            .ok_or_else(|| UnsupportedSiteError {
                url: url.to_string(),
                host,
            })
    }
}
