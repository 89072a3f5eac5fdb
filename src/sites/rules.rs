//! Rule record types shared by every site adapter
//!
//! Rules are plain `'static` data. The generic fetcher, extractor and walker
//! in [`crate::crawler`] interpret them; nothing here touches the network or
//! parses HTML.

use crate::crawler::Readiness;
use crate::sites::Site;
use url::Url;

/// Fixed extraction rules for one forum
#[derive(Debug)]
pub struct SiteRules {
    pub site: Site,

    /// Host patterns claimed by this site (`*.example.com` style)
    pub host_patterns: &'static [&'static str],

    /// Post identifier rules, tried in order
    pub post_id: &'static [IdRule],

    /// Selector that must exist once a post page is ready
    pub post_ready: &'static str,

    pub metadata: MetadataRules,

    /// Container holding the post body
    pub body: &'static str,

    pub comments: CommentRules,

    pub listing: ListingRules,

    /// Substrings identifying an anti-bot or access-denied page
    pub block_markers: &'static [&'static str],
}

impl SiteRules {
    /// Derives a post identifier from a URL, if any rule matches
    pub fn post_id_from_url(&self, url: &Url) -> Option<String> {
        self.post_id.iter().find_map(|rule| rule.apply(url))
    }

    pub fn post_readiness(&self) -> Readiness {
        Readiness {
            selector: self.post_ready,
            block_markers: self.block_markers,
        }
    }

    pub fn listing_readiness(&self) -> Readiness {
        Readiness {
            selector: self.listing.ready,
            block_markers: self.block_markers,
        }
    }
}

/// How a post identifier is read from a URL
///
/// Identifiers are numeric on every supported forum, so values that are not
/// all ASCII digits never match.
#[derive(Debug, Clone, Copy)]
pub enum IdRule {
    /// `?key=123`
    QueryParam(&'static str),

    /// `?scope=board&key=123`, yielding `board-123`
    ScopedQueryParam {
        scope: &'static str,
        key: &'static str,
    },

    /// `/.../marker/123/...`
    PathAfter(&'static str),

    /// `/.../123`
    LastPathSegment,
}

impl IdRule {
    pub fn apply(&self, url: &Url) -> Option<String> {
        match *self {
            Self::QueryParam(key) => query_value(url, key).filter(|v| is_numeric(v)),
            Self::ScopedQueryParam { scope, key } => {
                let scope_value = query_value(url, scope).filter(|v| !v.is_empty())?;
                let id = query_value(url, key).filter(|v| is_numeric(v))?;
                Some(format!("{}-{}", scope_value, id))
            }
            Self::PathAfter(marker) => {
                let mut segments = url.path_segments()?;
                segments.find(|segment| *segment == marker)?;
                segments
                    .next()
                    .filter(|segment| is_numeric(segment))
                    .map(str::to_string)
            }
            Self::LastPathSegment => url
                .path_segments()?
                .filter(|segment| !segment.is_empty())
                .last()
                .filter(|segment| is_numeric(segment))
                .map(str::to_string),
        }
    }
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_string())
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// A CSS selector plus an optional attribute to read instead of text
#[derive(Debug, Clone, Copy)]
pub struct FieldSelector {
    pub css: &'static str,
    pub attr: Option<&'static str>,
}

impl FieldSelector {
    pub const fn text(css: &'static str) -> Self {
        Self { css, attr: None }
    }

    pub const fn attr(css: &'static str, attr: &'static str) -> Self {
        Self {
            css,
            attr: Some(attr),
        }
    }
}

/// Post header selectors
#[derive(Debug, Clone, Copy)]
pub struct MetadataRules {
    pub title: FieldSelector,
    pub author: FieldSelector,
    pub date: FieldSelector,
    pub views: Option<FieldSelector>,
    pub upvotes: Option<FieldSelector>,
    pub comment_count: Option<FieldSelector>,
}

/// How the nesting level of a comment is expressed in markup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommentShape {
    /// No threading; every comment is top-level
    Flat,

    /// Replies carry this class and sit one level below the previous comment
    ReplyClass(&'static str),

    /// Depth is the number of enclosing elements matching this selector
    Nested(&'static str),

    /// Depth is an inline CSS length divided by `step`
    Indent { property: &'static str, step: f32 },
}

/// Where a comment's identifier comes from
#[derive(Debug, Clone, Copy)]
pub struct CommentIdRule {
    pub attr: &'static str,
    pub strip_prefixes: &'static [&'static str],
}

/// Comment list selectors and threading shape
#[derive(Debug, Clone, Copy)]
pub struct CommentRules {
    /// One element per comment, matched in document order
    pub item: &'static str,
    pub id: CommentIdRule,
    pub author: FieldSelector,
    pub date: FieldSelector,
    pub text: FieldSelector,
    pub shape: CommentShape,

    /// The site drops deleted comments from the page but still counts them
    pub hides_deleted: bool,
}

/// Board listing selectors and pagination
#[derive(Debug, Clone, Copy)]
pub struct ListingRules {
    /// Anchors pointing at posts
    pub anchors: &'static str,

    /// Query parameter holding the page number
    pub page_param: &'static str,

    /// Value of `page_param` for the first page
    pub first_page: u32,

    /// Selector that must exist once a listing page is ready
    pub ready: &'static str,
}

impl ListingRules {
    /// Builds the URL of listing page `index` (0-based) for a board
    pub fn page_url(&self, board_url: &Url, index: u32) -> Url {
        let mut url = board_url.clone();
        let kept: Vec<(String, String)> = board_url
            .query_pairs()
            .filter(|(k, _)| k != self.page_param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(self.page_param, &(self.first_page + index).to_string());
        url
    }
}
