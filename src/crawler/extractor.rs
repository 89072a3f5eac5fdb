//! Post extraction
//!
//! Turns the markup of one post page into a canonical [`Post`] using the
//! site's rule record. Extraction is pure: the same content always yields the
//! same post, and nothing here touches the network.

use crate::crawler::fetcher::RawContent;
use crate::model::{Comment, ContentElement, CountField, ExtractionFlag, Metadata, Post};
use crate::sites::{CommentIdRule, CommentRules, CommentShape, FieldSelector, Site, SiteRules};
use crate::url::resolve_link;
use crate::ExtractError;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements that end the current text block
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "table", "tr", "section", "article", "figure", "figcaption", "hr",
];

/// Attributes holding a media URL, lazy-load attributes first
const MEDIA_SOURCE_ATTRS: &[&str] = &["data-original", "data-src", "src"];

/// Result of parsing a display counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCount {
    pub value: u64,

    /// False when the value was not a readable count and defaulted to 0
    pub clean: bool,
}

const UNPARSED: ParsedCount = ParsedCount {
    value: 0,
    clean: false,
};

/// Parses a forum display counter such as `"1,234"` or `"조회 1,024"`
///
/// The first run of digits is read, with `,` and `.` accepted as thousands
/// separators. A trailing `만` or `천` scales the value (`"1.2만"` is 12000).
/// Anything without digits, negative values and overflow yield 0 with
/// `clean == false`.
///
/// # Examples
///
/// ```
/// use board_harvest::crawler::parse_count;
///
/// assert_eq!(parse_count("1,234").value, 1234);
/// assert_eq!(parse_count("추천 12").value, 12);
/// assert!(!parse_count("N/A").clean);
/// ```
pub fn parse_count(raw: &str) -> ParsedCount {
    let Some(start) = raw.find(|c: char| c.is_ascii_digit()) else {
        return UNPARSED;
    };

    if raw[..start].trim_end().ends_with('-') {
        return UNPARSED;
    }

    let rest = &raw[start..];
    let end = rest
        .char_indices()
        .find(|&(i, c)| {
            let separator =
                (c == ',' || c == '.') && rest[i + 1..].starts_with(|n: char| n.is_ascii_digit());
            !(c.is_ascii_digit() || separator)
        })
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    let run = &rest[..end];
    let parsed = match rest[end..].trim_start().chars().next() {
        Some('만') => scaled_count(run, 10_000),
        Some('천') => scaled_count(run, 1_000),
        _ => run
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse::<u64>()
            .ok(),
    };

    match parsed {
        Some(value) => ParsedCount { value, clean: true },
        None => UNPARSED,
    }
}

fn scaled_count(run: &str, unit: u64) -> Option<u64> {
    let digits: String = run.chars().filter(|c| *c != ',').collect();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut value = whole.parse::<u64>().ok()?.checked_mul(unit)?;
    let mut place = unit;
    for digit in fraction.chars().filter_map(|c| c.to_digit(10)) {
        place /= 10;
        value = value.checked_add(u64::from(digit) * place)?;
    }
    Some(value)
}

/// Extracts a post from fetched page content
///
/// # Arguments
///
/// * `raw` - The fetched page
/// * `site` - Site whose rules describe the page
///
/// # Returns
///
/// * `Ok(Post)` - The canonical post, possibly carrying extraction flags
/// * `Err(ExtractError)` - A required field or the body container is missing
pub fn extract(raw: &RawContent, site: Site) -> Result<Post, ExtractError> {
    let rules = site.rules();
    let document = Html::parse_document(&raw.body);
    let root = document.root_element();

    let post_id = derive_post_id(rules, raw, &document)
        .ok_or_else(|| ExtractError::missing_field("post_id"))?;

    let title = read_field(root, &rules.metadata.title)?
        .ok_or_else(|| ExtractError::missing_field("title"))?;
    let author = read_field(root, &rules.metadata.author)?
        .ok_or_else(|| ExtractError::missing_field("author"))?;
    let date = read_field(root, &rules.metadata.date)?;

    let body_selector = compile(rules.body)?;
    let body = root.select(&body_selector).next().ok_or_else(|| {
        ExtractError::malformed(format!("body container '{}' not found", rules.body))
    })?;

    let mut content = ContentBuilder::default();
    content.walk(body, &raw.final_url);
    let content = content.finish();

    let comments = collect_comments(root, &rules.comments, &post_id)?;

    let mut flags = Vec::new();
    let view_count =
        read_count(root, rules.metadata.views, CountField::Views, &mut flags)?.unwrap_or(0);
    let up_count =
        read_count(root, rules.metadata.upvotes, CountField::Upvotes, &mut flags)?.unwrap_or(0);

    let extracted = comments.len() as u64;
    let comment_count = match read_count(
        root,
        rules.metadata.comment_count,
        CountField::Comments,
        &mut flags,
    )? {
        Some(reported) => {
            let parsed_cleanly = !flags.iter().any(|flag| {
                matches!(
                    flag,
                    ExtractionFlag::UnparsedCount {
                        field: CountField::Comments,
                        ..
                    }
                )
            });
            if parsed_cleanly && reported != extracted {
                note_comment_mismatch(site, &post_id, reported, extracted);
                flags.push(ExtractionFlag::CommentCountMismatch {
                    reported,
                    extracted,
                    hides_deleted: rules.comments.hides_deleted,
                });
            }
            reported
        }
        None => extracted,
    };

    Ok(Post {
        post_id,
        site,
        url: raw.final_url.to_string(),
        metadata: Metadata {
            title,
            author,
            date,
            view_count,
            up_count,
            comment_count,
        },
        content,
        comments,
        flags,
    })
}

fn note_comment_mismatch(site: Site, post_id: &str, reported: u64, extracted: u64) {
    if site.rules().comments.hides_deleted {
        tracing::debug!(
            "{} post {}: {} comments reported, {} visible (deleted comments hidden)",
            site,
            post_id,
            reported,
            extracted
        );
    } else {
        tracing::warn!(
            "{} post {}: {} comments reported but {} extracted",
            site,
            post_id,
            reported,
            extracted
        );
    }
}

/// Derives the post identifier from the page URLs, then its canonical links
fn derive_post_id(rules: &SiteRules, raw: &RawContent, document: &Html) -> Option<String> {
    rules
        .post_id_from_url(&raw.final_url)
        .or_else(|| {
            canonical_urls(document, &raw.final_url)
                .iter()
                .find_map(|url| rules.post_id_from_url(url))
        })
        .or_else(|| rules.post_id_from_url(&raw.requested_url))
}

fn canonical_urls(document: &Html, base: &Url) -> Vec<Url> {
    [
        ("link[rel=\"canonical\"]", "href"),
        ("meta[property=\"og:url\"]", "content"),
    ]
    .into_iter()
    .filter_map(|(css, attr)| {
        let selector = Selector::parse(css).ok()?;
        let href = document.select(&selector).next()?.value().attr(attr)?;
        resolve_link(href, base)
    })
    .collect()
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::malformed(format!("invalid selector '{}'", css)))
}

/// Reads a field below `scope`
///
/// The configured attribute wins when present; otherwise the element text is
/// used with whitespace collapsed. Empty values count as absent.
fn read_field(scope: ElementRef<'_>, field: &FieldSelector) -> Result<Option<String>, ExtractError> {
    let selector = compile(field.css)?;
    let Some(element) = scope.select(&selector).next() else {
        return Ok(None);
    };

    let from_attr = field
        .attr
        .and_then(|attr| element.value().attr(attr))
        .map(collapse_whitespace)
        .filter(|value| !value.is_empty());

    Ok(from_attr
        .or_else(|| Some(collapse_whitespace(&element.text().collect::<String>())))
        .filter(|value| !value.is_empty()))
}

fn read_count(
    scope: ElementRef<'_>,
    field: Option<FieldSelector>,
    which: CountField,
    flags: &mut Vec<ExtractionFlag>,
) -> Result<Option<u64>, ExtractError> {
    let Some(field) = field else {
        return Ok(None);
    };
    let Some(raw) = read_field(scope, &field)? else {
        return Ok(None);
    };

    let parsed = parse_count(&raw);
    if !parsed.clean {
        tracing::debug!("Unparsed {} '{}', stored as 0", which, raw);
        flags.push(ExtractionFlag::UnparsedCount { field: which, raw });
    }
    Ok(Some(parsed.value))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accumulates body elements in document order
#[derive(Default)]
struct ContentBuilder {
    elements: Vec<ContentElement>,
    pending_text: String,
}

impl ContentBuilder {
    fn walk(&mut self, element: ElementRef<'_>, base: &Url) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.pending_text.push_str(&text.text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit(child, base);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&mut self, element: ElementRef<'_>, base: &Url) {
        let name = element.value().name();
        match name {
            "script" | "style" | "noscript" | "template" => {}
            "br" => self.break_block(),
            "img" => {
                if let Some(src) = media_source(element, base) {
                    self.push(ContentElement::Image { src });
                }
            }
            "iframe" | "embed" | "source" => {
                if let Some(src) = media_source(element, base) {
                    self.push(ContentElement::Embed { src });
                }
            }
            // A video without its own src is described by its <source> children
            "video" => match media_source(element, base) {
                Some(src) => self.push(ContentElement::Embed { src }),
                None => self.walk(element, base),
            },
            _ if BLOCK_ELEMENTS.contains(&name) => {
                self.break_block();
                self.walk(element, base);
                self.break_block();
            }
            _ => self.walk(element, base),
        }
    }

    fn break_block(&mut self) {
        let text = collapse_whitespace(&self.pending_text);
        self.pending_text.clear();
        if !text.is_empty() {
            self.elements.push(ContentElement::Text { text });
        }
    }

    fn push(&mut self, element: ContentElement) {
        self.break_block();
        self.elements.push(element);
    }

    fn finish(mut self) -> Vec<ContentElement> {
        self.break_block();
        self.elements
    }
}

fn media_source(element: ElementRef<'_>, base: &Url) -> Option<String> {
    MEDIA_SOURCE_ATTRS
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .find_map(|value| resolve_link(value, base))
        .map(String::from)
}

/// Collects comments in document order with threading resolved
///
/// `ancestry[d]` holds the latest comment seen at depth `d`, so a comment's
/// parent is always the nearest preceding comment one level up. A depth that
/// skips levels is clamped to one below the deepest open level.
fn collect_comments(
    root: ElementRef<'_>,
    rules: &CommentRules,
    post_id: &str,
) -> Result<Vec<Comment>, ExtractError> {
    let item_selector = compile(rules.item)?;
    let container_selector = match rules.shape {
        CommentShape::Nested(css) => Some(compile(css)?),
        _ => None,
    };

    let mut comments = Vec::new();
    let mut ancestry: Vec<String> = Vec::new();

    for (index, item) in root.select(&item_selector).enumerate() {
        let author = read_field(item, &rules.author)?.unwrap_or_default();
        let text = read_field(item, &rules.text)?.unwrap_or_default();

        let marked_depth = match rules.shape {
            CommentShape::Flat => 0,
            CommentShape::ReplyClass(class) => {
                u32::from(item.value().classes().any(|c| c == class))
            }
            CommentShape::Nested(_) => container_selector.as_ref().map_or(0, |selector| {
                item.ancestors()
                    .filter_map(ElementRef::wrap)
                    .filter(|ancestor| selector.matches(ancestor))
                    .count() as u32
            }),
            CommentShape::Indent { property, step } => {
                indent_depth(item.value().attr("style"), property, step)
            }
        };

        let depth = marked_depth.min(ancestry.len() as u32);
        ancestry.truncate(depth as usize);

        // Deleted rows lose author and text; they close deeper threads but
        // never become a parent
        if author.is_empty() && text.is_empty() {
            continue;
        }

        let parent_comment_id = ancestry.last().cloned();

        let comment_id = comment_id(item, &rules.id)
            .unwrap_or_else(|| format!("{}-c{}", post_id, index));
        ancestry.push(comment_id.clone());

        comments.push(Comment {
            comment_id,
            author,
            date: read_field(item, &rules.date)?,
            text,
            depth,
            parent_comment_id,
        });
    }

    Ok(comments)
}

fn comment_id(item: ElementRef<'_>, rule: &CommentIdRule) -> Option<String> {
    let raw = item.value().attr(rule.attr)?.trim();
    let id = rule
        .strip_prefixes
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw);
    (!id.is_empty()).then(|| id.to_string())
}

/// Reads an inline CSS length and converts it to a nesting level
fn indent_depth(style: Option<&str>, property: &str, step: f32) -> u32 {
    if step <= 0.0 {
        return 0;
    }

    style
        .into_iter()
        .flat_map(|style| style.split(';'))
        .filter_map(|declaration| declaration.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .and_then(|(_, value)| {
            let value = value.trim();
            let end = value
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(value.len());
            value[..end].parse::<f32>().ok()
        })
        .filter(|length| length.is_finite() && *length > 0.0)
        .map(|length| (length / step).round() as u32)
        .unwrap_or(0)
}
