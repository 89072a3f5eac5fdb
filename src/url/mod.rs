//! URL helpers: host extraction, host pattern matching and link resolution

mod domain;
mod matcher;

pub use domain::extract_domain;
pub use matcher::matches_wildcard;

use url::Url;

/// Resolves an anchor or media reference against the page it appeared on
///
/// Returns None for references that cannot point at a fetchable resource:
/// - empty values and fragment-only anchors
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - anything that is not HTTP(S) after resolution
///
/// The fragment of the resolved URL is dropped.
///
/// # Examples
///
/// ```
/// use board_harvest::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://www.clien.net/service/board/park?po=0").unwrap();
/// let resolved = resolve_link("/service/board/park/18000001#comment", &base).unwrap();
/// assert_eq!(resolved.as_str(), "https://www.clien.net/service/board/park/18000001");
/// ```
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}
