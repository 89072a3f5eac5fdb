use url::Url;

/// Extracts the lowercase host of a URL
///
/// Returns None for URLs without a host (which never happens for HTTP(S)).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use board_harvest::url::extract_domain;
///
/// let url = Url::parse("https://GALL.DCINSIDE.COM/board/view/?id=a&no=1").unwrap();
/// assert_eq!(extract_domain(&url), Some("gall.dcinside.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
