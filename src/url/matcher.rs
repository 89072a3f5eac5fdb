/// Checks if a host matches a site host pattern
///
/// Two pattern forms are supported:
/// 1. Exact: `"gall.dcinside.com"` matches only that host
/// 2. Wildcard: `"*.dcinside.com"` matches `dcinside.com` and any subdomain
///    (`gall.dcinside.com`, `m.dcinside.com`, ...)
///
/// Hosts are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use board_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.dcinside.com", "gall.dcinside.com"));
/// assert!(matches_wildcard("*.dcinside.com", "dcinside.com"));
/// assert!(!matches_wildcard("*.dcinside.com", "notdcinside.com"));
/// assert!(matches_wildcard("127.0.0.1", "127.0.0.1"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}
