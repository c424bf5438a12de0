/// Checks if a host matches a domain pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact: "rumble.com" matches only "rumble.com"
/// 2. Wildcard: "*.medium.com" matches "medium.com" itself and any subdomain
///    ("blog.medium.com", "a.b.medium.com")
///
/// # Examples
///
/// ```
/// use ref_cli::url::matches_wildcard;
///
/// assert!(matches_wildcard("rumble.com", "rumble.com"));
/// assert!(!matches_wildcard("rumble.com", "www.rumble.com"));
///
/// assert!(matches_wildcard("*.medium.com", "medium.com"));
/// assert!(matches_wildcard("*.medium.com", "towardsdatascience.medium.com"));
/// assert!(!matches_wildcard("*.medium.com", "notmedium.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => candidate == base || candidate.ends_with(&format!(".{}", base)),
        None => candidate == pattern,
    }
}

/// Returns true if the host matches any of the patterns
pub fn matches_any<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| matches_wildcard(pattern.as_ref(), candidate))
}
