//! Page URL helpers
//!
//! Catalog entries are keyed by their canonical article URL, so the encoding
//! here must stay stable between invocations.

/// Percent-encodes a page title for use in an article path
///
/// `/` is kept literal so subpages stay readable; every other reserved
/// character is escaped.
pub fn encode_title(title: &str) -> String {
    title
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds the canonical article URL for a page title
///
/// # Example
///
/// ```
/// use eq_catalog::url::page_url;
///
/// assert_eq!(
///     page_url("https://tibia.fandom.com/", "Crown_Helmet"),
///     "https://tibia.fandom.com/wiki/Crown_Helmet"
/// );
/// ```
pub fn page_url(base_url: &str, title: &str) -> String {
    format!(
        "{}/wiki/{}",
        base_url.trim_end_matches('/'),
        encode_title(title)
    )
}

/// Human-readable name for a page title
pub fn display_name(title: &str) -> String {
    title.replace('_', " ")
}

/// Host part of a base URL, used as the title list's provenance
pub fn host_of(base_url: &str) -> Option<String> {
    ::url::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}
