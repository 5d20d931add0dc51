//! Link filtering for seed pages
//!
//! Deliberately lossy: anything that looks like a content page is accepted,
//! including creature and disambiguation pages. The classifier rejects those
//! later, when the page text is available.

/// Default administrative/meta namespace prefixes
pub const DEFAULT_META_NAMESPACES: &[&str] = &[
    "File:",
    "Category:",
    "Special:",
    "Template:",
    "Help:",
    "Talk:",
    "TibiaWiki:",
];

pub const DEFAULT_HOME_PAGE: &str = "Main_Page";

const ARTICLE_PREFIX: &str = "/wiki/";

/// Decides which rendered link targets are candidate titles
#[derive(Debug, Clone)]
pub struct LinkFilter {
    home_page: String,
    meta_namespaces: Vec<String>,
}

impl LinkFilter {
    pub fn new(home_page: impl Into<String>, meta_namespaces: Vec<String>) -> Self {
        Self {
            home_page: to_page_id(&home_page.into()),
            meta_namespaces,
        }
    }

    /// Maps an href to a page title, or None if it is not a content link
    ///
    /// # Rules
    ///
    /// - only site-relative article links (`/wiki/...`)
    /// - fragment dropped, query strings rejected
    /// - percent-escapes decoded (left as-is when not valid UTF-8)
    /// - meta namespaces and the home page rejected
    pub fn title_from_href(&self, href: &str) -> Option<String> {
        let rest = href.trim().strip_prefix(ARTICLE_PREFIX)?;
        let rest = rest.split('#').next().unwrap_or_default();

        if rest.is_empty() || rest.contains('?') {
            return None;
        }

        let title = match urlencoding::decode(rest) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => rest.to_string(),
        };

        if self
            .meta_namespaces
            .iter()
            .any(|prefix| title.starts_with(prefix.as_str()))
        {
            return None;
        }

        if title == self.home_page {
            return None;
        }

        Some(title)
    }

    /// Converts a category member title to page identifier form
    pub fn title_from_member(&self, member: &str) -> Option<String> {
        let title = to_page_id(member.trim());
        if title.is_empty() || title == self.home_page {
            return None;
        }
        if self
            .meta_namespaces
            .iter()
            .any(|prefix| title.starts_with(prefix.as_str()))
        {
            return None;
        }
        Some(title)
    }
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_HOME_PAGE,
            DEFAULT_META_NAMESPACES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

/// Wiki page identifiers use underscores where display titles use spaces
pub fn to_page_id(title: &str) -> String {
    title.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_article_link() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.title_from_href("/wiki/Crown_Helmet"),
            Some("Crown_Helmet".to_string())
        );
    }

    #[test]
    fn test_drops_fragment() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.title_from_href("/wiki/Helmets#Rare"),
            Some("Helmets".to_string())
        );
        assert_eq!(filter.title_from_href("/wiki/#top"), None);
    }

    #[test]
    fn test_rejects_meta_namespaces() {
        let filter = LinkFilter::default();
        for href in [
            "/wiki/File:Crown_Helmet.gif",
            "/wiki/Category:Helmets",
            "/wiki/Special:Search",
            "/wiki/Template:Infobox",
            "/wiki/Help:Contents",
            "/wiki/Talk:Crown_Helmet",
            "/wiki/TibiaWiki:About",
        ] {
            assert_eq!(filter.title_from_href(href), None, "{href}");
        }
    }

    #[test]
    fn test_rejects_home_page_and_external_links() {
        let filter = LinkFilter::default();
        assert_eq!(filter.title_from_href("/wiki/Main_Page"), None);
        assert_eq!(filter.title_from_href("https://example.com/wiki/X"), None);
        assert_eq!(filter.title_from_href("/index.php?title=X&action=edit"), None);
        assert_eq!(filter.title_from_href("/wiki/X?action=edit"), None);
    }

    #[test]
    fn test_decodes_percent_escapes() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.title_from_href("/wiki/Ferumbras%27_Hat"),
            Some("Ferumbras'_Hat".to_string())
        );
    }

    #[test]
    fn test_creature_links_are_over_accepted() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.title_from_href("/wiki/Dragon_Lord"),
            Some("Dragon_Lord".to_string())
        );
    }

    #[test]
    fn test_member_titles_use_underscores() {
        let filter = LinkFilter::default();
        assert_eq!(
            filter.title_from_member("Crystal Quiver"),
            Some("Crystal_Quiver".to_string())
        );
        assert_eq!(filter.title_from_member("Category:Quivers"), None);
        assert_eq!(filter.title_from_member("Main Page"), None);
    }
}
