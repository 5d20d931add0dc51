//! HTML parser for rendered wiki pages
//!
//! The parse API returns the article body as an HTML fragment. This module
//! turns that fragment into:
//! - flat visible text, for classification and attribute extraction
//! - raw link targets, for title discovery

use scraper::{Html, Node, Selector};

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Flattens rendered HTML into whitespace-joined visible text
///
/// # Rules
///
/// - every text node is trimmed; empty nodes are dropped
/// - nodes are joined with a single space, so adjacent table cells and
///   list items never run together
/// - text inside `<script>`, `<style>` and `<noscript>` is skipped
///
/// # Example
///
/// ```
/// use eq_catalog::crawler::render_text;
///
/// let text = render_text("<p>Arm: 9</p><p>protection fire 5%</p>");
/// assert_eq!(text, "Arm: 9 protection fire 5%");
/// ```
pub fn render_text(html: &str) -> String {
    let document = Html::parse_fragment(html);

    let mut parts: Vec<&str> = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

/// Extracts raw `href` values from the article body
///
/// Links are taken from `.mw-parser-output` when present, otherwise from the
/// whole fragment. Hrefs are returned as written; deciding which are titles
/// is left to discovery.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_fragment(html);

    let (Ok(body_selector), Ok(link_selector)) = (
        Selector::parse(".mw-parser-output"),
        Selector::parse("a[href]"),
    ) else {
        return Vec::new();
    };

    let mut hrefs = Vec::new();
    let mut bodies = document.select(&body_selector).peekable();

    if bodies.peek().is_some() {
        for body in bodies {
            hrefs.extend(
                body.select(&link_selector)
                    .filter_map(|a| a.value().attr("href"))
                    .map(str::to_string),
            );
        }
    } else {
        hrefs.extend(
            document
                .select(&link_selector)
                .filter_map(|a| a.value().attr("href"))
                .map(str::to_string),
        );
    }

    hrefs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_nodes_joined_with_spaces() {
        let html = r#"<table><tr><td>Arm:</td><td>9</td></tr></table><ul><li>fire</li><li>5%</li></ul>"#;
        assert_eq!(render_text(html), "Arm: 9 fire 5%");
    }

    #[test]
    fn test_whitespace_only_nodes_dropped() {
        let html = "<div>\n  <p>  You see a helmet.  </p>\n  \n</div>";
        assert_eq!(render_text(html), "You see a helmet.");
    }

    #[test]
    fn test_script_and_style_skipped() {
        let html = r#"<p>Visible</p><script>var fire = "5%";</script><style>.x{}</style><p>text</p>"#;
        assert_eq!(render_text(html), "Visible text");
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<p>Ferumbras&#39; Hat &amp; more</p>";
        assert_eq!(render_text(html), "Ferumbras' Hat & more");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_text(""), "");
        assert!(extract_hrefs("").is_empty());
    }

    #[test]
    fn test_hrefs_from_parser_output_only() {
        let html = r#"
            <a href="/wiki/Outside">Nav</a>
            <div class="mw-parser-output">
                <a href="/wiki/Crown_Helmet">Crown Helmet</a>
                <a name="anchor">No href</a>
                <a href="/wiki/File:Crown_Helmet.gif">Image</a>
            </div>
        "#;
        assert_eq!(
            extract_hrefs(html),
            vec!["/wiki/Crown_Helmet", "/wiki/File:Crown_Helmet.gif"]
        );
    }

    #[test]
    fn test_hrefs_fallback_to_whole_fragment() {
        let html = r#"<p><a href="/wiki/Steel_Helmet">Steel</a> <a href="https://example.com/">Ext</a></p>"#;
        assert_eq!(
            extract_hrefs(html),
            vec!["/wiki/Steel_Helmet", "https://example.com/"]
        );
    }
}
