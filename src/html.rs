//! Title and link extraction over a parsed HTML document.
//!
//! The fetch pipeline buffers the response body once, parses it once, and
//! runs both extractors over the same document.

use std::sync::LazyLock;

use scraper::{Html, Selector};

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Text of the first `<title>` element, or empty when the document has
/// none. Only the first text node is taken, mirroring a single-token scan.
pub(crate) fn page_title(doc: &Html) -> String {
    doc.select(&TITLE)
        .next()
        .and_then(|title| title.text().next())
        .unwrap_or_default()
        .to_string()
}

/// All `<a href>` targets in document order, unresolved and unfiltered.
pub(crate) fn collect_links(doc: &Html) -> Vec<String> {
    doc.select(&ANCHOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_title_text() {
        let doc = Html::parse_document(r#"<meta charset="UTF-8"><title>Example Title</title>"#);
        assert_eq!(page_title(&doc), "Example Title");
    }

    #[test]
    fn missing_title_yields_empty_string() {
        let doc = Html::parse_document("<html><body><p>no title here</p></body></html>");
        assert_eq!(page_title(&doc), "");
    }

    #[test]
    fn collects_hrefs_in_document_order() {
        let doc = Html::parse_document(
            r#"<html><body>
                <a href="/first">one</a>
                <a name="no-href">skipped</a>
                <a href="https://example.com/second">two</a>
                <a href="mailto:someone@example.com">three</a>
            </body></html>"#,
        );
        assert_eq!(
            collect_links(&doc),
            vec![
                "/first".to_string(),
                "https://example.com/second".to_string(),
                "mailto:someone@example.com".to_string(),
            ]
        );
    }
}
