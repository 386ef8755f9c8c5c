//! HTML parsing and DOM navigation.
//!
//! [`Document`] owns a parsed `scraper::Html` tree. Every DOM-based strategy
//! builds its own `Document`, so no strategy ever sees another strategy's
//! mutations.
//!
//! # Example
//!
//! ```rust
//! use readmode_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::preprocess::{self, PreprocessConfig};
use crate::{ReadModeError, Result};

/// A parsed HTML document.
///
/// # Example
///
/// ```rust
/// use readmode_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string without any cleaning.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None })
    }

    /// Parses HTML after destructive noise removal.
    ///
    /// The fixed noise denylist is always applied; `config` controls the
    /// additional passes and relative URL resolution.
    pub fn parse_cleaned(html: &str, config: &PreprocessConfig) -> Result<Self> {
        let cleaned = preprocess::preprocess_html(html, config);
        let html = Html::parse_document(&cleaned);

        Ok(Self { html, base_url: config.base_url.clone() })
    }

    /// Base URL the document was cleaned against, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Gets the raw `scraper::Html` tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the whole document back to HTML.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ReadModeError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use readmode_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// First element matching a CSS selector.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(Element::new))
    }

    /// Looks an element up by its node id.
    pub fn element(&'_ self, id: NodeId) -> Option<Element<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap).map(Element::new)
    }

    /// The `<body>` element, when present.
    pub fn body(&'_ self) -> Option<Element<'_>> {
        self.select_first("body").ok().flatten()
    }

    /// Content of the `<title>` element, trimmed.
    pub fn title(&self) -> Option<String> {
        let title = self.select_first("title").ok()??.text();
        let title = title.trim();
        (!title.is_empty()).then(|| title.to_string())
    }

    /// All text content of the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ReadModeError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// A single element of a [`Document`].
///
/// # Example
///
/// ```rust
/// use readmode_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Stable identity of this element within its document.
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Concatenation of all descendant text nodes.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Number of characters of text, ignoring surrounding whitespace.
    pub fn text_len(&self) -> usize {
        self.text().trim().chars().count()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Lowercase tag name (e.g. "div", "a").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Closest ancestor that is an element.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// Element children in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(Element::new).collect()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ReadModeError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title> Test Page </title>
        </head>
        <body>
            <div id="wrap">
                <h1>Heading</h1>
                <p class="content">Paragraph 1</p>
                <p class="content">Paragraph 2</p>
            </div>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let link = doc.select_first("a").unwrap().unwrap();

        assert_eq!(link.attr("href"), Some("https://example.com"));
        assert_eq!(link.text(), "Link");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(ReadModeError::HtmlParseError(_))));
    }

    #[test]
    fn test_parent_and_children() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let para = doc.select_first("p.content").unwrap().unwrap();
        let parent = para.parent().unwrap();

        assert_eq!(parent.tag_name(), "div");
        assert_eq!(parent.attr("id"), Some("wrap"));
        let tags: Vec<String> = parent.children().iter().map(|c| c.tag_name()).collect();
        assert_eq!(tags, vec!["h1", "p", "p"]);
    }

    #[test]
    fn test_element_lookup_by_id() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let wrap = doc.select_first("#wrap").unwrap().unwrap();
        let found = doc.element(wrap.id()).unwrap();

        assert_eq!(found.outer_html(), wrap.outer_html());
    }

    #[test]
    fn test_text_content() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let text = doc.text_content();

        assert!(text.contains("Heading"));
        assert!(text.contains("Paragraph 2"));
    }
}
