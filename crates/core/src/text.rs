//! Plain-text helpers shared by the extraction strategies.

use ego_tree::iter::Edge;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w'-]+\b").unwrap());
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?(p|div|article|section|h[1-6]|ul|ol|li|br|blockquote|pre|span|a|img|figure)\b").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol", "p", "pre", "section", "table", "td",
    "th", "tr", "ul",
];

/// Count words in text, handling various whitespace and punctuation patterns
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Convert HTML to plain text.
///
/// Block-level elements become paragraph breaks (`\n\n`) and runs of
/// whitespace inside a block collapse to one space, so adjacent paragraphs
/// never glue their words together.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut skip_depth = 0usize;

    for edge in fragment.root_element().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Text(text) if skip_depth == 0 => current.push_str(text),
                Node::Element(el) if matches!(el.name(), "script" | "style") => skip_depth += 1,
                Node::Element(el) if BLOCK_TAGS.contains(&el.name()) => flush(&mut blocks, &mut current),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(el) = node.value() {
                    if matches!(el.name(), "script" | "style") {
                        skip_depth = skip_depth.saturating_sub(1);
                    } else if BLOCK_TAGS.contains(&el.name()) {
                        flush(&mut blocks, &mut current);
                    }
                }
            }
        }
    }
    flush(&mut blocks, &mut current);

    blocks.join("\n\n")
}

fn flush(blocks: &mut Vec<String>, current: &mut String) {
    let collapsed = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        blocks.push(collapsed);
    }
    current.clear();
}

/// Rebuild minimal paragraph markup from plain text.
///
/// Blank lines separate paragraphs. Text without any blank line falls back to
/// one paragraph per line.
pub fn text_to_paragraphs(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let chunks: Vec<&str> = if BLANK_LINE.is_match(&normalized) {
        BLANK_LINE.split(&normalized).collect()
    } else {
        normalized.lines().collect()
    };

    chunks
        .into_iter()
        .map(|chunk| chunk.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| format!("<p>{}</p>", escape_html(&chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode character references such as `&#8217;` or `&amp;` in plain text.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    Html::parse_fragment(text).root_element().text().collect()
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Heuristic check for whether a string carries HTML markup.
pub fn looks_like_html(content: &str) -> bool {
    MARKUP_TAG.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("It&#8217;s Tom &amp; Jerry"), "It\u{2019}s Tom & Jerry");
        assert_eq!(decode_entities("No references here"), "No references here");
        assert_eq!(decode_entities("One.\n\nTwo &lt;3"), "One.\n\nTwo <3");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("one two three"), 3);
        assert_eq!(count_words("  spaced\n\nout\twords "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_html_to_text_separates_blocks() {
        let text = html_to_text("<p>First paragraph.</p><p>Second   paragraph.</p>");
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_html_to_text_keeps_inline_runs() {
        let text = html_to_text("<p>Some <strong>bold</strong> and <a href=\"/x\">linked</a> text</p>");
        assert_eq!(text, "Some bold and linked text");
    }

    #[test]
    fn test_html_to_text_skips_script() {
        let text = html_to_text("<div><script>var x = 1;</script><p>Visible</p></div>");
        assert_eq!(text, "Visible");
    }

    #[test]
    fn test_text_to_paragraphs_blank_lines() {
        let html = text_to_paragraphs("First para\nstill first.\n\nSecond para.");
        assert_eq!(html, "<p>First para still first.</p>\n<p>Second para.</p>");
    }

    #[test]
    fn test_text_to_paragraphs_single_newlines() {
        let html = text_to_paragraphs("Line one.\nLine two.\n");
        assert_eq!(html, "<p>Line one.</p>\n<p>Line two.</p>");
    }

    #[test]
    fn test_text_to_paragraphs_escapes() {
        let html = text_to_paragraphs("Tom & Jerry <3");
        assert_eq!(html, "<p>Tom &amp; Jerry &lt;3</p>");
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<p>Hello</p>"));
        assert!(looks_like_html("intro <br/> more"));
        assert!(!looks_like_html("# Heading\n\nJust markdown 3 < 4"));
    }
}
