use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Configuration for cleanup of accepted article markup
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Whether to strip all images
    pub strip_images: bool,
    /// Whether to remove empty nodes
    pub remove_empty_nodes: bool,
    /// Maximum passes for removing empty nodes
    pub max_empty_node_passes: usize,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self { strip_images: false, remove_empty_nodes: true, max_empty_node_passes: 10 }
    }
}

const ARTICLE_TAGS: &[&str] = &[
    "a", "abbr", "article", "b", "blockquote", "br", "caption", "cite", "code", "dd", "del", "details", "div", "dl",
    "dt", "em", "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "kbd", "li",
    "main", "mark", "ol", "p", "picture", "pre", "q", "s", "section", "small", "source", "span", "strong", "sub",
    "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "u", "ul",
];

static EMPTY_NODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(div|p|span|section|article|figure|li|ul|ol|strong|em|b|i)(?:\s[^>]*)?>(?:\s|&nbsp;|<br\s*/?>)*</(div|p|span|section|article|figure|li|ul|ol|strong|em|b|i)>").unwrap()
});
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<(?:picture|figure)[^>]*>\s*(?:<source[^>]*>\s*)*<img[^>]*>\s*</(?:picture|figure)>|<img[^>]*>").unwrap());

/// Clean extracted HTML for display.
///
/// Sanitization always runs: scripts, event handlers, inline styles and
/// classes never survive.
pub fn postprocess_html(html: &str, config: &PostProcessConfig) -> String {
    let mut processed = sanitize_html(html);

    if config.strip_images {
        processed = IMAGE.replace_all(&processed, "").into_owned();
    }

    if config.remove_empty_nodes {
        processed = remove_empty_nodes(&processed, config.max_empty_node_passes);
    }

    processed.trim().to_string()
}

/// Sanitize with an ammonia allowlist of article markup.
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = ARTICLE_TAGS.iter().copied().collect();

    let mut builder = ammonia::Builder::new();
    builder
        .tags(tags)
        .add_tag_attributes("a", &["href", "title"])
        .add_tag_attributes("img", &["src", "alt", "title", "width", "height", "srcset", "sizes"])
        .add_tag_attributes("source", &["srcset", "media", "type"])
        .add_tag_attributes("time", &["datetime"])
        .add_tag_attributes("td", &["colspan", "rowspan"])
        .add_tag_attributes("th", &["colspan", "rowspan", "scope"])
        .url_schemes(["http", "https", "mailto"].iter().copied().collect());

    builder.clean(html).to_string()
}

/// Remove elements that hold no text, repeating until stable
fn remove_empty_nodes(html: &str, max_passes: usize) -> String {
    let mut result = html.to_string();

    for _ in 0..max_passes {
        let next = EMPTY_NODE.replace_all(&result, "").into_owned();
        if next == result {
            break;
        }
        result = next;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_drops_scripts_and_handlers() {
        let html = r#"<div class="x" style="color:red" onclick="steal()"><p>Text</p><script>alert(1)</script></div>"#;
        let result = sanitize_html(html);

        assert!(result.contains("<p>Text</p>"));
        assert!(!result.contains("script"));
        assert!(!result.contains("alert"));
        assert!(!result.contains("onclick"));
        assert!(!result.contains("style="));
        assert!(!result.contains("class="));
    }

    #[test]
    fn test_sanitize_keeps_links_and_images() {
        let html = r#"<p><a href="https://example.com/a">link</a><img src="https://example.com/i.png" alt="pic"></p>"#;
        let result = sanitize_html(html);

        assert!(result.contains(r#"href="https://example.com/a""#));
        assert!(result.contains(r#"src="https://example.com/i.png""#));
        assert!(result.contains(r#"alt="pic""#));
    }

    #[test]
    fn test_sanitize_rejects_javascript_urls() {
        let result = sanitize_html(r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!result.contains("javascript"));
    }

    #[test]
    fn test_strip_images() {
        let config = PostProcessConfig { strip_images: true, ..Default::default() };
        let html = r#"<p>Before</p><figure><img src="https://example.com/a.png"></figure><p>After <img src="https://example.com/b.png"></p>"#;
        let result = postprocess_html(html, &config);

        assert!(!result.contains("<img"));
        assert!(result.contains("Before"));
        assert!(result.contains("After"));
    }

    #[test]
    fn test_remove_empty_nodes_nested() {
        let html = "<div><p>Keep</p><div><span> </span></div><p>&nbsp;</p></div>";
        let result = remove_empty_nodes(html, 10);

        assert_eq!(result, "<div><p>Keep</p></div>");
    }

    #[test]
    fn test_postprocess_config_default() {
        let config = PostProcessConfig::default();
        assert!(!config.strip_images);
        assert!(config.remove_empty_nodes);
        assert_eq!(config.max_empty_node_passes, 10);
    }
}
