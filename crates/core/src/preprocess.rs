use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Elements removed before any DOM-based strategy scores or selects content.
///
/// Entries are matched by lol_html, which supports tag, class, id, attribute
/// and child/descendant combinators.
pub const NOISE_SELECTORS: &[&str] = &[
    // non-content markup
    "script",
    "style",
    "noscript",
    "iframe",
    "svg",
    "canvas",
    "template",
    "object",
    "embed",
    "link",
    // page chrome
    "nav",
    "footer",
    "aside",
    "body > header",
    "[role=\"navigation\"]",
    "[role=\"banner\"]",
    "[role=\"contentinfo\"]",
    "[role=\"complementary\"]",
    "[role=\"dialog\"]",
    "[role=\"alertdialog\"]",
    "[aria-hidden=\"true\"]",
    "[hidden]",
    "[class*=\"breadcrumb\"]",
    "[class*=\"sidebar\"]",
    "[id*=\"sidebar\"]",
    // advertising
    "ins.adsbygoogle",
    "[class*=\"advert\"]",
    "[id*=\"advert\"]",
    "[class*=\"ad-slot\"]",
    "[class*=\"ad-container\"]",
    "[class*=\"ad-wrapper\"]",
    "[id^=\"google_ads\"]",
    "[id^=\"div-gpt-ad\"]",
    "[class*=\"sponsored\"]",
    "[class*=\"promo\"]",
    // comments
    "#comments",
    "#disqus_thread",
    "[class*=\"comment\"]",
    "[id*=\"comment\"]",
    // cookie and consent banners
    "[class*=\"cookie\"]",
    "[id*=\"cookie\"]",
    "[class*=\"consent\"]",
    "[id*=\"consent\"]",
    "[class*=\"gdpr\"]",
    // paywall and overlays
    "[class*=\"paywall\"]",
    "[id*=\"paywall\"]",
    "[class*=\"newsletter\"]",
    "[class*=\"modal\"]",
    "[class*=\"overlay\"]",
    "[class*=\"popup\"]",
    // engagement widgets
    "[class*=\"share\"]",
    "[class*=\"social\"]",
    "[class*=\"related\"]",
];

/// Structural elements never removed by attribute matches, e.g. `<body class="has-sidebar">`.
const PROTECTED_TAGS: &[&str] = &["html", "head", "body", "main", "article"];

static UNLIKELY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(banner|combx|community|disqus|extra|foot|header|menu|remark|rss|shoutbox|sponsor|ad-break|agegate|pagination|pager)",
    )
    .unwrap()
});
static MAYBE_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story)").unwrap());
static HIDDEN_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").unwrap());
static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Configuration for the passes that run after the noise denylist
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Unwrap containers whose class/id suggests boilerplate
    pub remove_unlikely: bool,
    /// Remove elements hidden with inline styles
    pub remove_hidden: bool,
    /// Base URL for converting relative URLs
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_unlikely: true, remove_hidden: true, base_url: None }
    }
}

impl PreprocessConfig {
    pub fn with_base_url(base_url: &Url) -> Self {
        Self { base_url: Some(base_url.clone()), ..Default::default() }
    }
}

/// Clean raw HTML for DOM-based extraction.
///
/// Noise removal always runs; the remaining passes follow `config`.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = remove_noise(html);
    processed = remove_comments(&processed);

    if config.remove_unlikely {
        processed = remove_unlikely_candidates(&processed);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    if let Some(base_url) = &config.base_url {
        processed = convert_relative_urls(&processed, base_url);
    }

    processed
}

/// Remove every element matching [`NOISE_SELECTORS`], subtree included.
///
/// A substring rule such as `[class*="comment"]` spares an element that also
/// carries a content-like class or id token without the matched word, e.g.
/// `<div class="post-content comments-open">`.
pub fn remove_noise(html: &str) -> String {
    let handlers: Vec<(Cow<'_, lol_html::Selector>, lol_html::ElementContentHandlers<'_>)> = NOISE_SELECTORS
        .iter()
        .map(|selector| {
            let needle = substring_needle(selector);
            lol_html::element!(selector, move |el| {
                if PROTECTED_TAGS.contains(&el.tag_name().as_str()) {
                    return Ok(());
                }

                if let Some(needle) = needle {
                    let names_content = ["class", "id"]
                        .into_iter()
                        .filter_map(|name| el.get_attribute(name))
                        .any(|value| value.split_whitespace().any(|token| is_content_token(token, needle)));
                    if names_content {
                        return Ok(());
                    }
                }

                el.remove();
                Ok(())
            })
        })
        .collect();

    rewrite(html, handlers)
}

/// The word matched by a `[class*="..."]` or `[id*="..."]` rule.
fn substring_needle(selector: &str) -> Option<&str> {
    let rest = selector.strip_prefix("[class*=\"").or_else(|| selector.strip_prefix("[id*=\""))?;
    rest.strip_suffix("\"]")
}

fn is_content_token(token: &str, needle: &str) -> bool {
    MAYBE_CANDIDATE.is_match(token) && !token.to_ascii_lowercase().contains(needle)
}

/// Run a lol_html rewrite, returning the input untouched if rewriting fails.
fn rewrite<'h>(
    html: &str,
    handlers: Vec<(Cow<'_, lol_html::Selector>, lol_html::ElementContentHandlers<'h>)>,
) -> String {
    let mut output = String::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

fn remove_comments(html: &str) -> String {
    HTML_COMMENT.replace_all(html, "").into_owned()
}

/// Unwrap elements whose class or id matches boilerplate patterns.
///
/// Content is kept so that a mislabelled article wrapper only loses its tag.
fn remove_unlikely_candidates(html: &str) -> String {
    let is_unlikely = |value: &str| UNLIKELY.is_match(value) && !MAYBE_CANDIDATE.is_match(value);

    rewrite(
        html,
        vec![lol_html::element!("*", |el| {
            if PROTECTED_TAGS.contains(&el.tag_name().as_str()) {
                return Ok(());
            }

            let id_unlikely = el.get_attribute("id").is_some_and(|id| is_unlikely(&id));
            let class_unlikely = el
                .get_attribute("class")
                .is_some_and(|class| class.split_whitespace().any(is_unlikely));

            if id_unlikely || class_unlikely {
                el.remove_and_keep_content();
            }
            Ok(())
        })],
    )
}

fn remove_hidden_elements(html: &str) -> String {
    rewrite(
        html,
        vec![lol_html::element!("[style]", |el| {
            if el.get_attribute("style").is_some_and(|style| HIDDEN_STYLE.is_match(&style)) {
                el.remove();
            }
            Ok(())
        })],
    )
}

/// Convert relative `href`/`src` attributes to absolute URLs
pub fn convert_relative_urls(html: &str, base_url: &Url) -> String {
    rewrite(
        html,
        vec![
            lol_html::element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href")
                    && let Ok(absolute) = base_url.join(&href)
                {
                    el.set_attribute("href", absolute.as_str()).ok();
                }
                Ok(())
            }),
            lol_html::element!("img[src]", |el| {
                if let Some(src) = el.get_attribute("src")
                    && let Ok(absolute) = base_url.join(&src)
                {
                    el.set_attribute("src", absolute.as_str()).ok();
                }
                Ok(())
            }),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_selectors_are_valid() {
        for selector in NOISE_SELECTORS {
            assert!(
                selector.parse::<lol_html::Selector>().is_ok(),
                "unsupported selector: {}",
                selector
            );
        }
    }

    #[test]
    fn test_remove_noise_tags() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <p>Content</p>
                </body>
            </html>
        "#;

        let result = remove_noise(html);
        assert!(!result.contains("alert"));
        assert!(!result.contains("color:red"));
        assert!(!result.contains("Enable JavaScript"));
        assert!(!result.contains("<iframe"));
        assert!(!result.contains("rect"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_remove_noise_chrome_and_banners() {
        let html = r#"
            <body>
                <header><a href="/">Site logo</a></header>
                <nav><a href="/world">World</a><a href="/sport">Sport</a></nav>
                <div class="cookie-banner">We use cookies</div>
                <div id="paywall-overlay">Subscribe to continue</div>
                <div aria-hidden="true">Screen reader skip</div>
                <article>
                    <header><h1>Story headline</h1></header>
                    <p>Story text</p>
                </article>
                <section id="comments">Reader comments</section>
                <footer>Copyright</footer>
            </body>
        "#;

        let result = remove_noise(html);
        assert!(!result.contains("Site logo"));
        assert!(!result.contains("Sport"));
        assert!(!result.contains("We use cookies"));
        assert!(!result.contains("Subscribe to continue"));
        assert!(!result.contains("Screen reader skip"));
        assert!(!result.contains("Reader comments"));
        assert!(!result.contains("Copyright"));
        assert!(result.contains("Story headline"));
        assert!(result.contains("Story text"));
    }

    #[test]
    fn test_remove_noise_keeps_structural_elements() {
        let html = r#"<html><body class="has-sidebar modal-open"><article class="with-comments"><p>Story text</p></article></body></html>"#;
        let result = remove_noise(html);
        assert!(result.contains("Story text"));
    }

    #[test]
    fn test_remove_noise_spares_content_wrappers() {
        let html = r#"<body>
            <div class="post-content comments-open"><p>Story text</p></div>
            <div id="main-story" class="share-enabled"><p>Second part</p></div>
            <div class="comment-body"><p>Reader reply</p></div>
            <div class="share-buttons"><a href="/s">Share</a></div>
        </body>"#;

        let result = remove_noise(html);
        assert!(result.contains("Story text"));
        assert!(result.contains("Second part"));
        assert!(!result.contains("Reader reply"));
        assert!(!result.contains("Share</a>"));
    }

    #[test]
    fn test_substring_needle() {
        assert_eq!(substring_needle("[class*=\"comment\"]"), Some("comment"));
        assert_eq!(substring_needle("[id*=\"sidebar\"]"), Some("sidebar"));
        assert_eq!(substring_needle("#comments"), None);
        assert_eq!(substring_needle("nav"), None);
    }

    #[test]
    fn test_remove_noise_keeps_forms() {
        let html = r#"<div><form><p>Article inside a form wrapper</p></form></div>"#;
        let result = remove_noise(html);
        assert!(result.contains("Article inside a form wrapper"));
    }

    #[test]
    fn test_remove_comments() {
        let html = "<body><!-- note --><p>Visible</p><!--\nmulti\nline\n--></body>";
        let result = remove_comments(html);
        assert!(!result.contains("<!--"));
        assert!(result.contains("Visible"));
    }

    #[test]
    fn test_remove_unlikely_candidates_keeps_content() {
        let html = r#"<body><div class="menu-wrap"><p>Menu text</p></div><div class="post-body">Body</div></body>"#;
        let result = remove_unlikely_candidates(html);
        assert!(!result.contains("menu-wrap"));
        assert!(result.contains("Menu text"));
        assert!(result.contains("post-body"));
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"
            <div style="display:none">Hidden content</div>
            <div style="visibility: hidden">Invisible content</div>
            <div style="color: blue">Visible content</div>
        "#;

        let result = remove_hidden_elements(html);
        assert!(!result.contains("Hidden content"));
        assert!(!result.contains("Invisible content"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_convert_relative_urls() {
        let base = Url::parse("https://example.com/blog/").unwrap();
        let html = r#"<a href="/about">About</a><a href="post.html">Post</a><img src="image.jpg">"#;

        let result = convert_relative_urls(html, &base);
        assert!(result.contains("href=\"https://example.com/about\""));
        assert!(result.contains("href=\"https://example.com/blog/post.html\""));
        assert!(result.contains("src=\"https://example.com/blog/image.jpg\""));
    }

    #[test]
    fn test_preprocess_full_pipeline() {
        let html = r#"
            <html>
            <head><script>console.log('x');</script><!-- Comment --></head>
            <body>
                <aside><p>Sidebar</p></aside>
                <div id="main" class="article">
                    <a href="/post">Link</a>
                    <p style="display:none">Hidden</p>
                    <p>Content</p>
                </div>
            </body>
            </html>
        "#;

        let base = Url::parse("https://example.com").unwrap();
        let result = preprocess_html(html, &PreprocessConfig::with_base_url(&base));

        assert!(!result.contains("<script"));
        assert!(!result.contains("<!--"));
        assert!(!result.contains("Sidebar"));
        assert!(!result.contains("Hidden"));
        assert!(result.contains("href=\"https://example.com/post\""));
        assert!(result.contains("Content"));
    }
}
