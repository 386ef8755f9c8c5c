use crate::parse::Document;
use crate::text::{count_words, html_to_text};
use crate::{ReadModeError, Result};

/// Article-body selectors, most specific first.
pub const ARTICLE_SELECTORS: &[&str] = &[
    r#"article [class*="body"]"#,
    r#"article [class*="content"]"#,
    r#"[itemprop="articleBody"]"#,
    r#"[class*="article-body"]"#,
    r#"[class*="article__body"]"#,
    r#"[class*="story-body"]"#,
    r#"[class*="post-content"]"#,
    r#"[class*="entry-content"]"#,
    r#"[class*="article-content"]"#,
    r#"[class*="post-body"]"#,
    "article",
    r#"[role="main"]"#,
    "main",
    "#content",
    ".content",
    "#main",
];

/// A match from the selector walk
#[derive(Debug, Clone)]
pub struct SelectorMatch {
    pub selector: &'static str,
    pub content: String,
    pub word_count: usize,
}

/// Walk [`ARTICLE_SELECTORS`] in order and return the first element whose
/// text exceeds `min_words`.
///
/// The document must already be cleaned with the noise denylist. Invalid
/// selectors are skipped.
pub fn extract_by_selectors(doc: &Document, min_words: usize) -> Result<SelectorMatch> {
    for selector in ARTICLE_SELECTORS {
        let Ok(elements) = doc.select(selector) else {
            tracing::debug!(selector, "skipping invalid selector");
            continue;
        };

        for element in elements {
            let content = element.outer_html();
            let word_count = count_words(&html_to_text(&content));
            if word_count > min_words {
                return Ok(SelectorMatch { selector, content, word_count });
            }
        }
    }

    Err(ReadModeError::NoContent)
}
