//! Structured-data (JSON-LD) article extraction.
//!
//! Scans `<script type="application/ld+json">` blocks for schema.org
//! `Article`-family objects, including ones nested in `@graph` arrays, and
//! rebuilds paragraph markup from their `articleBody`/`text`.

use serde_json::Value;

use crate::parse::Document;
use crate::text::{decode_entities, text_to_paragraphs};
use crate::{ReadModeError, Result, StructuredArticle};

const ARTICLE_TYPES: &[&str] = &["Article", "NewsArticle", "BlogPosting", "ReportageNewsArticle", "TechArticle"];

/// Keys that commonly hold nested entities in SEO plugin output
const NESTED_KEYS: &[&str] = &["@graph", "mainEntity", "mainEntityOfPage", "hasPart", "itemListElement"];

/// Extract the first article body found in the page's JSON-LD blocks.
///
/// Malformed JSON blocks are skipped.
///
/// # Errors
///
/// [`ReadModeError::NoContent`] when no block carries an article body.
pub fn extract_structured(doc: &Document) -> Result<StructuredArticle> {
    for script in doc.select(r#"script[type="application/ld+json"]"#)? {
        let raw = script.text();
        let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
            tracing::debug!("skipping malformed JSON-LD block");
            continue;
        };

        if let Some(article) = find_article(&value)
            && let Some(body) = article_body(article)
        {
            let plain_text = decode_entities(body.trim());
            return Ok(StructuredArticle {
                title: string_field(article, "headline")
                    .or_else(|| string_field(article, "name"))
                    .map(|title| decode_entities(&title)),
                content_html: text_to_paragraphs(&plain_text),
                plain_text,
                byline: article.get("author").and_then(person_name),
                site_name: article.get("publisher").and_then(person_name),
            });
        }
    }

    Err(ReadModeError::NoContent)
}

/// Depth-first search for an Article-typed object that has a body.
pub(crate) fn find_article(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if map.get("@type").is_some_and(is_article_type) && article_body(value).is_some() {
                return Some(value);
            }
            NESTED_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .chain(map.values())
                .find_map(find_article)
        }
        Value::Array(items) => items.iter().find_map(find_article),
        _ => None,
    }
}

fn is_article_type(value: &Value) -> bool {
    match value {
        Value::String(name) => {
            let name = name.rsplit('/').next().unwrap_or(name.as_str());
            ARTICLE_TYPES.iter().any(|t| name.eq_ignore_ascii_case(t))
        }
        Value::Array(items) => items.iter().any(is_article_type),
        _ => false,
    }
}

/// `articleBody`, falling back to `text`. Arrays of strings join as paragraphs.
fn article_body(article: &Value) -> Option<String> {
    ["articleBody", "text"].iter().filter_map(|key| article.get(*key)).find_map(|body| match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(parts) => {
            let joined = parts.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("\n\n");
            (!joined.trim().is_empty()).then_some(joined)
        }
        _ => None,
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Name of a person or organization given as a string, object, or array
pub(crate) fn person_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(_) => string_field(value, "name"),
        Value::Array(items) => items.iter().find_map(person_name),
        _ => None,
    }
}
