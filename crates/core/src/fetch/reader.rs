//! Third-party reader service that returns pre-extracted article content.
//!
//! The service is asked for JSON and answers with
//! `{ "data": { "title": ..., "content": ... } }`. Content may be HTML or
//! Markdown; either way it is sanitized before it leaves this module.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use url::Url;

use super::{Fetcher, endpoint_url};
use crate::postprocess::sanitize_html;
use crate::text::{escape_html, html_to_text, looks_like_html};
use crate::{ReadModeError, Result, StructuredArticle};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*$").unwrap());
static RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[-=*_]\s*){3,}$").unwrap());
static MD_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static MD_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)[^)]*\)").unwrap());
static MD_STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());

#[derive(Debug, Deserialize)]
struct ReaderEnvelope {
    data: Option<ReaderData>,
    #[serde(flatten)]
    bare: ReaderData,
}

#[derive(Debug, Default, Deserialize)]
struct ReaderData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Ask the reader service at `template` for `target`.
///
/// Succeeds only with at least `min_chars` characters of article text.
pub async fn fetch_reader(fetcher: &Fetcher, template: &str, target: &Url, min_chars: usize) -> Result<StructuredArticle> {
    let endpoint = endpoint_url(template, target)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let page = fetcher.get(endpoint, headers).await?;
    page.ensure_success()?;

    parse_reader_response(&page.body, min_chars)
}

fn parse_reader_response(body: &str, min_chars: usize) -> Result<StructuredArticle> {
    let envelope: ReaderEnvelope =
        serde_json::from_str(body).map_err(|e| ReadModeError::MalformedResponse(e.to_string()))?;
    let data = envelope.data.unwrap_or(envelope.bare);

    let content = data.content.as_deref().map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(ReadModeError::NoContent);
    }

    let content_html = if looks_like_html(content) { sanitize_html(content) } else { sanitize_html(&markdown_to_html(content)) };
    let plain_text = html_to_text(&content_html);

    let found = plain_text.chars().count();
    if found < min_chars {
        return Err(ReadModeError::BelowThreshold { found, required: min_chars });
    }

    Ok(StructuredArticle {
        title: data.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        content_html,
        plain_text,
        byline: None,
        site_name: None,
    })
}

/// Render the Markdown subset reader services emit: headings, bullet lists,
/// paragraphs, bold text and links. Images and rules are dropped.
fn markdown_to_html(markdown: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut items: Vec<String> = Vec::new();

    for line in markdown.lines().map(str::trim) {
        if line.is_empty() || RULE.is_match(line) {
            flush_paragraph(&mut blocks, &mut paragraph);
            flush_list(&mut blocks, &mut items);
        } else if let Some(caps) = HEADING.captures(line) {
            flush_paragraph(&mut blocks, &mut paragraph);
            flush_list(&mut blocks, &mut items);
            let level = caps[1].len();
            blocks.push(format!("<h{level}>{}</h{level}>", inline(&caps[2])));
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            flush_paragraph(&mut blocks, &mut paragraph);
            items.push(format!("<li>{}</li>", inline(item)));
        } else {
            flush_list(&mut blocks, &mut items);
            paragraph.push(inline(line));
        }
    }
    flush_paragraph(&mut blocks, &mut paragraph);
    flush_list(&mut blocks, &mut items);

    blocks.join("\n")
}

fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    let without_images = MD_IMAGE.replace_all(&escaped, "");
    let linked = MD_LINK.replace_all(&without_images, r#"<a href="$2">$1</a>"#);
    MD_STRONG.replace_all(&linked, "<strong>$1</strong>").trim().to_string()
}

fn flush_paragraph(blocks: &mut Vec<String>, paragraph: &mut Vec<String>) {
    let text = paragraph.join(" ");
    if !text.trim().is_empty() {
        blocks.push(format!("<p>{text}</p>"));
    }
    paragraph.clear();
}

fn flush_list(blocks: &mut Vec<String>, items: &mut Vec<String>) {
    if !items.is_empty() {
        blocks.push(format!("<ul>{}</ul>", items.concat()));
    }
    items.clear();
}
