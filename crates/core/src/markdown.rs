//! Markdown rendering of extracted articles.

use std::collections::HashSet;

use crate::article::ExtractedArticle;
use crate::parse::Document;
use crate::text::count_words;
use crate::{ReadModeError, Result};

/// Configuration for Markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownConfig {
    /// Include TOML frontmatter with metadata
    pub include_frontmatter: bool,
    /// Generate reference table for all links
    pub include_references: bool,
    /// Strip images from output
    pub strip_images: bool,
    /// Include title as H1 heading at the start of content
    pub include_title_heading: bool,
}

/// A collected link reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub text: String,
    pub url: String,
}

impl ExtractedArticle {
    /// Render the article as Markdown.
    ///
    /// # Errors
    ///
    /// [`ReadModeError::MarkdownConversion`] when the markup cannot be converted.
    pub fn to_markdown(&self, config: &MarkdownConfig) -> Result<String> {
        let mut output = String::new();

        if config.include_frontmatter {
            output.push_str(&self.frontmatter());
            output.push('\n');
        }

        if config.include_title_heading {
            output.push_str(&format!("# {}\n\n", self.title));
        }

        let html = if config.strip_images { strip_images(&self.content_html) } else { self.content_html.clone() };
        let body = htmd::convert(&html).map_err(|e| ReadModeError::MarkdownConversion(e.to_string()))?;
        output.push_str(body.trim());

        if config.include_references {
            let links = extract_links(&html);
            if !links.is_empty() {
                output.push_str("\n\n## References\n\n");
                output.push_str(&reference_table(&links));
            }
        }

        Ok(output)
    }

    fn frontmatter(&self) -> String {
        let mut frontmatter = String::from("+++");
        frontmatter.push_str(&format!("\ntitle = {}", toml_escape_string(&self.title)));

        if let Some(byline) = &self.byline {
            frontmatter.push_str(&format!("\nauthor = {}", toml_escape_string(byline)));
        }
        if let Some(site) = &self.site_name {
            frontmatter.push_str(&format!("\nsite = {}", toml_escape_string(site)));
        }

        frontmatter.push_str(&format!("\nword_count = {}", count_words(&self.plain_text)));
        frontmatter.push_str("\n+++\n");
        frontmatter
    }
}

/// Escape a string for TOML format
fn toml_escape_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n"))
}

/// Remove `<img>` elements, keeping surrounding markup.
fn strip_images(html: &str) -> String {
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("img", |el| {
                el.remove();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| html.to_string())
}

/// Links in document order, first occurrence of each URL only.
pub fn extract_links(html: &str) -> Vec<LinkReference> {
    let Ok(doc) = Document::parse(html) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();

    doc.select("a[href]")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|link| {
            let text = link.text().trim().to_string();
            let url = link.attr("href")?.to_string();
            (!text.is_empty() && !url.is_empty() && seen.insert(url.clone())).then_some(LinkReference { text, url })
        })
        .collect()
}

fn reference_table(links: &[LinkReference]) -> String {
    let mut table = String::from("| # | Text | URL |\n|---|------|-----|\n");
    for (i, link) in links.iter().enumerate() {
        table.push_str(&format!("| {} | {} | {} |\n", i + 1, escape_pipe(&link.text), escape_pipe(&link.url)));
    }
    table
}

fn escape_pipe(s: &str) -> String {
    s.replace('|', "\\|")
}
