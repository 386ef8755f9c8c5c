use serde_json::Value;

use crate::parse::Document;
use crate::structured::{find_article, person_name};

/// Page-level metadata used to complete an article record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub site_name: Option<String>,
}

impl Document {
    /// Extract title metadata, byline and site name in one pass over the
    /// JSON-LD blocks.
    pub fn extract_metadata(&self) -> Metadata {
        let json_ld = self.json_ld_article();

        Metadata {
            title: self.extract_title(json_ld.as_ref()),
            byline: self.extract_byline(json_ld.as_ref()),
            site_name: self.extract_site_name(json_ld.as_ref()),
        }
    }

    /// Extract title with priority fallback:
    /// 1. Open Graph `og:title`
    /// 2. Twitter `twitter:title`
    /// 3. JSON-LD `headline`
    /// 4. `<title>` element
    /// 5. First `<h1>` element
    fn extract_title(&self, json_ld: Option<&Value>) -> Option<String> {
        self.meta_content("og:title")
            .or_else(|| self.meta_content("twitter:title"))
            .or_else(|| json_ld.and_then(|v| v.get("headline")).and_then(Value::as_str).map(clean_text))
            .or_else(|| self.title())
            .or_else(|| self.first_text("h1"))
            .filter(|title| !title.is_empty())
    }

    /// Extract byline with priority fallback:
    /// 1. JSON-LD `author`
    /// 2. Meta `author`
    /// 3. `[rel="author"]` link text
    /// 4. `[itemprop="author"]` text
    /// 5. `.byline` / `.author` text
    fn extract_byline(&self, json_ld: Option<&Value>) -> Option<String> {
        json_ld
            .and_then(|v| v.get("author"))
            .and_then(person_name)
            .or_else(|| self.meta_content("author"))
            .or_else(|| self.first_text(r#"[rel="author"]"#))
            .or_else(|| self.first_text(r#"[itemprop="author"]"#))
            .or_else(|| self.first_text(".byline"))
            .or_else(|| self.first_text(".author"))
            .filter(|byline| byline.chars().count() < 100)
    }

    /// Extract site name with priority fallback:
    /// 1. Open Graph `og:site_name`
    /// 2. JSON-LD `publisher.name`
    /// 3. Meta `application-name`
    fn extract_site_name(&self, json_ld: Option<&Value>) -> Option<String> {
        self.meta_content("og:site_name")
            .or_else(|| json_ld.and_then(|v| v.get("publisher")).and_then(person_name))
            .or_else(|| self.meta_content("application-name"))
    }

    /// Get meta tag content by name or property attribute
    fn meta_content(&self, key: &str) -> Option<String> {
        [format!(r#"meta[property="{key}"]"#), format!(r#"meta[name="{key}"]"#)]
            .iter()
            .filter_map(|selector| self.select_first(selector).ok().flatten())
            .filter_map(|el| el.attr("content").map(clean_text))
            .find(|content| !content.is_empty())
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        let element = self.select_first(selector).ok()??;
        let text = clean_text(&element.text());
        (!text.is_empty()).then_some(text)
    }

    /// The first Article-typed JSON-LD object on the page, if any
    fn json_ld_article(&self) -> Option<Value> {
        self.select(r#"script[type="application/ld+json"]"#)
            .unwrap_or_default()
            .iter()
            .filter_map(|el| serde_json::from_str::<Value>(el.text().trim()).ok())
            .find_map(|value| find_article(&value).cloned().or_else(|| top_level_article(&value).cloned()))
    }
}

/// An article object without a body still carries metadata.
fn top_level_article(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) if map.contains_key("headline") => Some(value),
        Value::Array(items) => items.iter().find_map(top_level_article),
        _ => None,
    }
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML_WITH_META: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Test Page Title | Example</title>
            <meta name="author" content="John Doe">
            <meta property="og:title" content="OG Title">
            <meta property="og:site_name" content="Example Site">
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "NewsArticle",
                "headline": "JSON-LD Headline",
                "author": { "@type": "Person", "name": "Jane Smith" },
                "publisher": { "@type": "Organization", "name": "JSON-LD Publisher" }
            }
            </script>
        </head>
        <body><h1>Main Heading</h1><p>Paragraph.</p></body>
        </html>
    "#;

    const HTML_WITHOUT_META: &str = r#"
        <html>
        <head><title>Simple Page</title></head>
        <body><h1>Heading</h1><p class="byline">By   Sam Lee</p></body>
        </html>
    "#;

    #[test]
    fn test_title_prefers_open_graph() {
        let doc = Document::parse(HTML_WITH_META).unwrap();
        assert_eq!(doc.extract_metadata().title, Some("OG Title".to_string()));
    }

    #[test]
    fn test_title_fallback() {
        let doc = Document::parse(HTML_WITHOUT_META).unwrap();
        assert_eq!(doc.extract_metadata().title, Some("Simple Page".to_string()));
    }

    #[test]
    fn test_title_from_h1() {
        let doc = Document::parse("<html><body><h1> Only Heading </h1></body></html>").unwrap();
        assert_eq!(doc.extract_metadata().title, Some("Only Heading".to_string()));
    }

    #[test]
    fn test_byline_from_json_ld() {
        let doc = Document::parse(HTML_WITH_META).unwrap();
        assert_eq!(doc.extract_metadata().byline, Some("Jane Smith".to_string()));
    }

    #[test]
    fn test_byline_from_markup() {
        let doc = Document::parse(HTML_WITHOUT_META).unwrap();
        assert_eq!(doc.extract_metadata().byline, Some("By Sam Lee".to_string()));
    }

    #[test]
    fn test_site_name() {
        let doc = Document::parse(HTML_WITH_META).unwrap();
        assert_eq!(doc.extract_metadata().site_name, Some("Example Site".to_string()));

        let doc = Document::parse(HTML_WITHOUT_META).unwrap();
        assert_eq!(doc.extract_metadata().site_name, None);
    }
}
