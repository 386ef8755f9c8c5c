//! HTTP retrieval primitives shared by every retrieval strategy.
//!
//! A [`Fetcher`] wraps one pooled reqwest client. Each strategy module builds
//! its own request (headers, endpoint URL) and decides how to judge the
//! response: [`direct`] and [`proxy`] want an HTML page, [`reader`] and
//! [`archive`] talk to JSON services first.
//!
//! Per-attempt time budgets are enforced by the coordinator in
//! [`retrieve`](crate::retrieve), not here, so a dropped future cancels the
//! request.

pub mod archive;
pub mod direct;
pub mod proxy;
pub mod reader;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::{ReadModeError, Result};

pub use archive::fetch_snapshot;
pub use direct::{HeaderProfile, fetch_direct};
pub use proxy::fetch_via_proxy;
pub use reader::fetch_reader;

/// User agent for service calls that do not impersonate a client.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; ReadMode/0.3)";

/// Largest response body read into memory (10 MiB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

const MAX_REDIRECTS: usize = 10;

/// How far into a body to look for a `<meta charset>` declaration
const CHARSET_SNIFF_LEN: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_.:-]+)"#).unwrap()
});

/// Shared HTTP client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_body: usize,
}

impl Fetcher {
    /// Builds a client that follows a bounded number of redirects and
    /// negotiates gzip, brotli and deflate transparently.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client, max_body: MAX_CONTENT_LENGTH })
    }

    /// Use a preconfigured reqwest client (proxies, custom TLS roots...).
    pub fn with_client(client: Client) -> Self {
        Self { client, max_body: MAX_CONTENT_LENGTH }
    }

    /// Lower or raise the body size limit.
    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    /// GET `url` with `headers`, returning whatever the server answered.
    ///
    /// Status and content type are not judged here; only the size limit is.
    pub async fn get(&self, url: Url, headers: HeaderMap) -> Result<FetchedPage> {
        self.fetch(url, headers, |_| Ok(())).await
    }

    /// GET an HTML page of at least `min_len` characters.
    ///
    /// Status and content type are checked from the response head, so a
    /// rejected body is never downloaded.
    pub async fn get_html(&self, url: Url, headers: HeaderMap, min_len: usize) -> Result<String> {
        self.fetch(url, headers, FetchedPage::check_html_head).await?.into_html(min_len)
    }

    async fn fetch(
        &self, url: Url, headers: HeaderMap, check_head: fn(&FetchedPage) -> Result<()>,
    ) -> Result<FetchedPage> {
        tracing::debug!(url = %url, "GET");

        let response = self.client.get(url).headers(headers).send().await?;
        let mut page = FetchedPage {
            status: response.status().as_u16(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            final_url: response.url().clone(),
            body: String::new(),
        };
        check_head(&page)?;

        let body = read_capped(response, self.max_body).await?;
        page.body = decode_body(&body, page.content_type.as_deref());
        Ok(page)
    }
}

/// Read the body chunk by chunk, giving up as soon as it exceeds `max`.
async fn read_capped(mut response: Response, max: usize) -> Result<Vec<u8>> {
    if let Some(len) = response.content_length()
        && len as usize > max
    {
        return Err(ReadModeError::BodyTooLarge { len: len as usize, max });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max {
            return Err(ReadModeError::BodyTooLarge { len: body.len() + chunk.len(), max });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Decode with the header charset, then a `<meta charset>` near the top of
/// the document, then a statistical guess.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(header_charset)
        .or_else(|| meta_charset(body))
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()));

    let encoding = declared.unwrap_or_else(|| {
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(body, true);
        detector.guess(None, true)
    });

    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

fn header_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
    })
}

fn meta_charset(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(CHARSET_SNIFF_LEN)];
    let captures = META_CHARSET.captures(head)?;
    Some(String::from_utf8_lossy(captures.get(1)?.as_bytes()).into_owned())
}

/// A response body with the metadata needed to judge it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub final_url: Url,
    pub body: String,
}

impl FetchedPage {
    pub fn ensure_success(&self) -> Result<()> {
        if (200..300).contains(&self.status) { Ok(()) } else { Err(ReadModeError::HttpStatus(self.status)) }
    }

    /// Reject a non-2xx or non-HTML response before its body is read.
    fn check_html_head(&self) -> Result<()> {
        self.ensure_success()?;
        if !self.is_html() {
            return Err(ReadModeError::UnsupportedContentType(self.content_type.clone().unwrap_or_default()));
        }
        Ok(())
    }

    /// True for `text/html`, `application/xhtml+xml`, or no content type at all.
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().is_none_or(is_html_content_type)
    }

    /// Accept the page as an HTML document of at least `min_len` characters.
    pub fn into_html(self, min_len: usize) -> Result<String> {
        self.check_html_head()?;

        let len = self.body.trim().chars().count();
        if len < min_len {
            return Err(ReadModeError::BodyTooShort { len, min: min_len });
        }

        Ok(self.body)
    }
}

/// Whether a `Content-Type` value names an HTML document.
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "text/html" || essence == "application/xhtml+xml"
}

/// Expand an endpoint template for `target`.
///
/// `{url}` is replaced with the percent-encoded target and `{raw_url}` with
/// the target verbatim. A template with neither placeholder gets the raw
/// target appended.
pub fn endpoint_url(template: &str, target: &Url) -> Result<Url> {
    let expanded = if template.contains("{url}") || template.contains("{raw_url}") {
        let encoded: String = byte_serialize(target.as_str().as_bytes()).collect();
        template.replace("{url}", &encoded).replace("{raw_url}", target.as_str())
    } else {
        format!("{template}{target}")
    };

    Url::parse(&expanded).map_err(|e| ReadModeError::InvalidUrl(format!("{expanded}: {e}")))
}
