//! Fetch through a public pass-through web proxy.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use url::Url;

use super::{Fetcher, endpoint_url};
use crate::Result;

/// Fetch `target` through the proxy at `template` and accept the relayed body
/// as HTML of at least `min_len` characters.
pub async fn fetch_via_proxy(fetcher: &Fetcher, template: &str, target: &Url, min_len: usize) -> Result<String> {
    let endpoint = endpoint_url(template, target)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"));

    fetcher.get_html(endpoint, headers, min_len).await
}
