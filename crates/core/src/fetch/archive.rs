//! Web-archive snapshot lookup.
//!
//! The availability API is asked for the closest snapshot of the target. The
//! snapshot is then fetched in its raw form (`/web/{timestamp}id_/...`), which
//! omits the archive's own toolbar and rewritten links.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use url::Url;

use super::{Fetcher, endpoint_url};
use crate::{ReadModeError, Result};

#[derive(Debug, Deserialize)]
struct Availability {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

/// The closest archived copy of a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub available: bool,
    pub url: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl Snapshot {
    /// The snapshot URL in raw (unframed) form.
    pub fn raw_url(&self) -> Result<Url> {
        let marker = format!("/web/{}/", self.timestamp);
        let raw = if !self.timestamp.is_empty() && self.url.contains(&marker) {
            self.url.replacen(&marker, &format!("/web/{}id_/", self.timestamp), 1)
        } else {
            self.url.clone()
        };

        Url::parse(&raw).map_err(|e| ReadModeError::InvalidUrl(format!("{raw}: {e}")))
    }
}

/// Look up the closest snapshot of `target` through the availability API at
/// `api_template`, then fetch it as HTML of at least `min_len` characters.
pub async fn fetch_snapshot(fetcher: &Fetcher, api_template: &str, target: &Url, min_len: usize) -> Result<String> {
    let endpoint = endpoint_url(api_template, target)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let page = fetcher.get(endpoint, headers).await?;
    page.ensure_success()?;

    let snapshot = closest_snapshot(&page.body)?;
    let raw = snapshot.raw_url()?;
    tracing::debug!(snapshot = %raw, timestamp = %snapshot.timestamp, "fetching archived snapshot");

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"));

    fetcher.get_html(raw, headers, min_len).await
}

fn closest_snapshot(body: &str) -> Result<Snapshot> {
    let availability: Availability =
        serde_json::from_str(body).map_err(|e| ReadModeError::MalformedResponse(e.to_string()))?;

    availability
        .archived_snapshots
        .closest
        .filter(|s| s.available && s.status.as_deref().is_none_or(|status| status.starts_with('2')))
        .ok_or(ReadModeError::SnapshotUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_raw_url_rewrite() {
        let snapshot = Snapshot {
            available: true,
            url: "http://web.archive.org/web/20240115093000/https://news.example/story".to_string(),
            timestamp: "20240115093000".to_string(),
            status: Some("200".to_string()),
        };

        assert_eq!(
            snapshot.raw_url().unwrap().as_str(),
            "http://web.archive.org/web/20240115093000id_/https://news.example/story"
        );
    }

    #[test]
    fn test_no_snapshot() {
        let body = json!({ "url": "news.example/story", "archived_snapshots": {} }).to_string();
        assert!(matches!(closest_snapshot(&body), Err(ReadModeError::SnapshotUnavailable)));

        let body = json!({
            "archived_snapshots": { "closest": { "available": true, "url": "http://a/b", "timestamp": "1", "status": "404" } }
        })
        .to_string();
        assert!(matches!(closest_snapshot(&body), Err(ReadModeError::SnapshotUnavailable)));
    }

    #[test]
    fn test_malformed_availability() {
        assert!(matches!(closest_snapshot("not json"), Err(ReadModeError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let server = MockServer::start();
        let target = "https://news.example/story";
        let snapshot_url = server.url("/web/20240115093000/news.example/story");
        let body = format!("<html><body><article>{}</article></body></html>", "archived ".repeat(80));

        let api = server.mock(|when, then| {
            when.method(GET).path("/wayback/available").query_param("url", target);
            then.status(200).header("content-type", "application/json").body(
                json!({
                    "archived_snapshots": {
                        "closest": { "available": true, "url": snapshot_url, "timestamp": "20240115093000", "status": "200" }
                    }
                })
                .to_string(),
            );
        });
        let raw = server.mock(|when, then| {
            when.method(GET).path("/web/20240115093000id_/news.example/story");
            then.status(200).header("content-type", "text/html; charset=utf-8").body(&body);
        });

        let template = format!("{}/wayback/available?url={{url}}", server.base_url());
        let html = fetch_snapshot(&Fetcher::new().unwrap(), &template, &Url::parse(target).unwrap(), 500).await.unwrap();

        api.assert();
        raw.assert();
        assert!(html.contains("archived archived"));
    }
}
