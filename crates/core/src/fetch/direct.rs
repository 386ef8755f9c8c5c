//! Direct fetches of the target URL under different client identities.

use std::fmt;
use std::str::FromStr;

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, HeaderMap, HeaderName, HeaderValue, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use serde::Serialize;
use url::Url;

use super::Fetcher;
use crate::Result;

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
pub const CRAWLER_USER_AGENT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// Client identity presented on a direct fetch.
///
/// Ordered from most to least elaborate header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderProfile {
    /// Full desktop Chrome navigation headers
    Browser,
    /// Search-engine crawler; many sites serve crawlers the full article
    Crawler,
    /// Minimal mobile Safari headers
    Mobile,
}

impl HeaderProfile {
    pub const ALL: [HeaderProfile; 3] = [HeaderProfile::Browser, HeaderProfile::Crawler, HeaderProfile::Mobile];

    pub fn name(self) -> &'static str {
        match self {
            HeaderProfile::Browser => "browser",
            HeaderProfile::Crawler => "crawler",
            HeaderProfile::Mobile => "mobile",
        }
    }

    pub fn user_agent(self) -> &'static str {
        match self {
            HeaderProfile::Browser => BROWSER_USER_AGENT,
            HeaderProfile::Crawler => CRAWLER_USER_AGENT,
            HeaderProfile::Mobile => MOBILE_USER_AGENT,
        }
    }

    /// Request headers for fetching `target` under this identity.
    ///
    /// `Accept-Encoding` is left to the client so responses are decoded
    /// transparently.
    pub fn headers(self, target: &Url) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.user_agent()));
        headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

        if self == HeaderProfile::Browser {
            if let Ok(origin) = HeaderValue::from_str(&target.origin().ascii_serialization()) {
                headers.insert(REFERER, origin);
            }
            headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
            headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("document"));
            headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("navigate"));
            headers.insert(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("cross-site"));
            headers.insert(HeaderName::from_static("sec-fetch-user"), HeaderValue::from_static("?1"));
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
            headers.insert(DNT, HeaderValue::from_static("1"));
        }

        headers
    }
}

impl fmt::Display for HeaderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HeaderProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HeaderProfile::ALL
            .into_iter()
            .find(|profile| profile.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown header profile '{s}' (expected browser, crawler or mobile)"))
    }
}

/// Fetch the target page itself and accept it as HTML of at least `min_len`
/// characters.
pub async fn fetch_direct(fetcher: &Fetcher, profile: HeaderProfile, target: &Url, min_len: usize) -> Result<String> {
    fetcher.get_html(target.clone(), profile.headers(target), min_len).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReadModeError;
    use httpmock::prelude::*;

    #[test]
    fn test_browser_headers() {
        let target = Url::parse("https://news.example/2024/story").unwrap();
        let headers = HeaderProfile::Browser.headers(&target);

        assert_eq!(headers[USER_AGENT], BROWSER_USER_AGENT);
        assert_eq!(headers[REFERER], "https://news.example");
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert_eq!(headers[DNT], "1");
        assert!(!headers.contains_key(reqwest::header::ACCEPT_ENCODING));
    }

    #[test]
    fn test_lighter_profiles() {
        let target = Url::parse("https://news.example/story").unwrap();

        let crawler = HeaderProfile::Crawler.headers(&target);
        assert!(crawler[USER_AGENT].to_str().unwrap().contains("Googlebot"));
        assert!(!crawler.contains_key(REFERER));

        let mobile = HeaderProfile::Mobile.headers(&target);
        assert!(mobile[USER_AGENT].to_str().unwrap().contains("iPhone"));
        assert!(mobile.len() < HeaderProfile::Browser.headers(&target).len());
    }

    #[test]
    fn test_profile_names() {
        assert_eq!("Crawler".parse::<HeaderProfile>(), Ok(HeaderProfile::Crawler));
        assert_eq!(HeaderProfile::Mobile.to_string(), "mobile");
        assert!("desktop".parse::<HeaderProfile>().is_err());
    }

    #[tokio::test]
    async fn test_fetch_direct_sends_profile() {
        let server = MockServer::start();
        let body = format!("<html><body><p>{}</p></body></html>", "text ".repeat(40));
        let mock = server.mock(|when, then| {
            when.method(GET).path("/story").header("user-agent", CRAWLER_USER_AGENT);
            then.status(200).header("content-type", "text/html; charset=utf-8").body(&body);
        });

        let target = Url::parse(&server.url("/story")).unwrap();
        let html = fetch_direct(&Fetcher::new().unwrap(), HeaderProfile::Crawler, &target, 100).await.unwrap();

        mock.assert();
        assert!(html.contains("text text"));
    }

    #[tokio::test]
    async fn test_fetch_direct_rejects_images() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/photo");
            then.status(200).header("content-type", "image/png").body("x".repeat(400));
        });

        let target = Url::parse(&server.url("/photo")).unwrap();
        let result = fetch_direct(&Fetcher::new().unwrap(), HeaderProfile::Browser, &target, 100).await;

        assert!(matches!(result, Err(ReadModeError::UnsupportedContentType(_))));
    }
}
