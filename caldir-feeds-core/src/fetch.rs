//! Feed fetching.

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::error::{FeedsError, FeedsResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw response of a feed request.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub status: u16,
    pub body: String,
}

impl FetchedFeed {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of feed bodies.
///
/// Non-success statuses are returned as data, not as errors; the engine
/// decides what a failed feed means.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = FeedsResult<FetchedFeed>> + Send;
}

/// Fetches feeds over HTTP(S). `webcal://` is treated as `https://`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> FeedsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("caldir-feeds/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedsError::Http(e.to_string()))?;
        Ok(HttpFetcher { client })
    }
}

impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FeedsResult<FetchedFeed> {
        let url = normalize_feed_url(url)?;
        tracing::debug!(%url, "fetching feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedsError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FeedsError::Http(e.to_string()))?;

        Ok(FetchedFeed { status, body })
    }
}

/// Parse a feed URL, mapping the `webcal`/`webcals` schemes to `https`.
pub fn normalize_feed_url(raw: &str) -> FeedsResult<Url> {
    let trimmed = raw.trim();
    let rewritten = match trimmed.split_once("://") {
        Some((scheme, rest))
            if scheme.eq_ignore_ascii_case("webcal") || scheme.eq_ignore_ascii_case("webcals") =>
        {
            format!("https://{rest}")
        }
        _ => trimmed.to_string(),
    };

    let url = Url::parse(&rewritten)
        .map_err(|e| FeedsError::Config(format!("Invalid feed URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FeedsError::Config(format!(
            "Unsupported feed URL scheme '{}' in '{}'",
            other, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webcal_is_rewritten_to_https() {
        let url = normalize_feed_url("webcal://example.com/cal.ics").unwrap();
        assert_eq!(url.as_str(), "https://example.com/cal.ics");
    }

    #[test]
    fn test_http_urls_pass_through() {
        let url = normalize_feed_url(" http://example.com/a.ics ").unwrap();
        assert_eq!(url.as_str(), "http://example.com/a.ics");
    }

    #[test]
    fn test_other_schemes_are_rejected() {
        assert!(normalize_feed_url("ftp://example.com/a.ics").is_err());
        assert!(normalize_feed_url("not a url").is_err());
    }

    #[test]
    fn test_success_range() {
        let ok = FetchedFeed { status: 200, body: String::new() };
        let missing = FetchedFeed { status: 404, body: String::new() };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }
}
