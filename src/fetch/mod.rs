//! HTTP fetch capability.
//!
//! Network access is funneled through the [`RemoteFetch`] trait so the
//! catalog resolver and api layers can be exercised against a stub.
//! [`HttpFetcher`] is the reqwest-backed implementation used by the binary.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::FetchError;

/// Header name/value pairs attached to a single request.
pub type HeaderPairs = [(String, String)];

#[async_trait]
pub trait RemoteFetch: Send + Sync {
    /// GET returning the response body as text.
    async fn get_text(&self, url: &str, headers: &HeaderPairs) -> Result<String, FetchError>;

    /// GET returning the response body decoded as JSON.
    async fn get_json(
        &self,
        url: &str,
        headers: &HeaderPairs,
    ) -> Result<serde_json::Value, FetchError>;

    /// POST with an empty body, returning the response decoded as JSON.
    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderPairs,
    ) -> Result<serde_json::Value, FetchError>;

    /// Lightweight existence check: HEAD request, no body transfer.
    ///
    /// Network errors count as a failed probe, never as a hard error.
    async fn head_ok(&self, url: &str, headers: &HeaderPairs) -> bool;
}

/// reqwest-backed [`RemoteFetch`] with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::request("<client>", e.to_string()))?;
        Ok(Self { client })
    }

    fn header_map(headers: &HeaderPairs) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => warn!("Skipping invalid header '{}'", name),
            }
        }
        map
    }

    async fn send_text(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<String, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::request(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::decode(url, e.to_string()))
    }
}

#[async_trait]
impl RemoteFetch for HttpFetcher {
    async fn get_text(&self, url: &str, headers: &HeaderPairs) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let request = self.client.get(url).headers(Self::header_map(headers));
        self.send_text(request, url).await
    }

    async fn get_json(
        &self,
        url: &str,
        headers: &HeaderPairs,
    ) -> Result<serde_json::Value, FetchError> {
        let text = self.get_text(url, headers).await?;
        serde_json::from_str(&text).map_err(|e| FetchError::decode(url, e.to_string()))
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &HeaderPairs,
    ) -> Result<serde_json::Value, FetchError> {
        debug!("POST {}", url);
        let request = self.client.post(url).headers(Self::header_map(headers));
        let text = self.send_text(request, url).await?;
        serde_json::from_str(&text).map_err(|e| FetchError::decode(url, e.to_string()))
    }

    async fn head_ok(&self, url: &str, headers: &HeaderPairs) -> bool {
        debug!("HEAD {}", url);
        match self
            .client
            .head(url)
            .headers(Self::header_map(headers))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Probe failed for {}: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_skips_invalid_names() {
        let headers = vec![
            ("User-Agent".to_string(), "test".to_string()),
            ("bad name\n".to_string(), "x".to_string()),
        ];
        let map = HttpFetcher::header_map(&headers);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("user-agent").unwrap(), "test");
    }
}
