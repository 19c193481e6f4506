// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! PageSpeed Insights adapter.
//!
//! Issues `runPagespeed` requests (performance category only) and hands the
//! raw JSON back to the caller. One adapter instance owns one
//! [`reqwest::Client`] and is shared by every request of a run.
//!
//! # Example
//!
//! ```ignore
//! use pagespeed_report_adapters::upstream::pagespeed::{PageSpeedAdapter, PageSpeedConfig};
//! use pagespeed_report_core::Strategy;
//!
//! let adapter = PageSpeedAdapter::new(PageSpeedConfig::default())?;
//! let response = adapter.run_pagespeed("https://example.com/", Strategy::Mobile).await?;
//! ```

use crate::MetricsSource;
use async_trait::async_trait;
use pagespeed_report_core::lcp::{analyze_lcp, LcpAnalysis};
use pagespeed_report_core::Strategy;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Public `runPagespeed` endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Default per-request timeout. Lighthouse runs routinely take 20-40 s.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that can occur during PageSpeed Insights requests.
#[derive(Debug, Error)]
pub enum PageSpeedAdapterError {
    /// Endpoint or page URL could not be used
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("PageSpeed API returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        message: String,
    },

    /// Response body was not JSON
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Response lacked data needed for analysis
    #[error(transparent)]
    Core(#[from] pagespeed_report_core::Error),
}

/// Result type for PageSpeed Insights operations.
pub type Result<T> = std::result::Result<T, PageSpeedAdapterError>;

/// Settings for [`PageSpeedAdapter`].
#[derive(Debug, Clone)]
pub struct PageSpeedConfig {
    /// `runPagespeed` endpoint.
    pub endpoint: String,
    /// Optional API key; unauthenticated requests get a much smaller quota.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for PageSpeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Adapter for the PageSpeed Insights API.
pub struct PageSpeedAdapter {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl PageSpeedAdapter {
    /// Create an adapter with its own HTTP client.
    pub fn new(config: PageSpeedConfig) -> Result<Self> {
        let client = super::build_client(config.timeout)?;
        Self::with_client(client, config)
    }

    /// Create an adapter that reuses an existing client.
    pub fn with_client(client: Client, config: PageSpeedConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| PageSpeedAdapterError::InvalidUrl(format!("{}: {}", config.endpoint, e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Whether requests carry an API key.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full request URL for a page and strategy.
    pub fn request_url(&self, url: &str, strategy: Strategy) -> Result<Url> {
        if url.trim().is_empty() {
            return Err(PageSpeedAdapterError::InvalidUrl("empty page URL".to_string()));
        }

        let mut request = self.endpoint.clone();
        {
            let mut query = request.query_pairs_mut();
            query
                .append_pair("url", url)
                .append_pair("strategy", strategy.as_str())
                .append_pair("category", "performance");
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        Ok(request)
    }

    /// Run Lighthouse for a page and return the raw response.
    pub async fn run_pagespeed(&self, url: &str, strategy: Strategy) -> Result<Value> {
        let request = self.request_url(url, strategy)?;
        debug!(url = %url, strategy = %strategy, "requesting PageSpeed Insights");

        let response = self.client.get(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PageSpeedAdapterError::Api {
                status: status.as_u16(),
                message: super::api_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| PageSpeedAdapterError::ParseError(e.to_string()))
    }

    /// Fetch a mobile run and analyse its Largest Contentful Paint.
    pub async fn analyze_lcp(&self, url: &str) -> Result<LcpAnalysis> {
        let data = self.run_pagespeed(url, Strategy::Mobile).await?;
        Ok(analyze_lcp(&data)?)
    }
}

#[async_trait]
impl MetricsSource for PageSpeedAdapter {
    async fn fetch(&self, url: &str, strategy: Strategy) -> Result<Value> {
        self.run_pagespeed(url, strategy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::canned;

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_request_url_without_key() {
        let adapter = PageSpeedAdapter::new(PageSpeedConfig::default()).unwrap();
        assert!(!adapter.has_api_key());

        let url = adapter
            .request_url("https://example.com/a?b=c", Strategy::Desktop)
            .unwrap();
        assert_eq!(url.host_str(), Some("www.googleapis.com"));
        assert_eq!(
            query_pairs(&url),
            vec![
                ("url".to_string(), "https://example.com/a?b=c".to_string()),
                ("strategy".to_string(), "desktop".to_string()),
                ("category".to_string(), "performance".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url_with_key() {
        let adapter = PageSpeedAdapter::new(PageSpeedConfig {
            api_key: Some("secret".to_string()),
            ..PageSpeedConfig::default()
        })
        .unwrap();

        let url = adapter.request_url("https://example.com/", Strategy::Mobile).unwrap();
        assert!(query_pairs(&url).contains(&("key".to_string(), "secret".to_string())));
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let adapter = PageSpeedAdapter::new(PageSpeedConfig {
            api_key: Some("  ".to_string()),
            ..PageSpeedConfig::default()
        })
        .unwrap();
        assert!(!adapter.has_api_key());
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = PageSpeedAdapter::new(PageSpeedConfig {
            endpoint: "not a url".to_string(),
            ..PageSpeedConfig::default()
        });
        assert!(matches!(result, Err(PageSpeedAdapterError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_page_url_rejected() {
        let adapter = PageSpeedAdapter::new(PageSpeedConfig::default()).unwrap();
        assert!(adapter.request_url(" ", Strategy::Mobile).is_err());
    }

    fn local_adapter(base: &str) -> PageSpeedAdapter {
        PageSpeedAdapter::new(PageSpeedConfig {
            endpoint: format!("{}/pagespeedonline/v5/runPagespeed", base),
            api_key: Some("k".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_quota_error_surfaces_api_message() {
        let (base, server) = canned::serve(vec![(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded for quota metric 'Queries per day'.","status":"RESOURCE_EXHAUSTED"}}"#,
        )])
        .await;

        let err = local_adapter(&base)
            .run_pagespeed("https://example.com/", Strategy::Mobile)
            .await
            .unwrap_err();

        match err {
            PageSpeedAdapterError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded for quota metric 'Queries per day'.");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /pagespeedonline/v5/runPagespeed?"));
        assert!(requests[0].contains("strategy=mobile"));
        assert!(requests[0].contains("key=k"));
    }

    #[tokio::test]
    async fn test_success_body_is_returned() {
        let (base, _server) = canned::serve(vec![(
            200,
            r#"{"id":"https://example.com/","lighthouseResult":{"categories":{"performance":{"score":0.42}}}}"#,
        )])
        .await;

        let data = local_adapter(&base)
            .fetch("https://example.com/", Strategy::Desktop)
            .await
            .unwrap();
        assert_eq!(data["lighthouseResult"]["categories"]["performance"]["score"], 0.42);
    }

    #[tokio::test]
    async fn test_non_json_success_is_parse_error() {
        let (base, _server) = canned::serve(vec![(200, "<html>oops</html>")]).await;

        let err = local_adapter(&base)
            .run_pagespeed("https://example.com/", Strategy::Mobile)
            .await
            .unwrap_err();
        assert!(matches!(err, PageSpeedAdapterError::ParseError(_)));
    }
}
