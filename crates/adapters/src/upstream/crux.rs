// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! CrUX History adapter.
//!
//! Queries `records:queryHistoryRecord` for a page. When CrUX has no
//! page-level record the query is repeated for the page's origin, and the
//! returned [`CruxHistoryRecord`] says which one answered.

use pagespeed_report_core::history::HistoryMetric;
use pagespeed_report_core::{DataSource, FormFactor};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Public history endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://chromeuxreport.googleapis.com/v1/records:queryHistoryRecord";

/// Errors that can occur during CrUX History requests.
#[derive(Debug, Error)]
pub enum CruxAdapterError {
    /// The CrUX API does not accept anonymous requests
    #[error("CrUX API key is required")]
    MissingApiKey,

    /// Endpoint or page URL could not be used
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Neither the page nor its origin has a record
    #[error("No CrUX history for {0} or its origin")]
    NotFound(String),

    /// Non-success status from the API
    #[error("CrUX API returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        message: String,
    },

    /// Response body was not JSON
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for CrUX operations.
pub type Result<T> = std::result::Result<T, CruxAdapterError>;

/// Settings for [`CruxAdapter`].
#[derive(Debug, Clone)]
pub struct CruxConfig {
    /// History endpoint.
    pub endpoint: String,
    /// API key.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl CruxConfig {
    /// Config for the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A history record and the level it was found at.
#[derive(Debug, Clone)]
pub struct CruxHistoryRecord {
    /// `Url` for page-level data, `Origin` after falling back.
    pub scope: DataSource,
    /// The URL or origin that was queried successfully.
    pub queried: String,
    /// Form factor requested.
    pub form_factor: FormFactor,
    /// Raw API response.
    pub record: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'a str>,
    form_factor: FormFactor,
    metrics: Vec<&'static str>,
}

/// `scheme://host[:port]` of a page URL.
pub fn origin_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| CruxAdapterError::InvalidUrl(format!("{}: {}", url, e)))?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(CruxAdapterError::InvalidUrl(format!("{}: URL has no origin", url)));
    }
    Ok(origin.ascii_serialization())
}

/// Adapter for the CrUX History API.
pub struct CruxAdapter {
    client: Client,
    endpoint: Url,
}

impl CruxAdapter {
    /// Create an adapter with its own HTTP client.
    pub fn new(config: CruxConfig) -> Result<Self> {
        let client = super::build_client(config.timeout)?;
        Self::with_client(client, config)
    }

    /// Create an adapter that reuses an existing client.
    pub fn with_client(client: Client, config: CruxConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CruxAdapterError::MissingApiKey);
        }
        let mut endpoint = Url::parse(&config.endpoint)
            .map_err(|e| CruxAdapterError::InvalidUrl(format!("{}: {}", config.endpoint, e)))?;
        endpoint.query_pairs_mut().append_pair("key", &config.api_key);

        Ok(Self { client, endpoint })
    }

    fn body<'a>(
        page: Option<&'a str>,
        origin: Option<&'a str>,
        form_factor: FormFactor,
    ) -> HistoryQuery<'a> {
        HistoryQuery {
            url: page,
            origin,
            form_factor,
            metrics: HistoryMetric::ALL.iter().map(|m| m.api_key()).collect(),
        }
    }

    /// POST one query. `Ok(None)` means the API has no record for it.
    async fn post(&self, query: &HistoryQuery<'_>) -> Result<Option<Value>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CruxAdapterError::Api {
                status: status.as_u16(),
                message: super::api_error_message(&body),
            });
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| CruxAdapterError::ParseError(e.to_string()))
    }

    /// History for a page, falling back to its origin.
    pub async fn query_history(
        &self,
        url: &str,
        form_factor: FormFactor,
    ) -> Result<CruxHistoryRecord> {
        let origin = origin_of(url)?;

        debug!(url = %url, form_factor = %form_factor, "querying CrUX history");
        if let Some(record) = self.post(&Self::body(Some(url), None, form_factor)).await? {
            return Ok(CruxHistoryRecord {
                scope: DataSource::Url,
                queried: url.to_string(),
                form_factor,
                record,
            });
        }

        info!(url = %url, origin = %origin, "no page-level CrUX history, trying origin");
        match self.post(&Self::body(None, Some(&origin), form_factor)).await? {
            Some(record) => Ok(CruxHistoryRecord {
                scope: DataSource::Origin,
                queried: origin,
                form_factor,
                record,
            }),
            None => Err(CruxAdapterError::NotFound(url.to_string())),
        }
    }
}
