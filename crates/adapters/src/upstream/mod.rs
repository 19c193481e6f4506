// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Upstream API adapters.
//!
//! Thin consumption layers over the two Google APIs the report is built
//! from:
//!
//! - **PageSpeed Insights**: Lighthouse lab data plus CrUX field data per page
//! - **CrUX History**: monthly field-data timeseries per page or origin
//!
//! Responses are returned as `serde_json::Value`; normalization lives in
//! `pagespeed_report_core`, because the response shapes vary too much to
//! model as fixed structs.
//!
//! # Example
//!
//! ```ignore
//! use pagespeed_report_adapters::upstream::prelude::*;
//!
//! let psi = PageSpeedAdapter::new(PageSpeedConfig::default())?;
//! let crux = CruxAdapter::new(CruxConfig::new(api_key))?;
//! ```

pub mod crux;
pub mod pagespeed;

use reqwest::Client;
use std::time::Duration;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::crux::{CruxAdapter, CruxAdapterError, CruxConfig, CruxHistoryRecord};
    pub use super::pagespeed::{PageSpeedAdapter, PageSpeedAdapterError, PageSpeedConfig};
}

pub use crux::CruxAdapter;
pub use pagespeed::PageSpeedAdapter;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("pagespeed-report/", env!("CARGO_PKG_VERSION"));

/// Longest API error body echoed back in error messages.
const MAX_ERROR_BODY: usize = 200;

/// Build the HTTP client shared by all requests of a run.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Best-effort message from a Google API error body.
///
/// Google APIs answer errors with `{"error": {"message": ...}}`; anything
/// else is echoed, truncated.
pub(crate) fn api_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_from_google_error() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for quota metric","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_error_message(body), "Quota exceeded for quota metric");
    }

    #[test]
    fn test_api_error_message_plain_text() {
        assert_eq!(api_error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(api_error_message(""), "empty response body");

        let long = "x".repeat(500);
        let msg = api_error_message(&long);
        assert_eq!(msg.len(), MAX_ERROR_BODY + 3);
        assert!(msg.ends_with("..."));
    }
}
