// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Network side of PageSpeed Report.
//!
//! This crate provides the [`MetricsSource`] trait, its PageSpeed Insights
//! implementation, the CrUX History adapter and the [`BatchRunner`] that
//! drives a whole report generation.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod runner;
pub mod upstream;

pub use runner::BatchRunner;

use async_trait::async_trait;
use pagespeed_report_core::Strategy;
use serde_json::Value;
use upstream::pagespeed::PageSpeedAdapterError;

/// Anything that can produce a PageSpeed Insights response for a page.
///
/// Implemented by [`upstream::PageSpeedAdapter`]; the batch runner is
/// generic over it so tests can substitute canned responses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch the raw response for `url` under `strategy`.
    async fn fetch(&self, url: &str, strategy: Strategy) -> Result<Value, PageSpeedAdapterError>;
}
