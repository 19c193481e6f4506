// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for PageSpeed Report.
//!
//! This crate holds everything that does not touch the network: the per-URL
//! result record, the normalizers that pull web-vital values out of
//! PageSpeed Insights and CrUX responses, the results-table sort order and
//! the lifecycle record of a single report generation.
//!
//! # Modules
//!
//! - [`types`] - Strategies, metric values and the per-URL [`ReportRow`]
//! - [`normalize`] - PageSpeed Insights response normalization
//! - [`history`] - CrUX history timeseries
//! - [`lcp`] - Largest Contentful Paint analysis
//! - [`sort`] - Results table columns and ordering
//! - [`run`] - Progress of one report generation
//! - [`urls`] - URL list parsing

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod history;
pub mod lcp;
pub mod normalize;
pub mod run;
pub mod sort;
pub mod types;
pub mod urls;

pub use error::{Error, Result};
pub use run::{ReportRun, RunStatus};
pub use types::{DataSource, FormFactor, MetricValue, ReportRow, Strategy, StrategyMetrics};
