// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! PageSpeed Insights response normalization.
//!
//! The `runPagespeed` response carries field data in up to three places,
//! each of which may be absent or hold an empty `metrics` object. The
//! normalizer walks them from most to least specific and records which one
//! it used as the row's [`DataSource`].
//!
//! # Example
//!
//! ```
//! use pagespeed_report_core::normalize::strategy_metrics;
//! use pagespeed_report_core::{DataSource, Strategy};
//!
//! let response = serde_json::json!({});
//! let metrics = strategy_metrics(&response, Strategy::Mobile);
//! assert_eq!(metrics.source, DataSource::None);
//! assert_eq!(metrics.lcp.to_string(), "N/A");
//! ```

use crate::types::{DataSource, MetricValue, Strategy, StrategyMetrics};
use serde_json::Value;
use std::cmp::Ordering;

/// CrUX metric keys inside an experience block.
pub mod keys {
    /// First Contentful Paint percentile, ms.
    pub const FCP: &str = "FIRST_CONTENTFUL_PAINT_MS";
    /// Largest Contentful Paint percentile, ms.
    pub const LCP: &str = "LARGEST_CONTENTFUL_PAINT_MS";
    /// Cumulative Layout Shift percentile, scaled by 100.
    pub const CLS: &str = "CUMULATIVE_LAYOUT_SHIFT_SCORE";
    /// Interaction to Next Paint percentile, ms.
    pub const INP: &str = "INTERACTION_TO_NEXT_PAINT";
}

/// Audit score below which an opportunity is reported.
pub const RECOMMENDATION_SCORE_THRESHOLD: f64 = 0.9;

/// Field metrics extracted from one experience block.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetrics {
    /// First Contentful Paint, seconds.
    pub fcp: MetricValue,
    /// Largest Contentful Paint, seconds.
    pub lcp: MetricValue,
    /// Cumulative Layout Shift.
    pub cls: MetricValue,
    /// Interaction to Next Paint, milliseconds.
    pub inp: MetricValue,
    /// Which block the values were read from.
    pub source: DataSource,
}

fn non_empty_metrics(experience: Option<&Value>) -> bool {
    experience
        .and_then(|e| e.get("metrics"))
        .and_then(|m| m.as_object())
        .map(|m| !m.is_empty())
        .unwrap_or(false)
}

/// Choose the experience block to read field data from.
///
/// Returns `None` for the block when nothing usable exists.
pub fn select_experience<'a>(
    data: &'a Value,
    strategy: Strategy,
) -> (Option<&'a Value>, DataSource) {
    let strategy_exp = data.get(format!("{}Experience", strategy.as_str()));
    if non_empty_metrics(strategy_exp) {
        return (strategy_exp, DataSource::Url);
    }

    let loading = data.get("loadingExperience");
    let origin = data.get("originLoadingExperience");

    if non_empty_metrics(loading) {
        let loading_id = loading.and_then(|l| l.get("id"));
        let origin_id = origin.and_then(|o| o.get("id"));
        // PSI echoes the origin's id in loadingExperience when it had no page data.
        let has_id = data
            .get("id")
            .is_some_and(|id| !id.is_null() && id.as_str() != Some(""));
        let is_origin = has_id
            && origin.is_some()
            && origin_id == loading_id;
        let source = if is_origin {
            DataSource::Origin
        } else {
            DataSource::Url
        };
        return (loading, source);
    }

    if non_empty_metrics(origin) {
        return (origin, DataSource::Origin);
    }

    (None, DataSource::None)
}

fn percentile(experience: Option<&Value>, key: &str) -> Option<f64> {
    experience?
        .get("metrics")?
        .get(key)?
        .get("percentile")?
        .as_f64()
}

/// Round milliseconds to the nearest 100 ms and convert to seconds.
fn ms_to_rounded_seconds(ms: Option<f64>) -> MetricValue {
    ms.map(|v| (v / 100.0).round() * 100.0 / 1000.0).into()
}

/// Extract the four field metrics for a strategy.
pub fn crux_metrics(data: &Value, strategy: Strategy) -> FieldMetrics {
    let (experience, source) = select_experience(data, strategy);

    FieldMetrics {
        fcp: ms_to_rounded_seconds(percentile(experience, keys::FCP)),
        lcp: ms_to_rounded_seconds(percentile(experience, keys::LCP)),
        cls: percentile(experience, keys::CLS).map(|v| v / 100.0).into(),
        inp: percentile(experience, keys::INP).into(),
        source,
    }
}

/// Lighthouse performance score scaled to 0-100.
pub fn lighthouse_performance(data: &Value) -> MetricValue {
    data.get("lighthouseResult")
        .and_then(|l| l.get("categories"))
        .and_then(|c| c.get("performance"))
        .and_then(|p| p.get("score"))
        .and_then(|s| s.as_f64())
        .map(|s| (s * 100.0).round())
        .into()
}

/// Titles of failing Lighthouse opportunities, biggest savings first.
pub fn recommendations(data: &Value) -> Vec<String> {
    let Some(audits) = data
        .get("lighthouseResult")
        .and_then(|l| l.get("audits"))
        .and_then(|a| a.as_object())
    else {
        return Vec::new();
    };

    let mut found: Vec<(f64, String)> = audits
        .values()
        .filter(|audit| {
            audit
                .get("details")
                .and_then(|d| d.get("type"))
                .and_then(|t| t.as_str())
                == Some("opportunity")
        })
        .filter(|audit| {
            audit
                .get("score")
                .and_then(|s| s.as_f64())
                .map(|s| s < RECOMMENDATION_SCORE_THRESHOLD)
                .unwrap_or(false)
        })
        .filter_map(|audit| {
            let title = audit.get("title")?.as_str()?.to_string();
            let savings = audit
                .get("details")
                .and_then(|d| d.get("overallSavingsMs"))
                .and_then(|s| s.as_f64())
                .unwrap_or(0.0);
            Some((savings, title))
        })
        .collect();

    found.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });

    found.into_iter().map(|(_, title)| title).collect()
}

/// Normalize one PSI response into [`StrategyMetrics`].
pub fn strategy_metrics(data: &Value, strategy: Strategy) -> StrategyMetrics {
    let field = crux_metrics(data, strategy);

    StrategyMetrics {
        performance: lighthouse_performance(data),
        fcp: field.fcp,
        lcp: field.lcp,
        cls: field.cls,
        inp: field.inp,
        source: field.source,
        recommendations: recommendations(data),
    }
}
