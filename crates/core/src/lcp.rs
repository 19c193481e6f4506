// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Largest Contentful Paint analysis from a Lighthouse run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lighthouse audit carrying the lab LCP value.
pub const LCP_AUDIT: &str = "largest-contentful-paint";

/// Lighthouse audit listing the LCP element and its phases.
pub const LCP_ELEMENT_AUDIT: &str = "largest-contentful-paint-element";

/// Upper bound of a good LCP, seconds.
pub const GOOD_THRESHOLD_SECS: f64 = 2.5;

/// Upper bound of a needs-improvement LCP, seconds.
pub const POOR_THRESHOLD_SECS: f64 = 4.0;

/// Core Web Vitals rating of an LCP value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LcpRating {
    /// At most 2.5 s.
    Good,
    /// At most 4.0 s.
    NeedsImprovement,
    /// Over 4.0 s.
    Poor,
}

impl LcpRating {
    /// Rate an LCP value given in seconds.
    pub fn from_seconds(secs: f64) -> Self {
        if secs <= GOOD_THRESHOLD_SECS {
            LcpRating::Good
        } else if secs <= POOR_THRESHOLD_SECS {
            LcpRating::NeedsImprovement
        } else {
            LcpRating::Poor
        }
    }
}

impl fmt::Display for LcpRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LcpRating::Good => "Good",
            LcpRating::NeedsImprovement => "Needs Improvement",
            LcpRating::Poor => "Poor",
        })
    }
}

/// A DOM node Lighthouse identified as the LCP element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcpElement {
    /// Short node description, `Unknown` when absent.
    pub node_label: String,
    /// Rendered size in px, when reported.
    pub size: Option<f64>,
    /// HTML snippet of the node.
    pub snippet: Option<String>,
}

/// Time spent in one LCP phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcpPhase {
    /// Phase name (TTFB, Load Delay, Load Time, Render Delay).
    pub phase: String,
    /// Duration, milliseconds.
    pub timing_ms: f64,
    /// Share of the summed phases, percent.
    pub share: f64,
}

/// Result of analysing a page's LCP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcpAnalysis {
    /// Lab LCP, seconds.
    pub lcp_seconds: f64,
    /// Rating of `lcp_seconds`.
    pub rating: LcpRating,
    /// Candidate elements.
    pub elements: Vec<LcpElement>,
    /// Phase breakdown, empty when Lighthouse did not report one.
    pub breakdown: Vec<LcpPhase>,
}

fn audit<'a>(data: &'a Value, id: &str) -> Option<&'a Value> {
    data.get("lighthouseResult")?.get("audits")?.get(id)
}

/// Flatten `details.items`, descending into nested `{ "items": [...] }` tables.
fn detail_items(audit: &Value) -> Vec<&Value> {
    let Some(items) = audit
        .get("details")
        .and_then(|d| d.get("items"))
        .and_then(|i| i.as_array())
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for item in items {
        match item.get("items").and_then(|i| i.as_array()) {
            Some(nested) => out.extend(nested.iter()),
            None => out.push(item),
        }
    }
    out
}

fn parse_element(item: &Value) -> Option<LcpElement> {
    let node = item.get("node")?;
    Some(LcpElement {
        node_label: node
            .get("nodeLabel")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string(),
        size: item.get("size").and_then(|v| v.as_f64()),
        snippet: node
            .get("snippet")
            .and_then(|v| v.as_str())
            .map(String::from),
    })
}

fn parse_breakdown(items: &[&Value]) -> Vec<LcpPhase> {
    let phases: Vec<(String, f64)> = items
        .iter()
        .filter_map(|item| {
            let phase = item.get("phase")?.as_str()?.to_string();
            let timing = item.get("timing")?.as_f64()?;
            Some((phase, timing))
        })
        .collect();

    let total: f64 = phases.iter().map(|(_, t)| t).sum();
    phases
        .into_iter()
        .map(|(phase, timing_ms)| LcpPhase {
            share: if total > 0.0 {
                (timing_ms / total * 1000.0).round() / 10.0
            } else {
                0.0
            },
            phase,
            timing_ms,
        })
        .collect()
}

/// Extract LCP details from a PageSpeed Insights response.
pub fn analyze_lcp(data: &Value) -> crate::Result<LcpAnalysis> {
    let numeric = audit(data, LCP_AUDIT)
        .and_then(|a| a.get("numericValue"))
        .and_then(|v| v.as_f64())
        .ok_or_else(|| {
            crate::Error::missing_data(format!("audit '{}' has no numericValue", LCP_AUDIT))
        })?;
    let lcp_seconds = numeric / 1000.0;

    let items = audit(data, LCP_ELEMENT_AUDIT)
        .map(detail_items)
        .unwrap_or_default();

    Ok(LcpAnalysis {
        lcp_seconds,
        rating: LcpRating::from_seconds(lcp_seconds),
        elements: items.iter().filter_map(|i| parse_element(i)).collect(),
        breakdown: parse_breakdown(&items),
    })
}
