// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! CrUX history timeseries.
//!
//! Turns a `queryHistoryRecord` response into per-metric series of p75
//! values and good / needs-improvement / poor shares, one point per
//! collection period. Older single-snapshot records (`histogram` plus
//! `percentile`) are accepted and produce a one-point series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Metrics available in CrUX history records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMetric {
    /// Largest Contentful Paint.
    Lcp,
    /// Cumulative Layout Shift.
    Cls,
    /// Interaction to Next Paint.
    Inp,
    /// First Contentful Paint.
    Fcp,
}

impl HistoryMetric {
    /// Every metric, in display order.
    pub const ALL: [HistoryMetric; 4] = [
        HistoryMetric::Lcp,
        HistoryMetric::Cls,
        HistoryMetric::Inp,
        HistoryMetric::Fcp,
    ];

    /// Key used by the CrUX API.
    pub fn api_key(&self) -> &'static str {
        match self {
            HistoryMetric::Lcp => "largest_contentful_paint",
            HistoryMetric::Cls => "cumulative_layout_shift",
            HistoryMetric::Inp => "interaction_to_next_paint",
            HistoryMetric::Fcp => "first_contentful_paint",
        }
    }

    /// Short label.
    pub fn label(&self) -> &'static str {
        match self {
            HistoryMetric::Lcp => "LCP",
            HistoryMetric::Cls => "CLS",
            HistoryMetric::Inp => "INP",
            HistoryMetric::Fcp => "FCP",
        }
    }

    /// Display unit of p75 values.
    pub fn unit(&self) -> &'static str {
        match self {
            HistoryMetric::Lcp | HistoryMetric::Fcp => "s",
            HistoryMetric::Inp => "ms",
            HistoryMetric::Cls => "",
        }
    }

    /// Convert a raw API p75 into display units.
    fn scale(&self, raw: f64) -> f64 {
        match self {
            HistoryMetric::Lcp | HistoryMetric::Fcp => round_to(raw / 1000.0, 2),
            HistoryMetric::Inp => raw.round(),
            HistoryMetric::Cls => raw,
        }
    }
}

impl fmt::Display for HistoryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for HistoryMetric {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "lcp" | "largest_contentful_paint" => Ok(HistoryMetric::Lcp),
            "cls" | "cumulative_layout_shift" => Ok(HistoryMetric::Cls),
            "inp" | "interaction_to_next_paint" => Ok(HistoryMetric::Inp),
            "fcp" | "first_contentful_paint" => Ok(HistoryMetric::Fcp),
            other => Err(crate::Error::invalid_input(format!(
                "unknown metric '{}'",
                other
            ))),
        }
    }
}

/// Calendar date as returned by the CrUX API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruxDate {
    /// Year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month; the API may omit it.
    #[serde(default = "first_day")]
    pub day: u32,
}

fn first_day() -> u32 {
    1
}

impl CruxDate {
    /// Convert to a [`NaiveDate`], if the date is valid.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day.max(1))
    }
}

impl fmt::Display for CruxDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// The 28-day window a history point aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPeriod {
    /// First day of the window.
    pub first_date: CruxDate,
    /// Last day of the window.
    pub last_date: CruxDate,
}

/// One point of a [`HistorySeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// 1-based position in the series.
    pub index: usize,
    /// Collection window, when the record lists one.
    pub period: Option<CollectionPeriod>,
    /// Share of good experiences, percent.
    pub good: Option<f64>,
    /// Share of needs-improvement experiences, percent.
    pub needs_improvement: Option<f64>,
    /// Share of poor experiences, percent.
    pub poor: Option<f64>,
    /// 75th percentile in display units.
    pub p75: Option<f64>,
}

impl HistoryPoint {
    /// Human readable label: the tracked window, or the index.
    pub fn label(&self) -> String {
        match &self.period {
            Some(p) => format!("{} to {}", p.first_date, p.last_date),
            None => self.index.to_string(),
        }
    }
}

/// Historical values of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    /// Metric the series describes.
    pub metric: HistoryMetric,
    /// Points, oldest first.
    pub points: Vec<HistoryPoint>,
}

impl HistorySeries {
    /// Months covered from the first window's start to the last window's end.
    ///
    /// `None` unless at least two points carry collection periods.
    pub fn month_span(&self) -> Option<u32> {
        if self.points.len() < 2 {
            return None;
        }
        let first = self.points.first()?.period?.first_date;
        let last = self.points.last()?.period?.last_date;
        let months = (last.year - first.year) * 12 + (last.month as i32 - first.month as i32) + 1;
        Some(months.max(1) as u32)
    }

    /// Chart-style title, e.g. `LCP Historical Values (6 months)`.
    pub fn title(&self) -> String {
        match self.month_span() {
            Some(m) => format!(
                "{} Historical Values ({} month{})",
                self.metric.label(),
                m,
                if m > 1 { "s" } else { "" }
            ),
            None => format!(
                "{} Historical Values ({} points)",
                self.metric.label(),
                self.points.len()
            ),
        }
    }

    /// Most recent point.
    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Numbers in history records may arrive as JSON numbers or strings.
fn loose_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}

fn percent(density: Option<&Value>) -> Option<f64> {
    density.and_then(loose_f64).map(|d| round_to(d * 100.0, 1))
}

/// Unwrap `{ "record": ... }` responses.
fn record_of(value: &Value) -> &Value {
    value.get("record").unwrap_or(value)
}

/// Pick the metrics map, preferring page-level data.
fn metrics_of(record: &Value) -> Option<&Value> {
    if let Some(m) = record.get("urlMetrics") {
        return Some(m);
    }
    let metrics = record.get("metrics")?;
    metrics
        .get("url")
        .or_else(|| metrics.get("origin"))
        .or(Some(metrics))
}

/// Collection periods listed by the record.
pub fn collection_periods(value: &Value) -> Vec<CollectionPeriod> {
    record_of(value)
        .get("collectionPeriods")
        .and_then(|p| serde_json::from_value::<Vec<CollectionPeriod>>(p.clone()).ok())
        .unwrap_or_default()
}

fn timeseries_points(
    metric: HistoryMetric,
    metric_obj: &Value,
    periods: &[CollectionPeriod],
) -> Option<Vec<HistoryPoint>> {
    let hist = metric_obj.get("histogramTimeseries")?.as_array()?;
    let p75s = metric_obj
        .get("percentilesTimeseries")?
        .get("p75s")?
        .as_array()?;
    if hist.len() != 3 || periods.is_empty() {
        return None;
    }

    let densities: Vec<&Vec<Value>> = hist
        .iter()
        .map(|bin| bin.get("densities").and_then(|d| d.as_array()))
        .collect::<Option<_>>()?;

    let len = densities
        .iter()
        .map(|d| d.len())
        .chain([p75s.len(), periods.len()])
        .min()
        .unwrap_or(0);

    Some(
        (0..len)
            .map(|i| HistoryPoint {
                index: i + 1,
                period: Some(periods[i]),
                good: percent(densities[0].get(i)),
                needs_improvement: percent(densities[1].get(i)),
                poor: percent(densities[2].get(i)),
                p75: loose_f64(&p75s[i]).map(|v| metric.scale(v)),
            })
            .collect(),
    )
}

fn snapshot_point(metric: HistoryMetric, metric_obj: &Value) -> HistoryPoint {
    let bin = |i: usize| {
        metric_obj
            .get("histogram")
            .and_then(|h| h.get(i))
            .and_then(|b| b.get("density"))
    };
    let p75 = metric_obj
        .get("percentiles")
        .and_then(|p| p.get("p75"))
        .or_else(|| metric_obj.get("percentile"));

    HistoryPoint {
        index: 1,
        period: None,
        good: percent(bin(0)),
        needs_improvement: percent(bin(1)),
        poor: percent(bin(2)),
        p75: p75.and_then(loose_f64).map(|v| metric.scale(v)),
    }
}

/// Build the series for one metric.
///
/// Returns `None` when the record has no p75 value for the metric.
pub fn history_series(value: &Value, metric: HistoryMetric) -> Option<HistorySeries> {
    let record = record_of(value);
    let metric_obj = metrics_of(record)?.get(metric.api_key())?;
    let periods = collection_periods(record);

    let points = timeseries_points(metric, metric_obj, &periods)
        .unwrap_or_else(|| vec![snapshot_point(metric, metric_obj)]);

    if points.iter().all(|p| p.p75.is_none()) {
        return None;
    }

    Some(HistorySeries { metric, points })
}

/// Series for every metric present in the record.
pub fn all_series(value: &Value) -> Vec<HistorySeries> {
    HistoryMetric::ALL
        .iter()
        .filter_map(|m| history_series(value, *m))
        .collect()
}
