// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-URL result record and the value types it is built from.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Device strategy requested from PageSpeed Insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Mobile emulation.
    Mobile,
    /// Desktop emulation.
    Desktop,
}

impl Strategy {
    /// Every strategy, in fetch order.
    pub const ALL: [Strategy; 2] = [Strategy::Mobile, Strategy::Desktop];

    /// Value of the `strategy` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form factor understood by the CrUX API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormFactor {
    /// Phones.
    Phone,
    /// Desktop browsers.
    Desktop,
}

impl FormFactor {
    /// Value of the `formFactor` request field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormFactor::Phone => "PHONE",
            FormFactor::Desktop => "DESKTOP",
        }
    }
}

impl From<Strategy> for FormFactor {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Mobile => FormFactor::Phone,
            Strategy::Desktop => FormFactor::Desktop,
        }
    }
}

impl fmt::Display for FormFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where field data for a page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Page-level real-user data.
    Url,
    /// Site-level (origin) real-user data.
    Origin,
    /// No real-user data available.
    None,
}

impl DataSource {
    /// Short label used in tables and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Url => "url",
            DataSource::Origin => "origin",
            DataSource::None => "none",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric metric that the API may not have reported.
///
/// Serialized as a plain number, or as the string `"N/A"` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MetricValue {
    /// Reported value.
    Value(f64),
    /// Not reported.
    #[default]
    NotAvailable,
}

impl MetricValue {
    /// Label used wherever a value is missing.
    pub const NOT_AVAILABLE: &'static str = "N/A";

    /// Numeric value, if present.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(*v),
            MetricValue::NotAvailable => None,
        }
    }

    /// Format with a fixed number of decimals, `N/A` when absent.
    pub fn format_fixed(&self, decimals: usize) -> String {
        match self {
            MetricValue::Value(v) => format!("{:.*}", decimals, v),
            MetricValue::NotAvailable => Self::NOT_AVAILABLE.to_string(),
        }
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => MetricValue::Value(v),
            _ => MetricValue::NotAvailable,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(v) => write!(f, "{}", v),
            MetricValue::NotAvailable => f.write_str(Self::NOT_AVAILABLE),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(v) => serializer.serialize_f64(*v),
            MetricValue::NotAvailable => serializer.serialize_str(Self::NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
            Null(()),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(v) => MetricValue::Value(v),
            Repr::Text(s) => s.parse::<f64>().ok().into(),
            Repr::Null(()) => MetricValue::NotAvailable,
        })
    }
}

/// Individual fields of [`StrategyMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    /// Lighthouse performance score (0-100).
    Performance,
    /// First Contentful Paint (s).
    Fcp,
    /// Largest Contentful Paint (s).
    Lcp,
    /// Cumulative Layout Shift.
    Cls,
    /// Interaction to Next Paint (ms).
    Inp,
    /// Field data provenance.
    Source,
}

impl MetricField {
    /// Every field, in table order.
    pub const ALL: [MetricField; 6] = [
        MetricField::Performance,
        MetricField::Fcp,
        MetricField::Lcp,
        MetricField::Cls,
        MetricField::Inp,
        MetricField::Source,
    ];

    /// Key suffix used in column names (`mobile_fcp`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            MetricField::Performance => "lighthouse",
            MetricField::Fcp => "fcp",
            MetricField::Lcp => "lcp",
            MetricField::Cls => "cls",
            MetricField::Inp => "inp",
            MetricField::Source => "source",
        }
    }
}

/// Metrics collected for one URL under one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    /// Lighthouse performance score, 0-100.
    pub performance: MetricValue,
    /// First Contentful Paint, seconds.
    pub fcp: MetricValue,
    /// Largest Contentful Paint, seconds.
    pub lcp: MetricValue,
    /// Cumulative Layout Shift.
    pub cls: MetricValue,
    /// Interaction to Next Paint, milliseconds.
    pub inp: MetricValue,
    /// Provenance of the field metrics above.
    pub source: DataSource,
    /// Lighthouse improvement opportunities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl Default for StrategyMetrics {
    fn default() -> Self {
        Self {
            performance: MetricValue::NotAvailable,
            fcp: MetricValue::NotAvailable,
            lcp: MetricValue::NotAvailable,
            cls: MetricValue::NotAvailable,
            inp: MetricValue::NotAvailable,
            source: DataSource::None,
            recommendations: Vec::new(),
        }
    }
}

impl StrategyMetrics {
    /// Numeric value of a field; `None` for the source column or missing data.
    pub fn value(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::Performance => self.performance.as_f64(),
            MetricField::Fcp => self.fcp.as_f64(),
            MetricField::Lcp => self.lcp.as_f64(),
            MetricField::Cls => self.cls.as_f64(),
            MetricField::Inp => self.inp.as_f64(),
            MetricField::Source => None,
        }
    }

    /// Display text of a field as it appears in tables.
    pub fn display(&self, field: MetricField) -> String {
        match field {
            MetricField::Performance => self.performance.format_fixed(0),
            MetricField::Fcp => self.fcp.format_fixed(2),
            MetricField::Lcp => self.lcp.format_fixed(2),
            MetricField::Cls => self.cls.to_string(),
            MetricField::Inp => self.inp.format_fixed(0),
            MetricField::Source => self.source.to_string(),
        }
    }
}

/// Result record for one URL of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Page that was analysed.
    pub url: String,
    /// Mobile metrics, when the mobile request succeeded.
    pub mobile: Option<StrategyMetrics>,
    /// Desktop metrics, when the desktop request succeeded.
    pub desktop: Option<StrategyMetrics>,
    /// Failure description for any request that did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportRow {
    /// Create an empty row for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mobile: None,
            desktop: None,
            error: None,
        }
    }

    /// Create a row that carries only an error.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(url)
        }
    }

    /// Metrics for a strategy.
    pub fn metrics(&self, strategy: Strategy) -> Option<&StrategyMetrics> {
        match strategy {
            Strategy::Mobile => self.mobile.as_ref(),
            Strategy::Desktop => self.desktop.as_ref(),
        }
    }

    /// Store metrics for a strategy.
    pub fn set_metrics(&mut self, strategy: Strategy, metrics: StrategyMetrics) {
        match strategy {
            Strategy::Mobile => self.mobile = Some(metrics),
            Strategy::Desktop => self.desktop = Some(metrics),
        }
    }

    /// Append an error message, joining multiple failures with `"; "`.
    pub fn push_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.error = Some(match self.error.take() {
            Some(existing) => format!("{}; {}", existing, error),
            None => error,
        });
    }

    /// Whether every request for this URL succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_value_serializes_na_as_string() {
        let json = serde_json::to_value(MetricValue::NotAvailable).unwrap();
        assert_eq!(json, serde_json::json!("N/A"));

        let json = serde_json::to_value(MetricValue::Value(1.2)).unwrap();
        assert_eq!(json, serde_json::json!(1.2));
    }

    #[test]
    fn test_metric_value_deserializes_loose_forms() {
        let v: MetricValue = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(v, MetricValue::NotAvailable);

        let v: MetricValue = serde_json::from_str("\"0.25\"").unwrap();
        assert_eq!(v, MetricValue::Value(0.25));

        let v: MetricValue = serde_json::from_str("null").unwrap();
        assert_eq!(v, MetricValue::NotAvailable);
    }

    #[test]
    fn test_non_finite_is_not_available() {
        assert_eq!(MetricValue::from(Some(f64::NAN)), MetricValue::NotAvailable);
    }

    #[test]
    fn test_display_formatting_per_field() {
        let metrics = StrategyMetrics {
            performance: MetricValue::Value(87.0),
            fcp: MetricValue::Value(1.2),
            lcp: MetricValue::Value(2.5),
            cls: MetricValue::Value(0.05),
            inp: MetricValue::Value(180.0),
            source: DataSource::Origin,
            recommendations: Vec::new(),
        };

        assert_eq!(metrics.display(MetricField::Performance), "87");
        assert_eq!(metrics.display(MetricField::Fcp), "1.20");
        assert_eq!(metrics.display(MetricField::Lcp), "2.50");
        assert_eq!(metrics.display(MetricField::Cls), "0.05");
        assert_eq!(metrics.display(MetricField::Inp), "180");
        assert_eq!(metrics.display(MetricField::Source), "origin");
        assert_eq!(StrategyMetrics::default().display(MetricField::Fcp), "N/A");
    }

    #[test]
    fn test_row_error_accumulates() {
        let mut row = ReportRow::new("https://example.com");
        assert!(row.is_ok());

        row.push_error("mobile: timeout");
        row.push_error("desktop: HTTP 500");
        assert_eq!(
            row.error.as_deref(),
            Some("mobile: timeout; desktop: HTTP 500")
        );
        assert!(!row.is_ok());
    }

    #[test]
    fn test_strategy_maps_to_form_factor() {
        assert_eq!(FormFactor::from(Strategy::Mobile), FormFactor::Phone);
        assert_eq!(FormFactor::from(Strategy::Desktop).as_str(), "DESKTOP");
        assert_eq!(Strategy::Mobile.to_string(), "mobile");
    }
}
