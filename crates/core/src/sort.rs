// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Results table columns and ordering.

use crate::types::{MetricField, ReportRow, Strategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What a column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 1-based row number.
    SerialNumber,
    /// Page URL.
    Url,
    /// A metric of one strategy.
    Metric(Strategy, MetricField),
}

/// A results table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Stable key, also used as the spreadsheet header.
    pub key: &'static str,
    /// Header label.
    pub label: &'static str,
    /// Whether rows may be ordered by this column.
    pub sortable: bool,
    /// Cell content.
    pub kind: ColumnKind,
}

macro_rules! metric_columns {
    ($strategy:expr, $prefix:literal, $title:literal) => {
        [
            Column {
                key: concat!($prefix, "_lighthouse"),
                label: concat!($title, " Lighthouse Performance"),
                sortable: true,
                kind: ColumnKind::Metric($strategy, MetricField::Performance),
            },
            Column {
                key: concat!($prefix, "_fcp"),
                label: concat!($title, " FCP (s)"),
                sortable: true,
                kind: ColumnKind::Metric($strategy, MetricField::Fcp),
            },
            Column {
                key: concat!($prefix, "_lcp"),
                label: concat!($title, " LCP (s)"),
                sortable: true,
                kind: ColumnKind::Metric($strategy, MetricField::Lcp),
            },
            Column {
                key: concat!($prefix, "_cls"),
                label: concat!($title, " CLS"),
                sortable: true,
                kind: ColumnKind::Metric($strategy, MetricField::Cls),
            },
            Column {
                key: concat!($prefix, "_inp"),
                label: concat!($title, " INP (ms)"),
                sortable: true,
                kind: ColumnKind::Metric($strategy, MetricField::Inp),
            },
            Column {
                key: concat!($prefix, "_source"),
                label: concat!($title, " Data Source"),
                sortable: false,
                kind: ColumnKind::Metric($strategy, MetricField::Source),
            },
        ]
    };
}

const MOBILE: [Column; 6] = metric_columns!(Strategy::Mobile, "mobile", "Mobile");
const DESKTOP: [Column; 6] = metric_columns!(Strategy::Desktop, "desktop", "Desktop");

/// All table columns, in display order.
pub fn columns() -> Vec<Column> {
    let mut cols = vec![
        Column {
            key: "sno",
            label: "S.no",
            sortable: false,
            kind: ColumnKind::SerialNumber,
        },
        Column {
            key: "url",
            label: "URL",
            sortable: true,
            kind: ColumnKind::Url,
        },
    ];
    cols.extend(MOBILE);
    cols.extend(DESKTOP);
    cols
}

/// Look up a column by key.
pub fn column(key: &str) -> Option<Column> {
    columns().into_iter().find(|c| c.key == key)
}

impl Column {
    /// Cell text for a row; `None` when the row has no data for it.
    ///
    /// Serial numbers depend on position and are not available here.
    pub fn cell(&self, row: &ReportRow) -> Option<String> {
        match self.kind {
            ColumnKind::SerialNumber => None,
            ColumnKind::Url => Some(row.url.clone()),
            ColumnKind::Metric(strategy, field) => {
                row.metrics(strategy).map(|m| m.display(field))
            }
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// The opposite direction.
    pub fn toggle(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Current ordering of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    /// Column key, `None` for input order.
    pub key: Option<&'static str>,
    /// Direction.
    pub direction: Direction,
}

impl SortConfig {
    /// Select a column: a repeated selection flips direction, a new one
    /// starts ascending. Unsortable columns leave the config unchanged.
    pub fn select(self, key: &str) -> Self {
        match column(key) {
            Some(col) if col.sortable => {
                if self.key == Some(col.key) {
                    Self {
                        key: self.key,
                        direction: self.direction.toggle(),
                    }
                } else {
                    Self {
                        key: Some(col.key),
                        direction: Direction::Asc,
                    }
                }
            }
            _ => self,
        }
    }
}

/// Compare two cells.
///
/// Numeric cells compare by value. Otherwise a missing cell sorts last in
/// either direction and text compares case-insensitively.
pub fn compare_cells(a: Option<&str>, b: Option<&str>, direction: Direction) -> Ordering {
    let num = |s: Option<&str>| s.and_then(|v| v.trim().parse::<f64>().ok());
    if let (Some(x), Some(y)) = (num(a), num(b)) {
        return direction.apply(x.partial_cmp(&y).unwrap_or(Ordering::Equal));
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => direction.apply(x.to_lowercase().cmp(&y.to_lowercase())),
    }
}

/// Rows ordered by `config`; input order when no sortable column is selected.
pub fn sorted_rows<'a>(rows: &'a [ReportRow], config: SortConfig) -> Vec<&'a ReportRow> {
    let mut out: Vec<&ReportRow> = rows.iter().collect();

    let Some(col) = config.key.and_then(column).filter(|c| c.sortable) else {
        return out;
    };

    out.sort_by(|a, b| {
        compare_cells(
            col.cell(a).as_deref(),
            col.cell(b).as_deref(),
            config.direction,
        )
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataSource, MetricValue, StrategyMetrics};

    fn row(url: &str, perf: Option<f64>) -> ReportRow {
        let mut r = ReportRow::new(url);
        r.mobile = Some(StrategyMetrics {
            performance: perf.into(),
            source: DataSource::Url,
            ..StrategyMetrics::default()
        });
        r
    }

    fn urls(rows: &[&ReportRow]) -> Vec<String> {
        rows.iter().map(|r| r.url.clone()).collect()
    }

    #[test]
    fn test_column_layout() {
        let cols = columns();
        assert_eq!(cols.len(), 14);
        assert_eq!(cols[0].key, "sno");
        assert_eq!(cols[2].key, "mobile_lighthouse");
        assert_eq!(cols[13].key, "desktop_source");
        assert!(!cols[7].sortable);
    }

    #[test]
    fn test_numeric_sort_both_directions() {
        let rows = vec![
            row("https://a.test", Some(50.0)),
            row("https://b.test", Some(9.0)),
            row("https://c.test", Some(100.0)),
        ];

        let asc = SortConfig::default().select("mobile_lighthouse");
        assert_eq!(
            urls(&sorted_rows(&rows, asc)),
            vec!["https://b.test", "https://a.test", "https://c.test"]
        );

        let desc = asc.select("mobile_lighthouse");
        assert_eq!(desc.direction, Direction::Desc);
        assert_eq!(
            urls(&sorted_rows(&rows, desc)),
            vec!["https://c.test", "https://a.test", "https://b.test"]
        );
    }

    #[test]
    fn test_missing_cells_sort_last() {
        let rows = vec![
            ReportRow::failed("https://broken.test", "mobile: timeout"),
            row("https://b.test", Some(20.0)),
            row("https://a.test", Some(10.0)),
        ];

        for direction in [Direction::Asc, Direction::Desc] {
            let config = SortConfig {
                key: Some("mobile_lighthouse"),
                direction,
            };
            let sorted = sorted_rows(&rows, config);
            assert_eq!(sorted[2].url, "https://broken.test");
        }
    }

    #[test]
    fn test_text_sort_is_case_insensitive() {
        let rows = vec![
            row("https://B.test", None),
            row("https://a.test", None),
            row("https://c.test", None),
        ];
        let sorted = sorted_rows(&rows, SortConfig::default().select("url"));
        assert_eq!(
            urls(&sorted),
            vec!["https://a.test", "https://B.test", "https://c.test"]
        );
    }

    #[test]
    fn test_unsortable_column_is_ignored() {
        let config = SortConfig::default().select("mobile_source");
        assert_eq!(config, SortConfig::default());

        let config = SortConfig::default().select("no_such_column");
        assert_eq!(config.key, None);
    }

    #[test]
    fn test_na_compares_as_text() {
        assert_eq!(
            compare_cells(Some("1.20"), Some(MetricValue::NOT_AVAILABLE), Direction::Asc),
            Ordering::Less
        );
    }
}
