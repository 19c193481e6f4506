//! Report document.
//!
//! This module provides the [`Report`] struct written to `report.json`
//! and consumed by the Markdown and spreadsheet writers.

use chrono::{DateTime, Local};
use pagespeed_report_core::{ReportRow, ReportRun};
use serde::{Deserialize, Serialize};

/// A finished report: every row of one run plus the run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// When the report was assembled (local time, used in file names).
    pub generated_at: DateTime<Local>,
    /// Lifecycle record of the run.
    pub run: ReportRun,
    /// One row per submitted URL, input order.
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Assemble a report stamped with the current time.
    pub fn new(rows: Vec<ReportRow>, run: ReportRun) -> Self {
        Self {
            generated_at: Local::now(),
            run,
            rows,
        }
    }

    /// Whether the report has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that carry an error.
    pub fn failures(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| !r.is_ok())
    }
}
