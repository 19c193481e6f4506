// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle record of one report generation.
//!
//! A [`ReportRun`] is created when a URL list is submitted, updated as each
//! batch of rows lands, and completed once every URL has a row. It is what
//! drives progress output and is written alongside the rows in
//! `report.json`.
//!
//! # Invariants
//!
//! ```text
//! failed <= done <= total
//! ```

use crate::types::ReportRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    /// Batches are still being fetched.
    #[default]
    Running,
    /// Every URL has a row.
    Completed,
}

/// Progress and timing of one report generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRun {
    /// Unique run identifier (UUID v4).
    pub run_id: String,
    /// Run status.
    pub status: RunStatus,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time, set by [`ReportRun::complete`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Duration in milliseconds, set by [`ReportRun::complete`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// URLs submitted.
    pub total: usize,
    /// URLs with a row.
    pub done: usize,
    /// Rows carrying an error.
    pub failed: usize,
    /// URLs fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches, milliseconds.
    pub batch_delay_ms: u64,
}

impl ReportRun {
    /// Start a run over `total` URLs.
    pub fn new(total: usize, batch_size: usize, batch_delay_ms: u64) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
            total,
            done: 0,
            failed: 0,
            batch_size,
            batch_delay_ms,
        }
    }

    /// Account for a finished row.
    pub fn record(&mut self, row: &ReportRow) {
        if self.done >= self.total {
            tracing::warn!(url = %row.url, total = self.total, "row recorded past run total");
            return;
        }
        self.done += 1;
        if !row.is_ok() {
            self.failed += 1;
        }
    }

    /// URLs still waiting for a row.
    pub fn pending(&self) -> usize {
        self.total - self.done
    }

    /// Rows that completed without error.
    pub fn succeeded(&self) -> usize {
        self.done - self.failed
    }

    /// Completion percentage, 0-100.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.done as f64 / self.total as f64 * 100.0
    }

    /// Whether every submitted URL has a row.
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.done == self.total
    }

    /// Mark the run completed, setting end time and duration.
    pub fn complete(&mut self) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.duration_ms = Some(
            now.signed_duration_since(self.started_at)
                .num_milliseconds()
                .unsigned_abs(),
        );
        self.status = RunStatus::Completed;
    }

    /// Whether [`ReportRun::complete`] has been called.
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_running() {
        let run = ReportRun::new(3, 5, 1500);
        assert_eq!(run.status, RunStatus::Running);
        assert!(Uuid::parse_str(&run.run_id).is_ok());
        assert_eq!(run.pending(), 3);
        assert!(!run.is_finished());
    }

    #[test]
    fn test_record_counts_failures() {
        let mut run = ReportRun::new(2, 5, 0);
        run.record(&ReportRow::new("https://a.test"));
        run.record(&ReportRow::failed("https://b.test", "mobile: HTTP 500"));

        assert_eq!(run.done, 2);
        assert_eq!(run.failed, 1);
        assert_eq!(run.succeeded(), 1);
        assert_eq!(run.percent(), 100.0);
        assert!(run.is_finished());
    }

    #[test]
    fn test_record_never_exceeds_total() {
        let mut run = ReportRun::new(1, 5, 0);
        run.record(&ReportRow::new("https://a.test"));
        run.record(&ReportRow::new("https://b.test"));
        assert_eq!(run.done, 1);
        assert_eq!(run.pending(), 0);
    }

    #[test]
    fn test_empty_run_is_not_finished() {
        let run = ReportRun::new(0, 5, 0);
        assert!(!run.is_finished());
        assert_eq!(run.percent(), 0.0);
    }

    #[test]
    fn test_complete() {
        let mut run = ReportRun::new(1, 5, 0);
        run.complete();
        assert!(run.is_completed());
        assert!(run.finished_at.is_some());
        assert!(run.duration_ms.is_some());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut run = ReportRun::new(4, 2, 100);
        run.complete();
        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("\"COMPLETED\""));
        let back: ReportRun = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, run.run_id);
        assert_eq!(back.total, 4);
    }
}
