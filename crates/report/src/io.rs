//! I/O operations for reports.
//!
//! This module writes a finished report to an output directory in the
//! requested formats and reads `report.json` back.

use crate::markdown;
use crate::result::Report;
use crate::xlsx;
use pagespeed_report_core::sort::SortConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// Default output directory path.
pub const OUTPUT_DIR: &str = "pagespeed-output";

/// Report document file name.
pub const REPORT_FILE: &str = "report.json";

/// Summary file name.
pub const SUMMARY_FILE: &str = "summary.md";

/// Per-URL detail file name.
pub const DETAILS_FILE: &str = "details.md";

/// Errors raised while writing or reading report files.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Report document could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Workbook could not be produced
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// Which files to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Spreadsheet, JSON document and Markdown summary.
    #[default]
    All,
    /// Spreadsheet only.
    Xlsx,
    /// `report.json` only.
    Json,
    /// `summary.md` and `details.md` only.
    Markdown,
}

impl OutputFormat {
    fn includes(self, other: OutputFormat) -> bool {
        self == OutputFormat::All || self == other
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(OutputFormat::All),
            "xlsx" => Ok(OutputFormat::Xlsx),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Ensure the output directory exists.
pub fn ensure_output_dir(dir: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Write the report document as pretty JSON.
pub fn write_report_json(report: &Report, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a report document written by [`write_report_json`].
pub fn read_report_json(path: impl AsRef<Path>) -> Result<Report> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the Markdown summary.
pub fn write_summary(report: &Report, sort: SortConfig, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, markdown::generate_summary(report, sort))?;
    Ok(())
}

/// Write the per-URL Markdown detail report.
pub fn write_details(report: &Report, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, markdown::generate_detailed_report(report))?;
    Ok(())
}

/// Write every requested output into `dir` and return the paths written.
///
/// The spreadsheet is skipped when the report has no rows.
pub fn write_outputs(
    report: &Report,
    dir: impl AsRef<Path>,
    format: OutputFormat,
    sort: SortConfig,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    ensure_output_dir(dir)?;
    let mut written = Vec::new();

    if format.includes(OutputFormat::Xlsx) {
        if report.is_empty() {
            warn!("no results, skipping spreadsheet");
        } else {
            let path = dir.join(xlsx::file_name(&report.generated_at.naive_local()));
            xlsx::write_workbook(report, &path)?;
            written.push(path);
        }
    }

    if format.includes(OutputFormat::Json) {
        let path = dir.join(REPORT_FILE);
        write_report_json(report, &path)?;
        written.push(path);
    }

    if format.includes(OutputFormat::Markdown) {
        let path = dir.join(SUMMARY_FILE);
        write_summary(report, sort, &path)?;
        written.push(path);

        let path = dir.join(DETAILS_FILE);
        write_details(report, &path)?;
        written.push(path);
    }

    for path in &written {
        info!(path = %path.display(), "wrote output");
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagespeed_report_core::{MetricValue, ReportRow, ReportRun, StrategyMetrics};

    fn report(rows: Vec<ReportRow>) -> Report {
        let mut run = ReportRun::new(rows.len(), 5, 1500);
        for row in &rows {
            run.record(row);
        }
        run.complete();
        Report::new(rows, run)
    }

    fn row(url: &str) -> ReportRow {
        let mut row = ReportRow::new(url);
        row.mobile = Some(StrategyMetrics {
            performance: MetricValue::Value(91.0),
            ..StrategyMetrics::default()
        });
        row
    }

    #[test]
    fn test_write_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let report = report(vec![row("https://example.com/")]);

        let written =
            write_outputs(&report, &out, OutputFormat::All, SortConfig::default()).unwrap();

        assert_eq!(written.len(), 4);
        assert_eq!(written[3], out.join(DETAILS_FILE));
        assert!(written[0].extension().is_some_and(|e| e == "xlsx"));
        assert!(written.iter().all(|p| p.exists()));

        let bytes = fs::read(&written[0]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_empty_report_skips_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let report = report(Vec::new());

        let sort = SortConfig::default();

        let written = write_outputs(&report, dir.path(), OutputFormat::Xlsx, sort).unwrap();
        assert!(written.is_empty());

        let written = write_outputs(&report, dir.path(), OutputFormat::All, sort).unwrap();
        assert_eq!(written.len(), 3);
    }

    #[test]
    fn test_report_json_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE);
        let original = report(vec![
            row("https://example.com/"),
            ReportRow::failed("https://down.test/", "mobile: timeout"),
        ]);

        write_report_json(&original, &path).unwrap();
        let loaded = read_report_json(&path).unwrap();

        assert_eq!(loaded.rows, original.rows);
        assert_eq!(loaded.run.failed, 1);
        assert_eq!(loaded.run.run_id, original.run.run_id);
    }

    #[test]
    fn test_markdown_format_writes_details() {
        let dir = tempfile::tempdir().unwrap();
        let report = report(vec![
            row("https://example.com/"),
            ReportRow::failed("https://down.test/", "mobile: timeout"),
        ]);

        let written =
            write_outputs(&report, dir.path(), OutputFormat::Markdown, SortConfig::default())
                .unwrap();
        assert_eq!(
            written,
            vec![dir.path().join(SUMMARY_FILE), dir.path().join(DETAILS_FILE)]
        );

        let details = fs::read_to_string(dir.path().join(DETAILS_FILE)).unwrap();
        assert!(details.starts_with("# Detailed PageSpeed Report"));
        assert!(details.contains("## https://example.com/"));
        assert!(details.contains("- lighthouse: 91"));
        assert!(details.contains("**Error:** mobile: timeout"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("XLSX".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
