//! Report output for PageSpeed Report.
//!
//! This crate turns the rows of a finished run into files: a spreadsheet,
//! a JSON report document, a Markdown summary and a per-URL Markdown
//! detail report.
//!
//! # Quick Start
//!
//! ```no_run
//! use pagespeed_report_core::{ReportRow, ReportRun};
//! use pagespeed_report_output::{write_all, Report};
//!
//! let rows = vec![ReportRow::new("https://example.com/")];
//! let report = Report::new(rows, ReportRun::new(1, 5, 1500));
//!
//! let written = write_all(&report, "pagespeed-output").unwrap();
//! for path in written {
//!     println!("{}", path.display());
//! }
//! ```
//!
//! # Modules
//!
//! - [`result`] - The `Report` document
//! - [`io`] - Writing and reading report files
//! - [`markdown`] - Markdown table and summary generation
//! - [`xlsx`] - Spreadsheet export

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod io;
pub mod markdown;
pub mod result;
pub mod xlsx;

pub use io::{OutputError, OutputFormat};
pub use result::Report;

use pagespeed_report_core::sort::SortConfig;
use std::path::{Path, PathBuf};

/// Write every output format into `dir`, rows in input order.
///
/// # Errors
///
/// Returns an [`OutputError`] if any file cannot be written.
pub fn write_all(report: &Report, dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    io::write_outputs(report, dir, OutputFormat::All, SortConfig::default())
}
