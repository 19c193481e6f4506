//! Spreadsheet export.
//!
//! One worksheet named after the file, a header row of column keys, a
//! meta row carrying the generation time, then one row per URL in input
//! order. Metric cells are numbers; anything missing is the text `N/A`.

use crate::result::Report;
use chrono::NaiveDateTime;
use pagespeed_report_core::sort::{columns, Column, ColumnKind};
use pagespeed_report_core::types::MetricField;
use pagespeed_report_core::{MetricValue, ReportRow};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::debug;

/// Longest sheet name the format allows.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Key of the trailing error column.
pub const ERROR_COLUMN: &str = "error";

/// Widths of the exported columns, in order.
pub const COLUMN_WIDTHS: [f64; 14] = [
    40.0, 14.0, 16.0, 16.0, 12.0, 16.0, 14.0, 14.0, 16.0, 16.0, 12.0, 16.0, 14.0, 40.0,
];

/// `PageSpeed_{date}_{time}`, cut to the sheet-name limit.
pub fn sheet_name(at: &NaiveDateTime) -> String {
    at.format("PageSpeed_%Y-%m-%d_%H-%M-%S")
        .to_string()
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect()
}

/// File name of the workbook for a report generated at `at`.
pub fn file_name(at: &NaiveDateTime) -> String {
    at.format("PageSpeed_%Y-%m-%d_%H-%M-%S.xlsx").to_string()
}

/// Exported columns: every table column except the serial number.
fn export_columns() -> Vec<Column> {
    columns()
        .into_iter()
        .filter(|c| c.kind != ColumnKind::SerialNumber)
        .collect()
}

/// Header keys in sheet order.
pub fn header_keys() -> Vec<&'static str> {
    export_columns()
        .iter()
        .map(|c| c.key)
        .chain(std::iter::once(ERROR_COLUMN))
        .collect()
}

fn write_metric(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: MetricValue,
) -> Result<(), XlsxError> {
    match value.as_f64() {
        Some(v) => sheet.write_number(row, col, v)?,
        None => sheet.write_string(row, col, MetricValue::NOT_AVAILABLE)?,
    };
    Ok(())
}

fn write_row(
    sheet: &mut Worksheet,
    index: u32,
    cols: &[Column],
    row: &ReportRow,
) -> Result<(), XlsxError> {
    for (c, column) in cols.iter().enumerate() {
        let c = c as u16;
        match column.kind {
            ColumnKind::SerialNumber => {}
            ColumnKind::Url => {
                sheet.write_string(index, c, &row.url)?;
            }
            ColumnKind::Metric(strategy, MetricField::Source) => {
                let text = row
                    .metrics(strategy)
                    .map(|m| m.source.as_str())
                    .unwrap_or(MetricValue::NOT_AVAILABLE);
                sheet.write_string(index, c, text)?;
            }
            ColumnKind::Metric(strategy, field) => {
                let value = row
                    .metrics(strategy)
                    .and_then(|m| m.value(field))
                    .into();
                write_metric(sheet, index, c, value)?;
            }
        }
    }

    if let Some(error) = &row.error {
        sheet.write_string(index, cols.len() as u16, error)?;
    }
    Ok(())
}

fn build_workbook(report: &Report) -> Result<Workbook, XlsxError> {
    let generated = report.generated_at.naive_local();
    let cols = export_columns();
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(&generated))?;

    for (c, key) in header_keys().iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, *key, &bold)?;
    }
    for (c, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(c as u16, *width)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    sheet.write_string(
        1,
        0,
        format!("Report generated: {}", generated.format("%Y-%m-%d %H:%M:%S")),
    )?;

    for (i, row) in report.rows.iter().enumerate() {
        write_row(sheet, i as u32 + 2, &cols, row)?;
    }

    Ok(workbook)
}

/// Serialize the report as an xlsx workbook.
pub fn workbook_bytes(report: &Report) -> Result<Vec<u8>, XlsxError> {
    build_workbook(report)?.save_to_buffer()
}

/// Write the workbook to `path`.
pub fn write_workbook(report: &Report, path: impl AsRef<Path>) -> Result<(), XlsxError> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = report.rows.len(), "writing workbook");
    build_workbook(report)?.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use chrono::{Local, NaiveDate, TimeZone};
    use pagespeed_report_core::{DataSource, ReportRun, StrategyMetrics};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_names() {
        assert_eq!(sheet_name(&at()), "PageSpeed_2024-03-09_14-05-07");
        assert_eq!(file_name(&at()), "PageSpeed_2024-03-09_14-05-07.xlsx");
        assert!(sheet_name(&at()).len() <= MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_header_keys_match_widths() {
        let keys = header_keys();
        assert_eq!(keys.len(), COLUMN_WIDTHS.len());
        assert_eq!(keys[0], "url");
        assert_eq!(keys[1], "mobile_lighthouse");
        assert_eq!(keys[7], "desktop_lighthouse");
        assert_eq!(keys[13], "error");
    }

    #[test]
    fn test_workbook_is_zip() {
        let mut row = ReportRow::new("https://example.com/");
        row.mobile = Some(StrategyMetrics::default());
        let report = Report::new(
            vec![row, ReportRow::failed("https://down.test/", "mobile: timeout")],
            ReportRun::new(2, 5, 0),
        );

        let bytes = workbook_bytes(&report).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_workbook_cells() {
        let mut row = ReportRow::new("https://example.com/");
        row.mobile = Some(StrategyMetrics {
            performance: MetricValue::Value(72.0),
            fcp: MetricValue::Value(1.8),
            lcp: MetricValue::Value(2.9),
            cls: MetricValue::Value(0.02),
            inp: MetricValue::NotAvailable,
            source: DataSource::Url,
            recommendations: Vec::new(),
        });
        row.error = Some("desktop: timeout".to_string());
        let mut report = Report::new(vec![row], ReportRun::new(1, 5, 0));
        report.generated_at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name(&at()));
        write_workbook(&report, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let names = workbook.sheet_names();
        assert_eq!(names, vec!["PageSpeed_2024-03-09_14-05-07".to_string()]);
        assert_eq!(Some(names[0].as_str()), path.file_stem().and_then(|s| s.to_str()));

        let range = workbook.worksheet_range(&names[0]).unwrap();
        let cell = |r: u32, c: u32| range.get_value((r, c)).cloned();
        let text = |s: &str| Some(Data::String(s.to_string()));

        assert_eq!(cell(0, 0), text("url"));
        assert_eq!(cell(0, 13), text("error"));
        assert_eq!(cell(1, 0), text("Report generated: 2024-03-09 14:05:07"));

        assert_eq!(cell(2, 0), text("https://example.com/"));
        assert_eq!(cell(2, 1), Some(Data::Float(72.0)));
        assert_eq!(cell(2, 3), Some(Data::Float(2.9)));
        assert_eq!(cell(2, 5), text("N/A"));
        assert_eq!(cell(2, 6), text("url"));
        assert_eq!(cell(2, 7), text("N/A"));
        assert_eq!(cell(2, 12), text("N/A"));
        assert_eq!(cell(2, 13), text("desktop: timeout"));
    }
}
