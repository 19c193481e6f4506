//! Markdown output generation for reports.
//!
//! This module renders the sortable results table and a per-URL detail
//! report in Markdown.

use crate::result::Report;
use pagespeed_report_core::sort::{columns, sorted_rows, ColumnKind, Direction, SortConfig};
use pagespeed_report_core::types::MetricField;
use pagespeed_report_core::Strategy;
use std::fmt::{self, Write};

/// Metric glossary appended to summaries.
const METRIC_DEFINITIONS: &[(&str, &str)] = &[
    ("FCP", "First Contentful Paint (s)"),
    ("LCP", "Largest Contentful Paint (s)"),
    ("CLS", "Cumulative Layout Shift"),
    ("INP", "Interaction to Next Paint (ms)"),
];

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Render the results table only.
pub fn render_table(report: &Report, sort: SortConfig) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write_table(&mut output, report, sort);
    output
}

fn write_table(output: &mut String, report: &Report, sort: SortConfig) -> fmt::Result {
    let cols = columns();

    let header: Vec<String> = cols
        .iter()
        .map(|c| match (sort.key, c.sortable) {
            (Some(key), true) if key == c.key => {
                let arrow = match sort.direction {
                    Direction::Asc => "▲",
                    Direction::Desc => "▼",
                };
                format!("{} {}", c.label, arrow)
            }
            _ => c.label.to_string(),
        })
        .collect();
    writeln!(output, "| {} |", header.join(" | "))?;
    writeln!(
        output,
        "|{}",
        cols.iter().map(|_| "---|").collect::<String>()
    )?;

    for (i, row) in sorted_rows(&report.rows, sort).into_iter().enumerate() {
        let cells: Vec<String> = cols
            .iter()
            .map(|c| match c.kind {
                ColumnKind::SerialNumber => (i + 1).to_string(),
                _ => escape(&c.cell(row).unwrap_or_default()),
            })
            .collect();
        writeln!(output, "| {} |", cells.join(" | "))?;
    }

    Ok(())
}

/// Generate a markdown summary: table, failures and metric definitions.
pub fn generate_summary(report: &Report, sort: SortConfig) -> String {
    let mut output = String::new();
    let _ = write_summary(&mut output, report, sort);
    output
}

fn write_summary(output: &mut String, report: &Report, sort: SortConfig) -> fmt::Result {
    writeln!(output, "# PageSpeed Report")?;
    writeln!(output)?;
    writeln!(
        output,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(output)?;
    writeln!(output, "## Results")?;
    writeln!(output)?;
    output.push_str(&render_table(report, sort));

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        writeln!(output)?;
        writeln!(output, "## Failures")?;
        writeln!(output)?;
        for row in failures {
            writeln!(
                output,
                "- {}: {}",
                row.url,
                row.error.as_deref().unwrap_or_default()
            )?;
        }
    }

    writeln!(output)?;
    writeln!(
        output,
        "**Metric definitions (percentile values, real user data):**"
    )?;
    writeln!(output)?;
    for (name, description) in METRIC_DEFINITIONS {
        writeln!(output, "- **{}**: {}", name, description)?;
    }

    writeln!(output)?;
    writeln!(output, "---")?;
    writeln!(
        output,
        "Total URLs: {} ({} succeeded, {} failed)",
        report.rows.len(),
        report.run.succeeded(),
        report.run.failed
    )?;

    Ok(())
}

/// Generate a detailed markdown report with per-URL recommendations.
pub fn generate_detailed_report(report: &Report) -> String {
    let mut output = String::new();
    let _ = write_detailed_report(&mut output, report);
    output
}

fn write_detailed_report(output: &mut String, report: &Report) -> fmt::Result {
    writeln!(output, "# Detailed PageSpeed Report")?;
    writeln!(output)?;
    writeln!(
        output,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(output)?;

    for row in &report.rows {
        writeln!(output, "## {}", row.url)?;
        writeln!(output)?;

        if let Some(error) = &row.error {
            writeln!(output, "**Error:** {}", error)?;
            writeln!(output)?;
        }

        for strategy in Strategy::ALL {
            let Some(metrics) = row.metrics(strategy) else {
                continue;
            };
            writeln!(output, "### {}", strategy)?;
            writeln!(output)?;
            for field in MetricField::ALL {
                writeln!(output, "- {}: {}", field.key(), metrics.display(field))?;
            }
            if !metrics.recommendations.is_empty() {
                writeln!(output)?;
                writeln!(output, "**Recommendations:**")?;
                for rec in &metrics.recommendations {
                    writeln!(output, "- {}", rec)?;
                }
            }
            writeln!(output)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagespeed_report_core::{DataSource, MetricValue, ReportRow, ReportRun, StrategyMetrics};

    fn sample_report() -> Report {
        let mut good = ReportRow::new("https://example.com/|pipe");
        good.mobile = Some(StrategyMetrics {
            performance: MetricValue::Value(72.0),
            fcp: MetricValue::Value(1.8),
            lcp: MetricValue::Value(2.9),
            cls: MetricValue::Value(0.02),
            inp: MetricValue::Value(150.0),
            source: DataSource::Url,
            recommendations: vec!["Reduce unused JavaScript".to_string()],
        });
        good.desktop = Some(StrategyMetrics::default());

        let bad = ReportRow::failed("https://broken.test/", "mobile: HTTP request failed");

        let mut run = ReportRun::new(2, 5, 0);
        run.record(&good);
        run.record(&bad);
        run.complete();

        Report::new(vec![good, bad], run)
    }

    #[test]
    fn test_table_shape() {
        let table = render_table(&sample_report(), SortConfig::default());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("| S.no | URL | Mobile Lighthouse Performance"));
        assert!(lines[2].contains("https://example.com/\\|pipe"));
        assert!(lines[2].contains("| 1.80 | 2.90 | 0.02 | 150 | url |"));
        assert!(lines[2].contains("| N/A | N/A |"));
        assert!(lines[3].starts_with("| 2 | https://broken.test/ |"));
    }

    #[test]
    fn test_sorted_header_marker() {
        let sort = SortConfig::default().select("mobile_lcp").select("mobile_lcp");
        let table = render_table(&sample_report(), sort);
        assert!(table.contains("Mobile LCP (s) ▼"));
    }

    #[test]
    fn test_summary_sections() {
        let summary = generate_summary(&sample_report(), SortConfig::default());
        assert!(summary.contains("# PageSpeed Report"));
        assert!(summary.contains("## Failures"));
        assert!(summary.contains("- https://broken.test/: mobile: HTTP request failed"));
        assert!(summary.contains("- **INP**: Interaction to Next Paint (ms)"));
        assert!(summary.contains("Total URLs: 2 (1 succeeded, 1 failed)"));
    }

    #[test]
    fn test_detailed_report() {
        let detail = generate_detailed_report(&sample_report());
        assert!(detail.contains("### mobile"));
        assert!(detail.contains("- lighthouse: 72"));
        assert!(detail.contains("- Reduce unused JavaScript"));
        assert!(detail.contains("**Error:** mobile: HTTP request failed"));
    }
}
