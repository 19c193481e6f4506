//! Command handlers.

use crate::config::{mask_key, AppConfig, Overrides, DEFAULT_CONFIG_FILE};
use crate::{Cli, Commands};
use anyhow::{bail, Context};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pagespeed_report_adapters::upstream::{CruxAdapter, PageSpeedAdapter};
use pagespeed_report_adapters::BatchRunner;
use pagespeed_report_core::history::{all_series, history_series, HistoryMetric, HistorySeries};
use pagespeed_report_core::lcp::{LcpAnalysis, LcpRating};
use pagespeed_report_core::sort::{column, Direction, SortConfig};
use pagespeed_report_core::urls::{parse_url_list, UrlList};
use pagespeed_report_core::{FormFactor, ReportRun};
use pagespeed_report_output::{io, markdown, OutputFormat, Report};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Dispatch a parsed command line.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            urls,
            file,
            output,
            format,
            sort,
            desc,
            batch_size,
            delay_ms,
        } => {
            let config = config.apply_overrides(Overrides {
                batch_size,
                batch_delay_ms: delay_ms,
                output_dir: output,
            })?;
            let list = collect_urls(&urls, file.as_deref())?;
            let sort = sort_config(sort.as_deref(), desc)?;
            run_report(&config, list, format, sort).await
        }
        Commands::History {
            url,
            form_factor,
            metric,
            json,
        } => history(&config, &url, form_factor.into(), metric, json).await,
        Commands::Lcp { url } => lcp(&config, &url).await,
        Commands::Status { detailed } => {
            status(&config, cli.config.as_deref(), detailed);
            Ok(())
        }
    }
}

/// Merge URL arguments and the optional URL file into one list.
fn collect_urls(args: &[String], file: Option<&Path>) -> anyhow::Result<UrlList> {
    let mut text = args.join("\n");
    if let Some(path) = file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read URL file {}", path.display()))?;
        text.push('\n');
        text.push_str(&content);
    }

    let list = parse_url_list(&text);
    for entry in &list.rejected {
        warn!(entry = %entry, "skipping entry without http(s) scheme");
    }
    if list.is_empty() {
        bail!("no valid URLs given (expected http:// or https:// URLs)");
    }
    Ok(list)
}

fn sort_config(key: Option<&str>, desc: bool) -> anyhow::Result<SortConfig> {
    let Some(key) = key else {
        return Ok(SortConfig::default());
    };
    let config = SortConfig::default().select(key);
    if config.key.is_none() {
        match column(key) {
            Some(_) => bail!("column '{}' cannot be sorted", key),
            None => bail!("unknown column '{}'", key),
        }
    }
    Ok(SortConfig {
        direction: if desc { Direction::Desc } else { Direction::Asc },
        ..config
    })
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} URLs {msg}",
    )
    .map(|s| s.progress_chars("=> "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

fn on_progress(bar: &ProgressBar, run: &ReportRun) {
    bar.set_position(run.done as u64);
    if run.failed > 0 {
        bar.set_message(format!("({} failed)", run.failed));
    }
}

async fn run_report(
    config: &AppConfig,
    list: UrlList,
    format: OutputFormat,
    sort: SortConfig,
) -> anyhow::Result<()> {
    let adapter = PageSpeedAdapter::new(config.pagespeed())?;
    if !adapter.has_api_key() {
        warn!("no API key configured, requests use the anonymous quota");
    }

    let runner = BatchRunner::new(adapter)
        .batch_size(config.batch_size)
        .batch_delay(config.batch_delay());

    let bar = progress_bar(list.urls.len());
    let (rows, run) = runner.run(&list.urls, |run| on_progress(&bar, run)).await;
    bar.finish_and_clear();

    let report = Report::new(rows, run);
    print!("{}", markdown::render_table(&report, sort));

    let written = io::write_outputs(&report, &config.output_dir, format, sort)
        .with_context(|| format!("failed to write report to {}", config.output_dir.display()))?;

    println!();
    println!(
        "{} {} URLs ({} succeeded, {} failed) in {} ms",
        "Completed".green().bold(),
        report.run.total,
        report.run.succeeded(),
        report.run.failed,
        report.run.duration_ms.unwrap_or_default()
    );
    for row in report.failures() {
        println!(
            "  {} {}: {}",
            "✗".red(),
            row.url,
            row.error.as_deref().unwrap_or_default()
        );
    }
    for path in &written {
        println!("  {} {}", "→".cyan(), path.display());
    }

    Ok(())
}

fn print_series(series: &HistorySeries) {
    println!();
    println!("{}", series.title().bold());
    let unit = series.metric.unit();
    let pct = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| format!("{:.1}%", v));

    for point in &series.points {
        let p75 = point
            .p75
            .map_or_else(|| "N/A".to_string(), |v| format!("{}{}", v, unit));
        println!(
            "  {:<26} good {:>7}  ni {:>7}  poor {:>7}  p75 {}",
            point.label(),
            pct(point.good).green(),
            pct(point.needs_improvement).yellow(),
            pct(point.poor).red(),
            p75
        );
    }
}

async fn history(
    config: &AppConfig,
    url: &str,
    form_factor: FormFactor,
    metric: Option<HistoryMetric>,
    json: bool,
) -> anyhow::Result<()> {
    let adapter = CruxAdapter::new(config.crux())?;
    let record = adapter.query_history(url, form_factor).await?;
    info!(
        scope = %record.scope,
        queried = %record.queried,
        form_factor = %record.form_factor,
        "CrUX history found"
    );

    let series: Vec<HistorySeries> = match metric {
        Some(m) => history_series(&record.record, m).into_iter().collect(),
        None => all_series(&record.record),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    println!(
        "{} {} ({}, {} data)",
        "CrUX history for".bold(),
        record.queried,
        record.form_factor,
        record.scope
    );
    if series.is_empty() {
        println!("No history data available.");
    }
    for s in &series {
        print_series(s);
    }
    Ok(())
}

fn print_lcp(url: &str, analysis: &LcpAnalysis) {
    let lcp = format!("{:.2}s", analysis.lcp_seconds);
    let rating = analysis.rating.to_string();
    let rating = match analysis.rating {
        LcpRating::Good => rating.green(),
        LcpRating::NeedsImprovement => rating.yellow(),
        LcpRating::Poor => rating.red(),
    };
    println!("{} {}", "LCP analysis for".bold(), url);
    println!("  LCP: {} ({})", lcp.bold(), rating);

    if !analysis.elements.is_empty() {
        println!();
        println!("{}", "LCP element(s):".bold());
        for element in &analysis.elements {
            match element.size {
                Some(size) => println!("  - {} ({} px)", element.node_label, size),
                None => println!("  - {}", element.node_label),
            }
            if let Some(snippet) = &element.snippet {
                println!("    {}", snippet.dimmed());
            }
        }
    }

    if analysis.breakdown.is_empty() {
        println!();
        println!("No LCP phase breakdown reported.");
    } else {
        println!();
        println!("{}", "Timing breakdown:".bold());
        for phase in &analysis.breakdown {
            println!(
                "  {:<14} {:>8.0} ms  {:>5.1}%",
                phase.phase, phase.timing_ms, phase.share
            );
        }
    }
}

async fn lcp(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let adapter = PageSpeedAdapter::new(config.pagespeed())?;
    let analysis = adapter.analyze_lcp(url).await?;
    print_lcp(url, &analysis);
    Ok(())
}

fn status(config: &AppConfig, config_path: Option<&Path>, detailed: bool) {
    println!("{}", "PageSpeed Report".bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));

    let key = config
        .api_key()
        .map_or_else(|| "not set".yellow().to_string(), mask_key);
    println!("API key: {}", key);
    println!("Output directory: {}", config.output_dir.display());

    if detailed {
        let file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let present = if file.exists() { "" } else { " (not found)" };

        println!("\nConfiguration file:");
        println!("  - {}{}", file.display(), present);
        println!("\nBatching:");
        println!("  - batch_size: {}", config.batch_size);
        println!("  - batch_delay_ms: {}", config.batch_delay_ms);
        println!("  - request_timeout_secs: {}", config.request_timeout_secs);
        println!("\nEndpoints:");
        println!("  - {}", config.pagespeed_endpoint);
        println!("  - {}", config.crux_endpoint);
        println!("\nOutput files:");
        println!("  - PageSpeed_{{date}}_{{time}}.xlsx");
        println!("  - {}", io::REPORT_FILE);
        println!("  - {}", io::SUMMARY_FILE);
        println!("  - {}", io::DETAILS_FILE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_urls_merges_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(&path, "https://b.test/\nhttps://a.test/, not-a-url\n").unwrap();

        let list = collect_urls(&["https://a.test/".to_string()], Some(&path)).unwrap();
        assert_eq!(list.urls, vec!["https://a.test/", "https://b.test/"]);
        assert_eq!(list.rejected, vec!["not-a-url"]);
    }

    #[test]
    fn test_collect_urls_requires_one() {
        assert!(collect_urls(&["example.com".to_string()], None).is_err());
        assert!(collect_urls(&[], Some(Path::new("/nonexistent/urls.txt"))).is_err());
    }

    #[test]
    fn test_sort_config() {
        assert_eq!(sort_config(None, false).unwrap(), SortConfig::default());

        let config = sort_config(Some("desktop_inp"), true).unwrap();
        assert_eq!(config.key, Some("desktop_inp"));
        assert_eq!(config.direction, Direction::Desc);

        assert!(sort_config(Some("mobile_source"), false).is_err());
        assert!(sort_config(Some("nope"), false).is_err());
    }
}
