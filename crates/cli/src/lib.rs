//! CLI for PageSpeed Report.
//!
//! This crate provides the `pagespeed-report` command-line interface:
//! batch report generation (`run`), CrUX history lookups (`history`),
//! LCP diagnostics (`lcp`) and a configuration overview (`status`).

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod commands;
pub mod config;
pub mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use logging::LogFormat;
use pagespeed_report_core::history::HistoryMetric;
use pagespeed_report_core::FormFactor;
use pagespeed_report_output::OutputFormat;
use std::path::PathBuf;

/// PageSpeed Report CLI.
#[derive(Parser, Debug)]
#[command(name = "pagespeed-report")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ./pagespeed-report.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// CrUX form factor accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormFactorArg {
    /// Phones.
    Phone,
    /// Desktop browsers.
    Desktop,
}

impl From<FormFactorArg> for FormFactor {
    fn from(arg: FormFactorArg) -> Self {
        match arg {
            FormFactorArg::Phone => FormFactor::Phone,
            FormFactorArg::Desktop => FormFactor::Desktop,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch mobile and desktop metrics for a list of URLs and write a report.
    ///
    /// URLs may be given as arguments, in a file, or both; entries are
    /// split on whitespace and commas and duplicates are dropped.
    /// Results are written to the output directory:
    /// - PageSpeed_{date}_{time}.xlsx - spreadsheet
    /// - report.json - full report document
    /// - summary.md - Markdown summary
    /// - details.md - per-URL metrics and recommendations
    Run {
        /// URLs to analyse.
        urls: Vec<String>,

        /// File containing URLs.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output directory override.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: all, xlsx, json or markdown.
        #[arg(long, default_value = "all")]
        format: OutputFormat,

        /// Column key to sort the printed table and summary by (e.g. mobile_lcp).
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending.
        #[arg(long, requires = "sort")]
        desc: bool,

        /// URLs fetched concurrently per batch.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between batches in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Show CrUX history for a page, falling back to its origin.
    History {
        /// Page URL.
        url: String,

        /// Form factor.
        #[arg(long, value_enum, default_value_t = FormFactorArg::Phone)]
        form_factor: FormFactorArg,

        /// Single metric (lcp, cls, inp, fcp); all when omitted.
        #[arg(short, long)]
        metric: Option<HistoryMetric>,

        /// Print the series as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Analyse a page's Largest Contentful Paint (mobile).
    Lcp {
        /// Page URL.
        url: String,
    },

    /// Show version and resolved configuration.
    Status {
        /// Show detailed status information.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if the command fails.
pub async fn run() -> anyhow::Result<()> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    commands::execute(cli).await
}
