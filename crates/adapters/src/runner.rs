// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batched fetch loop.
//!
//! URLs are processed in fixed-size batches. Inside a batch every URL gets
//! its own future, and each future requests mobile then desktop in turn, so
//! no more than `batch_size` requests are in flight at once. Batches are
//! separated by a fixed delay to stay under the API's rate limit.
//!
//! A failed request never aborts the run: the error text is stored on that
//! URL's row and the loop moves on.

use crate::MetricsSource;
use futures::future::join_all;
use pagespeed_report_core::normalize::strategy_metrics;
use pagespeed_report_core::{ReportRow, ReportRun, Strategy};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of URLs fetched concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default pause between batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1500);

/// Drives a report generation over a [`MetricsSource`].
pub struct BatchRunner<S> {
    source: S,
    batch_size: usize,
    batch_delay: Duration,
}

impl<S: MetricsSource> BatchRunner<S> {
    /// Runner with the default batch size and delay.
    pub fn new(source: S) -> Self {
        Self {
            source,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Set the batch size; values below 1 are raised to 1.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        if batch_size == 0 {
            warn!("batch size 0 requested, using 1");
        }
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the pause between batches.
    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch both strategies for one URL.
    async fn fetch_row(&self, url: &str) -> ReportRow {
        let mut row = ReportRow::new(url);

        for strategy in Strategy::ALL {
            match self.source.fetch(url, strategy).await {
                Ok(data) => row.set_metrics(strategy, strategy_metrics(&data, strategy)),
                Err(e) => {
                    warn!(url = %url, strategy = %strategy, error = %e, "PageSpeed request failed");
                    row.push_error(format!("{}: {}", strategy, e));
                }
            }
        }

        row
    }

    /// Fetch every URL and return one row per URL, in input order.
    ///
    /// `on_progress` is called after each batch.
    pub async fn run<F>(&self, urls: &[String], mut on_progress: F) -> (Vec<ReportRow>, ReportRun)
    where
        F: FnMut(&ReportRun),
    {
        let mut run = ReportRun::new(
            urls.len(),
            self.batch_size,
            self.batch_delay.as_millis() as u64,
        );
        let mut rows = Vec::with_capacity(urls.len());
        let batch_count = urls.len().div_ceil(self.batch_size);

        info!(
            run_id = %run.run_id,
            urls = urls.len(),
            batches = batch_count,
            batch_size = self.batch_size,
            "starting report run"
        );

        for (index, batch) in urls.chunks(self.batch_size).enumerate() {
            debug!(batch = index + 1, of = batch_count, size = batch.len(), "fetching batch");

            let batch_rows = join_all(batch.iter().map(|url| self.fetch_row(url))).await;
            for row in &batch_rows {
                run.record(row);
            }
            rows.extend(batch_rows);
            on_progress(&run);

            if index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        run.complete();
        info!(
            run_id = %run.run_id,
            succeeded = run.succeeded(),
            failed = run.failed,
            duration_ms = run.duration_ms.unwrap_or_default(),
            "report run finished"
        );

        (rows, run)
    }
}
