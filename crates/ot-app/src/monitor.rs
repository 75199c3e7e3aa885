//! Poll-driven live monitor.
//!
//! The monitor owns one diff engine and re-derives the history on every poll,
//! so only the watermark survives between polls.

use std::thread;
use std::time::Duration;

use ot_core::{Delta, IncrementalDiffEngine, Watermark};
use ot_trace::TableColumns;
use tracing::{debug, info, warn};

use crate::config::{HistorySource, MonitorConfig};
use crate::error::{AppError, AppResult};
use crate::history_service::load_history;

#[derive(Debug)]
pub struct LiveMonitor {
    source: HistorySource,
    columns: TableColumns,
    engine: IncrementalDiffEngine,
}

impl LiveMonitor {
    pub fn new(source: HistorySource, columns: TableColumns) -> Self {
        Self {
            source,
            columns,
            engine: IncrementalDiffEngine::new(),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self::new(config.source.clone(), config.table_columns()))
    }

    pub fn source(&self) -> &HistorySource {
        &self.source
    }

    pub fn watermark(&self) -> Watermark {
        self.engine.watermark()
    }

    /// Re-read the source and return rows not delivered yet.
    pub fn poll(&mut self) -> AppResult<Delta> {
        let series = load_history(&self.source, self.columns)?;
        let delta = self.engine.poll(&series);
        debug!(
            rows = series.len(),
            new_rows = delta.len(),
            watermark = ?self.engine.watermark().get(),
            "polled history"
        );
        if !delta.is_empty() {
            info!(
                first = delta.new_iterations.first().copied(),
                last = delta.new_iterations.last().copied(),
                "new iterations available"
            );
        }
        Ok(delta)
    }

    /// Poll every `interval` until `max_polls` is reached (forever when
    /// `None`), handing each non-empty delta to `on_delta`. Returns the number
    /// of polls made.
    ///
    /// A source that fails to read is reported and retried on the next poll;
    /// errors from `on_delta` stop the loop.
    pub fn run<F>(
        &mut self,
        interval: Duration,
        max_polls: Option<usize>,
        mut on_delta: F,
    ) -> AppResult<usize>
    where
        F: FnMut(&Delta) -> AppResult<()>,
    {
        let mut polls = 0usize;
        loop {
            match self.poll() {
                Ok(delta) if !delta.is_empty() => on_delta(&delta)?,
                Ok(_) => {}
                Err(AppError::Trace(err)) => warn!(error = %err, "poll failed, will retry"),
                Err(err) => return Err(err),
            }
            polls += 1;
            if max_polls.is_some_and(|max| polls >= max) {
                return Ok(polls);
            }
            thread::sleep(interval);
        }
    }
}
