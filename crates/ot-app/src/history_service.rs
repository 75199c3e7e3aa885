//! History loading. Every call re-reads its source from scratch.

use std::path::{Path, PathBuf};

use ot_core::HistorySeries;
use ot_trace::{
    Episode, JsonlCaseStore, OptimizationHistory, SolverKind, TableColumns, episodes_to_series,
    read_residual_log, stack_sources,
};

use crate::config::HistorySource;
use crate::error::AppResult;

/// Read one or more case stores, stacking them as sequential restart runs.
pub fn load_cases(paths: &[PathBuf]) -> AppResult<OptimizationHistory> {
    let stores: Vec<JsonlCaseStore> = paths.iter().map(JsonlCaseStore::new).collect();
    Ok(stack_sources(&stores)?)
}

pub fn load_residuals(path: &Path, kind: SolverKind) -> AppResult<Vec<Episode>> {
    Ok(read_residual_log(path, kind)?)
}

/// Derive the current flat history for `source`.
pub fn load_history(source: &HistorySource, columns: TableColumns) -> AppResult<HistorySeries> {
    match source {
        HistorySource::Cases { paths } => Ok(load_cases(paths)?.flat_table(columns)?),
        HistorySource::ResidualLog { path, solver } => {
            let episodes = load_residuals(path, *solver)?;
            Ok(episodes_to_series(&episodes)?)
        }
    }
}
