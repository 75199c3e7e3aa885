//! Query helpers for extracting data from loaded histories.

use ot_core::{HistorySeries, Role};
use ot_trace::{Episode, SolverKind};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Summary of a history table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub record_count: usize,
    pub iteration_range: Option<(usize, usize)>,
    /// Column names grouped by role, roles in first-seen order.
    pub columns_by_role: Vec<(Role, Vec<String>)>,
}

pub fn summarize_history(table: &HistorySeries) -> HistorySummary {
    let mut columns_by_role: Vec<(Role, Vec<String>)> = Vec::new();
    for column in table.schema().columns() {
        match columns_by_role.iter_mut().find(|(r, _)| *r == column.role) {
            Some((_, names)) => names.push(column.name.clone()),
            None => columns_by_role.push((column.role, vec![column.name.clone()])),
        }
    }

    let iteration_range = table
        .records()
        .first()
        .zip(table.records().last())
        .map(|(first, last)| (first.iteration, last.iteration));

    HistorySummary {
        record_count: table.len(),
        iteration_range,
        columns_by_role,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub index: usize,
    pub records: usize,
    pub first_iteration: Option<usize>,
    pub final_absolute: Option<f64>,
    pub final_relative: Option<f64>,
}

/// Per-episode convergence summary of a residual log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualLogSummary {
    pub kind: SolverKind,
    pub episodes: Vec<EpisodeSummary>,
    pub total_records: usize,
}

pub fn summarize_residuals(kind: SolverKind, episodes: &[Episode]) -> ResidualLogSummary {
    let summaries: Vec<EpisodeSummary> = episodes
        .iter()
        .enumerate()
        .map(|(index, episode)| EpisodeSummary {
            index,
            records: episode.len(),
            first_iteration: episode.first_iteration(),
            final_absolute: episode.last().map(|r| r.absolute),
            final_relative: episode.last().map(|r| r.relative),
        })
        .collect();

    ResidualLogSummary {
        kind,
        total_records: summaries.iter().map(|s| s.records).sum(),
        episodes: summaries,
    }
}

/// Extract `(iteration, value)` pairs for one column.
pub fn extract_column(table: &HistorySeries, name: &str) -> AppResult<Vec<(usize, f64)>> {
    let Some(idx) = table.schema().position(name) else {
        return Err(AppError::InvalidInput(format!("Unknown column: {}", name)));
    };
    Ok(table
        .records()
        .iter()
        .map(|r| (r.iteration, r.values[idx]))
        .collect())
}
