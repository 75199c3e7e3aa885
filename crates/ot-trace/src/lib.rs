//! ot-trace: readers that turn optimization run output into history series.

pub mod case_store;
pub mod residual_log;
pub mod stack;
pub mod structured;

pub use case_store::{CaseEntry, CaseSource, JsonlCaseStore, VarGroup};
pub use residual_log::{
    Episode, EpisodeSegmenter, ResidualRecord, SolverKind, episodes_to_series, read_residual_log,
    segment, segment_records,
};
pub use stack::{stack_histories, stack_sources};
pub use structured::{Group, OptimizationHistory, TableColumns, read_history};

use ot_core::SeriesError;

pub type TraceResult<T> = Result<T, TraceError>;

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed case record at line {line_no}: {source}")]
    Json {
        line_no: usize,
        source: serde_json::Error,
    },

    #[error("Failed to encode case record: {0}")]
    Encode(serde_json::Error),

    #[error("Unparsable residual line {line_no} ({what}): {line:?}")]
    Parse {
        line_no: usize,
        line: String,
        what: &'static str,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

impl TraceError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, TraceError::Series(SeriesError::SchemaMismatch { .. }))
    }
}
