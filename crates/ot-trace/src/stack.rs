//! Stack sequential restart runs into one history.
//!
//! A restarted optimization records the previous run's final state as its
//! first case, so each continuation run is shifted by `len - 1` and that
//! shared case is kept once.

use tracing::{debug, info};

use crate::TraceResult;
use crate::case_store::CaseSource;
use crate::structured::{OptimizationHistory, read_history};

/// Read and stack `sources` in order. Sources with no cases are skipped.
pub fn stack_sources<S: CaseSource>(sources: &[S]) -> TraceResult<OptimizationHistory> {
    let mut histories = Vec::with_capacity(sources.len());
    for source in sources {
        histories.push(read_history(source)?);
    }
    stack_histories(histories)
}

/// Stack histories that were already read.
pub fn stack_histories<I>(histories: I) -> TraceResult<OptimizationHistory>
where
    I: IntoIterator<Item = OptimizationHistory>,
{
    let mut stacked = OptimizationHistory::empty();
    let mut merged = 0usize;
    for (idx, history) in histories.into_iter().enumerate() {
        if history.is_empty() {
            debug!(source = idx, "skipping source with no cases");
            continue;
        }
        stacked.append_continuation(history, &format!("source {idx}"))?;
        merged += 1;
    }
    info!(
        sources = merged,
        cases = stacked.case_count(),
        "stacked optimization histories"
    );
    Ok(stacked)
}
