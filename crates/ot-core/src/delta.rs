//! Watermark-based incremental diff engine for live views.
//!
//! Each poll receives a freshly re-derived [`HistorySeries`] and returns only
//! the rows the consumer has not seen yet. The watermark is the last iteration
//! already delivered; it starts undefined and never decreases.

use indexmap::IndexMap;

use crate::series::HistorySeries;

/// Last iteration delivered to one consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Watermark(Option<usize>);

impl Watermark {
    pub const UNDEFINED: Watermark = Watermark(None);

    pub fn get(self) -> Option<usize> {
        self.0
    }

    pub fn is_defined(self) -> bool {
        self.0.is_some()
    }
}

/// Rows that became available since the previous poll, column-aligned to
/// `new_iterations`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Delta {
    pub new_iterations: Vec<usize>,
    pub columns: IndexMap<String, Vec<f64>>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.new_iterations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.new_iterations.len()
    }
}

/// Not reentrant: `poll` takes `&mut self`, so sharing one engine across
/// threads needs a lock held by the caller.
#[derive(Debug, Default)]
pub struct IncrementalDiffEngine {
    watermark: Watermark,
}

impl IncrementalDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    /// Forget everything delivered so far.
    pub fn reset(&mut self) {
        self.watermark = Watermark::UNDEFINED;
    }

    /// Rows of `series` past the watermark. Advances the watermark to the
    /// last returned iteration; an empty delta leaves it untouched.
    pub fn poll(&mut self, series: &HistorySeries) -> Delta {
        let fresh = series.records_after(self.watermark.get());
        let Some(last) = fresh.last() else {
            return Delta::default();
        };

        let mut columns: IndexMap<String, Vec<f64>> = series
            .schema()
            .names()
            .map(|name| (name.to_string(), Vec::with_capacity(fresh.len())))
            .collect();
        for record in fresh {
            for (values, &v) in columns.values_mut().zip(&record.values) {
                values.push(v);
            }
        }

        self.watermark = Watermark(Some(last.iteration));
        Delta {
            new_iterations: fresh.iter().map(|r| r.iteration).collect(),
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Schema};
    use crate::value::Role;

    fn objective_series(values: &[f64]) -> HistorySeries {
        let schema = Schema::new(vec![Column::new("f", Role::Objective)]).unwrap();
        let mut s = HistorySeries::new(schema);
        for v in values {
            s.push(vec![*v]).unwrap();
        }
        s
    }

    #[test]
    fn empty_series_with_undefined_watermark() {
        let mut engine = IncrementalDiffEngine::new();
        let delta = engine.poll(&HistorySeries::empty());
        assert!(delta.is_empty());
        assert_eq!(engine.watermark(), Watermark::UNDEFINED);
    }

    #[test]
    fn first_poll_delivers_everything() {
        let mut engine = IncrementalDiffEngine::new();
        let delta = engine.poll(&objective_series(&[3.0, 2.0]));
        assert_eq!(delta.new_iterations, [0, 1]);
        assert_eq!(delta.columns["f"], [3.0, 2.0]);
        assert_eq!(engine.watermark().get(), Some(1));
    }

    #[test]
    fn shrunken_series_leaves_watermark() {
        let mut engine = IncrementalDiffEngine::new();
        engine.poll(&objective_series(&[3.0, 2.0, 1.0]));
        let delta = engine.poll(&objective_series(&[3.0]));
        assert!(delta.is_empty());
        assert_eq!(engine.watermark().get(), Some(2));
    }

    #[test]
    fn reset_redelivers() {
        let mut engine = IncrementalDiffEngine::new();
        let s = objective_series(&[3.0, 2.0]);
        engine.poll(&s);
        engine.reset();
        assert!(!engine.watermark().is_defined());
        assert_eq!(engine.poll(&s).len(), 2);
    }
}
