//! Append-only history series indexed by a global iteration counter.

use crate::error::{SeriesError, SeriesResult};
use crate::schema::Schema;

/// One row of a history series: the iteration plus one value per column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceRecord {
    pub iteration: usize,
    pub values: Vec<f64>,
}

/// Ordered records whose iterations start at 0 and grow by exactly one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySeries {
    schema: Schema,
    records: Vec<TraceRecord>,
}

impl HistorySeries {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// No columns, no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_iteration(&self) -> Option<usize> {
        self.records.last().map(|r| r.iteration)
    }

    /// Iteration the next pushed row will receive.
    pub fn next_iteration(&self) -> usize {
        self.last_iteration().map_or(0, |i| i + 1)
    }

    pub fn iterations(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.iter().map(|r| r.iteration)
    }

    /// Append a row at the next iteration and return that iteration.
    pub fn push(&mut self, values: Vec<f64>) -> SeriesResult<usize> {
        if values.len() != self.schema.len() {
            return Err(SeriesError::RowWidth {
                expected: self.schema.len(),
                found: values.len(),
            });
        }
        let iteration = self.next_iteration();
        self.records.push(TraceRecord { iteration, values });
        Ok(iteration)
    }

    /// Append a prebuilt record, checking that it continues the series.
    pub fn push_record(&mut self, record: TraceRecord) -> SeriesResult<()> {
        if record.iteration != self.next_iteration() {
            return Err(SeriesError::Invariant {
                what: "iteration must continue the series by exactly one",
            });
        }
        self.push(record.values).map(|_| ())
    }

    /// All values of one column, in iteration order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.schema.position(name)?;
        Some(self.records.iter().map(|r| r.values[idx]).collect())
    }

    /// Records with an iteration strictly after `watermark`, or every record
    /// when nothing has been delivered yet.
    pub fn records_after(&self, watermark: Option<usize>) -> &[TraceRecord] {
        match watermark {
            None => &self.records,
            Some(w) => {
                let start = self.records.partition_point(|r| r.iteration <= w);
                &self.records[start..]
            }
        }
    }

    /// Append a continuation run.
    ///
    /// The first record of `next` repeats this series' last record and is
    /// dropped, so `next` is shifted by `len - 1` rather than `len`. When this
    /// series has no rows yet, `next` is taken whole. `context` names the
    /// source in a `SchemaMismatch`. Columns of `next` are matched by name, so
    /// a run that lists them in another order is realigned.
    pub fn append_continuation(
        &mut self,
        next: HistorySeries,
        context: &str,
    ) -> SeriesResult<()> {
        let order = self.schema.alignment(&next.schema, context)?;
        let skip = usize::from(!self.records.is_empty());
        for record in next.records.into_iter().skip(skip) {
            self.push(reorder(&record.values, &order))?;
        }
        Ok(())
    }

    /// Append a row whose values follow `schema`, realigned to this series'
    /// column order.
    pub fn push_aligned(
        &mut self,
        schema: &Schema,
        values: &[f64],
        context: &str,
    ) -> SeriesResult<usize> {
        if values.len() != schema.len() {
            return Err(SeriesError::RowWidth {
                expected: schema.len(),
                found: values.len(),
            });
        }
        let order = self.schema.alignment(schema, context)?;
        self.push(reorder(values, &order))
    }

    /// Join row-aligned series column-wise.
    ///
    /// Parts without columns are left out. The remaining parts must cover the
    /// same iterations.
    pub fn hconcat(parts: &[&HistorySeries]) -> SeriesResult<HistorySeries> {
        let parts: Vec<&HistorySeries> = parts
            .iter()
            .copied()
            .filter(|p| !p.schema.is_empty())
            .collect();
        let Some(first) = parts.first() else {
            return Ok(HistorySeries::empty());
        };
        let schema = Schema::concat(parts.iter().map(|p| &p.schema))?;
        for part in &parts[1..] {
            if !part.iterations().eq(first.iterations()) {
                return Err(SeriesError::Invariant {
                    what: "joined series must cover the same iterations",
                });
            }
        }

        let records = first
            .records
            .iter()
            .enumerate()
            .map(|(row, record)| TraceRecord {
                iteration: record.iteration,
                values: parts
                    .iter()
                    .flat_map(|p| p.records[row].values.iter().copied())
                    .collect(),
            })
            .collect();
        Ok(HistorySeries { schema, records })
    }
}

fn reorder(values: &[f64], order: &[usize]) -> Vec<f64> {
    order.iter().map(|&i| values[i]).collect()
}
