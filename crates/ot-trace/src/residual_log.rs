//! Block Gauss-Seidel residual logs.
//!
//! Solver output interleaves residual lines such as
//!
//! ```text
//! NL: NLBGS 3 ; 1.2e-03 4.5e-04
//! ```
//!
//! with arbitrary other text. Matching lines are scanned once, in order, and
//! grouped into episodes: one episode per solve, closed whenever the iteration
//! counter returns to the solver's start value.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use ot_core::{Column, HistorySeries, Role, Schema};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{TraceError, TraceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Nonlinear block Gauss-Seidel (`NL: NLBGS`), counts from 1.
    Nonlinear,
    /// Linear block Gauss-Seidel (`LN: LNBGS`), counts from 0.
    Linear,
}

impl SolverKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SolverKind::Nonlinear => "NL: NLBGS",
            SolverKind::Linear => "LN: LNBGS",
        }
    }

    pub fn start_iteration(self) -> usize {
        match self {
            SolverKind::Nonlinear => 1,
            SolverKind::Linear => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SolverKind::Nonlinear => "nlbgs",
            SolverKind::Linear => "lnbgs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualRecord {
    pub iteration: usize,
    pub absolute: f64,
    pub relative: f64,
}

/// Residual records of one solve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Episode {
    records: Vec<ResidualRecord>,
}

impl Episode {
    pub fn records(&self) -> &[ResidualRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_iteration(&self) -> Option<usize> {
        self.records.first().map(|r| r.iteration)
    }

    pub fn last(&self) -> Option<&ResidualRecord> {
        self.records.last()
    }
}

/// Single-pass episode builder.
///
/// There is always exactly one open episode; [`finish`](Self::finish) emits it
/// even when it holds no records.
#[derive(Debug)]
pub struct EpisodeSegmenter {
    kind: SolverKind,
    closed: Vec<Episode>,
    open: Episode,
}

impl EpisodeSegmenter {
    pub fn new(kind: SolverKind) -> Self {
        Self {
            kind,
            closed: Vec::new(),
            open: Episode::default(),
        }
    }

    /// Feed one raw log line. Non-matching lines are skipped; a matching line
    /// whose fields cannot be extracted is an error.
    pub fn feed_line(&mut self, line_no: usize, line: &str) -> TraceResult<()> {
        match parse_line(line, self.kind) {
            Ok(Some(record)) => {
                self.push(record);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(what) => Err(TraceError::Parse {
                line_no,
                line: line.to_string(),
                what,
            }),
        }
    }

    pub fn push(&mut self, record: ResidualRecord) {
        if record.iteration == self.kind.start_iteration() && !self.open.is_empty() {
            self.closed.push(std::mem::take(&mut self.open));
        }
        self.open.records.push(record);
    }

    pub fn finish(mut self) -> Vec<Episode> {
        self.closed.push(self.open);
        self.closed
    }
}

/// Segment already-split log lines.
pub fn segment<I, S>(lines: I, kind: SolverKind) -> TraceResult<Vec<Episode>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segmenter = EpisodeSegmenter::new(kind);
    for (idx, line) in lines.into_iter().enumerate() {
        segmenter.feed_line(idx + 1, line.as_ref())?;
    }
    Ok(segmenter.finish())
}

/// Segment records that were already parsed, e.g. episodes laid end to end.
pub fn segment_records<I>(records: I, kind: SolverKind) -> Vec<Episode>
where
    I: IntoIterator<Item = ResidualRecord>,
{
    let mut segmenter = EpisodeSegmenter::new(kind);
    for record in records {
        segmenter.push(record);
    }
    segmenter.finish()
}

/// Stream a log file from disk. A file that does not exist yet reads as a
/// single empty episode. Invalid UTF-8 bytes are replaced.
pub fn read_residual_log(path: &Path, kind: SolverKind) -> TraceResult<Vec<Episode>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "residual log not found, treating as empty");
            return Ok(vec![Episode::default()]);
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut segmenter = EpisodeSegmenter::new(kind);
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        segmenter.feed_line(line_no, line.trim_end_matches(['\n', '\r']))?;
    }
    let episodes = segmenter.finish();
    debug!(
        path = %path.display(),
        solver = kind.label(),
        episodes = episodes.len(),
        "segmented residual log"
    );
    Ok(episodes)
}

/// Lay episodes end to end on one iteration axis starting at 0.
pub fn episodes_to_series(episodes: &[Episode]) -> TraceResult<HistorySeries> {
    let schema = Schema::new(vec![
        Column::new("episode", Role::Counter),
        Column::new("local_iteration", Role::Counter),
        Column::new("absolute", Role::AbsoluteResidual),
        Column::new("relative", Role::RelativeResidual),
    ])?;
    let mut series = HistorySeries::new(schema);
    for (episode_idx, episode) in episodes.iter().enumerate() {
        for r in episode.records() {
            series.push(vec![
                episode_idx as f64,
                r.iteration as f64,
                r.absolute,
                r.relative,
            ])?;
        }
    }
    Ok(series)
}

/// Text after the solver prefix, if the line carries a residual entry.
fn matched_tail(line: &str, kind: SolverKind) -> Option<&str> {
    let prefix = kind.prefix();
    let mut rest = line;
    while let Some(pos) = rest.find(prefix) {
        let tail = &rest[pos + prefix.len()..];
        if tail
            .trim_start_matches(' ')
            .starts_with(|c: char| c.is_ascii_digit())
        {
            return Some(tail);
        }
        rest = tail;
    }
    None
}

fn parse_line(line: &str, kind: SolverKind) -> Result<Option<ResidualRecord>, &'static str> {
    let Some(tail) = matched_tail(line, kind) else {
        return Ok(None);
    };

    let (iteration_text, _) = tail
        .split_once(';')
        .ok_or("missing ';' after iteration")?;
    let iteration = iteration_text
        .trim()
        .parse::<usize>()
        .map_err(|_| "iteration is not an integer")?;

    let residual_text = tail.rsplit_once(';').map_or("", |(_, r)| r);
    let mut fields = residual_text.split_whitespace();
    let absolute = fields
        .next()
        .ok_or("missing absolute residual")?
        .parse::<f64>()
        .map_err(|_| "absolute residual is not a number")?;
    let relative = fields
        .next()
        .ok_or("missing relative residual")?
        .parse::<f64>()
        .map_err(|_| "relative residual is not a number")?;

    Ok(Some(ResidualRecord {
        iteration,
        absolute,
        relative,
    }))
}
