//! Flat-file export of a history table.
//!
//! Two formats: CSV, and a point-ordered table readable by plotting tools that
//! expect the three-line header
//!
//! ```text
//! TITLE     = "OpenMDAO Record"
//! VARIABLES =Iteration "f" "x"
//! ZONE T="OpenMDAO"  I=2, ZONETYPE=Ordered DATAPACKING=POINT
//! ```
//!
//! The header bytes are fixed; existing stacking and conversion workflows
//! depend on them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ot_core::HistorySeries;
use tracing::info;

use crate::error::{AppError, AppResult};

const POINT_TITLE: &str = "OpenMDAO Record";
const POINT_ZONE: &str = "OpenMDAO";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `.dat`
    PointTable,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("dat") => ExportFormat::PointTable,
            _ => ExportFormat::Csv,
        }
    }
}

/// Format like C's `%.18e`: 18 fractional digits and a signed exponent of at
/// least two digits.
pub fn format_sci(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{:.18e}", x);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => formatted,
    }
}

pub fn write_point_table<W: Write>(table: &HistorySeries, mut out: W) -> AppResult<()> {
    let mut variables = String::from("Iteration");
    for name in table.schema().names() {
        variables.push_str(&format!(" \"{}\"", name));
    }
    writeln!(out, "TITLE     = \"{}\"", POINT_TITLE)?;
    writeln!(out, "VARIABLES ={}", variables)?;
    writeln!(
        out,
        "ZONE T=\"{}\"  I={}, ZONETYPE=Ordered DATAPACKING=POINT",
        POINT_ZONE,
        table.len()
    )?;

    for record in table.records() {
        let mut line = format_sci(record.iteration as f64);
        for v in &record.values {
            line.push(' ');
            line.push_str(&format_sci(*v));
        }
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv<W: Write>(table: &HistorySeries, out: W) -> AppResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec!["Iteration".to_string()];
    header.extend(table.schema().names().map(str::to_string));
    writer.write_record(&header)?;

    for record in table.records() {
        let mut row = Vec::with_capacity(record.values.len() + 1);
        row.push(record.iteration.to_string());
        row.extend(record.values.iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `table` to `path`, choosing the format from the extension.
pub fn export_table(table: &HistorySeries, path: &Path) -> AppResult<ExportFormat> {
    let format = ExportFormat::from_path(path);
    let file = File::create(path).map_err(|e| AppError::ExportWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let out = BufWriter::new(file);
    match format {
        ExportFormat::PointTable => write_point_table(table, out)?,
        ExportFormat::Csv => write_csv(table, out)?,
    }
    info!(
        path = %path.display(),
        rows = table.len(),
        format = ?format,
        "exported history"
    );
    Ok(format)
}
