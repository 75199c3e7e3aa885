//! ot-core: stable foundation for optimization trace handling.
//!
//! Contains:
//! - value (scalar/vector variable values + column roles)
//! - schema (ordered, validated column sets)
//! - series (append-only, iteration-indexed history series)
//! - delta (watermark-based incremental diff engine)
//! - error (shared error types)

pub mod delta;
pub mod error;
pub mod schema;
pub mod series;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use delta::{Delta, IncrementalDiffEngine, Watermark};
pub use error::{SeriesError, SeriesResult};
pub use schema::{Column, Schema};
pub use series::{HistorySeries, TraceRecord};
pub use value::{Role, Value};
