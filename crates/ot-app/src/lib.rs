//! Shared application service layer for optimization trace tooling.
//!
//! This crate provides one interface for any frontend, centralizing
//! configuration, history loading, live monitoring, export, and summary
//! queries.

pub mod config;
pub mod error;
pub mod export;
pub mod history_service;
pub mod monitor;
pub mod query;

// Re-export key types for convenience
pub use config::{HistorySource, MonitorConfig, load_config};
pub use error::{AppError, AppResult};
pub use export::{ExportFormat, export_table, format_sci, write_csv, write_point_table};
pub use history_service::{load_cases, load_history, load_residuals};
pub use monitor::LiveMonitor;
pub use query::{
    EpisodeSummary, HistorySummary, ResidualLogSummary, extract_column, summarize_history,
    summarize_residuals,
};
