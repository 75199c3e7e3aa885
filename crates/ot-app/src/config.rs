//! Live monitor configuration.
//!
//! ```yaml
//! refresh_interval_s: 10
//! include_design_vars: false
//! source:
//!   kind: cases
//!   paths: [opt_1.jsonl, opt_2.jsonl]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ot_trace::{SolverKind, TableColumns};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Where a history is re-derived from on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistorySource {
    /// Case stores of sequential restart runs, stacked in order.
    Cases { paths: Vec<PathBuf> },
    /// Captured solver output.
    ResidualLog { path: PathBuf, solver: SolverKind },
}

impl Default for HistorySource {
    fn default() -> Self {
        HistorySource::Cases { paths: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub refresh_interval_s: f64,
    pub source: HistorySource,
    pub include_design_vars: bool,
    pub include_constraints: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_s: 30.0,
            source: HistorySource::default(),
            include_design_vars: true,
            include_constraints: true,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> AppResult<()> {
        if !(self.refresh_interval_s.is_finite() && self.refresh_interval_s > 0.0) {
            return Err(AppError::Config(format!(
                "refresh_interval_s must be positive, got {}",
                self.refresh_interval_s
            )));
        }
        if let HistorySource::Cases { paths } = &self.source
            && paths.is_empty()
        {
            return Err(AppError::Config(
                "at least one case store path is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval_s)
    }

    pub fn table_columns(&self) -> TableColumns {
        TableColumns {
            constraints: self.include_constraints,
            design_vars: self.include_design_vars,
        }
    }
}

/// Load monitor configuration from a YAML file. Validation is left to the
/// caller so command-line overrides can be applied first.
pub fn load_config(path: &Path) -> AppResult<MonitorConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: MonitorConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: MonitorConfig = serde_yaml::from_str(
            "source:\n  kind: residual_log\n  path: run.out\n  solver: linear\n",
        )
        .unwrap();
        assert_eq!(config.refresh_interval_s, 30.0);
        assert!(config.include_design_vars);
        assert_eq!(
            config.source,
            HistorySource::ResidualLog {
                path: PathBuf::from("run.out"),
                solver: SolverKind::Linear,
            }
        );
        config.validate().unwrap();
    }

    #[test]
    fn cases_source_with_flags() {
        let config: MonitorConfig = serde_yaml::from_str(
            "refresh_interval_s: 2.5\ninclude_design_vars: false\nsource:\n  kind: cases\n  paths: [a.jsonl, b.jsonl]\n",
        )
        .unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_millis(2500));
        assert_eq!(
            config.table_columns(),
            TableColumns {
                constraints: true,
                design_vars: false
            }
        );
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = MonitorConfig::default();
        assert!(config.validate().is_err());

        config.source = HistorySource::Cases {
            paths: vec![PathBuf::from("a.jsonl")],
        };
        config.validate().unwrap();

        config.refresh_interval_s = 0.0;
        assert!(config.validate().is_err());
    }
}
