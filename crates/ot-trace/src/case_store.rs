//! Case-record stores.
//!
//! A case is one recorded driver iteration holding three name->value groups.
//! [`CaseSource`] is the seam readers depend on; [`JsonlCaseStore`] is the
//! on-disk implementation, one JSON object per line:
//!
//! ```text
//! {"design_vars": {"x": 3.0, "y": [1.0, 2.0]}, "objectives": {"f": -3.0}}
//! ```

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use ot_core::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{TraceError, TraceResult};

/// Variables of one group, in recording order.
pub type VarGroup = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseEntry {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub design_vars: VarGroup,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub objectives: VarGroup,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub constraints: VarGroup,
}

impl CaseEntry {
    pub fn design_vars(&self) -> &VarGroup {
        &self.design_vars
    }

    pub fn objectives(&self) -> &VarGroup {
        &self.objectives
    }

    pub fn constraints(&self) -> &VarGroup {
        &self.constraints
    }

    pub fn with_design_var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.design_vars.insert(name.to_string(), value.into());
        self
    }

    pub fn with_objective(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.objectives.insert(name.to_string(), value.into());
        self
    }

    pub fn with_constraint(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.constraints.insert(name.to_string(), value.into());
        self
    }
}

/// Ordered cases of one optimization run.
pub trait CaseSource {
    /// All cases recorded so far, in order. A store that does not exist yet
    /// has no cases.
    fn cases(&self) -> TraceResult<Vec<CaseEntry>>;
}

impl CaseSource for [CaseEntry] {
    fn cases(&self) -> TraceResult<Vec<CaseEntry>> {
        Ok(self.to_vec())
    }
}

impl CaseSource for Vec<CaseEntry> {
    fn cases(&self) -> TraceResult<Vec<CaseEntry>> {
        Ok(self.clone())
    }
}

impl<T: CaseSource + ?Sized> CaseSource for &T {
    fn cases(&self) -> TraceResult<Vec<CaseEntry>> {
        (**self).cases()
    }
}

/// JSON-lines case store on disk.
#[derive(Debug, Clone)]
pub struct JsonlCaseStore {
    path: PathBuf,
}

impl JsonlCaseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append one case, creating the store if needed.
    pub fn append_case(&self, case: &CaseEntry) -> TraceResult<()> {
        let mut line = serde_json::to_string(case).map_err(TraceError::Encode)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Replace the store contents.
    pub fn write_cases(&self, cases: &[CaseEntry]) -> TraceResult<()> {
        let mut content = String::new();
        for case in cases {
            let line = serde_json::to_string(case).map_err(TraceError::Encode)?;
            content.push_str(&line);
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CaseSource for JsonlCaseStore {
    fn cases(&self) -> TraceResult<Vec<CaseEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "case store not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let complete = content.ends_with('\n');
        let line_count = content.lines().count();
        let mut cases = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CaseEntry>(line) {
                Ok(case) => cases.push(case),
                // A writer may still be appending the last line.
                Err(_) if !complete && idx + 1 == line_count => {
                    debug!(
                        path = %self.path.display(),
                        line_no = idx + 1,
                        "skipping partially written case"
                    );
                }
                Err(source) => {
                    return Err(TraceError::Json {
                        line_no: idx + 1,
                        source,
                    });
                }
            }
        }
        Ok(cases)
    }
}
