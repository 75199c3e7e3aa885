//! Flatten per-case variable groups into three row-aligned series.

use ot_core::{Column, HistorySeries, Role, Schema};
use tracing::debug;

use crate::case_store::{CaseEntry, CaseSource, VarGroup};
use crate::TraceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Objectives,
    Constraints,
    DesignVars,
}

impl Group {
    pub fn role(self) -> Role {
        match self {
            Group::Objectives => Role::Objective,
            Group::Constraints => Role::Constraint,
            Group::DesignVars => Role::DesignVar,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Group::Objectives => "objectives",
            Group::Constraints => "constraints",
            Group::DesignVars => "design variables",
        }
    }

    fn of(self, case: &CaseEntry) -> &VarGroup {
        match self {
            Group::Objectives => case.objectives(),
            Group::Constraints => case.constraints(),
            Group::DesignVars => case.design_vars(),
        }
    }
}

/// Which optional groups a flat table includes. Objectives are always in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableColumns {
    pub constraints: bool,
    pub design_vars: bool,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            constraints: true,
            design_vars: true,
        }
    }
}

/// Objective, constraint and design-variable histories of one run (or of
/// several stacked runs).
///
/// Every series with columns has one row per case; a group whose column set
/// is empty has no rows at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptimizationHistory {
    pub objectives: HistorySeries,
    pub constraints: HistorySeries,
    pub design_vars: HistorySeries,
    case_count: usize,
}

impl OptimizationHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn case_count(&self) -> usize {
        self.case_count
    }

    pub fn is_empty(&self) -> bool {
        self.case_count == 0
    }

    pub fn group(&self, group: Group) -> &HistorySeries {
        match group {
            Group::Objectives => &self.objectives,
            Group::Constraints => &self.constraints,
            Group::DesignVars => &self.design_vars,
        }
    }

    /// Objectives, then constraints, then design variables.
    pub fn flat_table(&self, columns: TableColumns) -> TraceResult<HistorySeries> {
        let mut parts = vec![&self.objectives];
        if columns.constraints {
            parts.push(&self.constraints);
        }
        if columns.design_vars {
            parts.push(&self.design_vars);
        }
        Ok(HistorySeries::hconcat(&parts)?)
    }

    pub fn objectives_and_constraints(&self) -> TraceResult<HistorySeries> {
        self.flat_table(TableColumns {
            constraints: true,
            design_vars: false,
        })
    }

    /// Stack a continuation run onto this history.
    ///
    /// Both runs must carry the same column set in every group. A run with
    /// no cases is ignored.
    pub fn append_continuation(
        &mut self,
        next: OptimizationHistory,
        label: &str,
    ) -> TraceResult<()> {
        if next.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = next;
            return Ok(());
        }
        // Check every group before touching any, so a mismatch leaves self whole.
        for group in [Group::Objectives, Group::Constraints, Group::DesignVars] {
            let context = format!("{} of {label}", group.label());
            self.group(group)
                .schema()
                .ensure_matches(next.group(group).schema(), &context)?;
        }
        let OptimizationHistory {
            objectives,
            constraints,
            design_vars,
            case_count,
        } = next;
        self.objectives
            .append_continuation(objectives, &format!("objectives of {label}"))?;
        self.constraints
            .append_continuation(constraints, &format!("constraints of {label}"))?;
        self.design_vars
            .append_continuation(design_vars, &format!("design variables of {label}"))?;
        self.case_count += case_count - 1;
        Ok(())
    }
}

/// Flatten one group: scalars keep their key, vectors expand to `{key}_{i}`.
pub fn flatten_group(group: &VarGroup, role: Role) -> TraceResult<(Schema, Vec<f64>)> {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (key, value) in group {
        for (name, v) in value.flatten(key) {
            columns.push(Column::new(name, role));
            values.push(v);
        }
    }
    Ok((Schema::new(columns)?, values))
}

/// Series for one group, with its column set fixed by the first case.
struct GroupBuilder {
    group: Group,
    series: Option<HistorySeries>,
}

impl GroupBuilder {
    fn new(group: Group) -> Self {
        Self {
            group,
            series: None,
        }
    }

    fn add_case(&mut self, case_idx: usize, case: &CaseEntry) -> TraceResult<()> {
        let (schema, values) = flatten_group(self.group.of(case), self.group.role())?;
        if let Some(series) = self.series.as_mut() {
            let context = format!("{} of case {case_idx}", self.group.label());
            if series.schema().is_empty() {
                series.schema().ensure_matches(&schema, &context)?;
            } else {
                series.push_aligned(&schema, &values, &context)?;
            }
            return Ok(());
        }

        let mut series = HistorySeries::new(schema);
        if !series.schema().is_empty() {
            series.push(values)?;
        }
        self.series = Some(series);
        Ok(())
    }

    fn finish(self) -> HistorySeries {
        self.series.unwrap_or_default()
    }
}

/// Read every case of `source` into aligned histories.
pub fn read_history<S: CaseSource + ?Sized>(source: &S) -> TraceResult<OptimizationHistory> {
    let cases = source.cases()?;
    let mut objectives = GroupBuilder::new(Group::Objectives);
    let mut constraints = GroupBuilder::new(Group::Constraints);
    let mut design_vars = GroupBuilder::new(Group::DesignVars);
    for (idx, case) in cases.iter().enumerate() {
        objectives.add_case(idx, case)?;
        constraints.add_case(idx, case)?;
        design_vars.add_case(idx, case)?;
    }

    let history = OptimizationHistory {
        objectives: objectives.finish(),
        constraints: constraints.finish(),
        design_vars: design_vars.finish(),
        case_count: cases.len(),
    };
    debug!(
        cases = history.case_count,
        objectives = history.objectives.schema().len(),
        constraints = history.constraints.schema().len(),
        design_vars = history.design_vars.schema().len(),
        "read optimization history"
    );
    Ok(history)
}
