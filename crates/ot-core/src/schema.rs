//! Explicit column sets.
//!
//! A schema is fixed by the first record that produces it and every later
//! record or source is validated against it. Columns are never unioned or
//! dropped to make two schemas agree; a record whose columns arrive in another
//! order is realigned by name.

use std::collections::HashSet;

use crate::error::{SeriesError, SeriesResult};
use crate::value::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub name: String,
    pub role: Role,
}

impl Column {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema, rejecting repeated column names.
    pub fn new(columns: Vec<Column>) -> SeriesResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SeriesError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.role)
    }

    /// Position in `other` of each column of this schema, in this schema's
    /// order. Fails with `SchemaMismatch` unless both hold the same set of
    /// columns; order may differ.
    pub fn alignment(&self, other: &Schema, context: &str) -> SeriesResult<Vec<usize>> {
        let mismatch = || SeriesError::SchemaMismatch {
            context: context.to_string(),
            expected: self.names().map(str::to_string).collect(),
            found: other.names().map(str::to_string).collect(),
        };
        if self.len() != other.len() {
            return Err(mismatch());
        }
        self.columns
            .iter()
            .map(|c| other.columns.iter().position(|o| o == c).ok_or_else(mismatch))
            .collect()
    }

    pub fn ensure_matches(&self, other: &Schema, context: &str) -> SeriesResult<()> {
        self.alignment(other, context).map(|_| ())
    }

    /// Columns of all parts side by side, in order.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Schema>) -> SeriesResult<Schema> {
        let columns = parts
            .into_iter()
            .flat_map(|s| s.columns.iter().cloned())
            .collect();
        Schema::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> Schema {
        Schema::new(names.iter().map(|n| Column::new(*n, Role::DesignVar)).collect()).unwrap()
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = Schema::new(vec![
            Column::new("x", Role::DesignVar),
            Column::new("x", Role::Constraint),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SeriesError::DuplicateColumn {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn mismatch_reports_both_sides() {
        let a = schema(&["x", "y"]);
        let b = schema(&["x", "z"]);
        match a.ensure_matches(&b, "case 3") {
            Err(SeriesError::SchemaMismatch {
                context,
                expected,
                found,
            }) => {
                assert_eq!(context, "case 3");
                assert_eq!(expected, ["x", "y"]);
                assert_eq!(found, ["x", "z"]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn reordered_columns_align_by_name() {
        let order = schema(&["x", "y", "z"])
            .alignment(&schema(&["z", "x", "y"]), "t")
            .unwrap();
        assert_eq!(order, [1, 2, 0]);
    }

    #[test]
    fn same_name_other_role_is_a_mismatch() {
        let a = Schema::new(vec![Column::new("g", Role::Constraint)]).unwrap();
        let b = Schema::new(vec![Column::new("g", Role::Objective)]).unwrap();
        assert!(a.ensure_matches(&b, "t").is_err());
    }

    #[test]
    fn subset_is_a_mismatch() {
        assert!(schema(&["x", "y"]).ensure_matches(&schema(&["x"]), "t").is_err());
        assert!(schema(&["x"]).ensure_matches(&schema(&["x", "y"]), "t").is_err());
    }

    #[test]
    fn concat_keeps_order_and_roles() {
        let a = Schema::new(vec![Column::new("f", Role::Objective)]).unwrap();
        let b = Schema::new(vec![Column::new("g", Role::Constraint)]).unwrap();
        let joined = Schema::concat([&a, &b]).unwrap();
        assert_eq!(joined.names().collect::<Vec<_>>(), ["f", "g"]);
        assert_eq!(joined.role_of("g"), Some(Role::Constraint));
        assert_eq!(joined.position("g"), Some(1));
    }
}
