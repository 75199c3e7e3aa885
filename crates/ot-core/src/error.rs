use thiserror::Error;

pub type SeriesResult<T> = Result<T, SeriesError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Schema mismatch in {context}: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        context: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Duplicate column: {name}")]
    DuplicateColumn { name: String },

    #[error("Row width mismatch: expected {expected} values, found {found}")]
    RowWidth { expected: usize, found: usize },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
