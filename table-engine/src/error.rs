//! FILENAME: table-engine/src/error.rs

use thiserror::Error;

use crate::column::DataType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Row {row} has {actual} values, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Type mismatch in column '{column}': expected {expected:?}, found {found:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Aggregation {aggregation} requires a numeric column, but '{column}' holds text")]
    NonNumeric { column: String, aggregation: String },

    #[error("Integer sum of column '{column}' overflows")]
    Overflow { column: String },
}
