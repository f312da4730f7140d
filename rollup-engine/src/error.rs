//! FILENAME: rollup-engine/src/error.rs

use table_engine::TableError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RollupError {
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Operation {0} is not defined")]
    UnsupportedOperation(String),

    #[error(
        "The operation {operation} requires an \"{parameter}\" parameter, but none was provided"
    )]
    MissingParameter {
        operation: String,
        parameter: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Constant dimension elements and change dimension elements must be mutually exclusive \
         (shared: {})",
        .0.join(", ")
    )]
    OverlappingDimensions(Vec<String>),

    #[error("Column '{column}' referenced by {context} is not found in the table")]
    UnknownColumn { column: String, context: String },

    #[error(
        "Column for calculation ({column}) cannot be contained in of_total: [{}]",
        .of_total.join(", ")
    )]
    TargetInOfTotal { column: String, of_total: Vec<String> },

    #[error("Operation {operation} requires a numeric column, but '{column}' holds text")]
    NonNumericColumn { operation: String, column: String },

    #[error("Column name '{0}' is reserved for result output")]
    ReservedColumn(String),

    #[error("Result column '{0}' would be produced more than once")]
    DuplicateResultColumn(String),
}

pub type Result<T> = std::result::Result<T, RollupError>;
