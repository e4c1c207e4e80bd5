// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Input that cannot be turned into an indicator table, or misuse of the table itself.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unsupported input format {0:?} (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("input has no worksheets")]
    NoWorksheet,

    #[error("no header row found: required field {field:?} is missing")]
    MissingField { field: &'static str },

    #[error("row {row}: year {value:?} is not an integer")]
    InvalidYear { row: usize, value: String },

    #[error("row {row}: {field} value {value:?} is not numeric")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("year {0} appears more than once")]
    DuplicateYear(i64),

    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("column {0:?} already exists")]
    DuplicateColumn(String),

    #[error("column {name:?} has {found} rows, table has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// An output artifact could not be written.
#[derive(Debug, Error)]
#[error("failed to write {kind} to {}", .path.display())]
pub struct ArtifactWriteError {
    pub kind: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl ArtifactWriteError {
    pub fn new(kind: &'static str, path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self {
            kind,
            path: path.into(),
            source: source.into(),
        }
    }
}
