//! Error types for batch file handling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for batch operations
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors that can occur while loading, editing or writing a batch file.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The batch file path does not resolve
    #[error("File not found: {}. Check if the file path is correct", path.display())]
    FileNotFound { path: PathBuf },

    /// The file structure is corrupted
    #[error("Malformed batch file at line {line}: {message}")]
    MalformedFile { line: usize, message: String },

    /// A typed field could not be coerced from its text form
    #[error("Field \"{field}\" holds \"{value}\", which is not an integer")]
    Coercion { field: &'static str, value: String },

    /// A numeric field does not fit its column
    #[error("Field \"{field}\" value \"{value}\" does not fit in {width} columns")]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },

    /// A proposed change was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Rewriting the batch file failed
    #[error("Failed to write {}: {}", path.display(), source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read input or write output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `check` found problems in the loaded file
    #[error("{count} discrepancies found")]
    AuditFailed { count: usize },

    /// Bad command line
    #[error("{0}. Usage: txn-batch <file> <show|get|set|append|check|export> [args...]")]
    Usage(String),
}

/// Reasons a single field change or append is refused.
///
/// Each variant names the violated rule and carries the offending value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Attempted write to a store-managed field
    #[error("Validation error: trying to change value in locked field \"{field}\"")]
    LockedField { field: String },

    /// Value fails its type predicate
    #[error("Validation error: \"{value}\" is not {expected} (field \"{field}\")")]
    Type {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// Value is longer than its column
    #[error("Validation error: \"{value}\" contains more than {max} characters (field \"{field}\")")]
    Length {
        field: &'static str,
        value: String,
        max: usize,
    },

    /// Field name is not part of the record's layout
    #[error("Validation error: record has no field \"{field}\"")]
    UnknownField { field: String },

    /// Append did not supply a required business field
    #[error("Validation error: missing value for field \"{field}\"")]
    MissingField { field: &'static str },

    /// Append supplied the same field more than once
    #[error("Validation error: field \"{field}\" supplied more than once")]
    DuplicateField { field: &'static str },

    /// Transaction index out of range
    #[error("Validation error: no transaction at index {index} (table holds {len})")]
    NoSuchTransaction { index: usize, len: usize },
}
