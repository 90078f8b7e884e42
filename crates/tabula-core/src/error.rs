//! Error types for Tabula core.

use thiserror::Error;

use tabula_engine::engine::InvalidCellName;

/// Errors raised by document I/O and parsing.
///
/// Formula failures are not errors at this level: they are stored on the
/// cell as a `CellError` and never escape the document.
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    InvalidCellName(#[from] InvalidCellName),

    #[error("No file path set")]
    NoFilePath,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, TabulaError>;
