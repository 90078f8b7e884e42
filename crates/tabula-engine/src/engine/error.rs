//! Cell-level error model.
//!
//! Evaluation failures never escape a cell: they are captured as a
//! [`CellError`] stored on the cell, and dependents observe the flag.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a cell failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Identifier is neither a builtin nor a valid coordinate.
    UnrecognizedReference,
    /// Reference resolves to a label, which cannot be used as an operand.
    InvalidOperandType,
    /// A referenced cell is itself errored; its message is passed through.
    PropagatedError,
    /// A builtin function was called with the wrong number of arguments.
    ParameterCount,
    /// Self reference, or a cascade that exhausted its recursion budget.
    CircularReference,
    /// A `start..end` range whose corners are not cell names.
    InvalidRange,
    /// Formula text could not be parsed.
    Syntax,
    /// Runtime failure inside the expression (bad operand, unknown function).
    Evaluation,
}

/// Sticky error state of a cell: kind plus human-readable message.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CellError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CellError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CellError {
            kind,
            message: message.into(),
        }
    }

    pub fn unrecognized(name: &str) -> Self {
        Self::new(
            ErrorKind::UnrecognizedReference,
            format!("Unrecognized cell '{}'", name),
        )
    }

    pub fn invalid_operand(name: &str) -> Self {
        Self::new(
            ErrorKind::InvalidOperandType,
            format!("Invalid cell type '{}'", name),
        )
    }

    /// Pass a dependency's failure through verbatim.
    pub fn propagated(source: &CellError) -> Self {
        Self::new(ErrorKind::PropagatedError, source.message.clone())
    }

    pub fn circular(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CircularReference, message)
    }
}

/// Returned when a string is not a valid cell name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Invalid cell name '{0}'")]
pub struct InvalidCellName(pub String);
