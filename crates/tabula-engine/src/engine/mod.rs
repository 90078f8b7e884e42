//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellKind`], [`Grid`] - Data structures for cell storage
//! - [`CellRef`] - Cell name parsing (A1 notation ↔ row/col indices)
//! - [`expand_ranges`], [`extract_strings`] - Formula preprocessing
//! - [`referenced_cells`] - Lexical reference tokens with offsets
//! - [`FormulaEngine`] - Shared Rhai engine with built-in functions
//! - [`resolve_formula`], [`evaluate_input`] - The per-cell resolve loop
//! - [`cycle_path`] - Dependency cycle lookup

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod lower;
mod preprocess;
mod resolve;
mod value;

pub use cell::{Alignment, Cell, CellKind, Grid};
pub use cell_ref::CellRef;
pub use cycle::{circular_error, cycle_path, describe_cycle};
pub use deps::{CellReference, extract_dependencies, referenced_cells};
pub use error::{CellError, ErrorKind, InvalidCellName};
pub use eval::{CompiledFormula, FormulaEngine, Params, Step};
pub use preprocess::{
    DELETED_REF, ExtractedFormula, MAX_RANGE_CELLS, ShiftOperation, expand_ranges, extract_strings,
    offset_formula_references, range_cells, shift_formula_references,
};
pub use resolve::{
    GridOperands, OperandSource, Resolution, evaluate_input, read_operand, resolve_formula,
};
pub use value::{Value, format_number};
