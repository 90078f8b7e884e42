//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellKind`] - What a cell's raw text was classified as
//! - [`Cell`] - Raw text, evaluated value, error state and dependencies
//! - [`Grid`] - Sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::cell_ref::CellRef;
use super::error::CellError;
use super::value::Value;

/// The kind of content stored in a cell, derived from its raw text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Empty,
    Number,
    Label,
    Formula,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

impl CellKind {
    pub fn alignment(&self) -> Alignment {
        match self {
            CellKind::Number | CellKind::Formula => Alignment::Right,
            CellKind::Empty | CellKind::Label => Alignment::Left,
        }
    }

    /// Prefix that marks this kind in user input (`'` for labels, `=` for formulas).
    pub fn prefix(&self) -> &'static str {
        match self {
            CellKind::Label => "'",
            CellKind::Formula => "=",
            CellKind::Empty | CellKind::Number => "",
        }
    }
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Raw text without its kind prefix.
    pub raw: String,
    pub kind: CellKind,
    /// Meaningless while `error` is set.
    pub value: Value,
    pub error: Option<CellError>,
    pub alignment: Alignment,
    /// Cells consumed by the most recent evaluation, in resolution order.
    pub depends_on: Vec<CellRef>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    pub fn new_label(text: &str) -> Cell {
        Cell {
            raw: text.to_string(),
            kind: CellKind::Label,
            value: Value::Text(text.to_string()),
            alignment: Alignment::Left,
            ..Cell::default()
        }
    }

    pub fn new_number(raw: &str, n: f64) -> Cell {
        Cell {
            raw: raw.to_string(),
            kind: CellKind::Number,
            value: Value::Number(n),
            alignment: Alignment::Right,
            ..Cell::default()
        }
    }

    /// A formula cell that has not been evaluated yet.
    pub fn new_formula(raw: &str) -> Cell {
        Cell {
            raw: raw.to_string(),
            kind: CellKind::Formula,
            alignment: Alignment::Right,
            ..Cell::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn is_formula(&self) -> bool {
        self.kind == CellKind::Formula
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Raw text with its kind prefix, as it would be typed back in.
    pub fn input_string(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.raw)
    }
}

/// Sparse grid storage.
///
/// Entries handed out by `get`/`get_mut` hold a shard lock: never keep one
/// alive across another call that touches the grid.
pub type Grid = DashMap<CellRef, Cell>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_string_restores_prefix() {
        assert_eq!(Cell::new_label("hello").input_string(), "'hello");
        assert_eq!(Cell::new_formula("A1+1").input_string(), "=A1+1");
        assert_eq!(Cell::new_number("2.50", 2.5).input_string(), "2.50");
        assert_eq!(Cell::new_empty().input_string(), "");
    }

    #[test]
    fn test_alignment_follows_kind() {
        assert_eq!(Cell::new_label("x").alignment, Alignment::Left);
        assert_eq!(Cell::new_number("1", 1.0).alignment, Alignment::Right);
        assert_eq!(CellKind::Formula.alignment(), Alignment::Right);
    }
}
