//! Per-cell resolve/evaluate loop.
//!
//! A formula is compiled once, then evaluated repeatedly: each time the
//! evaluator asks for an identifier, the identifier is looked up as a cell,
//! its value is bound, and evaluation is retried. Every retry binds one new
//! identifier, so the loop ends after at most as many retries as the formula
//! has distinct identifiers.

use tracing::trace;

use super::cell::{Cell, CellKind, Grid};
use super::cell_ref::CellRef;
use super::cycle::circular_error;
use super::error::{CellError, ErrorKind};
use super::eval::{FormulaEngine, Params, Step};
use super::preprocess::{expand_ranges, extract_strings};
use super::value::Value;

/// Where the resolve loop reads operand values from.
pub trait OperandSource {
    /// Value of `cell` for use in an expression, or the error that makes it unusable.
    fn operand(&mut self, cell: &CellRef) -> Result<Value, CellError>;
}

/// Read operands straight from a grid, materializing placeholders for
/// referenced cells that do not exist yet.
pub struct GridOperands<'a>(pub &'a Grid);

impl OperandSource for GridOperands<'_> {
    fn operand(&mut self, cell: &CellRef) -> Result<Value, CellError> {
        read_operand(self.0, cell)
    }
}

/// Operand rules shared by every source:
/// - a missing cell becomes an empty placeholder and reads as 0
/// - a label is not an operand
/// - an errored cell passes its error on
pub fn read_operand(grid: &Grid, cell: &CellRef) -> Result<Value, CellError> {
    let entry = grid.entry(cell.clone()).or_insert_with(Cell::new_empty);
    if let Some(err) = &entry.error {
        return Err(CellError::propagated(err));
    }
    match entry.kind {
        CellKind::Empty => Ok(Value::default()),
        CellKind::Label => Err(CellError::invalid_operand(&cell.to_string())),
        CellKind::Number | CellKind::Formula => Ok(entry.value.clone()),
    }
}

/// Outcome of resolving one formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub result: Result<Value, CellError>,
    /// Cells consumed while resolving, in the order they were requested.
    pub depends_on: Vec<CellRef>,
}

/// Compile and evaluate a formula (text after the `=`) for the cell at `own`.
pub fn resolve_formula(raw: &str, own: &CellRef, source: &mut dyn OperandSource) -> Resolution {
    let mut depends_on = Vec::new();
    let result = resolve_into(raw, own, source, &mut depends_on);
    Resolution { result, depends_on }
}

fn resolve_into(
    raw: &str,
    own: &CellRef,
    source: &mut dyn OperandSource,
    depends_on: &mut Vec<CellRef>,
) -> Result<Value, CellError> {
    if raw.trim().is_empty() {
        return Ok(Value::default());
    }

    let expanded = expand_ranges(raw)?;
    let extracted = extract_strings(&expanded);
    let engine = FormulaEngine::shared();
    let compiled = engine.compile(&extracted.text, &extracted.strings)?;

    let mut params = Params::new();
    let value = loop {
        match engine.evaluate(&compiled, &params) {
            Step::Resolved(value) => break value,
            Step::Failed(err) => return Err(err),
            Step::NeedsIdentifier(name) => {
                if params.contains_key(&name) {
                    return Err(CellError::new(
                        ErrorKind::Evaluation,
                        format!("Unresolved identifier '{}'", name),
                    ));
                }
                let Some(cell) = CellRef::from_str(&name) else {
                    return Err(CellError::unrecognized(&name));
                };
                depends_on.push(cell.clone());
                // The cell's previous contents are about to be replaced.
                if cell == *own {
                    return Err(circular_error(&[own.clone(), own.clone()]));
                }
                let value = source.operand(&cell)?;
                trace!(cell = %own, identifier = %name, "resolved identifier");
                params.insert(name, value);
            }
        }
    };

    Ok(value)
}

/// Classify and evaluate user input for the cell at `own`.
///
/// - empty → Empty
/// - `'text` → Label
/// - `=formula` → Formula, even if it fails
/// - a number → Number
/// - anything else → Formula if it evaluates, otherwise Label
pub fn evaluate_input(input: &str, own: &CellRef, source: &mut dyn OperandSource) -> Cell {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Cell::new_empty();
    }

    if let Some(label) = trimmed.strip_prefix('\'') {
        return Cell::new_label(label);
    }

    if let Some(formula) = trimmed.strip_prefix('=') {
        return formula_cell(formula, resolve_formula(formula, own, source));
    }

    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => return Cell::new_number(trimmed, n),
        _ => {}
    }

    let resolution = resolve_formula(trimmed, own, source);
    if resolution.result.is_ok() {
        formula_cell(trimmed, resolution)
    } else {
        Cell::new_label(trimmed)
    }
}

fn formula_cell(raw: &str, resolution: Resolution) -> Cell {
    let mut cell = Cell::new_formula(raw);
    cell.depends_on = resolution.depends_on;
    match resolution.result {
        Ok(value) => cell.value = value,
        Err(err) => cell.error = Some(err),
    }
    cell
}
