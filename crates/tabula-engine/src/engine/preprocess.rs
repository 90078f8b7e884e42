//! Formula preprocessing and reference transformation.
//!
//! Raw formula text goes through two textual passes before it is lowered for
//! evaluation:
//!
//! - **Range expansion**: `SUM(A1..B2)` → `SUM(A1,B1,A2,B2)`, `50%` → `50*1/100`
//! - **String extraction**: `"abc" + A1` → `STR(0) + A1` with `["abc"]` on the side
//!
//! It also owns the reference rewriters used by structural edits and copies:
//!
//! - **Reference shifting**: adjusting references when rows/columns are inserted/deleted
//! - **Reference offsetting**: moving every reference by a relative delta

use super::cell_ref::CellRef;
use super::deps::{CellReference, referenced_cells};
use super::error::{CellError, ErrorKind};

/// Text substituted for a reference whose target no longer exists.
pub const DELETED_REF: &str = "#REF!";

/// Largest number of cells a single `start..end` range may expand to.
pub const MAX_RANGE_CELLS: usize = 100_000;

/// Operation for shifting cell references in formulas.
///
/// Insert variants carry the boundary index (first row/column that moves);
/// delete variants carry the index being removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRow(usize),
    DeleteRow(usize),
    InsertColumn(usize),
    DeleteColumn(usize),
}

impl ShiftOperation {
    /// Where a coordinate ends up after this operation; None if it is deleted
    /// or pushed past the last addressable row or column.
    pub fn apply(&self, cell: &CellRef) -> Option<CellRef> {
        match *self {
            ShiftOperation::InsertRow(at) if cell.row >= at => cell.offset(0, 1),
            ShiftOperation::InsertColumn(at) if cell.col >= at => cell.offset(1, 0),
            ShiftOperation::DeleteRow(at) if cell.row == at => None,
            ShiftOperation::DeleteRow(at) if cell.row > at => {
                Some(CellRef::new(cell.col, cell.row - 1))
            }
            ShiftOperation::DeleteColumn(at) if cell.col == at => None,
            ShiftOperation::DeleteColumn(at) if cell.col > at => {
                Some(CellRef::new(cell.col - 1, cell.row))
            }
            _ => Some(cell.clone()),
        }
    }
}

/// Formula text with its string literals pulled out into a side table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedFormula {
    pub text: String,
    /// Literal contents without their quotes, indexed by `STR(id)`.
    pub strings: Vec<String>,
}

/// Rewrite `%` and expand every `start..end` range into an explicit list.
///
/// Cells are listed row by row, left to right within a row. Corners may be
/// given in any order.
pub fn expand_ranges(formula: &str) -> Result<String, CellError> {
    let mut text = formula.replace('%', "*1/100");

    while let Some(dots) = text.find("..") {
        let start = text[..dots]
            .rfind(|c: char| !c.is_ascii_alphanumeric())
            .map(|i| i + 1)
            .unwrap_or(0);
        let after = dots + 2;
        let end = text[after..]
            .find(|c: char| !c.is_ascii_alphanumeric())
            .map(|i| after + i)
            .unwrap_or(text.len());

        let from = CellRef::from_str(&text[start..dots]);
        let to = CellRef::from_str(&text[after..end]);
        let (Some(from), Some(to)) = (from, to) else {
            return Err(CellError::new(
                ErrorKind::InvalidRange,
                format!("Invalid range '{}'", &text[start..end]),
            ));
        };

        let Some(cells) = range_cells(&from, &to) else {
            return Err(CellError::new(
                ErrorKind::InvalidRange,
                format!(
                    "Range '{}' is larger than {} cells",
                    &text[start..end],
                    MAX_RANGE_CELLS
                ),
            ));
        };
        let list = cells
            .iter()
            .map(CellRef::to_string)
            .collect::<Vec<_>>()
            .join(",");
        text.replace_range(start..end, &list);
    }

    Ok(text)
}

/// All coordinates in the rectangle spanned by two corners, row-major.
/// None if the rectangle holds more than [`MAX_RANGE_CELLS`] cells.
pub fn range_cells(from: &CellRef, to: &CellRef) -> Option<Vec<CellRef>> {
    let (min_col, max_col) = (from.col.min(to.col), from.col.max(to.col));
    let (min_row, max_row) = (from.row.min(to.row), from.row.max(to.row));

    let width = (max_col - min_col).checked_add(1)?;
    let height = (max_row - min_row).checked_add(1)?;
    let count = width.checked_mul(height).filter(|&n| n <= MAX_RANGE_CELLS)?;

    let mut cells = Vec::with_capacity(count);
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            cells.push(CellRef::new(col, row));
        }
    }
    Some(cells)
}

/// Replace each double-quoted literal with `STR(id)`.
/// An unterminated quote is left in place.
pub fn extract_strings(formula: &str) -> ExtractedFormula {
    let mut text = String::with_capacity(formula.len());
    let mut strings = Vec::new();
    let mut rest = formula;

    while let Some(open) = rest.find('"') {
        let Some(len) = rest[open + 1..].find('"') else {
            break;
        };
        let close = open + 1 + len;
        text.push_str(&rest[..open]);
        text.push_str(&format!("STR({})", strings.len()));
        strings.push(rest[open + 1..close].to_string());
        rest = &rest[close + 1..];
    }
    text.push_str(rest);

    ExtractedFormula { text, strings }
}

/// Shift cell references in a formula when rows/cols are inserted/deleted.
///
/// Rules:
/// - Insert at boundary B: refs at or past B move one step further
/// - Delete at I: refs past I move back one step; refs at I become `#REF!`
pub fn shift_formula_references(formula: &str, op: ShiftOperation) -> String {
    rewrite_references(formula, |r| match op.apply(&r.cell) {
        Some(cell) if cell == r.cell => None,
        Some(cell) => Some(cell.to_string()),
        None => Some(DELETED_REF.to_string()),
    })
}

/// Offset all cell references in a formula by a relative column/row delta.
/// References that would leave the sheet become `#REF!`.
pub fn offset_formula_references(formula: &str, delta_col: isize, delta_row: isize) -> String {
    if delta_col == 0 && delta_row == 0 {
        return formula.to_string();
    }

    rewrite_references(formula, |r| {
        Some(
            r.cell
                .offset(delta_col, delta_row)
                .map(|c| c.to_string())
                .unwrap_or_else(|| DELETED_REF.to_string()),
        )
    })
}

/// Apply a replacement to every reference token, tracking how much earlier
/// replacements have moved the later offsets.
fn rewrite_references<F>(formula: &str, mut replace: F) -> String
where
    F: FnMut(&CellReference) -> Option<String>,
{
    let mut out = formula.to_string();
    let mut shift: isize = 0;

    for token in referenced_cells(formula) {
        let Some(new_name) = replace(&token) else {
            continue;
        };
        let start = token.offset.saturating_add_signed(shift);
        let end = token.end().saturating_add_signed(shift);
        out.replace_range(start..end, &new_name);
        shift += new_name.len() as isize - token.name.len() as isize;
    }

    out
}
