use super::Document;
use tabula_engine::engine::{
    Cell, CellRef, GridOperands, ShiftOperation, evaluate_input, offset_formula_references,
    shift_formula_references,
};
use tracing::debug;

/// Which side of the given index a new row or column goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    #[default]
    Before,
    After,
}

impl Placement {
    fn boundary(&self, at: usize) -> usize {
        match self {
            Placement::Before => at,
            Placement::After => at + 1,
        }
    }
}

impl Document {
    /// Set cell contents from user input, then cascade to dependents.
    ///
    /// Failures are recorded on the cell rather than returned. A cell that
    /// goes from errored to clean triggers one full refresh so dependents
    /// holding its old error get another chance.
    pub fn set_cell_from_input(&mut self, cell_ref: CellRef, input: &str) {
        let was_errored = self
            .grid
            .get(&cell_ref)
            .map(|c| c.has_error())
            .unwrap_or(false);

        let cell = evaluate_input(input, &cell_ref, &mut GridOperands(&self.grid));
        let now_errored = cell.has_error();
        debug!(cell = %cell_ref, kind = ?cell.kind, errored = now_errored, "commit");

        self.grid.insert(cell_ref.clone(), cell);
        self.modified = true;
        self.cascade_from(&cell_ref);

        if was_errored && !now_errored {
            self.refresh();
        }
    }

    /// Remove a cell outright; formulas that used it see an empty placeholder.
    pub fn clear_cell(&mut self, cell_ref: &CellRef) {
        if self.grid.remove(cell_ref).is_some() {
            self.modified = true;
            self.cascade_from(cell_ref);
        }
    }

    /// Copy a cell to another position. Formula references move by the same
    /// offset as the cell; any that would leave the sheet become `#REF!`.
    /// Copying an absent cell clears the target.
    pub fn copy_cell(&mut self, from: &CellRef, to: CellRef) {
        let Some(source) = self.get_cell(from) else {
            self.clear_cell(&to);
            return;
        };

        let input = if source.is_formula() {
            let delta_col = to.col as isize - from.col as isize;
            let delta_row = to.row as isize - from.row as isize;
            format!(
                "={}",
                offset_formula_references(&source.raw, delta_col, delta_row)
            )
        } else {
            source.input_string()
        };
        self.set_cell_from_input(to, &input);
    }

    /// Insert a row before or after the given row.
    pub fn insert_row(&mut self, at_row: usize, placement: Placement) {
        self.apply_shift(ShiftOperation::InsertRow(placement.boundary(at_row)));
    }

    /// Delete the specified row.
    pub fn delete_row(&mut self, at_row: usize) {
        self.apply_shift(ShiftOperation::DeleteRow(at_row));
    }

    /// Insert a column before or after the given column.
    pub fn insert_column(&mut self, at_col: usize, placement: Placement) {
        self.apply_shift(ShiftOperation::InsertColumn(placement.boundary(at_col)));
    }

    /// Delete the specified column.
    pub fn delete_column(&mut self, at_col: usize) {
        self.apply_shift(ShiftOperation::DeleteColumn(at_col));
    }

    /// Move cells and rewrite formula references for a structural edit,
    /// then refresh the whole sheet.
    fn apply_shift(&mut self, op: ShiftOperation) {
        debug!(?op, "structural edit");

        let cells: Vec<(CellRef, Cell)> = self
            .grid
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        self.grid.clear();

        for (cell_ref, mut cell) in cells {
            // Cells on a deleted row/column are dropped.
            let Some(new_ref) = op.apply(&cell_ref) else {
                continue;
            };
            if cell.is_formula() {
                cell.raw = shift_formula_references(&cell.raw, op);
            }
            self.grid.insert(new_ref, cell);
        }

        if matches!(
            op,
            ShiftOperation::InsertColumn(_) | ShiftOperation::DeleteColumn(_)
        ) {
            self.widths = self
                .widths
                .drain()
                .filter_map(|(col, width)| {
                    op.apply(&CellRef::new(col, 0))
                        .map(|moved| (moved.col, width))
                })
                .collect();
        }

        self.modified = true;
        self.refresh();
    }

    /// Width of a column, falling back to the document default.
    pub fn column_width(&self, col: usize) -> usize {
        self.widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    /// Override a column's width (minimum 1).
    pub fn set_column_width(&mut self, col: usize, width: usize) {
        let width = width.max(1);
        if width == self.default_column_width {
            self.widths.remove(&col);
        } else {
            self.widths.insert(col, width);
        }
        self.modified = true;
    }

    /// Grow or shrink a column's width by `delta` (never below 1).
    pub fn adjust_column_width(&mut self, col: usize, delta: isize) {
        let width = self.column_width(col).saturating_add_signed(delta);
        self.set_column_width(col, width);
    }

    /// Column width overrides, sorted by column.
    pub fn column_widths(&self) -> Vec<(usize, usize)> {
        let mut widths: Vec<(usize, usize)> = self.widths.iter().map(|(c, w)| (*c, *w)).collect();
        widths.sort();
        widths
    }
}
