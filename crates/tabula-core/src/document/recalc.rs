//! Recalculation: the cascade that follows an edit, and the full-sheet refresh.

use std::collections::HashSet;
use tracing::{debug, warn};

use super::Document;
use tabula_engine::engine::{
    CellError, CellRef, Grid, GridOperands, OperandSource, Resolution, Value, circular_error,
    cycle_path, extract_dependencies, read_operand, resolve_formula,
};

impl Document {
    /// Refresh every formula that references `origin`, then every formula that
    /// references those, and so on. The depth is bounded by twice the cell
    /// count; running out marks `origin` as a circular reference.
    pub(crate) fn cascade_from(&self, origin: &CellRef) {
        let budget = 2 * self.grid.len();
        if self.cascade(origin, budget) {
            return;
        }

        let err = cycle_path(origin, &self.grid)
            .map(|path| circular_error(&path))
            .unwrap_or_else(|| {
                CellError::circular(format!("Circular reference involving {}", origin))
            });
        warn!(cell = %origin, message = %err.message, "cascade budget exhausted");
        if let Some(mut cell) = self.grid.get_mut(origin) {
            cell.error = Some(err);
            cell.value = Value::default();
        }

        // Errored cells are skipped by the scan, so this pass settles once the
        // new error has reached every dependent.
        if !self.cascade(origin, budget) {
            warn!(cell = %origin, "cascade did not settle after marking cycle");
        }
    }

    fn cascade(&self, changed: &CellRef, budget: usize) -> bool {
        if budget == 0 {
            return false;
        }

        let targets = self.formulas_mentioning(changed);
        if !targets.is_empty() {
            debug!(changed = %changed, count = targets.len(), "cascading");
        }
        for target in &targets {
            self.refresh_cell(target);
        }
        targets
            .iter()
            .all(|target| self.cascade(target, budget - 1))
    }

    /// Non-errored formula cells whose range-expanded text has a reference
    /// token naming `changed`. `A1` does not match inside `A10` or `AA1`.
    fn formulas_mentioning(&self, changed: &CellRef) -> Vec<CellRef> {
        let mut found: Vec<CellRef> = self
            .grid
            .iter()
            .filter(|entry| entry.is_formula() && !entry.has_error())
            .filter(|entry| extract_dependencies(&entry.raw).contains(changed))
            .map(|entry| entry.key().clone())
            .collect();
        found.sort();
        found
    }

    /// Re-run the resolve loop for one formula cell against current values.
    pub(crate) fn refresh_cell(&self, cell_ref: &CellRef) {
        let Some(raw) = self
            .grid
            .get(cell_ref)
            .filter(|c| c.is_formula())
            .map(|c| c.raw.clone())
        else {
            return;
        };
        let resolution = resolve_formula(&raw, cell_ref, &mut GridOperands(&self.grid));
        store_resolution(&self.grid, cell_ref, resolution);
    }

    /// Recompile and re-evaluate every formula cell.
    ///
    /// Empty cells are pruned first. Formulas are evaluated row by row, but a
    /// formula that needs another pending formula evaluates that one first;
    /// reaching a formula that is still in progress is a circular reference.
    pub fn refresh(&mut self) {
        self.grid.retain(|_, cell| !cell.is_empty());

        let mut formulas: Vec<CellRef> = self
            .grid
            .iter()
            .filter(|entry| entry.is_formula())
            .map(|entry| entry.key().clone())
            .collect();
        formulas.sort();
        debug!(formulas = formulas.len(), "full refresh");

        let mut pass = RefreshPass {
            grid: &self.grid,
            pending: formulas.iter().cloned().collect(),
            in_progress: Vec::new(),
        };
        for cell_ref in &formulas {
            pass.evaluate(cell_ref);
        }
    }

    /// Cells consumed by this cell's last evaluation. For an errored formula
    /// that stopped early, falls back to the references written in its text.
    pub fn precedents(&self, cell_ref: &CellRef) -> Vec<CellRef> {
        let Some(cell) = self.get_cell(cell_ref) else {
            return Vec::new();
        };
        let deps = if cell.depends_on.is_empty() && cell.is_formula() && cell.has_error() {
            extract_dependencies(&cell.raw)
        } else {
            cell.depends_on
        };

        let mut seen = HashSet::new();
        deps.into_iter().filter(|d| seen.insert(d.clone())).collect()
    }

    /// Cells whose last evaluation consumed this cell, row-major.
    pub fn dependents(&self, cell_ref: &CellRef) -> Vec<CellRef> {
        let mut found: Vec<CellRef> = self
            .grid
            .iter()
            .filter(|entry| entry.depends_on.contains(cell_ref))
            .map(|entry| entry.key().clone())
            .collect();
        found.sort();
        found
    }

    /// A dependency cycle reachable from this cell, if there is one.
    pub fn cycle_path(&self, cell_ref: &CellRef) -> Option<Vec<CellRef>> {
        cycle_path(cell_ref, &self.grid)
    }
}

fn store_resolution(grid: &Grid, cell_ref: &CellRef, resolution: Resolution) {
    if let Some(mut cell) = grid.get_mut(cell_ref) {
        cell.depends_on = resolution.depends_on;
        match resolution.result {
            Ok(value) => {
                cell.value = value;
                cell.error = None;
            }
            Err(err) => {
                cell.value = Value::default();
                cell.error = Some(err);
            }
        }
    }
}

/// One full-refresh pass; also the operand source for the formulas it evaluates.
struct RefreshPass<'a> {
    grid: &'a Grid,
    pending: HashSet<CellRef>,
    in_progress: Vec<CellRef>,
}

impl RefreshPass<'_> {
    fn evaluate(&mut self, cell_ref: &CellRef) {
        if !self.pending.remove(cell_ref) {
            return;
        }
        let Some(raw) = self.grid.get(cell_ref).map(|c| c.raw.clone()) else {
            return;
        };

        self.in_progress.push(cell_ref.clone());
        let resolution = resolve_formula(&raw, cell_ref, self);
        self.in_progress.pop();

        if let Err(err) = &resolution.result {
            debug!(cell = %cell_ref, error = %err, "formula failed during refresh");
        }
        store_resolution(self.grid, cell_ref, resolution);
    }
}

impl OperandSource for RefreshPass<'_> {
    fn operand(&mut self, cell: &CellRef) -> Result<Value, CellError> {
        if let Some(pos) = self.in_progress.iter().position(|c| c == cell) {
            let mut path = self.in_progress[pos..].to_vec();
            path.push(cell.clone());
            warn!(cycle = %tabula_engine::engine::describe_cycle(&path), "circular reference");
            return Err(circular_error(&path));
        }
        if self.pending.contains(cell) {
            self.evaluate(cell);
        }
        read_operand(self.grid, cell)
    }
}
