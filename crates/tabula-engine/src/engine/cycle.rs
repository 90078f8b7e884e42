//! Cycle lookup over recorded dependency sets.
//!
//! Cycles are detected during evaluation (self reference, cascade budget,
//! in-progress refresh). This module only walks the `depends_on` lists left
//! behind by those evaluations to name the cells involved.

use std::collections::HashSet;

use super::{CellError, CellRef, Grid};

/// Find a dependency cycle reachable from `start`.
/// The returned path begins and ends with the same cell.
pub fn cycle_path(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut path = Vec::new();

    if walk(start, grid, &mut visiting, &mut done, &mut path) {
        let repeated = path.last()?;
        let first = path.iter().position(|c| c == repeated)?;
        Some(path.split_off(first))
    } else {
        None
    }
}

/// Render a cycle path as `A1 -> B1 -> A1`.
pub fn describe_cycle(path: &[CellRef]) -> String {
    path.iter()
        .map(CellRef::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// CircularReference error naming the cells of a cycle path.
pub fn circular_error(path: &[CellRef]) -> CellError {
    match path {
        [a, b] if a == b => {
            CellError::circular(format!("Circular reference: {} refers to itself", a))
        }
        [] | [_] => CellError::circular("Circular reference"),
        _ => CellError::circular(format!("Circular reference: {}", describe_cycle(path))),
    }
}

fn walk(
    current: &CellRef,
    grid: &Grid,
    visiting: &mut HashSet<CellRef>,
    done: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if visiting.contains(current) {
        path.push(current.clone());
        return true;
    }
    if done.contains(current) {
        return false;
    }

    // Clone out of the map so no shard lock is held while recursing.
    let deps = match grid.get(current) {
        Some(entry) => entry.depends_on.clone(),
        None => return false,
    };

    visiting.insert(current.clone());
    path.push(current.clone());

    for dep in &deps {
        if walk(dep, grid, visiting, done, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    done.insert(current.clone());
    false
}
