//! Lexical reference extraction from formula strings.
//!
//! Scans formula text for coordinate-like tokens (e.g. `A1`, `b12`) and
//! records each one with its byte offset. The scan is purely lexical: it
//! knows nothing about the expression grammar, which is exactly what the
//! structural editor needs to rewrite references in place.
//!
//! Handles:
//! - Cell names in any letter case: `A1`, `aa10`
//! - Ignores tokens that are builtin function names (`LOG10`, `LOG2`)
//! - Ignores references inside string literals

use regex::Regex;
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::preprocess::expand_ranges;

/// A coordinate token found in formula text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellReference {
    /// Token exactly as written.
    pub name: String,
    /// Byte offset of the token in the scanned text.
    pub offset: usize,
    pub cell: CellRef,
}

impl CellReference {
    pub fn end(&self) -> usize {
        self.offset + self.name.len()
    }
}

fn cell_ref_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+)([0-9]+)\b").expect("reference token regex must compile")
    })
}

/// Enumerate all coordinate tokens in a formula, in source order.
pub fn referenced_cells(formula: &str) -> Vec<CellReference> {
    let masked = mask_string_literals(formula);

    cell_ref_re()
        .find_iter(&masked)
        .filter(|m| !crate::builtins::is_builtin_name(m.as_str()))
        .filter_map(|m| {
            let cell = CellRef::from_str(m.as_str())?;
            Some(CellReference {
                name: formula[m.start()..m.end()].to_string(),
                offset: m.start(),
                cell,
            })
        })
        .collect()
}

/// Lexical dependency list of a formula: the cells named after range expansion.
/// Used where no evaluation-time dependency set is available, such as a
/// formula that failed before reading its operands.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let expanded = expand_ranges(formula).unwrap_or_else(|_| formula.to_string());
    referenced_cells(&expanded)
        .into_iter()
        .map(|r| r.cell)
        .collect()
}

/// Blank out the contents of double-quoted literals, keeping byte offsets intact.
/// An unterminated quote masks the rest of the text.
fn mask_string_literals(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut in_string = false;

    for ch in formula.chars() {
        if ch == '"' {
            in_string = !in_string;
            out.push('"');
        } else if in_string {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }

    out
}
