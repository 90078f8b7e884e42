//! Markdown export of evaluated values

use crate::document::Document;
use tabula_engine::engine::CellRef;

/// Render the occupied part of the sheet as a Markdown table of display values.
pub fn write_markdown_content(doc: &Document, precision: usize) -> String {
    let mut out = String::from("# Sheet\n\n");

    let Some((min_row, min_col, max_row, max_col)) = find_grid_bounds(doc) else {
        out.push_str("*Empty spreadsheet*\n");
        return out;
    };

    out.push_str("|   |");
    for col in min_col..=max_col {
        out.push_str(&format!(" {} |", CellRef::col_to_letters(col)));
    }
    out.push('\n');

    out.push_str("|---|");
    for _ in min_col..=max_col {
        out.push_str("---|");
    }
    out.push('\n');

    for row in min_row..=max_row {
        out.push_str(&format!("| {} |", row + 1));
        for col in min_col..=max_col {
            let display = doc.get_cell_display(&CellRef::new(col, row), precision);
            out.push_str(&format!(" {} |", escape_markdown(&display)));
        }
        out.push('\n');
    }

    out
}

/// (min_row, min_col, max_row, max_col) over non-empty cells.
fn find_grid_bounds(doc: &Document) -> Option<(usize, usize, usize, usize)> {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;

    for entry in doc.grid.iter().filter(|e| !e.is_empty()) {
        let c = entry.key();
        bounds = Some(match bounds {
            None => (c.row, c.col, c.row, c.col),
            Some((r0, c0, r1, c1)) => (r0.min(c.row), c0.min(c.col), r1.max(c.row), c1.max(c.col)),
        });
    }

    bounds
}

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_table_of_values() {
        let mut doc = Document::new();
        doc.set_cell_from_input(CellRef::new(1, 1), "'a|b");
        doc.set_cell_from_input(CellRef::new(2, 1), "=1/3");
        doc.set_cell_from_input(CellRef::new(1, 2), "=foo");

        assert_eq!(
            write_markdown_content(&doc, 2),
            "# Sheet\n\n\
             |   | B | C |\n\
             |---|---|---|\n\
             | 2 | a\\|b | 0.33 |\n\
             | 3 | #ERR! |  |\n"
        );
    }

    #[test]
    fn test_markdown_empty_sheet() {
        let doc = Document::new();
        assert_eq!(
            write_markdown_content(&doc, 2),
            "# Sheet\n\n*Empty spreadsheet*\n"
        );
    }
}
