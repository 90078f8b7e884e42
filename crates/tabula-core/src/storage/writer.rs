//! Writer for the .tbl file format

use super::SheetData;
use tabula_engine::engine::CellRef;

/// Render a sheet as .tbl text: widths first, then cells in the given order.
pub fn write_tbl_content(sheet: &SheetData) -> String {
    let mut lines = vec!["# Tabula sheet".to_string()];

    for (col, width) in &sheet.widths {
        lines.push(format!("width {}: {}", CellRef::col_to_letters(*col), width));
    }
    for (cell_ref, raw) in &sheet.cells {
        lines.push(format!("{}: {}", cell_ref, escape_tbl_text(raw)));
    }

    lines.join("\n") + "\n"
}

fn escape_tbl_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}
