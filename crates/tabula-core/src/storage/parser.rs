//! Parser for the .tbl file format

use super::SheetData;
use crate::error::{Result, TabulaError};
use tabula_engine::engine::CellRef;

/// Parse .tbl content.
///
/// Each non-blank line is either `A1: <input>` with the cell's prefixed raw
/// text, or `width C: 30`. Lines starting with `#` are comments.
pub fn parse_tbl_content(content: &str) -> Result<SheetData> {
    let mut sheet = SheetData::default();

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(parse_error(line_num, "Expected 'CELL: VALUE' or 'width COL: N'"));
        };
        let key = key.trim();
        let value = value.trim();

        if let Some(col) = key.strip_prefix("width ") {
            sheet.widths.push(parse_width(col.trim(), value, line_num)?);
            continue;
        }

        let cell_ref = CellRef::from_str(key)
            .ok_or_else(|| parse_error(line_num, format!("Invalid cell reference: {}", key)))?;
        sheet.cells.push((cell_ref, unescape_tbl_text(value)));
    }

    Ok(sheet)
}

fn parse_width(col: &str, value: &str, line_num: usize) -> Result<(usize, usize)> {
    let col = CellRef::letters_to_col(col)
        .ok_or_else(|| parse_error(line_num, format!("Invalid column: {}", col)))?;
    let width = value
        .parse::<usize>()
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| parse_error(line_num, format!("Invalid width: {}", value)))?;
    Ok((col, width))
}

fn parse_error(line: usize, message: impl Into<String>) -> TabulaError {
    TabulaError::Parse {
        line,
        message: message.into(),
    }
}

/// Undo the writer's `\\` and `\n` escapes.
fn unescape_tbl_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
