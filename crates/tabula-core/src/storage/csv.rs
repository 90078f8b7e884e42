//! CSV import/export of prefixed raw cell texts.
//!
//! The grid is anchored at A1: row N of the file is sheet row N and field M is
//! column M. Fields carry the same text `cells_for_save` produces, so `=`
//! marks formulas and `'` marks labels.

use tabula_engine::engine::CellRef;

/// Parse CSV content into `(cell, raw text)` pairs, skipping empty fields.
/// Quoted fields may span lines.
pub fn parse_csv_content(content: &str) -> Vec<(CellRef, String)> {
    let mut cells = Vec::new();

    for (row_idx, record) in parse_csv_records(content).into_iter().enumerate() {
        for (col_idx, field) in record.into_iter().enumerate() {
            if field.trim().is_empty() {
                continue;
            }
            cells.push((CellRef::new(col_idx, row_idx), field));
        }
    }

    cells
}

/// Split CSV content into records, handling quoted fields and `""` escapes.
pub(crate) fn parse_csv_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = content.chars().peekable();

    let finish_field = |current: &mut String, quoted: bool| {
        let field = std::mem::take(current);
        if quoted { field } else { field.trim().to_string() }
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                field_was_quoted = true;
            }
            ',' => {
                fields.push(finish_field(&mut current, field_was_quoted));
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(finish_field(&mut current, field_was_quoted));
                field_was_quoted = false;
                records.push(std::mem::take(&mut fields));
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() || field_was_quoted || !fields.is_empty() {
        fields.push(finish_field(&mut current, field_was_quoted));
        records.push(fields);
    }
    records
}

/// Render cells as a dense CSV grid from A1 to the furthest occupied cell.
pub fn write_csv_content(cells: &[(CellRef, String)]) -> String {
    let Some(max_row) = cells.iter().map(|(c, _)| c.row).max() else {
        return String::new();
    };
    let max_col = cells.iter().map(|(c, _)| c.col).max().unwrap_or(0);

    let mut rows = vec![vec![String::new(); max_col + 1]; max_row + 1];
    for (cell_ref, raw) in cells {
        rows[cell_ref.row][cell_ref.col] = escape_csv_field(raw);
    }

    let mut out = String::new();
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field when it would not survive a plain CSV read.
fn escape_csv_field(field: &str) -> String {
    let needs_quotes = field.contains([',', '"', '\n', '\r'])
        || field.trim() != field;
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    #[test]
    fn test_parse_csv_records_simple() {
        assert_eq!(parse_csv_records("a,b,c"), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_parse_csv_records_quoted() {
        assert_eq!(
            parse_csv_records(r#"a,"hello, world",c"#),
            vec![vec!["a", "hello, world", "c"]]
        );
    }

    #[test]
    fn test_parse_csv_records_escaped_quotes_and_newlines() {
        assert_eq!(
            parse_csv_records("\"say \"\"hi\"\"\",\"two\nlines\"\r\nx,y\n"),
            vec![vec!["say \"hi\"", "two\nlines"], vec!["x", "y"]]
        );
    }

    #[test]
    fn test_parse_csv_content_positions() {
        let cells = parse_csv_content("1,,=A1+1\n\n'note\n");
        assert_eq!(
            cells,
            vec![
                (at("A1"), "1".to_string()),
                (at("C1"), "=A1+1".to_string()),
                (at("A3"), "'note".to_string()),
            ]
        );
    }

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("simple"), "simple");
        assert_eq!(escape_csv_field("=SUM(A1,B1)"), "\"=SUM(A1,B1)\"");
        assert_eq!(escape_csv_field("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv_field("' padded "), "\"' padded \"");
    }

    #[test]
    fn test_write_csv_content_fills_gaps() {
        let cells = vec![
            (at("A1"), "1".to_string()),
            (at("C2"), "=SUM(A1,1)".to_string()),
        ];
        assert_eq!(write_csv_content(&cells), "1,,\n,,\"=SUM(A1,1)\"\n");
        assert_eq!(parse_csv_content(&write_csv_content(&cells)), cells);
    }

    #[test]
    fn test_write_csv_content_empty() {
        assert_eq!(write_csv_content(&[]), "");
        assert!(parse_csv_content("").is_empty());
    }
}
