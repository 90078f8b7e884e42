//! Edit commands accepted by `-c`.
//!
//! Rows are 1-based numbers and columns are letters, as shown in the sheet.

use std::str::FromStr;

use tabula_core::{CellRef, Document, Placement};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid cell: {0}")]
    InvalidCell(String),
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error("Invalid column: {0}")]
    InvalidColumn(String),
    #[error("Invalid width: {0}")]
    InvalidWidth(String),
}

/// One edit to apply to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { cell: CellRef, input: String },
    Clear(CellRef),
    InsertRow { row: usize, placement: Placement },
    DeleteRow(usize),
    InsertColumn { col: usize, placement: Placement },
    DeleteColumn(usize),
    Width { col: usize, width: usize },
    Copy { from: CellRef, to: CellRef },
    Refresh,
}

impl Command {
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Command::Set { cell, input } => doc.set_cell_from_input(cell.clone(), input),
            Command::Clear(cell) => doc.clear_cell(cell),
            Command::InsertRow { row, placement } => doc.insert_row(*row, *placement),
            Command::DeleteRow(row) => doc.delete_row(*row),
            Command::InsertColumn { col, placement } => doc.insert_column(*col, *placement),
            Command::DeleteColumn(col) => doc.delete_column(*col),
            Command::Width { col, width } => doc.set_column_width(*col, *width),
            Command::Copy { from, to } => doc.copy_cell(from, to.clone()),
            Command::Refresh => doc.refresh(),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = s.trim();
        if cmd.is_empty() {
            return Err(CommandError::Empty);
        }

        let (word, rest) = cmd
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((cmd, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();

        match word.to_ascii_lowercase().as_str() {
            "clear" | "del" => match args.as_slice() {
                [cell] => Ok(Command::Clear(parse_cell(cell)?)),
                _ => Err(CommandError::Usage("clear CELL")),
            },
            "insert-row" | "ir" => {
                let (index, placement) = index_and_placement(&args, "insert-row ROW [after]")?;
                Ok(Command::InsertRow {
                    row: parse_row(index)?,
                    placement,
                })
            }
            "delete-row" | "dr" => match args.as_slice() {
                [row] => Ok(Command::DeleteRow(parse_row(row)?)),
                _ => Err(CommandError::Usage("delete-row ROW")),
            },
            "insert-col" | "ic" => {
                let (index, placement) = index_and_placement(&args, "insert-col COL [after]")?;
                Ok(Command::InsertColumn {
                    col: parse_col(index)?,
                    placement,
                })
            }
            "delete-col" | "dc" => match args.as_slice() {
                [col] => Ok(Command::DeleteColumn(parse_col(col)?)),
                _ => Err(CommandError::Usage("delete-col COL")),
            },
            "width" | "cw" => match args.as_slice() {
                [col, width] => Ok(Command::Width {
                    col: parse_col(col)?,
                    width: width
                        .parse()
                        .map_err(|_| CommandError::InvalidWidth(width.to_string()))?,
                }),
                _ => Err(CommandError::Usage("width COL WIDTH")),
            },
            "copy" | "cp" => match args.as_slice() {
                [from, to] => Ok(Command::Copy {
                    from: parse_cell(from)?,
                    to: parse_cell(to)?,
                }),
                _ => Err(CommandError::Usage("copy FROM TO")),
            },
            "refresh" => Ok(Command::Refresh),
            _ => parse_assignment(cmd),
        }
    }
}

/// `A1 = input`, where the input keeps its own `=` or `'` prefix.
fn parse_assignment(cmd: &str) -> Result<Command, CommandError> {
    let Some((name, input)) = cmd.split_once('=') else {
        let word = cmd.split_whitespace().next().unwrap_or(cmd);
        return Err(CommandError::Unknown(word.to_string()));
    };
    Ok(Command::Set {
        cell: parse_cell(name.trim())?,
        input: input.trim().to_string(),
    })
}

fn index_and_placement<'a>(
    args: &[&'a str],
    usage: &'static str,
) -> Result<(&'a str, Placement), CommandError> {
    match args {
        [index] => Ok((*index, Placement::Before)),
        [index, side] if side.eq_ignore_ascii_case("before") => Ok((*index, Placement::Before)),
        [index, side] if side.eq_ignore_ascii_case("after") => Ok((*index, Placement::After)),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn parse_cell(s: &str) -> Result<CellRef, CommandError> {
    CellRef::from_str(s).ok_or_else(|| CommandError::InvalidCell(s.to_string()))
}

fn parse_row(s: &str) -> Result<usize, CommandError> {
    s.parse::<usize>()
        .ok()
        .and_then(|r| r.checked_sub(1))
        .ok_or_else(|| CommandError::InvalidRow(s.to_string()))
}

fn parse_col(s: &str) -> Result<usize, CommandError> {
    CellRef::letters_to_col(s).ok_or_else(|| CommandError::InvalidColumn(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    #[test]
    fn test_parse_assignment_keeps_prefix() {
        assert_eq!(
            "A1 = =B1 + 1".parse::<Command>().unwrap(),
            Command::Set {
                cell: at("A1"),
                input: "=B1 + 1".to_string()
            }
        );
        assert_eq!(
            "b2='hello".parse::<Command>().unwrap(),
            Command::Set {
                cell: at("B2"),
                input: "'hello".to_string()
            }
        );
        assert_eq!(
            "C3 =".parse::<Command>().unwrap(),
            Command::Set {
                cell: at("C3"),
                input: String::new()
            }
        );
    }

    #[test]
    fn test_parse_structural_commands() {
        assert_eq!(
            "insert-row 3 after".parse::<Command>().unwrap(),
            Command::InsertRow {
                row: 2,
                placement: Placement::After
            }
        );
        assert_eq!(
            "ic b".parse::<Command>().unwrap(),
            Command::InsertColumn {
                col: 1,
                placement: Placement::Before
            }
        );
        assert_eq!("delete-row 1".parse::<Command>().unwrap(), Command::DeleteRow(0));
        assert_eq!("dc AA".parse::<Command>().unwrap(), Command::DeleteColumn(26));
        assert_eq!(
            "width C 30".parse::<Command>().unwrap(),
            Command::Width { col: 2, width: 30 }
        );
        assert_eq!(
            "copy A1 B2".parse::<Command>().unwrap(),
            Command::Copy {
                from: at("A1"),
                to: at("B2")
            }
        );
        assert_eq!("clear A1".parse::<Command>().unwrap(), Command::Clear(at("A1")));
        assert_eq!("REFRESH".parse::<Command>().unwrap(), Command::Refresh);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "frobnicate A1".parse::<Command>(),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert_eq!(
            "delete-row 0".parse::<Command>(),
            Err(CommandError::InvalidRow("0".to_string()))
        );
        assert_eq!(
            "insert-col 3".parse::<Command>(),
            Err(CommandError::InvalidColumn("3".to_string()))
        );
        assert_eq!(
            "insert-row 3 sideways".parse::<Command>(),
            Err(CommandError::Usage("insert-row ROW [after]"))
        );
        assert_eq!(
            "1A = 5".parse::<Command>(),
            Err(CommandError::InvalidCell("1A".to_string()))
        );
    }

    #[test]
    fn test_apply_edits() {
        let mut doc = Document::new();
        for cmd in ["A1 = 2", "A2 = =A1*3", "insert-row 1", "width B 20"] {
            cmd.parse::<Command>().unwrap().apply(&mut doc);
        }
        assert_eq!(doc.get_cell_display(&at("A3"), 2), "6");
        assert_eq!(doc.get_cell(&at("A3")).unwrap().raw, "A2*3");
        assert_eq!(doc.column_width(1), 20);
    }
}
