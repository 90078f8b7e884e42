//! File formats built on the document's save/load contract.
//!
//! Every reader produces a [`SheetData`] and every writer consumes one, so the
//! formats never touch the grid directly.

mod csv;
mod md;
mod parser;
mod writer;

pub use csv::{parse_csv_content, write_csv_content};
pub use md::write_markdown_content;
pub use parser::parse_tbl_content;
pub use writer::write_tbl_content;

use crate::error::{Result, TabulaError};
use std::path::Path;
use tabula_engine::engine::CellRef;

/// Prefixed raw cell texts plus column width overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetData {
    pub cells: Vec<(CellRef, String)>,
    pub widths: Vec<(usize, usize)>,
}

/// Formats the document can be written as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    /// Native `A1: =B1+1` text.
    Tbl,
    Csv,
    /// Evaluated values only; cannot be loaded back.
    Markdown,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<FileFormat> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("tbl") => Ok(FileFormat::Tbl),
            Some("csv") => Ok(FileFormat::Csv),
            Some("md") => Ok(FileFormat::Markdown),
            Some(other) => Err(TabulaError::UnsupportedFormat(format!(".{}", other))),
            None => Err(TabulaError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn is_loadable(&self) -> bool {
        !matches!(self, FileFormat::Markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.tbl")).unwrap(), FileFormat::Tbl);
        assert_eq!(FileFormat::from_path(Path::new("a.CSV")).unwrap(), FileFormat::Csv);
        assert_eq!(
            FileFormat::from_path(Path::new("out/report.md")).unwrap(),
            FileFormat::Markdown
        );
        assert!(matches!(
            FileFormat::from_path(Path::new("a.xlsx")),
            Err(TabulaError::UnsupportedFormat(ext)) if ext == ".xlsx"
        ));
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }
}
