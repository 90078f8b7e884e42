use super::Document;
use crate::error::{Result, TabulaError};
use crate::storage::{
    FileFormat, SheetData, parse_csv_content, parse_tbl_content, write_csv_content,
    write_markdown_content, write_tbl_content,
};
use std::path::{Path, PathBuf};
use tabula_engine::engine::{CellKind, CellRef, GridOperands, evaluate_input};
use tracing::debug;

impl Document {
    /// Non-empty cells in row-major order with their prefixed raw text.
    pub fn cells_for_save(&self) -> Vec<(CellRef, String)> {
        let mut cells: Vec<(CellRef, String)> = self
            .grid
            .iter()
            .filter(|entry| !entry.is_empty())
            .map(|entry| (entry.key().clone(), entry.input_string()))
            .collect();
        cells.sort_by(|a, b| a.0.cmp(&b.0));
        cells
    }

    /// Replace the sheet with the given cells and width overrides.
    ///
    /// Cells are evaluated in the order given; formulas that read cells
    /// loaded later are fixed up by the single refresh at the end.
    pub fn load_cells<I>(&mut self, cells: I, widths: &[(usize, usize)])
    where
        I: IntoIterator<Item = (CellRef, String)>,
    {
        self.grid.clear();
        self.widths.clear();

        for (cell_ref, raw) in cells {
            let cell = evaluate_input(&raw, &cell_ref, &mut GridOperands(&self.grid));
            self.grid.insert(cell_ref, cell);
        }
        for (col, width) in widths {
            self.widths.insert(*col, (*width).max(1));
        }

        self.refresh();
        self.modified = false;
    }

    /// Text shown for a cell: `#ERR!` for failures, blank for empty or absent cells.
    pub fn get_cell_display(&self, cell_ref: &CellRef, precision: usize) -> String {
        let Some(cell) = self.grid.get(cell_ref) else {
            return String::new();
        };
        if cell.has_error() {
            return "#ERR!".to_string();
        }
        match cell.kind {
            CellKind::Empty => String::new(),
            _ => cell.value.display(precision),
        }
    }

    /// Load a .tbl or .csv file, replacing the current sheet.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path)?;
        if !format.is_loadable() {
            return Err(TabulaError::UnsupportedFormat(format!(
                "{} (export only)",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let sheet = match format {
            FileFormat::Csv => SheetData {
                cells: parse_csv_content(&content),
                widths: Vec::new(),
            },
            _ => parse_tbl_content(&content)?,
        };
        debug!(path = %path.display(), cells = sheet.cells.len(), "loading");

        self.load_cells(sheet.cells, &sheet.widths);
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Save to the current file path.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let path = self.file_path.clone().ok_or(TabulaError::NoFilePath)?;
        self.save_as(&path)?;
        Ok(path)
    }

    /// Write the sheet in the format implied by the extension.
    ///
    /// A .tbl or .csv target becomes the document's file path. Markdown is an
    /// export and leaves the path and modified flag alone.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path)?;
        let content = match format {
            FileFormat::Tbl => write_tbl_content(&SheetData {
                cells: self.cells_for_save(),
                widths: self.column_widths(),
            }),
            FileFormat::Csv => write_csv_content(&self.cells_for_save()),
            FileFormat::Markdown => write_markdown_content(self, self.precision),
        };
        std::fs::write(path, content)?;
        debug!(path = %path.display(), ?format, "saved");

        if format.is_loadable() {
            self.file_path = Some(path.to_path_buf());
            self.modified = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_engine::engine::Value;

    fn at(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    fn temp_path(tag: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "tabula_{}_{}_{}_{:?}.{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
            ext,
        ))
    }

    struct Cleanup(PathBuf);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_cells_for_save_prefixes_and_order() {
        let mut doc = Document::new();
        doc.set_cell_from_input(at("B2"), "'note");
        doc.set_cell_from_input(at("B1"), "=A1+1");
        doc.set_cell_from_input(at("C1"), "2.50");

        // B1 materialized an empty A1 placeholder, which is not saved.
        assert_eq!(
            doc.cells_for_save(),
            vec![
                (at("B1"), "=A1+1".to_string()),
                (at("C1"), "2.50".to_string()),
                (at("B2"), "'note".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_cells_refreshes_forward_references() {
        let mut doc = Document::new();
        doc.set_cell_from_input(at("Z9"), "1");
        doc.load_cells(
            vec![
                (at("A1"), "=A2*2".to_string()),
                (at("A2"), "21".to_string()),
            ],
            &[(0, 12)],
        );

        assert!(doc.get_cell(&at("Z9")).is_none());
        assert_eq!(doc.get_cell(&at("A1")).unwrap().value, Value::Number(42.0));
        assert_eq!(doc.column_width(0), 12);
        assert!(!doc.modified);
    }

    #[test]
    fn test_get_cell_display() {
        let mut doc = Document::new();
        doc.set_cell_from_input(at("A1"), "=1/3");
        doc.set_cell_from_input(at("A2"), "=A9+foo");
        doc.set_cell_from_input(at("A3"), "'text");

        assert_eq!(doc.get_cell_display(&at("A1"), 3), "0.333");
        assert_eq!(doc.get_cell_display(&at("A2"), 2), "#ERR!");
        assert_eq!(doc.get_cell_display(&at("A3"), 2), "text");
        assert_eq!(doc.get_cell_display(&at("A9"), 2), "");
        assert_eq!(doc.get_cell_display(&at("Q7"), 2), "");
    }

    #[test]
    fn test_tbl_save_and_reload() {
        let path = temp_path("roundtrip", "tbl");
        let _cleanup = Cleanup(path.clone());

        let mut doc = Document::new();
        doc.set_cell_from_input(at("A1"), "10");
        doc.set_cell_from_input(at("A2"), "=A1*2");
        doc.set_cell_from_input(at("B1"), "'=not a formula");
        doc.set_column_width(1, 25);
        doc.save_as(&path).unwrap();
        assert!(!doc.modified);
        assert_eq!(doc.file_path.as_deref(), Some(path.as_path()));

        let loaded = Document::with_file(Some(path.clone())).unwrap();
        assert_eq!(loaded.cells_for_save(), doc.cells_for_save());
        assert_eq!(loaded.column_width(1), 25);
        assert_eq!(
            loaded.get_cell(&at("A2")).unwrap().value,
            Value::Number(20.0)
        );
    }

    #[test]
    fn test_csv_save_and_reload() {
        let path = temp_path("csv", "csv");
        let _cleanup = Cleanup(path.clone());

        let mut doc = Document::new();
        doc.set_cell_from_input(at("A1"), "1");
        doc.set_cell_from_input(at("B1"), "=SUM(A1, 2)");
        doc.save_as(&path).unwrap();

        let mut loaded = Document::new();
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded.get_cell(&at("B1")).unwrap().value, Value::Number(3.0));
    }

    #[test]
    fn test_markdown_is_export_only() {
        let path = temp_path("export", "md");
        let _cleanup = Cleanup(path.clone());

        let mut doc = Document::new();
        doc.set_cell_from_input(at("A1"), "=2*3");
        doc.save_as(&path).unwrap();
        assert!(doc.file_path.is_none());
        assert!(doc.modified);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("| 1 | 6 |"));
        assert!(matches!(
            Document::new().load_file(&path),
            Err(TabulaError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_save_without_path() {
        let mut doc = Document::new();
        assert!(matches!(doc.save_file(), Err(TabulaError::NoFilePath)));
    }

    #[test]
    fn test_with_file_missing_path_becomes_target() {
        let path = temp_path("missing", "tbl");
        let doc = Document::with_file(Some(path.clone())).unwrap();
        assert_eq!(doc.file_path, Some(path));
        assert_eq!(doc.cell_count(), 0);
    }
}
