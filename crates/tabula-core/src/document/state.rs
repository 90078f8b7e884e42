use crate::error::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use tabula_engine::engine::{Cell, CellRef, Grid};

/// Width used for columns without an override.
pub const DEFAULT_COLUMN_WIDTH: usize = 15;

/// Decimals shown for non-integer numbers.
pub const DEFAULT_PRECISION: usize = 2;

/// UI-agnostic document state for the spreadsheet.
pub struct Document {
    /// Sparse cell storage
    pub grid: Grid,
    /// Column width overrides, keyed by column index
    pub(crate) widths: HashMap<usize, usize>,
    /// Width reported for columns without an override
    pub default_column_width: usize,
    /// Decimals used by exports that render values
    pub precision: usize,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified
    pub modified: bool,
}

impl Document {
    /// Create a new document state.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Document {
            grid: Grid::new(),
            widths: HashMap::new(),
            default_column_width: DEFAULT_COLUMN_WIDTH,
            precision: DEFAULT_PRECISION,
            file_path: None,
            modified: false,
        }
    }

    /// Create a new document and load a file if provided.
    /// A path that does not exist yet becomes the save target.
    pub fn with_file(path: Option<PathBuf>) -> Result<Self> {
        let mut doc = Self::new();

        if let Some(ref p) = path {
            if p.exists() {
                doc.load_file(p)?;
            } else {
                doc.file_path = Some(p.clone());
                doc.modified = false;
            }
        }
        Ok(doc)
    }

    /// Snapshot of a cell.
    pub fn get_cell(&self, cell_ref: &CellRef) -> Option<Cell> {
        self.grid.get(cell_ref).map(|c| c.clone())
    }

    /// Number of cells in the grid, including placeholders.
    pub fn cell_count(&self) -> usize {
        self.grid.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
