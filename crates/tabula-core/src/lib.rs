//! tabula-core - UI-agnostic document model, recalculation and storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{DEFAULT_COLUMN_WIDTH, DEFAULT_PRECISION, Document, Placement};
pub use error::{Result, TabulaError};

pub use tabula_engine::engine::CellRef;
