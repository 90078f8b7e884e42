//! Document state and logic (UI-agnostic).

mod io;
mod ops;
mod recalc;
mod state;

pub use ops::Placement;
pub use state::{DEFAULT_COLUMN_WIDTH, DEFAULT_PRECISION, Document};
