//! Cell coordinate naming.
//!
//! Provides bidirectional conversion between cell names (e.g., "A1", "B12",
//! "AA100") and zero-indexed column/row coordinates. Columns use bijective
//! base-26 lettering (A..Z, AA, AB, ...), rows are 1-based decimals.
//!
//! # Examples
//!
//! ```
//! use tabula_engine::engine::CellRef;
//!
//! let cell = CellRef::parse("B3").unwrap();
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::InvalidCellName;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("cell name regex must compile")
    })
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell name (e.g., "A1", "b2", "AA10").
    pub fn parse(name: &str) -> Result<CellRef, InvalidCellName> {
        Self::parse_name(name).ok_or_else(|| InvalidCellName(name.to_string()))
    }

    /// Parse a cell name, returning None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_name(name)
    }

    fn parse_name(name: &str) -> Option<CellRef> {
        let caps = name_re().captures(name)?;
        let col = Self::letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<u128>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, usize::try_from(row).ok()?))
    }

    /// Decode column letters (case-insensitive) into a zero-based index.
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        // One past usize::MAX is still a valid bijective value, so accumulate wide.
        let mut col_acc = 0u128;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as u128 + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        usize::try_from(col_acc.checked_sub(1)?).ok()
    }

    /// Convert column index to letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Offset this reference, returning None if either coordinate would go negative.
    pub fn offset(&self, delta_col: isize, delta_row: isize) -> Option<CellRef> {
        let col = self.col.checked_add_signed(delta_col)?;
        let row = self.row.checked_add_signed(delta_row)?;
        Some(CellRef::new(col, row))
    }
}

impl std::str::FromStr for CellRef {
    type Err = InvalidCellName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            CellRef::col_to_letters(self.col),
            self.row as u128 + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::CellRef;
    use proptest::prelude::*;

    #[test]
    fn test_parse_name_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::from_str(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_max_coordinates_round_trip() {
        let corner = CellRef::new(usize::MAX, usize::MAX);
        let name = corner.to_string();
        assert!(name.ends_with(&(usize::MAX as u128 + 1).to_string()));
        assert_eq!(CellRef::parse(&name).unwrap(), corner);
    }

    #[test]
    fn test_col_to_letters_boundaries() {
        assert_eq!(CellRef::col_to_letters(0), "A");
        assert_eq!(CellRef::col_to_letters(25), "Z");
        assert_eq!(CellRef::col_to_letters(26), "AA");
        assert_eq!(CellRef::col_to_letters(701), "ZZ");
        assert_eq!(CellRef::col_to_letters(702), "AAA");
    }

    #[test]
    fn test_parse_reports_invalid_name() {
        let err = CellRef::parse("12A").unwrap_err();
        assert_eq!(err.to_string(), "Invalid cell name '12A'");
        assert!(CellRef::parse("ABC").is_err());
        assert!(CellRef::parse("A1B").is_err());
    }

    #[test]
    fn test_offset_rejects_negative() {
        let b2 = CellRef::new(1, 1);
        assert_eq!(b2.offset(-1, 1), Some(CellRef::new(0, 2)));
        assert_eq!(b2.offset(-2, 0), None);
    }

    proptest! {
        #[test]
        fn name_round_trips(col in any::<usize>(), row in any::<usize>()) {
            let cell = CellRef::new(col, row);
            prop_assert_eq!(CellRef::parse(&cell.to_string()).unwrap(), cell);
        }
    }
}
