//! Column letters, sheet quoting and A1 range addresses.
//!
//! Provides bidirectional conversion between spreadsheet-style column letters
//! ("A", "Z", "AA") and 1-based column numbers, plus parsing and formatting of
//! `[Sheet!]A1[:B2]` range addresses.
//!
//! # Examples
//!
//! ```ignore
//! let range: RangeAddress = "Sheet1!$A$1:D10".parse().unwrap();
//! assert_eq!(range.end_col, 4);
//! assert_eq!(range.to_string(), "Sheet1!$A$1:$D$10");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{RangeError, Result};

/// Host column ceiling (column `XFD`).
pub const MAX_COLUMNS: u32 = 16_384;
/// Host row ceiling.
pub const MAX_ROWS: u32 = 1_048_576;

/// Convert column letters to a 1-based column number ("A" -> 1, "AA" -> 27).
///
/// Input is case-insensitive. Empty strings and non-letters are rejected.
/// Letters past "XFD" are clamped to [`MAX_COLUMNS`].
pub fn column_to_number(letters: &str) -> Result<u32> {
    column_value(letters).map(|n| n.min(MAX_COLUMNS))
}

/// Unclamped column value, saturating one past the host ceiling so callers
/// can tell "XFD" from anything beyond it.
fn column_value(letters: &str) -> Result<u32> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(RangeError::InvalidColumnLetters(letters.to_string()));
    }

    let mut acc = 0u32;
    for c in letters.to_ascii_uppercase().bytes() {
        let digit = u32::from(c - b'A') + 1;
        acc = (acc * 26 + digit).min(MAX_COLUMNS + 1);
    }
    Ok(acc)
}

/// Convert a 1-based column number to letters (1 -> "A", 27 -> "AA").
///
/// Numbers above [`MAX_COLUMNS`] are clamped to the last host column.
pub fn number_to_column(n: i64) -> Result<String> {
    if n <= 0 {
        return Err(RangeError::InvalidColumnNumber(n));
    }
    let clamped = n.min(i64::from(MAX_COLUMNS)) as u32;
    Ok(column_letters(clamped))
}

/// Infallible variant used by the compiler once a column is known to be >= 1.
pub(crate) fn column_letters(col: u32) -> String {
    let mut n = col.clamp(1, MAX_COLUMNS);
    let mut letters = Vec::with_capacity(3);
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn bare_sheet_re() -> &'static Regex {
    static SHEET_RE: OnceLock<Regex> = OnceLock::new();
    SHEET_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("bare sheet name regex must compile")
    })
}

fn range_re() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?:'(?<qsheet>(?:[^']|'')+)'|(?<sheet>[^'!]+))!)?\$?(?<c1>[A-Za-z]{1,3})\$?(?<r1>[0-9]+)(?::\$?(?<c2>[A-Za-z]{1,3})\$?(?<r2>[0-9]+))?$",
        )
        .expect("range address regex must compile")
    })
}

/// Quote a sheet name for use in a reference.
///
/// Plain identifiers are returned unchanged; anything else is wrapped in single
/// quotes with embedded quotes doubled. An empty name yields an empty string.
pub fn quote_sheet_name(name: &str) -> String {
    if name.is_empty() || bare_sheet_re().is_match(name) {
        return name.to_string();
    }
    format!("'{}'", name.replace('\'', "''"))
}

/// `Sheet!` prefix for a reference, or nothing when the sheet is empty.
pub(crate) fn sheet_prefix(sheet: &str) -> String {
    if sheet.is_empty() {
        String::new()
    } else {
        format!("{}!", quote_sheet_name(sheet))
    }
}

/// Format an absolute cell reference without a sheet prefix (`$B$7`).
pub(crate) fn anchored_cell(col: u32, row: u32) -> String {
    format!("${}${}", column_letters(col), row.clamp(1, MAX_ROWS))
}

/// A single cell on an optional sheet. Columns and rows are 1-based.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellAddress {
    pub sheet: String,
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    pub fn new(sheet: impl Into<String>, col: u32, row: u32) -> CellAddress {
        CellAddress {
            sheet: sheet.into(),
            col,
            row,
        }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            sheet_prefix(&self.sheet),
            anchored_cell(self.col, self.row)
        )
    }
}

/// A closed rectangular range. Columns and rows are 1-based and inclusive.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RangeAddress {
    pub sheet: String,
    pub start_col: u32,
    pub start_row: u32,
    pub end_col: u32,
    pub end_row: u32,
}

impl RangeAddress {
    pub fn new(
        sheet: impl Into<String>,
        start_col: u32,
        start_row: u32,
        end_col: u32,
        end_row: u32,
    ) -> RangeAddress {
        RangeAddress {
            sheet: sheet.into(),
            start_col,
            start_row,
            end_col,
            end_row,
        }
    }

    pub fn cell(sheet: impl Into<String>, col: u32, row: u32) -> RangeAddress {
        Self::new(sheet, col, row, col, row)
    }

    pub fn col_count(&self) -> u32 {
        self.end_col.saturating_sub(self.start_col) + 1
    }

    pub fn row_count(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row) + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.start_col == self.end_col && self.start_row == self.end_row
    }

    pub fn top_left(&self) -> CellAddress {
        CellAddress::new(self.sheet.clone(), self.start_col, self.start_row)
    }

    /// Column letters for every column of the range, left to right.
    pub fn column_letters(&self) -> Vec<String> {
        (self.start_col..=self.end_col).map(column_letters).collect()
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", sheet_prefix(&self.sheet))?;
        if self.is_single_cell() {
            write!(f, "{}", anchored_cell(self.start_col, self.start_row))
        } else {
            write!(
                f,
                "{}:{}",
                anchored_cell(self.start_col, self.start_row),
                anchored_cell(self.end_col, self.end_row)
            )
        }
    }
}

impl std::str::FromStr for RangeAddress {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_range_address(s)
    }
}

/// Parse `[Sheet!]Col Row[:Col Row]`, with optional `$` anchors on every
/// coordinate and an optional single-quoted sheet name.
///
/// Single cells become 1x1 ranges. Reversed corners are normalised so that the
/// start is always the top-left. Coordinates past the host limits are rejected.
pub fn parse_range_address(text: &str) -> Result<RangeAddress> {
    let parse_err = || RangeError::Parse(text.to_string());
    let caps = range_re().captures(text.trim()).ok_or_else(parse_err)?;

    let sheet = match (caps.name("qsheet"), caps.name("sheet")) {
        (Some(q), _) => q.as_str().replace("''", "'"),
        (None, Some(s)) => s.as_str().to_string(),
        (None, None) => String::new(),
    };

    let coord = |col: &str, row: &str| -> Result<(u32, u32)> {
        let col = column_value(col).map_err(|_| parse_err())?;
        let row = row.parse::<u32>().map_err(|_| parse_err())?;
        if col > MAX_COLUMNS || row == 0 || row > MAX_ROWS {
            return Err(parse_err());
        }
        Ok((col, row))
    };

    let (c1, r1) = coord(&caps["c1"], &caps["r1"])?;
    let (c2, r2) = match (caps.name("c2"), caps.name("r2")) {
        (Some(c), Some(r)) => coord(c.as_str(), r.as_str())?,
        _ => (c1, r1),
    };

    Ok(RangeAddress::new(
        sheet,
        c1.min(c2),
        r1.min(r2),
        c1.max(c2),
        r1.max(r2),
    ))
}
