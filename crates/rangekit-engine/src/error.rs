//! Error types for the rangekit engine.

use thiserror::Error;

/// Errors raised by the reference algebra, selection model and compiler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid column letters: {0:?}")]
    InvalidColumnLetters(String),

    #[error("Invalid column number: {0}")]
    InvalidColumnNumber(i64),

    #[error("Invalid range address: {0:?}")]
    Parse(String),

    #[error("Selection has no active rows or columns")]
    EmptySelection,

    #[error("Fixed column count {fixed} must be smaller than the {total} selected columns")]
    FixedSplitTooWide { fixed: u32, total: u32 },

    #[error("A fixed column split cannot be combined with skips inside the selection")]
    FixedSplitWithScatteredSkips,

    #[error("Skip index {index} is outside the selection ({len} entries)")]
    SkipIndexOutOfRange { index: u32, len: u32 },
}

/// Reasons a candidate named-range identifier is rejected.
///
/// The `Display` text is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Name cannot be empty")]
    Empty,

    #[error("Name cannot contain spaces")]
    ContainsWhitespace,

    #[error("Name must start with a letter or underscore, not a digit")]
    LeadingDigit,

    #[error("Name must start with a letter or underscore")]
    InvalidLeadingChar,

    #[error("Name can only contain letters, numbers, underscores, and dots (found {0:?})")]
    InvalidChar(char),

    #[error("'{0}' looks like a cell reference (e.g., A1, BC23). Choose a different name.")]
    LooksLikeCellRef(String),

    #[error("Name is longer than {max} characters")]
    TooLong { max: usize },
}

pub type Result<T> = std::result::Result<T, RangeError>;
