//! Classification of stored named ranges.
//!
//! Everything here works on the text the host hands back: a formula, the
//! value it resolved to and (when the host could resolve it) an address.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::NameError;

/// The host's broken-reference sentinel.
pub const REF_ERROR: &str = "#REF!";

/// Host limit on identifier length.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RangeType {
    Fixed,
    Dynamic,
    Hybrid,
}

impl fmt::Display for RangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RangeType::Fixed => "fixed",
            RangeType::Dynamic => "dynamic",
            RangeType::Hybrid => "hybrid",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Health {
    Valid,
    Broken,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Health::Valid => "valid",
            Health::Broken => "broken",
        })
    }
}

/// A value as resolved by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum ResolvedValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Error(String),
    Array(Vec<Vec<ResolvedValue>>),
}

impl ResolvedValue {
    /// True for the host's `#REF!` sentinel, whether reported as an error, as
    /// text, or as the only cell of a 1x1 grid.
    pub fn is_ref_error(&self) -> bool {
        match self {
            ResolvedValue::Error(e) | ResolvedValue::Text(e) => e.trim() == REF_ERROR,
            ResolvedValue::Array(rows) => match rows.as_slice() {
                [row] => matches!(row.as_slice(), [only] if only.is_ref_error()),
                _ => false,
            },
            _ => false,
        }
    }
}

fn dynamic_fn_re() -> &'static Regex {
    static DYNAMIC_RE: OnceLock<Regex> = OnceLock::new();
    DYNAMIC_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(OFFSET|INDIRECT|INDEX)\s*\(").expect("dynamic function regex must compile")
    })
}

fn cell_like_re() -> &'static Regex {
    static CELL_LIKE_RE: OnceLock<Regex> = OnceLock::new();
    CELL_LIKE_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{1,3}[0-9]+$").expect("cell-like name regex must compile")
    })
}

/// Split a formula into its top-level areas.
///
/// The leading `=` and a single pair of wrapping parentheses are dropped.
/// Commas inside function calls, quoted sheet names and string literals do
/// not split.
pub fn split_areas(formula: &str) -> Vec<&str> {
    let mut body = formula.trim();
    body = body.strip_prefix('=').unwrap_or(body).trim();
    if body.starts_with('(') && body.ends_with(')') && closing_paren(body, 0) == Some(body.len() - 1)
    {
        body = &body[1..body.len() - 1];
    }

    let mut areas = Vec::new();
    let mut depth = 0usize;
    let mut in_sheet = false;
    let mut in_string = false;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        match ch {
            '\'' if !in_string => in_sheet = !in_sheet,
            '"' if !in_sheet => in_string = !in_string,
            '(' if !in_sheet && !in_string => depth += 1,
            ')' if !in_sheet && !in_string => depth = depth.saturating_sub(1),
            ',' if depth == 0 && !in_sheet && !in_string => {
                areas.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = body[start..].trim();
    if !last.is_empty() || !areas.is_empty() {
        areas.push(last);
    }
    areas
}

/// Byte index of the parenthesis closing the one opened at `open`.
fn closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// True when the formula references more than one area.
pub fn is_union(formula: &str) -> bool {
    split_areas(formula).len() > 1
}

/// Classify a formula as fixed, dynamic or hybrid.
pub fn detect_range_type(formula: &str) -> RangeType {
    let areas = split_areas(formula);
    let dynamic = areas
        .iter()
        .filter(|area| dynamic_fn_re().is_match(area))
        .count();
    match (areas.len() > 1, dynamic) {
        (_, 0) => RangeType::Fixed,
        (false, _) => RangeType::Dynamic,
        (true, _) => RangeType::Hybrid,
    }
}

/// Decide whether a stored name still points somewhere.
///
/// Dynamic and union formulas may legitimately come back without an address
/// before the host evaluates them; a plain formula without one is broken.
pub fn classify_health(
    formula: &str,
    resolved_value: &ResolvedValue,
    resolved_address: Option<&str>,
) -> Health {
    if resolved_value.is_ref_error() || formula.to_ascii_uppercase().contains(REF_ERROR) {
        return Health::Broken;
    }
    let unresolved = resolved_address.is_none_or(|address| address.trim().is_empty());
    if unresolved && detect_range_type(formula) == RangeType::Fixed && !is_union(formula) {
        return Health::Broken;
    }
    Health::Valid
}

/// Check a candidate identifier against the host's naming rules.
pub fn validate_name(candidate: &str) -> Result<(), NameError> {
    if candidate.trim().is_empty() {
        return Err(NameError::Empty);
    }
    if candidate.chars().any(char::is_whitespace) {
        return Err(NameError::ContainsWhitespace);
    }

    let mut chars = candidate.chars();
    let Some(first) = chars.next() else {
        return Err(NameError::Empty);
    };
    if first.is_ascii_digit() {
        return Err(NameError::LeadingDigit);
    }
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(NameError::InvalidLeadingChar);
    }
    if let Some(bad) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '.') {
        return Err(NameError::InvalidChar(bad));
    }
    if cell_like_re().is_match(candidate) {
        return Err(NameError::LooksLikeCellRef(candidate.to_string()));
    }
    if candidate.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong { max: MAX_NAME_LEN });
    }
    Ok(())
}
