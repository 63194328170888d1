//! Port to the host spreadsheet document.
//!
//! The host owns every named range; rangekit only reads selection snapshots
//! and hands back `(name, formula, comment)` payloads to persist.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{RangekitError, Result};
use crate::tags::OverflowMap;
use rangekit_engine::engine::{RangeAddress, ResolvedValue, SelectionGrid, parse_range_address};

/// Where a name is visible.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Document,
    Sheet(String),
}

impl Scope {
    /// `"document"` (any case) maps to [`Scope::Document`], anything else is
    /// a sheet name.
    pub fn parse(text: &str) -> Scope {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("document") {
            Scope::Document
        } else {
            Scope::Sheet(text.to_string())
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Document => f.write_str("document"),
            Scope::Sheet(sheet) => f.write_str(sheet),
        }
    }
}

/// What the host reports about the user's current selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub sheet: String,
    /// Address without sheet prefix, e.g. `A1:D10`.
    pub address: String,
    pub values: Vec<Vec<ResolvedValue>>,
    pub start_row: u32,
    pub end_row: u32,
    pub start_column: String,
    pub end_column: String,
    pub columns: Vec<String>,
    pub row_count: u32,
    pub column_count: u32,
    /// Per row: non-blank cells just right of the selection.
    pub column_overflow: OverflowMap,
    /// Per column letter: non-blank cells just below the selection.
    pub row_overflow: OverflowMap,
}

impl SelectionSnapshot {
    /// Snapshot with every derived field filled in from a range.
    pub fn from_range(range: &RangeAddress) -> SelectionSnapshot {
        let columns = range.column_letters();
        let unsheeted = RangeAddress {
            sheet: String::new(),
            ..range.clone()
        };
        SelectionSnapshot {
            sheet: range.sheet.clone(),
            address: unsheeted.to_string().replace('$', ""),
            values: Vec::new(),
            start_row: range.start_row,
            end_row: range.end_row,
            start_column: columns.first().cloned().unwrap_or_default(),
            end_column: columns.last().cloned().unwrap_or_default(),
            row_count: range.row_count(),
            column_count: range.col_count(),
            columns,
            column_overflow: OverflowMap::new(),
            row_overflow: OverflowMap::new(),
        }
    }

    pub fn range(&self) -> Result<RangeAddress> {
        let mut range = parse_range_address(&self.address)?;
        if range.sheet.is_empty() {
            range.sheet = self.sheet.clone();
        }
        Ok(range)
    }

    /// A fresh grid with nothing skipped.
    pub fn grid(&self) -> Result<SelectionGrid> {
        Ok(SelectionGrid::new(self.range()?))
    }
}

/// The unit persisted by the host.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub name: String,
    /// Always starts with `=`.
    pub formula: String,
    /// Tag-encoded comment.
    pub comment: String,
    pub scope: Scope,
}

/// A named range as the host reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedRangeRecord {
    pub name: String,
    pub formula: String,
    pub comment: String,
    pub resolved_address: Option<String>,
    pub resolved_value: ResolvedValue,
    pub scope: Scope,
}

/// Operations rangekit needs from the host document.
pub trait HostDocument {
    fn selection(&self) -> Result<SelectionSnapshot>;

    fn sheets(&self) -> Result<Vec<String>>;

    fn names(&self) -> Result<Vec<NamedRangeRecord>>;

    fn create(&mut self, payload: &SavePayload) -> Result<()>;

    /// Replace the name currently called `original_name` (possibly renaming it).
    fn update(&mut self, original_name: &str, payload: &SavePayload) -> Result<()>;

    fn delete(&mut self, name: &str) -> Result<()>;

    /// Claim the single in-flight edit slot for a name.
    fn begin_edit(&self, name: &str) -> Result<EditToken>;
}

/// Tracks which names currently have an edit in flight.
#[derive(Clone, Debug, Default)]
pub struct EditTokens {
    active: Arc<DashMap<String, ()>>,
}

impl EditTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`; fails while another token for it is alive.
    pub fn begin(&self, name: &str) -> Result<EditToken> {
        let key = name_key(name);
        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => Err(RangekitError::EditInProgress(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(EditToken {
                    key,
                    active: Arc::clone(&self.active),
                })
            }
        }
    }

    pub fn is_editing(&self, name: &str) -> bool {
        self.active.contains_key(&name_key(name))
    }
}

/// Held while a name is being edited; releases the slot on drop.
#[derive(Debug)]
pub struct EditToken {
    key: String,
    active: Arc<DashMap<String, ()>>,
}

impl Drop for EditToken {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}

/// Host names compare case-insensitively.
pub fn name_key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parse_and_display() {
        assert_eq!(Scope::parse("Document"), Scope::Document);
        assert_eq!(Scope::parse(""), Scope::Document);
        assert_eq!(Scope::parse("Sheet2"), Scope::Sheet("Sheet2".into()));
        assert_eq!(Scope::Sheet("Q1".into()).to_string(), "Q1");
    }

    #[test]
    fn test_snapshot_from_range() {
        let snapshot = SelectionSnapshot::from_range(&RangeAddress::new("Data", 2, 3, 4, 8));
        assert_eq!(snapshot.address, "B3:D8");
        assert_eq!(snapshot.columns, vec!["B", "C", "D"]);
        assert_eq!(snapshot.start_column, "B");
        assert_eq!(snapshot.end_column, "D");
        assert_eq!(snapshot.row_count, 6);
        assert_eq!(snapshot.range().unwrap(), RangeAddress::new("Data", 2, 3, 4, 8));
    }

    #[test]
    fn test_edit_token_is_exclusive_until_dropped() {
        let tokens = EditTokens::new();
        let first = tokens.begin("Revenue").unwrap();
        assert!(matches!(
            tokens.begin("REVENUE"),
            Err(RangekitError::EditInProgress(_))
        ));
        assert!(tokens.begin("Costs").is_ok());
        drop(first);
        assert!(!tokens.is_editing("Revenue"));
        assert!(tokens.begin("Revenue").is_ok());
    }
}
