use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::host::{EditTokens, SavePayload, SelectionSnapshot, name_key};
use rangekit_engine::engine::{
    REF_ERROR, RangeType, ResolvedValue, detect_range_type, parse_range_address, split_areas,
};

/// Resolution result for a formula the host cannot interpret.
pub(crate) const NAME_ERROR: &str = "#NAME?";

/// A host document kept entirely in memory.
///
/// Names are keyed case-insensitively and unique across the whole document,
/// whatever their scope.
pub struct MemoryHost {
    /// Stored names by [`name_key`] (DashMap is internally Arc-based, clones are cheap)
    pub(crate) names: Arc<DashMap<String, SavePayload>>,
    /// Known sheet names, in declaration order
    pub(crate) sheets: Vec<String>,
    /// The user's current selection, if any
    pub(crate) selection: Option<SelectionSnapshot>,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether names have changed since the last load or save
    pub modified: bool,
    pub(crate) edits: EditTokens,
}

impl MemoryHost {
    /// Create an empty document.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        MemoryHost {
            names: Arc::new(DashMap::new()),
            sheets: Vec::new(),
            selection: None,
            file_path: None,
            modified: false,
            edits: EditTokens::new(),
        }
    }

    pub fn with_sheets<I, S>(sheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut host = Self::new();
        host.sheets = sheets.into_iter().map(Into::into).collect();
        host
    }

    pub fn add_sheet(&mut self, sheet: &str) {
        if !self.has_sheet(sheet) {
            self.sheets.push(sheet.to_string());
            self.modified = true;
        }
    }

    pub fn set_selection(&mut self, selection: Option<SelectionSnapshot>) {
        self.selection = selection;
        self.modified = true;
    }

    /// An empty sheet list means the layout is unknown and any sheet is accepted.
    pub(crate) fn has_sheet(&self, sheet: &str) -> bool {
        self.sheets.is_empty() || self.sheets.iter().any(|s| s.eq_ignore_ascii_case(sheet))
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&name_key(name))
    }

    /// Resolve a formula the way the host would before evaluation.
    ///
    /// Dynamic formulas need the host's evaluator and stay unresolved.
    pub(crate) fn resolve(&self, formula: &str) -> (Option<String>, ResolvedValue) {
        if formula.to_ascii_uppercase().contains(REF_ERROR) {
            return (None, ResolvedValue::Error(REF_ERROR.to_string()));
        }
        if detect_range_type(formula) != RangeType::Fixed {
            return (None, ResolvedValue::Empty);
        }

        let mut addresses = Vec::new();
        for area in split_areas(formula) {
            let Ok(mut range) = parse_range_address(area) else {
                return (None, ResolvedValue::Error(NAME_ERROR.to_string()));
            };
            if range.sheet.is_empty() {
                range.sheet = self.sheets.first().cloned().unwrap_or_default();
            } else if !self.has_sheet(&range.sheet) {
                return (None, ResolvedValue::Error(REF_ERROR.to_string()));
            }
            addresses.push(range.to_string());
        }
        if addresses.is_empty() {
            return (None, ResolvedValue::Error(NAME_ERROR.to_string()));
        }
        (Some(addresses.join(",")), ResolvedValue::Empty)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_and_union() {
        let host = MemoryHost::with_sheets(["Sheet1", "My Data"]);
        assert_eq!(
            host.resolve("=Sheet1!$A$1:$D$10"),
            (Some("Sheet1!$A$1:$D$10".into()), ResolvedValue::Empty)
        );
        assert_eq!(
            host.resolve("='My Data'!A1,'My Data'!C1:D2").0.as_deref(),
            Some("'My Data'!$A$1,'My Data'!$C$1:$D$2")
        );
        assert_eq!(host.resolve("=B2").0.as_deref(), Some("Sheet1!$B$2"));
    }

    #[test]
    fn test_resolve_failures() {
        let host = MemoryHost::with_sheets(["Sheet1"]);
        assert_eq!(
            host.resolve("=Gone!$A$1"),
            (None, ResolvedValue::Error(REF_ERROR.into()))
        );
        assert_eq!(
            host.resolve("=#REF!$A$1"),
            (None, ResolvedValue::Error(REF_ERROR.into()))
        );
        assert_eq!(
            host.resolve("=not a range"),
            (None, ResolvedValue::Error(NAME_ERROR.into()))
        );
    }

    #[test]
    fn test_dynamic_stays_unresolved() {
        let host = MemoryHost::with_sheets(["Sheet1"]);
        assert_eq!(
            host.resolve("=OFFSET(Sheet1!$A$1,0,0,COUNTA(Sheet1!$A$1:$A$1010),4)"),
            (None, ResolvedValue::Empty)
        );
    }

    #[test]
    fn test_unknown_layout_accepts_any_sheet() {
        let host = MemoryHost::new();
        assert!(host.resolve("=Anything!A1").0.is_some());
    }
}
