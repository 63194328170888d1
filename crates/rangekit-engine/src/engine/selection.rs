//! Selection grids with per-row and per-column skips.
//!
//! A [`SelectionGrid`] is created from a picked range and only changes through
//! single-index toggles, each of which returns a new grid. Skip indices are
//! relative to the range's top-left corner and zero-based.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::address::RangeAddress;
use crate::error::{RangeError, Result};

/// Relative indices excluded from a selection axis.
pub type SkipSet = BTreeSet<u32>;

/// Flip membership of a single index, returning a new set.
pub fn toggle_skip(set: &SkipSet, index: u32) -> SkipSet {
    let mut next = set.clone();
    if !next.remove(&index) {
        next.insert(index);
    }
    next
}

/// Indices `0..total` that are not skipped, in ascending order.
pub fn active_indices(total: u32, skipped: &SkipSet) -> Vec<u32> {
    (0..total).filter(|i| !skipped.contains(i)).collect()
}

/// Number of skipped indices at the very start of the axis.
///
/// Counting stops at the first active index, so skips after it never count.
pub fn leading_skip_count(total: u32, skipped: &SkipSet) -> u32 {
    (0..total).take_while(|i| skipped.contains(i)).count() as u32
}

/// A maximal run of consecutive absolute column numbers or row numbers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContiguousRun {
    pub start: u32,
    pub end: u32,
}

impl ContiguousRun {
    /// Number of rows or columns covered; a run is never empty.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Group ordered absolute values into runs; a gap starts a new run.
pub fn group_contiguous(values: &[u32]) -> Vec<ContiguousRun> {
    let mut runs: Vec<ContiguousRun> = Vec::new();
    for &value in values {
        match runs.last_mut() {
            Some(run) if run.end.checked_add(1) == Some(value) => run.end = value,
            _ => runs.push(ContiguousRun {
                start: value,
                end: value,
            }),
        }
    }
    runs
}

/// A picked range plus the rows and columns the user has excluded from it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SelectionGrid {
    pub range: RangeAddress,
    skipped_rows: SkipSet,
    skipped_cols: SkipSet,
}

impl SelectionGrid {
    pub fn new(range: RangeAddress) -> SelectionGrid {
        SelectionGrid {
            range,
            skipped_rows: SkipSet::new(),
            skipped_cols: SkipSet::new(),
        }
    }

    /// Build a grid with skips already applied, validating every index.
    pub fn with_skips(
        range: RangeAddress,
        skipped_rows: impl IntoIterator<Item = u32>,
        skipped_cols: impl IntoIterator<Item = u32>,
    ) -> Result<SelectionGrid> {
        let mut grid = SelectionGrid::new(range);
        for index in skipped_rows {
            check_index(index, grid.row_count())?;
            grid.skipped_rows.insert(index);
        }
        for index in skipped_cols {
            check_index(index, grid.col_count())?;
            grid.skipped_cols.insert(index);
        }
        Ok(grid)
    }

    pub fn row_count(&self) -> u32 {
        self.range.row_count()
    }

    pub fn col_count(&self) -> u32 {
        self.range.col_count()
    }

    pub fn skipped_rows(&self) -> &SkipSet {
        &self.skipped_rows
    }

    pub fn skipped_cols(&self) -> &SkipSet {
        &self.skipped_cols
    }

    pub fn toggle_row(&self, index: u32) -> Result<SelectionGrid> {
        check_index(index, self.row_count())?;
        Ok(SelectionGrid {
            skipped_rows: toggle_skip(&self.skipped_rows, index),
            ..self.clone()
        })
    }

    pub fn toggle_col(&self, index: u32) -> Result<SelectionGrid> {
        check_index(index, self.col_count())?;
        Ok(SelectionGrid {
            skipped_cols: toggle_skip(&self.skipped_cols, index),
            ..self.clone()
        })
    }

    /// Absolute row numbers that are still selected.
    pub fn active_rows(&self) -> Vec<u32> {
        active_indices(self.row_count(), &self.skipped_rows)
            .into_iter()
            .map(|i| self.range.start_row + i)
            .collect()
    }

    /// Absolute column numbers that are still selected.
    pub fn active_cols(&self) -> Vec<u32> {
        active_indices(self.col_count(), &self.skipped_cols)
            .into_iter()
            .map(|i| self.range.start_col + i)
            .collect()
    }

    pub fn row_runs(&self) -> Vec<ContiguousRun> {
        group_contiguous(&self.active_rows())
    }

    pub fn col_runs(&self) -> Vec<ContiguousRun> {
        group_contiguous(&self.active_cols())
    }

    pub fn leading_skipped_rows(&self) -> u32 {
        leading_skip_count(self.row_count(), &self.skipped_rows)
    }

    pub fn leading_skipped_cols(&self) -> u32 {
        leading_skip_count(self.col_count(), &self.skipped_cols)
    }

    /// True when every skip on both axes sits in the leading block, so the
    /// selection can be expressed with plain skip counts.
    pub fn has_only_leading_skips(&self) -> bool {
        self.skipped_rows.len() as u32 == self.leading_skipped_rows()
            && self.skipped_cols.len() as u32 == self.leading_skipped_cols()
    }
}

fn check_index(index: u32, len: u32) -> Result<()> {
    if index >= len {
        return Err(RangeError::SkipIndexOutOfRange { index, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[u32]) -> SkipSet {
        items.iter().copied().collect()
    }

    #[test]
    fn test_toggle_skip_is_symmetric_and_pure() {
        let original = set(&[1]);
        let added = toggle_skip(&original, 3);
        let removed = toggle_skip(&added, 1);
        assert_eq!(original, set(&[1]));
        assert_eq!(added, set(&[1, 3]));
        assert_eq!(removed, set(&[3]));
    }

    #[test]
    fn test_active_indices_preserve_order() {
        assert_eq!(active_indices(5, &set(&[1, 3])), vec![0, 2, 4]);
        assert!(active_indices(2, &set(&[0, 1])).is_empty());
    }

    #[test]
    fn test_leading_skip_count_stops_at_first_active() {
        assert_eq!(leading_skip_count(5, &set(&[0, 1, 3])), 2);
        assert_eq!(leading_skip_count(5, &set(&[2, 3])), 0);
        assert_eq!(leading_skip_count(3, &set(&[0, 1, 2])), 3);
    }

    #[test]
    fn test_group_contiguous() {
        let runs = group_contiguous(&[1, 3, 4, 7]);
        assert_eq!(
            runs,
            vec![
                ContiguousRun { start: 1, end: 1 },
                ContiguousRun { start: 3, end: 4 },
                ContiguousRun { start: 7, end: 7 },
            ]
        );
        assert_eq!(runs[1].len(), 2);
        assert!(group_contiguous(&[]).is_empty());
    }

    #[test]
    fn test_grid_skipping_column_b_splits_runs() {
        let grid = SelectionGrid::new(RangeAddress::new("Sheet1", 1, 1, 4, 10))
            .toggle_col(1)
            .unwrap();
        assert_eq!(
            grid.col_runs(),
            vec![
                ContiguousRun { start: 1, end: 1 },
                ContiguousRun { start: 3, end: 4 },
            ]
        );
        assert_eq!(grid.row_runs(), vec![ContiguousRun { start: 1, end: 10 }]);
        assert!(!grid.has_only_leading_skips());
    }

    #[test]
    fn test_grid_toggle_rejects_out_of_range() {
        let grid = SelectionGrid::new(RangeAddress::new("", 1, 1, 2, 2));
        assert_eq!(
            grid.toggle_row(2),
            Err(RangeError::SkipIndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_grid_leading_skips() {
        let grid = SelectionGrid::with_skips(RangeAddress::new("", 1, 1, 3, 5), [0, 1], [0])
            .unwrap();
        assert_eq!(grid.leading_skipped_rows(), 2);
        assert_eq!(grid.leading_skipped_cols(), 1);
        assert!(grid.has_only_leading_skips());
        assert_eq!(grid.active_rows(), vec![3, 4, 5]);
    }
}
