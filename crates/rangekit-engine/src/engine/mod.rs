//! Named-range engine API.
//!
//! This module provides the pure, host-independent logic:
//!
//! - [`RangeAddress`], [`column_to_number`], [`number_to_column`] - A1 reference algebra
//! - [`SelectionGrid`], [`group_contiguous`] - picked ranges with skipped rows/columns
//! - [`FormulaCompiler`] - synthesis of plain, union and windowed formulas
//! - [`detect_range_type`], [`classify_health`], [`validate_name`] - classification of stored names

mod address;
mod classify;
mod compiler;
mod selection;

pub use address::{
    CellAddress, MAX_COLUMNS, MAX_ROWS, RangeAddress, column_to_number, number_to_column,
    parse_range_address, quote_sheet_name,
};
pub use classify::{
    Health, MAX_NAME_LEN, REF_ERROR, RangeType, ResolvedValue, classify_health,
    detect_range_type, is_union, split_areas, validate_name,
};
pub use compiler::{
    CompiledRange, CompilerOptions, DEFAULT_WINDOW_BUFFER, FormulaCompiler, Promotion, Strategy,
};
pub use selection::{
    ContiguousRun, SelectionGrid, SkipSet, active_indices, group_contiguous, leading_skip_count,
    toggle_skip,
};
