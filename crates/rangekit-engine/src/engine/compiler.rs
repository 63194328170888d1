//! Formula synthesis for named ranges.
//!
//! Turns a picked range (or a [`SelectionGrid`] with scattered skips) plus
//! [`CompilerOptions`] into a host formula string:
//!
//! - **Plain**: a single anchored area, `=Sheet1!$A$1:$D$10`
//! - **Union**: comma-joined areas, one per (column run x row run) pair
//! - **Windowed**: `OFFSET(anchor,..,COUNTA(window),..)` where the window is a
//!   bounded lookahead past the current edge
//! - **Hybrid**: a fixed anchored block followed by a windowed block
//!
//! The lookahead window ends at `edge + window_buffer`, clamped to the host
//! ceilings, so the aggregate never scans a whole column or row.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::address::{
    MAX_COLUMNS, MAX_ROWS, RangeAddress, anchored_cell, parse_range_address, sheet_prefix,
};
use super::selection::SelectionGrid;
use crate::error::{RangeError, Result};

/// Default number of rows/columns scanned past the current edge.
pub const DEFAULT_WINDOW_BUFFER: u32 = 1000;

/// Per-compile configuration. Never mutated by the compiler; the effective
/// (clamped) values come back in [`CompiledRange::options`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Leading rows to drop from the top of the range.
    pub skip_rows: u32,
    /// Leading columns to drop from the left of the range.
    pub skip_cols: u32,
    /// Columns kept as a literal block before the dynamic block starts.
    pub fixed_column_count: u32,
    pub expand_rows: bool,
    pub expand_cols: bool,
    pub last_column_only: bool,
    pub last_row_only: bool,
}

impl CompilerOptions {
    pub fn is_dynamic(&self) -> bool {
        self.expand_rows || self.expand_cols
    }
}

/// Shape of the emitted formula.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Strategy {
    Plain,
    Union,
    Windowed,
    Hybrid,
}

/// A compiled formula and the record needed to describe it in a comment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledRange {
    pub formula: String,
    pub strategy: Strategy,
    pub options: CompilerOptions,
    /// The range as picked, before any skips.
    pub original: RangeAddress,
    /// Relative row indices skipped on the scattered path.
    pub skipped_rows: Vec<u32>,
    /// Relative column indices skipped on the scattered path.
    pub skipped_cols: Vec<u32>,
    pub fixed_block: Option<RangeAddress>,
    pub dynamic_block: Option<RangeAddress>,
}

/// Outcome of promoting a typed reference.
#[derive(Clone, Debug, PartialEq)]
pub enum Promotion {
    Compiled(CompiledRange),
    /// The reference did not parse; it is kept as typed.
    PassThrough(String),
}

impl Promotion {
    pub fn formula(&self) -> &str {
        match self {
            Promotion::Compiled(compiled) => &compiled.formula,
            Promotion::PassThrough(formula) => formula,
        }
    }
}

/// Which edges of a block grow, and whether only the trailing slice is kept.
#[derive(Clone, Copy, Debug, Default)]
struct Growth {
    rows: bool,
    cols: bool,
    last_row: bool,
    last_col: bool,
}

#[derive(Clone, Debug)]
pub struct FormulaCompiler {
    window_buffer: u32,
}

impl Default for FormulaCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_BUFFER)
    }
}

impl FormulaCompiler {
    pub fn new(window_buffer: u32) -> FormulaCompiler {
        FormulaCompiler {
            window_buffer: window_buffer.max(1),
        }
    }

    pub fn window_buffer(&self) -> u32 {
        self.window_buffer
    }

    /// Compile a contiguous range using leading skip counts.
    pub fn compile_range(
        &self,
        range: &RangeAddress,
        options: &CompilerOptions,
    ) -> Result<CompiledRange> {
        let skip_rows = options.skip_rows.min(range.end_row.saturating_sub(range.start_row));
        let skip_cols = options.skip_cols.min(range.end_col.saturating_sub(range.start_col));
        let body = RangeAddress::new(
            range.sheet.clone(),
            range.start_col + skip_cols,
            range.start_row + skip_rows,
            range.end_col,
            range.end_row,
        );

        let fixed = options.fixed_column_count;
        if fixed > 0 && fixed >= body.col_count() {
            return Err(RangeError::FixedSplitTooWide {
                fixed,
                total: body.col_count(),
            });
        }

        let effective = CompilerOptions {
            skip_rows,
            skip_cols,
            ..options.clone()
        };
        let mut compiled = CompiledRange {
            formula: String::new(),
            strategy: Strategy::Plain,
            options: effective,
            original: range.clone(),
            skipped_rows: Vec::new(),
            skipped_cols: Vec::new(),
            fixed_block: None,
            dynamic_block: None,
        };

        if !options.is_dynamic() {
            let mut slice = body;
            if options.last_column_only {
                slice.start_col = slice.end_col;
            }
            if options.last_row_only {
                slice.start_row = slice.end_row;
            }
            compiled.formula = format!("={slice}");
            debug!("plain formula for {range}: {}", compiled.formula);
            return Ok(compiled);
        }

        let growth = Growth {
            rows: options.expand_rows,
            cols: options.expand_cols,
            last_row: options.last_row_only,
            last_col: options.last_column_only,
        };

        if fixed > 0 {
            let split = body.start_col + fixed;
            let fixed_block = RangeAddress::new(
                body.sheet.clone(),
                body.start_col,
                body.start_row,
                split - 1,
                body.end_row,
            );
            let dynamic_block = RangeAddress::new(
                body.sheet.clone(),
                split,
                body.start_row,
                body.end_col,
                body.end_row,
            );
            compiled.formula = format!(
                "={},{}",
                fixed_block,
                self.windowed_term(&dynamic_block, growth)
            );
            compiled.strategy = Strategy::Hybrid;
            compiled.fixed_block = Some(fixed_block);
            compiled.dynamic_block = Some(dynamic_block);
        } else {
            compiled.formula = format!("={}", self.windowed_term(&body, growth));
            compiled.strategy = Strategy::Windowed;
            compiled.dynamic_block = Some(body);
        }

        debug!(
            "{:?} formula for {range}: {}",
            compiled.strategy, compiled.formula
        );
        Ok(compiled)
    }

    /// Compile a selection grid.
    ///
    /// Grids whose skips are all leading go through [`Self::compile_range`] with
    /// the leading counts. Anything else is grouped into runs; only the last run
    /// on an expanding axis grows. Last-only keeps the final column (row) of the
    /// trailing run, and a fixed split is rejected on this path.
    pub fn compile_selection(
        &self,
        grid: &SelectionGrid,
        options: &CompilerOptions,
    ) -> Result<CompiledRange> {
        let col_runs = grid.col_runs();
        let row_runs = grid.row_runs();
        if col_runs.is_empty() || row_runs.is_empty() {
            return Err(RangeError::EmptySelection);
        }

        if grid.has_only_leading_skips() {
            let simple = CompilerOptions {
                skip_rows: grid.leading_skipped_rows(),
                skip_cols: grid.leading_skipped_cols(),
                ..options.clone()
            };
            return self.compile_range(&grid.range, &simple);
        }

        if options.fixed_column_count > 0 {
            return Err(RangeError::FixedSplitWithScatteredSkips);
        }

        // Last-only keeps the trailing run on that axis and narrows it below.
        let col_runs = if options.last_column_only {
            &col_runs[col_runs.len() - 1..]
        } else {
            &col_runs[..]
        };
        let row_runs = if options.last_row_only {
            &row_runs[row_runs.len() - 1..]
        } else {
            &row_runs[..]
        };

        let sheet = &grid.range.sheet;
        let mut terms = Vec::with_capacity(col_runs.len() * row_runs.len());
        let mut windowed = 0usize;
        for (ci, col_run) in col_runs.iter().enumerate() {
            let last_col_run = ci + 1 == col_runs.len();
            for (ri, row_run) in row_runs.iter().enumerate() {
                let last_row_run = ri + 1 == row_runs.len();
                let mut block = RangeAddress::new(
                    sheet.clone(),
                    col_run.start,
                    row_run.start,
                    col_run.end,
                    row_run.end,
                );
                let rows = options.expand_rows && last_row_run;
                let cols = options.expand_cols && last_col_run;
                if rows || cols {
                    windowed += 1;
                    terms.push(self.windowed_term(
                        &block,
                        Growth {
                            rows,
                            cols,
                            last_row: options.last_row_only,
                            last_col: options.last_column_only,
                        },
                    ));
                } else {
                    if options.last_column_only {
                        block.start_col = block.end_col;
                    }
                    if options.last_row_only {
                        block.start_row = block.end_row;
                    }
                    terms.push(block.to_string());
                }
            }
        }

        let strategy = match (terms.len(), windowed) {
            (1, 0) => Strategy::Plain,
            (1, _) => Strategy::Windowed,
            (_, 0) => Strategy::Union,
            _ => Strategy::Hybrid,
        };
        let formula = format!("={}", terms.join(","));
        debug!("{strategy:?} formula for {}: {formula}", grid.range);

        Ok(CompiledRange {
            formula,
            strategy,
            options: CompilerOptions {
                skip_rows: 0,
                skip_cols: 0,
                fixed_column_count: 0,
                ..options.clone()
            },
            original: grid.range.clone(),
            skipped_rows: grid.skipped_rows().iter().copied().collect(),
            skipped_cols: grid.skipped_cols().iter().copied().collect(),
            fixed_block: None,
            dynamic_block: None,
        })
    }

    /// Turn a typed reference into a formula with the given options.
    ///
    /// A reference that does not parse is kept as typed (with a leading `=`),
    /// since the user already picked it. Option errors are still reported.
    pub fn promote_reference(
        &self,
        reference: &str,
        options: &CompilerOptions,
    ) -> Result<Promotion> {
        let trimmed = reference.trim();
        let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
        match parse_range_address(body) {
            Ok(range) => Ok(Promotion::Compiled(self.compile_range(&range, options)?)),
            Err(err) => {
                warn!("keeping reference as typed: {err}");
                Ok(Promotion::PassThrough(format!("={body}")))
            }
        }
    }

    /// `OFFSET(anchor,rowOff,colOff,height,width)` over a block.
    fn windowed_term(&self, block: &RangeAddress, growth: Growth) -> String {
        let prefix = sheet_prefix(&block.sheet);
        let anchor = format!("{prefix}{}", anchored_cell(block.start_col, block.start_row));

        let (row_offset, height) = if growth.rows {
            let count = format!("COUNTA({})", self.column_window(block));
            if growth.last_row {
                (format!("MAX({count},1)-1"), "1".to_string())
            } else {
                ("0".to_string(), count)
            }
        } else if growth.last_row {
            ((block.row_count() - 1).to_string(), "1".to_string())
        } else {
            ("0".to_string(), block.row_count().to_string())
        };

        let (col_offset, width) = if growth.cols {
            let count = format!("COUNTA({})", self.row_window(block));
            if growth.last_col {
                (format!("MAX({count},1)-1"), "1".to_string())
            } else {
                ("0".to_string(), count)
            }
        } else if growth.last_col {
            ((block.col_count() - 1).to_string(), "1".to_string())
        } else {
            ("0".to_string(), block.col_count().to_string())
        };

        format!("OFFSET({anchor},{row_offset},{col_offset},{height},{width})")
    }

    /// Column-shaped lookahead from the anchor downward.
    fn column_window(&self, block: &RangeAddress) -> RangeAddress {
        let end_row = block
            .end_row
            .saturating_add(self.window_buffer)
            .min(MAX_ROWS);
        RangeAddress::new(
            block.sheet.clone(),
            block.start_col,
            block.start_row,
            block.start_col,
            end_row,
        )
    }

    /// Row-shaped lookahead from the anchor rightward.
    fn row_window(&self, block: &RangeAddress) -> RangeAddress {
        let end_col = block
            .end_col
            .saturating_add(self.window_buffer)
            .min(MAX_COLUMNS);
        RangeAddress::new(
            block.sheet.clone(),
            block.start_col,
            block.start_row,
            end_col,
            block.start_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet1(range: &str) -> RangeAddress {
        parse_range_address(&format!("Sheet1!{range}")).unwrap()
    }

    fn compile(range: &str, options: CompilerOptions) -> CompiledRange {
        FormulaCompiler::default()
            .compile_range(&sheet1(range), &options)
            .unwrap()
    }

    #[test]
    fn test_plain_range() {
        let c = compile("A1:D10", CompilerOptions::default());
        assert_eq!(c.formula, "=Sheet1!$A$1:$D$10");
        assert_eq!(c.strategy, Strategy::Plain);
    }

    #[test]
    fn test_plain_without_sheet() {
        let range = parse_range_address("a1:b2").unwrap();
        let c = FormulaCompiler::default()
            .compile_range(&range, &CompilerOptions::default())
            .unwrap();
        assert_eq!(c.formula, "=$A$1:$B$2");
    }

    #[test]
    fn test_plain_leading_skips_shift_start() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                skip_rows: 1,
                skip_cols: 2,
                ..Default::default()
            },
        );
        assert_eq!(c.formula, "=Sheet1!$C$2:$D$10");
    }

    #[test]
    fn test_static_last_column_only() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                last_column_only: true,
                ..Default::default()
            },
        );
        assert_eq!(c.formula, "=Sheet1!$D$1:$D$10");
    }

    #[test]
    fn test_expand_rows() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                expand_rows: true,
                ..Default::default()
            },
        );
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$A$1,0,0,COUNTA(Sheet1!$A$1:$A$1010),4)"
        );
        assert_eq!(c.strategy, Strategy::Windowed);
    }

    #[test]
    fn test_expand_cols_window_ends_at_edge_plus_buffer() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                expand_cols: true,
                ..Default::default()
            },
        );
        // D (4) + 1000 = 1004 = ALP
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$A$1,0,0,10,COUNTA(Sheet1!$A$1:$ALP$1))"
        );
    }

    #[test]
    fn test_expand_both_axes() {
        let c = compile(
            "B2:C3",
            CompilerOptions {
                expand_rows: true,
                expand_cols: true,
                ..Default::default()
            },
        );
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$B$2,0,0,COUNTA(Sheet1!$B$2:$B$1003),COUNTA(Sheet1!$B$2:$ALO$2))"
        );
    }

    #[test]
    fn test_windows_clamp_to_host_ceiling() {
        let c = compile(
            "XFA1048000:XFB1048010",
            CompilerOptions {
                expand_rows: true,
                expand_cols: true,
                ..Default::default()
            },
        );
        assert!(c.formula.contains("$XFA$1048000:$XFA$1048576"));
        assert!(c.formula.contains("$XFA$1048000:$XFD$1048000"));
    }

    #[test]
    fn test_custom_window_buffer() {
        let c = FormulaCompiler::new(5)
            .compile_range(
                &sheet1("A1:A10"),
                &CompilerOptions {
                    expand_rows: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$A$1,0,0,COUNTA(Sheet1!$A$1:$A$15),1)"
        );
    }

    #[test]
    fn test_skip_rows_moves_anchor_and_clamps() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                skip_rows: 2,
                expand_rows: true,
                ..Default::default()
            },
        );
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$A$3,0,0,COUNTA(Sheet1!$A$3:$A$1010),4)"
        );

        let clamped = compile(
            "A1:D10",
            CompilerOptions {
                skip_rows: 50,
                expand_rows: true,
                ..Default::default()
            },
        );
        assert_eq!(clamped.options.skip_rows, 9);
        assert!(clamped.formula.starts_with("=OFFSET(Sheet1!$A$10,"));
    }

    #[test]
    fn test_last_column_only_clamps_offset() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                expand_cols: true,
                last_column_only: true,
                ..Default::default()
            },
        );
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$A$1,0,MAX(COUNTA(Sheet1!$A$1:$ALP$1),1)-1,10,1)"
        );
    }

    #[test]
    fn test_last_row_only() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                expand_rows: true,
                last_row_only: true,
                ..Default::default()
            },
        );
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$A$1,MAX(COUNTA(Sheet1!$A$1:$A$1010),1)-1,0,1,4)"
        );
    }

    #[test]
    fn test_hybrid_split() {
        let c = compile(
            "A1:D10",
            CompilerOptions {
                fixed_column_count: 1,
                expand_rows: true,
                ..Default::default()
            },
        );
        assert_eq!(
            c.formula,
            "=Sheet1!$A$1:$A$10,OFFSET(Sheet1!$B$1,0,0,COUNTA(Sheet1!$B$1:$B$1010),3)"
        );
        assert_eq!(c.strategy, Strategy::Hybrid);
        assert_eq!(c.fixed_block, Some(sheet1("A1:A10")));
        assert_eq!(c.dynamic_block, Some(sheet1("B1:D10")));
    }

    #[test]
    fn test_fixed_split_too_wide() {
        let err = FormulaCompiler::default()
            .compile_range(
                &sheet1("A1:D10"),
                &CompilerOptions {
                    fixed_column_count: 4,
                    expand_rows: true,
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, RangeError::FixedSplitTooWide { fixed: 4, total: 4 });
    }

    #[test]
    fn test_selection_without_skips_is_plain() {
        let grid = SelectionGrid::new(sheet1("A1:D10"));
        let c = FormulaCompiler::default()
            .compile_selection(&grid, &CompilerOptions::default())
            .unwrap();
        assert_eq!(c.formula, "=Sheet1!$A$1:$D$10");
    }

    #[test]
    fn test_selection_skipping_b_is_union() {
        let grid = SelectionGrid::new(sheet1("A1:D10")).toggle_col(1).unwrap();
        let c = FormulaCompiler::default()
            .compile_selection(&grid, &CompilerOptions::default())
            .unwrap();
        assert_eq!(c.formula, "=Sheet1!$A$1:$A$10,Sheet1!$C$1:$D$10");
        assert_eq!(c.strategy, Strategy::Union);
        assert_eq!(c.skipped_cols, vec![1]);
    }

    #[test]
    fn test_selection_union_is_cartesian_product() {
        let grid = SelectionGrid::with_skips(sheet1("A1:C5"), [2], [1]).unwrap();
        let c = FormulaCompiler::default()
            .compile_selection(&grid, &CompilerOptions::default())
            .unwrap();
        assert_eq!(
            c.formula,
            "=Sheet1!$A$1:$A$2,Sheet1!$A$4:$A$5,Sheet1!$C$1:$C$2,Sheet1!$C$4:$C$5"
        );
    }

    #[test]
    fn test_selection_only_last_run_expands() {
        let grid = SelectionGrid::new(sheet1("A1:D10")).toggle_col(1).unwrap();
        let c = FormulaCompiler::default()
            .compile_selection(
                &grid,
                &CompilerOptions {
                    expand_cols: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            c.formula,
            "=Sheet1!$A$1:$A$10,OFFSET(Sheet1!$C$1,0,0,10,COUNTA(Sheet1!$C$1:$ALP$1))"
        );
        assert_eq!(c.strategy, Strategy::Hybrid);
    }

    #[test]
    fn test_selection_scattered_skip_keeps_last_column_only() {
        let grid = SelectionGrid::with_skips(sheet1("A1:D10"), [4], []).unwrap();
        let compiler = FormulaCompiler::default();

        let grown = compiler
            .compile_selection(
                &grid,
                &CompilerOptions {
                    expand_rows: true,
                    last_column_only: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            grown.formula,
            "=Sheet1!$D$1:$D$4,OFFSET(Sheet1!$A$6,0,3,COUNTA(Sheet1!$A$6:$A$1010),1)"
        );
        assert_eq!(grown.strategy, Strategy::Hybrid);

        let fixed = compiler
            .compile_selection(
                &grid,
                &CompilerOptions {
                    last_column_only: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(fixed.formula, "=Sheet1!$D$1:$D$4,Sheet1!$D$6:$D$10");
        assert_eq!(fixed.strategy, Strategy::Union);
    }

    #[test]
    fn test_selection_scattered_skip_keeps_last_row_only() {
        // Skipping B leaves column runs A and C:D; only row 10 survives.
        let grid = SelectionGrid::new(sheet1("A1:D10")).toggle_col(1).unwrap();
        let c = FormulaCompiler::default()
            .compile_selection(
                &grid,
                &CompilerOptions {
                    expand_cols: true,
                    last_row_only: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            c.formula,
            "=Sheet1!$A$10,OFFSET(Sheet1!$C$1,9,0,1,COUNTA(Sheet1!$C$1:$ALP$1))"
        );
    }

    #[test]
    fn test_selection_last_column_only_drops_earlier_column_runs() {
        let grid = SelectionGrid::new(sheet1("A1:D10")).toggle_col(1).unwrap();
        let c = FormulaCompiler::default()
            .compile_selection(
                &grid,
                &CompilerOptions {
                    last_column_only: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(c.formula, "=Sheet1!$D$1:$D$10");
        assert_eq!(c.strategy, Strategy::Plain);
    }

    #[test]
    fn test_selection_scattered_skip_rejects_fixed_split() {
        let grid = SelectionGrid::with_skips(sheet1("A1:D10"), [4], []).unwrap();
        let err = FormulaCompiler::default()
            .compile_selection(
                &grid,
                &CompilerOptions {
                    fixed_column_count: 1,
                    expand_rows: true,
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, RangeError::FixedSplitWithScatteredSkips);
    }

    #[test]
    fn test_selection_leading_skips_use_simple_path() {
        let grid = SelectionGrid::with_skips(sheet1("A1:D10"), [0], []).unwrap();
        let c = FormulaCompiler::default()
            .compile_selection(
                &grid,
                &CompilerOptions {
                    expand_rows: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(c.options.skip_rows, 1);
        assert!(c.skipped_rows.is_empty());
        assert_eq!(
            c.formula,
            "=OFFSET(Sheet1!$A$2,0,0,COUNTA(Sheet1!$A$2:$A$1010),4)"
        );
    }

    #[test]
    fn test_selection_trailing_skip_is_single_area() {
        let grid = SelectionGrid::new(sheet1("A1:D10")).toggle_col(3).unwrap();
        let c = FormulaCompiler::default()
            .compile_selection(&grid, &CompilerOptions::default())
            .unwrap();
        assert_eq!(c.formula, "=Sheet1!$A$1:$C$10");
        assert_eq!(c.strategy, Strategy::Plain);
    }

    #[test]
    fn test_empty_selection() {
        let grid = SelectionGrid::with_skips(sheet1("A1:B2"), [], [0, 1]).unwrap();
        let err = FormulaCompiler::default()
            .compile_selection(&grid, &CompilerOptions::default())
            .unwrap_err();
        assert_eq!(err, RangeError::EmptySelection);
    }

    #[test]
    fn test_promote_reference() {
        let compiler = FormulaCompiler::default();
        let options = CompilerOptions {
            expand_rows: true,
            ..Default::default()
        };
        let promoted = compiler.promote_reference("=Sheet1!A1:B5", &options).unwrap();
        assert_eq!(
            promoted.formula(),
            "=OFFSET(Sheet1!$A$1,0,0,COUNTA(Sheet1!$A$1:$A$1005),2)"
        );

        let kept = compiler.promote_reference("=Totals", &options).unwrap();
        assert_eq!(kept, Promotion::PassThrough("=Totals".to_string()));

        let unprefixed = compiler.promote_reference("not a ref", &options).unwrap();
        assert_eq!(unprefixed.formula(), "=not a ref");
    }

    #[test]
    fn test_promote_still_reports_option_errors() {
        let err = FormulaCompiler::default()
            .promote_reference(
                "Sheet1!A1:B5",
                &CompilerOptions {
                    fixed_column_count: 2,
                    expand_rows: true,
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, RangeError::FixedSplitTooWide { .. }));
    }
}
