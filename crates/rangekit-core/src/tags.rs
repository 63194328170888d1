//! Comment tag codec.
//!
//! The host keeps only `name`, `formula` and `comment` for a named range, so
//! compiler settings travel inside the comment as bracketed tags:
//!
//! ```text
//! [rangekit] [skip:2,1] [origrange:Sheet1!$A$1:$D$10] [expandrows] Monthly revenue
//! ```
//!
//! Each tag is matched on its own, anywhere in the comment. Tags holding a
//! default value are never written.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use rangekit_engine::engine::{CompiledRange, CompilerOptions, SelectionGrid, parse_range_address};

/// Sentinel marking names created by rangekit.
pub const ORIGIN_TAG: &str = "[rangekit]";

/// Row-or-column key to the number of non-blank cells found past the edge.
pub type OverflowMap = BTreeMap<String, u32>;

/// One token of the comment tag language.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Tag {
    Origin,
    Skip { rows: u32, cols: u32 },
    FixRef(String),
    DynRef(String),
    OrigRange(String),
    ExpandRows,
    ExpandCols,
    LastCol,
    LastRow,
    SkipColIdx(Vec<u32>),
    SkipRowIdx(Vec<u32>),
    ColOverflow(OverflowMap),
    RowOverflow(OverflowMap),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Origin => f.write_str(ORIGIN_TAG),
            Tag::Skip { rows, cols } => write!(f, "[skip:{rows},{cols}]"),
            Tag::FixRef(r) => write!(f, "[fixref:{r}]"),
            Tag::DynRef(r) => write!(f, "[dynref:{r}]"),
            Tag::OrigRange(r) => write!(f, "[origrange:{r}]"),
            Tag::ExpandRows => f.write_str("[expandrows]"),
            Tag::ExpandCols => f.write_str("[expandcols]"),
            Tag::LastCol => f.write_str("[lastcol]"),
            Tag::LastRow => f.write_str("[lastrow]"),
            Tag::SkipColIdx(idx) => write!(f, "[skipcidx:{}]", join_indices(idx)),
            Tag::SkipRowIdx(idx) => write!(f, "[skipridx:{}]", join_indices(idx)),
            Tag::ColOverflow(map) => write!(f, "[coloverflow:{}]", encode_overflow(map)),
            Tag::RowOverflow(map) => write!(f, "[rowoverflow:{}]", encode_overflow(map)),
        }
    }
}

/// Everything the tags of one comment describe.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommentTags {
    pub origin: bool,
    pub skip_rows: u32,
    pub skip_cols: u32,
    pub fixed_ref: String,
    pub dynamic_ref: String,
    pub original_range: String,
    pub expand_rows: bool,
    pub expand_cols: bool,
    pub last_col: bool,
    pub last_row: bool,
    pub skipped_col_indices: Vec<u32>,
    pub skipped_row_indices: Vec<u32>,
    pub col_overflow: OverflowMap,
    pub row_overflow: OverflowMap,
}

struct TagPatterns {
    skip: Regex,
    fixref: Regex,
    dynref: Regex,
    origrange: Regex,
    skipcidx: Regex,
    skipridx: Regex,
    coloverflow: Regex,
    rowoverflow: Regex,
    any: Regex,
}

fn patterns() -> &'static TagPatterns {
    static PATTERNS: OnceLock<TagPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("comment tag regex must compile");
        TagPatterns {
            skip: re(r"\[skip:(\d+),(\d+)\]"),
            fixref: re(r"\[fixref:([^\]]+)\]"),
            dynref: re(r"\[dynref:([^\]]+)\]"),
            origrange: re(r"\[origrange:([^\]]+)\]"),
            skipcidx: re(r"\[skipcidx:([\d,]+)\]"),
            skipridx: re(r"\[skipridx:([\d,]+)\]"),
            coloverflow: re(r"\[coloverflow:([^\]]+)\]"),
            rowoverflow: re(r"\[rowoverflow:([^\]]+)\]"),
            any: re(concat!(
                r"\s*\[(?:rangekit|skip:\d+,\d+|fixref:[^\]]+|dynref:[^\]]+|origrange:[^\]]+",
                r"|expandrows|expandcols|lastcol|lastrow|skipcidx:[\d,]+|skipridx:[\d,]+",
                r"|coloverflow:[^\]]+|rowoverflow:[^\]]+)\]"
            )),
        }
    })
}

impl CommentTags {
    /// Tags for this record in canonical order, defaults omitted.
    pub fn tags(&self) -> Vec<Tag> {
        let candidates = [
            self.origin.then_some(Tag::Origin),
            (self.skip_rows > 0 || self.skip_cols > 0).then_some(Tag::Skip {
                rows: self.skip_rows,
                cols: self.skip_cols,
            }),
            (!self.fixed_ref.is_empty()).then(|| Tag::FixRef(self.fixed_ref.clone())),
            (!self.dynamic_ref.is_empty()).then(|| Tag::DynRef(self.dynamic_ref.clone())),
            (!self.original_range.is_empty()).then(|| Tag::OrigRange(self.original_range.clone())),
            self.expand_rows.then_some(Tag::ExpandRows),
            self.expand_cols.then_some(Tag::ExpandCols),
            self.last_col.then_some(Tag::LastCol),
            self.last_row.then_some(Tag::LastRow),
            (!self.skipped_col_indices.is_empty())
                .then(|| Tag::SkipColIdx(self.skipped_col_indices.clone())),
            (!self.skipped_row_indices.is_empty())
                .then(|| Tag::SkipRowIdx(self.skipped_row_indices.clone())),
            (!self.col_overflow.is_empty()).then(|| Tag::ColOverflow(self.col_overflow.clone())),
            (!self.row_overflow.is_empty()).then(|| Tag::RowOverflow(self.row_overflow.clone())),
        ];
        candidates.into_iter().flatten().collect()
    }

    /// Space-joined tag string; empty when nothing is configured.
    pub fn encode(&self) -> String {
        self.tags()
            .iter()
            .map(Tag::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Read every known tag from a comment. Missing or malformed tags decode
    /// to their defaults.
    pub fn decode(comment: &str) -> CommentTags {
        let p = patterns();
        let capture = |re: &Regex| -> Option<String> {
            re.captures(comment)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };

        let (skip_rows, skip_cols) = p
            .skip
            .captures(comment)
            .map(|caps| {
                (
                    caps[1].parse::<u32>().unwrap_or(0),
                    caps[2].parse::<u32>().unwrap_or(0),
                )
            })
            .unwrap_or((0, 0));

        CommentTags {
            origin: comment.contains(ORIGIN_TAG),
            skip_rows,
            skip_cols,
            fixed_ref: capture(&p.fixref).unwrap_or_default(),
            dynamic_ref: capture(&p.dynref).unwrap_or_default(),
            original_range: capture(&p.origrange).unwrap_or_default(),
            expand_rows: comment.contains("[expandrows]"),
            expand_cols: comment.contains("[expandcols]"),
            last_col: comment.contains("[lastcol]"),
            last_row: comment.contains("[lastrow]"),
            skipped_col_indices: capture(&p.skipcidx)
                .map(|s| parse_indices(&s))
                .unwrap_or_default(),
            skipped_row_indices: capture(&p.skipridx)
                .map(|s| parse_indices(&s))
                .unwrap_or_default(),
            col_overflow: capture(&p.coloverflow)
                .map(|s| decode_overflow(&s))
                .unwrap_or_default(),
            row_overflow: capture(&p.rowoverflow)
                .map(|s| decode_overflow(&s))
                .unwrap_or_default(),
        }
    }

    /// Tags describing a freshly compiled range.
    pub fn from_compiled(compiled: &CompiledRange) -> CommentTags {
        let options = &compiled.options;
        CommentTags {
            origin: true,
            skip_rows: options.skip_rows,
            skip_cols: options.skip_cols,
            fixed_ref: compiled
                .fixed_block
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            dynamic_ref: compiled
                .dynamic_block
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            original_range: compiled.original.to_string(),
            expand_rows: options.expand_rows,
            expand_cols: options.expand_cols,
            last_col: options.last_column_only,
            last_row: options.last_row_only,
            skipped_col_indices: compiled.skipped_cols.clone(),
            skipped_row_indices: compiled.skipped_rows.clone(),
            col_overflow: OverflowMap::new(),
            row_overflow: OverflowMap::new(),
        }
    }

    /// Compiler options that would reproduce this record.
    ///
    /// The fixed split is recovered from the width of the fixed block.
    pub fn compiler_options(&self) -> CompilerOptions {
        let fixed_column_count = parse_range_address(&self.fixed_ref)
            .map(|r| r.col_count())
            .unwrap_or(0);
        CompilerOptions {
            skip_rows: self.skip_rows,
            skip_cols: self.skip_cols,
            fixed_column_count,
            expand_rows: self.expand_rows,
            expand_cols: self.expand_cols,
            last_column_only: self.last_col,
            last_row_only: self.last_row,
        }
    }

    /// Rebuild the selection grid the record was compiled from, if the
    /// original range was recorded. Leading skip counts become leading skip
    /// indices; indices outside the range are dropped.
    pub fn selection_grid(&self) -> Option<SelectionGrid> {
        let range = parse_range_address(&self.original_range).ok()?;
        let rows = range.row_count();
        let cols = range.col_count();
        let grid = SelectionGrid::with_skips(
            range,
            (0..self.skip_rows)
                .chain(self.skipped_row_indices.iter().copied())
                .filter(|&i| i < rows),
            (0..self.skip_cols)
                .chain(self.skipped_col_indices.iter().copied())
                .filter(|&i| i < cols),
        );
        grid.ok()
    }
}

/// Remove every known tag and the origin sentinel, returning the user text.
pub fn strip_tags(comment: &str) -> String {
    patterns().any.replace_all(comment, "").trim().to_string()
}

/// Build a stored comment: tags first, then the user's description.
pub fn compose_comment(tags: &CommentTags, user_text: &str) -> String {
    let parts = [tags.encode(), strip_tags(user_text)];
    let comment = parts
        .iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    debug!("composed comment: {comment}");
    comment
}

fn join_indices(indices: &[u32]) -> String {
    indices
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_indices(text: &str) -> Vec<u32> {
    text.split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}

/// `k1,k2=v` when every value matches, `k1:v1,k2:v2` otherwise.
fn encode_overflow(map: &OverflowMap) -> String {
    let mut values = map.values();
    if let Some(first) = values.next() {
        if values.all(|v| v == first) {
            let keys = map.keys().map(String::as_str).collect::<Vec<_>>().join(",");
            return format!("{keys}={first}");
        }
    }
    map.iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_overflow(text: &str) -> OverflowMap {
    let compact = match (text.find('='), text.find(':')) {
        (Some(eq), Some(colon)) => eq < colon,
        (Some(_), None) => true,
        _ => false,
    };

    let mut map = OverflowMap::new();
    if compact {
        let Some((keys, value)) = text.split_once('=') else {
            return map;
        };
        let Ok(value) = value.trim().parse::<u32>() else {
            return map;
        };
        for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            map.insert(key.to_string(), value);
        }
    } else {
        for pair in text.split(',') {
            let Some((key, value)) = pair.split_once(':') else {
                continue;
            };
            match value.trim().parse::<u32>() {
                Ok(value) if !key.trim().is_empty() => {
                    map.insert(key.trim().to_string(), value);
                }
                _ => {}
            }
        }
    }
    map
}
