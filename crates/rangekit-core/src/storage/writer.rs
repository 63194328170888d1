//! Writer for .nrd file format

use super::DocumentContents;
use crate::error::Result;
use crate::host::Scope;
use std::fs;
use std::path::Path;

/// Write document contents to a .nrd file
pub fn write_nrd(path: &Path, contents: &DocumentContents) -> Result<()> {
    fs::write(path, write_nrd_content(contents))?;
    Ok(())
}

/// Write document contents to a .nrd format string
pub fn write_nrd_content(contents: &DocumentContents) -> String {
    let mut lines = vec!["# Rangekit Names".to_string()];

    for sheet in &contents.sheets {
        lines.push(format!("!sheet {}", sheet));
    }
    if let Some(selection) = &contents.selection {
        lines.push(format!("!selection {}", selection));
    }

    // Sorted by name for consistent output
    let mut names: Vec<_> = contents.names.iter().collect();
    names.sort_by_key(|payload| payload.name.to_ascii_uppercase());

    for payload in names {
        let mut header = payload.name.clone();
        if let Scope::Sheet(sheet) = &payload.scope {
            header.push('@');
            header.push_str(&escape_nrd_text(sheet, &['"', ':']));
        }
        if !payload.comment.is_empty() {
            header.push_str(&format!(" \"{}\"", escape_nrd_text(&payload.comment, &['"'])));
        }
        lines.push(format!("{}: {}", header, escape_nrd_text(&payload.formula, &[])));
    }

    lines.join("\n") + "\n"
}

/// Backslash-escape `input` so it stays on one line. `delimiters` are the
/// extra characters that would end the surrounding field.
fn escape_nrd_text(input: &str, delimiters: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ if delimiters.contains(&ch) => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}
