//! Parser for .nrd file format

use super::DocumentContents;
use crate::error::{RangekitError, Result};
use crate::host::{SavePayload, Scope};
use std::fs;
use std::path::Path;

/// Parse a .nrd file
pub fn parse_nrd(path: &Path) -> Result<DocumentContents> {
    let content = fs::read_to_string(path)?;
    parse_nrd_content(&content)
}

/// Parse .nrd content from a string
pub fn parse_nrd_content(content: &str) -> Result<DocumentContents> {
    let mut contents = DocumentContents::default();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(sheet) = line.strip_prefix("!sheet ") {
            contents.sheets.push(sheet.trim().to_string());
            continue;
        }
        if let Some(selection) = line.strip_prefix("!selection ") {
            contents.selection = Some(selection.trim().to_string());
            continue;
        }
        if line.starts_with('!') {
            return Err(parse_error(line_num, format!("Unknown directive: {}", line)));
        }

        contents.names.push(parse_name_line(line, line_num + 1)?);
    }

    Ok(contents)
}

/// Parse `Name[@Scope] ["comment"]: =formula`
fn parse_name_line(line: &str, line_num: usize) -> Result<SavePayload> {
    let header_end = find_header_end(line)
        .ok_or_else(|| parse_error(line_num - 1, "Expected 'NAME: =FORMULA' format".into()))?;

    let header = line[..header_end].trim();
    let (name, scope) = match header.split_once('@') {
        Some((name, sheet)) => (name.trim(), Scope::Sheet(unescape_nrd_text(sheet.trim()))),
        None => (header, Scope::Document),
    };
    if name.is_empty() {
        return Err(parse_error(line_num - 1, "Missing name".into()));
    }

    let mut rest = &line[header_end..];
    let mut comment = String::new();
    if let Some(quoted) = rest.strip_prefix('"') {
        let (text, consumed) = read_quoted(quoted)
            .ok_or_else(|| parse_error(line_num - 1, "Unterminated comment".into()))?;
        comment = text;
        rest = quoted[consumed..].trim_start();
    }

    let Some(formula) = rest.strip_prefix(':') else {
        return Err(parse_error(line_num - 1, "Expected ':' before formula".into()));
    };
    let formula = formula.trim();
    if !formula.starts_with('=') {
        return Err(parse_error(
            line_num - 1,
            format!("Formula must start with '=': {}", formula),
        ));
    }

    Ok(SavePayload {
        name: name.to_string(),
        formula: unescape_nrd_text(formula),
        comment,
        scope,
    })
}

/// Byte offset of the first unescaped `"` or `:`.
fn find_header_end(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' | ':' => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Read an escaped string up to its closing quote.
/// Returns the unescaped text and the bytes consumed, closing quote included.
fn read_quoted(input: &str) -> Option<(String, usize)> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => push_escaped(&mut out, chars.next().map(|(_, c)| c)),
            '"' => return Some((out, idx + 1)),
            _ => out.push(ch),
        }
    }
    None
}

/// Undo the writer's escaping on an unquoted field.
fn unescape_nrd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => push_escaped(&mut out, chars.next()),
            _ => out.push(ch),
        }
    }
    out
}

/// Unknown escapes are kept verbatim, backslash included.
fn push_escaped(out: &mut String, next: Option<char>) {
    match next {
        Some('n') => out.push('\n'),
        Some('r') => out.push('\r'),
        Some(ch @ ('\\' | '"' | ':')) => out.push(ch),
        Some(other) => {
            out.push('\\');
            out.push(other);
        }
        None => out.push('\\'),
    }
}

fn parse_error(line_idx: usize, message: String) -> RangekitError {
    RangekitError::Parse {
        line: line_idx + 1,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        let content = "!sheet Sheet1\n!sheet My Data\n!selection Sheet1!A1:D10\n";
        let parsed = parse_nrd_content(content).unwrap();
        assert_eq!(parsed.sheets, vec!["Sheet1", "My Data"]);
        assert_eq!(parsed.selection.as_deref(), Some("Sheet1!A1:D10"));
        assert!(parsed.names.is_empty());
    }

    #[test]
    fn test_parse_name_without_comment() {
        let parsed = parse_nrd_content("Revenue: =Sheet1!$A$1:$D$10").unwrap();
        assert_eq!(
            parsed.names,
            vec![SavePayload {
                name: "Revenue".into(),
                formula: "=Sheet1!$A$1:$D$10".into(),
                comment: String::new(),
                scope: Scope::Document,
            }]
        );
    }

    #[test]
    fn test_parse_name_with_comment_and_scope() {
        let line = r#"Local@My Data "[rangekit] say \"hi\": ok": =OFFSET('My Data'!$A$1,0,0,1,1)"#;
        let parsed = parse_nrd_content(line).unwrap();
        let name = &parsed.names[0];
        assert_eq!(name.name, "Local");
        assert_eq!(name.scope, Scope::Sheet("My Data".into()));
        assert_eq!(name.comment, "[rangekit] say \"hi\": ok");
        assert_eq!(name.formula, "=OFFSET('My Data'!$A$1,0,0,1,1)");
    }

    #[test]
    fn test_skip_comments_and_empty_lines() {
        let content = "\n# header\n\nA_: =$A$1\n# trailing\n";
        assert_eq!(parse_nrd_content(content).unwrap().names.len(), 1);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_nrd_content("\nRevenue =A1").unwrap_err();
        assert!(matches!(err, RangekitError::Parse { line: 2, .. }));

        let err = parse_nrd_content("Revenue: A1").unwrap_err();
        assert!(matches!(err, RangekitError::Parse { line: 1, .. }));

        let err = parse_nrd_content("Revenue \"open: =A1").unwrap_err();
        assert!(matches!(err, RangekitError::Parse { line: 1, .. }));

        let err = parse_nrd_content("!bogus x").unwrap_err();
        assert!(matches!(err, RangekitError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_escaped_line_breaks() {
        let line = r#"Notes "first\nsecond\r\nthird": =IF(A1,"x\ny","")"#;
        let name = &parse_nrd_content(line).unwrap().names[0];
        assert_eq!(name.comment, "first\nsecond\r\nthird");
        assert_eq!(name.formula, "=IF(A1,\"x\ny\",\"\")");
    }

    #[test]
    fn test_parse_escaped_scope() {
        let line = r#"Local@Say \"hi\"\: now: =$A$1"#;
        let name = &parse_nrd_content(line).unwrap().names[0];
        assert_eq!(name.name, "Local");
        assert_eq!(name.scope, Scope::Sheet("Say \"hi\": now".into()));
        assert_eq!(name.formula, "=$A$1");
    }

    #[test]
    fn test_unknown_escape_is_kept() {
        let name = &parse_nrd_content(r#"Path "C:\temp": =$A$1"#).unwrap().names[0];
        assert_eq!(name.comment, "C:\\temp");
    }
}
