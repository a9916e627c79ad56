//! CSV parsing for prospect uploads.
//!
//! Every cell stays a string. The header row defines column order and count;
//! short rows are padded with empty cells and long rows are truncated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One data row keyed by header name.
pub type CsvRow = BTreeMap<String, String>;

/// Result of parsing an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedCsv {
    /// Header names in file order.
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl ParsedCsv {
    /// True when there is nothing to import: no header or no data rows.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

/// Parses delimited text into headers and header-keyed rows.
///
/// Empty or all-blank input yields an empty `ParsedCsv`, not an error.
pub fn parse_csv(text: &str) -> ParsedCsv {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = text
        .split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty());

    let headers = match lines.next() {
        Some(line) => parse_csv_line(line),
        None => return ParsedCsv::default(),
    };

    let rows = lines
        .map(|line| {
            let mut values = parse_csv_line(line).into_iter();
            let mut row = CsvRow::new();
            // Duplicate header names collide here; the later column wins.
            for header in &headers {
                row.insert(header.clone(), values.next().unwrap_or_default());
            }
            row
        })
        .collect();

    ParsedCsv { headers, rows }
}

/// Splits one line into fields, honoring double-quoted sections and `""` escapes.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
