use std::io::BufRead;

use super::ParseError;

/// Separator used by every file this tool reads or writes
pub const DEFAULT_DELIMITER: char = '|';

/// One data line of a delimited file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the source file
    pub line: usize,
    pub fields: Vec<String>,
}

impl Row {
    /// Required, non-empty field
    pub fn get(&self, index: usize, column: &str) -> Result<&str, ParseError> {
        let value = self.fields.get(index).ok_or(ParseError::ShortRow {
            line: self.line,
            expected: index + 1,
            found: self.fields.len(),
        })?;

        let value = value.trim();
        if value.is_empty() {
            return Err(ParseError::EmptyValue {
                line: self.line,
                column: column.to_string(),
            });
        }
        Ok(value)
    }

    /// Optional field; missing and blank values are `None`
    pub fn optional(&self, index: Option<usize>) -> Option<String> {
        index
            .and_then(|i| self.fields.get(i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Header plus data rows of a delimited file
#[derive(Debug, Clone)]
pub struct DelimitedTable {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl DelimitedTable {
    /// Read a whole file; the first non-blank line is the header
    pub fn read<R: BufRead>(reader: R, delimiter: char) -> Result<Self, ParseError> {
        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_line(line, delimiter);
            if headers.is_none() {
                headers = Some(fields.iter().map(|h| normalize_header(h)).collect());
            } else {
                rows.push(Row {
                    line: idx + 1,
                    fields,
                });
            }
        }

        let headers = headers.ok_or(ParseError::MissingHeader)?;
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Index of the first header matching any of `names` (case-insensitive)
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            let name = normalize_header(name);
            self.headers.iter().position(|h| *h == name)
        })
    }

    /// Like `column`, but a missing column is an error named after `names[0]`
    pub fn require(&self, names: &[&str]) -> Result<usize, ParseError> {
        self.column(names).ok_or_else(|| {
            ParseError::MissingColumn(names.first().copied().unwrap_or_default().to_string())
        })
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

/// Split a line on `delimiter`
///
/// Fields wrapped in double quotes may contain the delimiter; a doubled
/// quote inside a quoted field is a literal quote.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    fields
}
