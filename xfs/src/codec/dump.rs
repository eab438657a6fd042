//! CSV dumping.
//!
//! Data is first classified into a [`CsvTable`] (explicitly or by looking at
//! the first element), then flattened into rows and encoded into a single
//! in-memory string. Nothing touches the disk here.

use serde_json::Value;
use tracing::debug;

use super::dialect::CsvDialect;
use super::table::{CsvTable, DumpMode, Row};
use crate::error::{CsvError, CsvResult, RowRef};

// =============================================================================
// Shape Detection
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Plain,
    Structured,
}

fn detect_shape(data: &[Value]) -> CsvResult<Shape> {
    let Some(first) = data.first() else {
        return Ok(Shape::Plain);
    };

    match first {
        Value::Object(_) => Ok(Shape::Structured),
        Value::Array(fields) if fields.iter().all(is_scalar) => Ok(Shape::Plain),
        Value::Array(_) => Err(CsvError::InvalidDumpShape(
            "first element is an array with nested values".into(),
        )),
        other => Err(CsvError::InvalidDumpShape(format!(
            "first element is {}",
            describe(other)
        ))),
    }
}

/// Classify dynamic data as rows or records.
///
/// With [`DumpMode::Detect`], an object as first element means records and
/// an array of scalars means rows. Elements that do not fit the chosen
/// shape are reported as [`CsvError::InvalidRowData`].
pub fn detect_table(data: &[Value], mode: DumpMode) -> CsvResult<CsvTable> {
    let shape = match mode {
        DumpMode::Plain => Shape::Plain,
        DumpMode::Structured => Shape::Structured,
        DumpMode::Detect => detect_shape(data)?,
    };

    match shape {
        Shape::Plain => {
            let rows = data
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Array(fields) => fields_to_row(fields.iter(), RowRef::Item(i + 1)),
                    other => Err(CsvError::InvalidRowData {
                        row: RowRef::Item(i + 1),
                        reason: format!("expected an array, found {}", describe(other)),
                    }),
                })
                .collect::<CsvResult<Vec<Row>>>()?;
            Ok(CsvTable::Rows(rows))
        }
        Shape::Structured => {
            let records = data
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(record) => Ok(record.clone()),
                    other => Err(CsvError::InvalidRowData {
                        row: RowRef::Item(i + 1),
                        reason: format!("expected an object, found {}", describe(other)),
                    }),
                })
                .collect::<CsvResult<Vec<_>>>()?;
            Ok(CsvTable::Records(records))
        }
    }
}

// =============================================================================
// Field Encoding
// =============================================================================

/// How to decide whether a field needs the enclosure.
enum QuoteCheck {
    /// Delimiter and enclosure are single characters.
    Chars { delimiter: char, enclosure: char },
    /// At least one of them spans several characters.
    Substrings,
}

/// Encodes fields and rows for one dialect; built once per document.
///
/// A field is enclosed only when it contains the delimiter, the enclosure
/// or whitespace. With a multi-character delimiter, an unenclosed field
/// that ends with a prefix of the delimiter therefore reads back
/// differently: `["a|", "b"]` with `||` dumps as `a|||b`, which parses as
/// `["a", "|b"]`.
struct FieldEncoder<'a> {
    dialect: &'a CsvDialect,
    check: QuoteCheck,
    /// Prefix put in front of an enclosure inside an enclosed field.
    enclosure_prefix: &'a str,
    /// Escape sequence that must itself be escaped, if distinct from the enclosure.
    escape: Option<&'a str>,
}

impl<'a> FieldEncoder<'a> {
    fn new(dialect: &'a CsvDialect) -> Self {
        let check = match (single_char(&dialect.delimiter), single_char(&dialect.enclosure)) {
            (Some(delimiter), Some(enclosure)) => QuoteCheck::Chars {
                delimiter,
                enclosure,
            },
            _ => QuoteCheck::Substrings,
        };
        let enclosure_prefix = dialect
            .escape_seq()
            .unwrap_or(dialect.enclosure.as_str());
        let escape = dialect
            .escape_seq()
            .filter(|escape| *escape != dialect.enclosure);

        Self {
            dialect,
            check,
            enclosure_prefix,
            escape,
        }
    }

    fn needs_enclosure(&self, field: &str) -> bool {
        match self.check {
            QuoteCheck::Chars {
                delimiter,
                enclosure,
            } => field
                .chars()
                .any(|c| c == delimiter || c == enclosure || c.is_whitespace()),
            QuoteCheck::Substrings => {
                field.contains(self.dialect.delimiter.as_str())
                    || field.contains(self.dialect.enclosure.as_str())
                    || field.chars().any(char::is_whitespace)
            }
        }
    }

    fn encode_field(&self, field: &str, out: &mut String) {
        if !self.needs_enclosure(field) {
            out.push_str(field);
            return;
        }

        let enclosure = self.dialect.enclosure.as_str();
        out.push_str(enclosure);

        // Single left-to-right scan: an escaped enclosure is never rescanned.
        let mut rest = field;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix(enclosure) {
                out.push_str(self.enclosure_prefix);
                out.push_str(enclosure);
                rest = after;
                continue;
            }
            if let Some(escape) = self.escape {
                if let Some(after) = rest.strip_prefix(escape) {
                    out.push_str(escape);
                    out.push_str(escape);
                    rest = after;
                    continue;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }

        out.push_str(enclosure);
    }

    fn encode_row<'f>(&self, fields: impl IntoIterator<Item = &'f str>, out: &mut String) {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push_str(&self.dialect.delimiter);
            }
            self.encode_field(field, out);
        }
        out.push('\n');
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

// =============================================================================
// Dumping
// =============================================================================

/// Encode a table as CSV text.
///
/// Every row ends with `\n`; an empty table encodes to an empty string.
/// `target` identifies the destination in error messages.
///
/// Fields are enclosed only when needed, so with a multi-character
/// delimiter a field ending with a prefix of it (`a|` before `||`) does
/// not survive a round trip.
pub fn encode_table(table: &CsvTable, dialect: &CsvDialect, target: &str) -> CsvResult<String> {
    dialect.validate()?;

    let encoder = FieldEncoder::new(dialect);
    let mut out = String::new();

    match table {
        CsvTable::Rows(rows) => {
            let Some(first) = rows.first() else {
                return Ok(out);
            };
            if first.is_empty() {
                return Err(CsvError::InvalidRowData {
                    row: RowRef::Item(1),
                    reason: "row has no fields".into(),
                });
            }

            for (i, row) in rows.iter().enumerate() {
                check_width(first.len(), row.len(), i + 1, target)?;
                encoder.encode_row(row.iter().map(String::as_str), &mut out);
            }
        }
        CsvTable::Records(records) => {
            let Some(first) = records.first() else {
                return Ok(out);
            };
            if first.is_empty() {
                return Err(CsvError::InvalidRowData {
                    row: RowRef::Header,
                    reason: "first record has no fields".into(),
                });
            }

            encoder.encode_row(first.keys().map(String::as_str), &mut out);

            for (i, record) in records.iter().enumerate() {
                check_width(first.len(), record.len(), i + 1, target)?;
                let row = fields_to_row(record.values(), RowRef::Item(i + 1))?;
                encoder.encode_row(row.iter().map(String::as_str), &mut out);
            }
        }
    }

    debug!(target, rows = table.len(), bytes = out.len(), "encoded CSV");
    Ok(out)
}

/// Classify `data` according to `mode` and encode it as CSV text.
///
/// # Example
/// ```
/// use serde_json::json;
/// use xfs::codec::{dump, CsvDialect, DumpMode};
///
/// let data = vec![json!({ "name": "Jane Doe", "age": 30 })];
/// let csv = dump(&data, &CsvDialect::default(), DumpMode::Detect, "inline").unwrap();
/// assert_eq!(csv, "name,age\n\"Jane Doe\",30\n");
/// ```
pub fn dump(data: &[Value], dialect: &CsvDialect, mode: DumpMode, target: &str) -> CsvResult<String> {
    let table = detect_table(data, mode)?;
    encode_table(&table, dialect, target)
}

fn check_width(expected: usize, found: usize, row: usize, target: &str) -> CsvResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(CsvError::ColumnCountMismatch {
            file: target.to_string(),
            expected,
            found,
            row,
        })
    }
}

fn fields_to_row<'v>(fields: impl Iterator<Item = &'v Value>, row: RowRef) -> CsvResult<Row> {
    fields
        .enumerate()
        .map(|(i, value)| {
            scalar_to_field(value).ok_or_else(|| CsvError::InvalidRowData {
                row,
                reason: format!("field {} is {}", i + 1, describe(value)),
            })
        })
        .collect()
}

/// String form of a scalar: `true` is `1`, `false` and `null` are empty.
fn scalar_to_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) | Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
