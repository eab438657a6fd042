//! CSV parsing.
//!
//! Documents are split on raw `\n` before field splitting, so line breaks
//! inside enclosed fields are not supported. Every line is trimmed.
//!
//! Field grammar (shared by both splitting strategies):
//!
//! - fields are separated by the delimiter
//! - a field starting with the enclosure is enclosed; inside it the escape
//!   sequence takes the next enclosure, escape or character literally, and
//!   a doubled enclosure stands for one enclosure
//! - the closing enclosure ends the quoted part; anything up to the next
//!   delimiter is appended verbatim
//! - an empty line is a single empty field

use serde_json::Value;
use tracing::debug;

use super::dialect::CsvDialect;
use super::table::{CsvData, ParseMode, Record, Row};
use crate::error::{CsvError, CsvResult};

// =============================================================================
// Line Splitting Strategies
// =============================================================================

/// Field splitter, chosen once per document.
enum LineSplitter<'a> {
    /// Every part of the dialect is one byte: the `csv` crate does the work.
    SingleByte(csv::ReaderBuilder),
    /// Delimiter, enclosure or escape spans several bytes.
    MultiChar(&'a CsvDialect),
}

impl<'a> LineSplitter<'a> {
    fn for_dialect(dialect: &'a CsvDialect) -> Self {
        match dialect.as_single_bytes() {
            Some((delimiter, enclosure, escape)) => {
                let mut builder = csv::ReaderBuilder::new();
                builder
                    .has_headers(false)
                    .flexible(true)
                    .trim(csv::Trim::None)
                    .delimiter(delimiter)
                    .quote(enclosure)
                    .double_quote(true)
                    .escape(escape)
                    // Lines are already split; a bare `\r` is field data.
                    .terminator(csv::Terminator::Any(b'\n'));
                LineSplitter::SingleByte(builder)
            }
            None => LineSplitter::MultiChar(dialect),
        }
    }

    fn split(&self, line: &str, row: usize) -> CsvResult<Row> {
        if line.is_empty() {
            return Ok(vec![String::new()]);
        }
        match self {
            LineSplitter::SingleByte(builder) => {
                let mut reader = builder.from_reader(line.as_bytes());
                let mut record = csv::StringRecord::new();
                match reader.read_record(&mut record) {
                    Ok(true) => Ok(record.iter().map(String::from).collect()),
                    Ok(false) => Ok(vec![String::new()]),
                    Err(e) => Err(CsvError::Malformed {
                        row,
                        message: e.to_string(),
                    }),
                }
            }
            LineSplitter::MultiChar(dialect) => Ok(split_multi_char(line, dialect)),
        }
    }
}

fn split_multi_char(line: &str, dialect: &CsvDialect) -> Row {
    let delimiter = dialect.delimiter.as_str();
    let mut fields = Vec::new();
    let mut rest = line;

    loop {
        let (field, remaining) = match rest.strip_prefix(dialect.enclosure.as_str()) {
            Some(inner) => read_enclosed(inner, dialect),
            None => match rest.find(delimiter) {
                Some(at) => (rest[..at].to_string(), Some(&rest[at + delimiter.len()..])),
                None => (rest.to_string(), None),
            },
        };
        fields.push(field);
        match remaining {
            Some(next) => rest = next,
            None => break,
        }
    }

    fields
}

/// Read an enclosed field whose opening enclosure was already consumed.
///
/// Returns the field and the text after its trailing delimiter, if any.
fn read_enclosed<'a>(mut rest: &'a str, dialect: &CsvDialect) -> (String, Option<&'a str>) {
    let enclosure = dialect.enclosure.as_str();
    let delimiter = dialect.delimiter.as_str();
    let mut field = String::new();

    // An escape equal to the enclosure behaves like doubling.
    let escape = dialect.escape_seq().filter(|escape| *escape != enclosure);

    loop {
        if let Some(escape) = escape {
            if let Some(after) = rest.strip_prefix(escape) {
                if let Some(next) = after.strip_prefix(enclosure) {
                    field.push_str(enclosure);
                    rest = next;
                    continue;
                }
                if let Some(next) = after.strip_prefix(escape) {
                    field.push_str(escape);
                    rest = next;
                    continue;
                }
                let mut chars = after.chars();
                if let Some(c) = chars.next() {
                    field.push(c);
                    rest = chars.as_str();
                    continue;
                }
            }
        }

        if let Some(after) = rest.strip_prefix(enclosure) {
            match after.strip_prefix(enclosure) {
                Some(next) => {
                    field.push_str(enclosure);
                    rest = next;
                    continue;
                }
                None => {
                    rest = after;
                    break;
                }
            }
        }

        let mut chars = rest.chars();
        match chars.next() {
            Some(c) => {
                field.push(c);
                rest = chars.as_str();
            }
            // Unterminated enclosure: keep what was read.
            None => return (field, None),
        }
    }

    match rest.find(delimiter) {
        Some(at) => {
            field.push_str(&rest[..at]);
            (field, Some(&rest[at + delimiter.len()..]))
        }
        None => {
            field.push_str(rest);
            (field, None)
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse CSV text into rows.
///
/// `source` identifies the document in error messages. Every row must have
/// as many fields as the first one.
///
/// # Example
/// ```
/// use xfs::codec::{parse, CsvDialect};
///
/// let rows = parse("name,age\nAlice,30\n", &CsvDialect::default(), "inline").unwrap();
/// assert_eq!(rows, vec![vec!["name", "age"], vec!["Alice", "30"]]);
/// ```
pub fn parse(text: &str, dialect: &CsvDialect, source: &str) -> CsvResult<Vec<Row>> {
    dialect.validate()?;

    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let splitter = LineSplitter::for_dialect(dialect);
    let mut expected: Option<usize> = None;
    let mut rows = Vec::new();

    for (index, line) in text.split('\n').enumerate() {
        let row_num = index + 1;
        let fields = splitter.split(line.trim(), row_num)?;

        match expected {
            None => expected = Some(fields.len()),
            Some(len) if fields.len() != len => {
                return Err(CsvError::ColumnCountMismatch {
                    file: source.to_string(),
                    expected: len,
                    found: fields.len(),
                    row: row_num,
                });
            }
            Some(_) => {}
        }

        rows.push(fields);
    }

    debug!(source, rows = rows.len(), "parsed CSV");
    Ok(rows)
}

/// Zip every row after the first against the first row's fields.
///
/// Rows must already have consistent lengths (as produced by [`parse`]).
pub fn rows_to_records(mut rows: Vec<Row>) -> Vec<Record> {
    if rows.is_empty() {
        return Vec::new();
    }
    let header = rows.remove(0);

    rows.into_iter()
        .map(|row| {
            header
                .iter()
                .cloned()
                .zip(row.into_iter().map(Value::String))
                .collect()
        })
        .collect()
}

/// Parse CSV text and structure it according to `mode`.
pub fn parse_with_mode(
    text: &str,
    dialect: &CsvDialect,
    source: &str,
    mode: ParseMode,
) -> CsvResult<CsvData> {
    let rows = parse(text, dialect, source)?;

    Ok(match mode {
        ParseMode::Array => CsvData::Rows(rows),
        ParseMode::Assoc => CsvData::Records(rows_to_records(rows)),
        ParseMode::Object => CsvData::Objects(
            rows_to_records(rows)
                .into_iter()
                .map(Value::Object)
                .collect(),
        ),
    })
}
