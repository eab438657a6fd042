//! Data shapes handled by the CSV codec.

use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{XfsError, XfsResult};

/// One CSV line as ordered string fields.
pub type Row = Vec<String>;

/// One data line keyed by the header, in header order.
pub type Record = Map<String, Value>;

// =============================================================================
// Tables
// =============================================================================

/// The two shapes a CSV document can be dumped from.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvTable {
    /// Rows used verbatim, no header synthesis.
    Rows(Vec<Row>),
    /// Records sharing the first record's keys as header.
    Records(Vec<Record>),
}

impl CsvTable {
    pub fn len(&self) -> usize {
        match self {
            CsvTable::Rows(rows) => rows.len(),
            CsvTable::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Row>> for CsvTable {
    fn from(rows: Vec<Row>) -> Self {
        CsvTable::Rows(rows)
    }
}

impl From<Vec<Record>> for CsvTable {
    fn from(records: Vec<Record>) -> Self {
        CsvTable::Records(records)
    }
}

/// Result of reading a CSV file, shaped by [`ParseMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum CsvData {
    /// [`ParseMode::Array`]: every line, header included.
    Rows(Vec<Row>),
    /// [`ParseMode::Assoc`]: one record per data line.
    Records(Vec<Record>),
    /// [`ParseMode::Object`]: one JSON object per data line.
    Objects(Vec<Value>),
}

impl CsvData {
    pub fn len(&self) -> usize {
        match self {
            CsvData::Rows(rows) => rows.len(),
            CsvData::Records(records) => records.len(),
            CsvData::Objects(objects) => objects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into a JSON array, whatever the shape.
    pub fn into_value(self) -> Value {
        match self {
            CsvData::Rows(rows) => Value::Array(
                rows.into_iter()
                    .map(|row| Value::Array(row.into_iter().map(Value::String).collect()))
                    .collect(),
            ),
            CsvData::Records(records) => {
                Value::Array(records.into_iter().map(Value::Object).collect())
            }
            CsvData::Objects(objects) => Value::Array(objects),
        }
    }
}

// =============================================================================
// Modes
// =============================================================================

/// How parsed CSV lines are structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Each line as a row.
    Array,
    /// First line as header, data lines as records.
    Assoc,
    /// Like `Assoc`, but records exposed as JSON objects.
    #[default]
    Object,
}

impl FromStr for ParseMode {
    type Err = XfsError;

    fn from_str(s: &str) -> XfsResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "array" => Ok(ParseMode::Array),
            "assoc" => Ok(ParseMode::Assoc),
            "object" => Ok(ParseMode::Object),
            other => Err(XfsError::InvalidArgument(format!(
                "invalid parse mode \"{}\", must be one of array, assoc, object",
                other
            ))),
        }
    }
}

impl TryFrom<u8> for ParseMode {
    type Error = XfsError;

    fn try_from(value: u8) -> XfsResult<Self> {
        match value {
            0 => Ok(ParseMode::Array),
            1 => Ok(ParseMode::Assoc),
            2 => Ok(ParseMode::Object),
            other => Err(XfsError::InvalidArgument(format!(
                "invalid parse mode {}, must be 0 (array), 1 (assoc) or 2 (object)",
                other
            ))),
        }
    }
}

/// How data handed to the CSV dumper is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpMode {
    /// Arrays of scalars, written verbatim.
    Plain,
    /// Records; the first record's keys become the header.
    Structured,
    /// Decide from the first element.
    #[default]
    Detect,
}

impl FromStr for DumpMode {
    type Err = XfsError;

    fn from_str(s: &str) -> XfsResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(DumpMode::Plain),
            "structured" => Ok(DumpMode::Structured),
            "detect" => Ok(DumpMode::Detect),
            other => Err(XfsError::InvalidArgument(format!(
                "invalid dump mode \"{}\", must be one of plain, structured, detect",
                other
            ))),
        }
    }
}

impl TryFrom<u8> for DumpMode {
    type Error = XfsError;

    fn try_from(value: u8) -> XfsResult<Self> {
        match value {
            0 => Ok(DumpMode::Plain),
            1 => Ok(DumpMode::Structured),
            3 => Ok(DumpMode::Detect),
            other => Err(XfsError::InvalidArgument(format!(
                "invalid dump mode {}, must be 0 (plain), 1 (structured) or 3 (detect)",
                other
            ))),
        }
    }
}
