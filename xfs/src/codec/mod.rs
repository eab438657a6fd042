//! CSV codec.
//!
//! This module provides:
//! - `dialect`: delimiter/enclosure/escape configuration, any length
//! - `parse`: CSV text to rows, records or JSON objects
//! - `dump`: rows or records back to CSV text
//! - `charset`: transcoding of non-UTF-8 input
//!
//! ## Usage Flow
//!
//! ```text
//! bytes → charset::decode → parse → Vec<Row> → rows_to_records → Vec<Record>
//! Vec<Value> → detect_table → CsvTable → encode_table → String
//! ```
//!
//! ## Known limitations
//!
//! Lines are split on raw `\n`, so a line break inside an enclosed field
//! breaks the row. Lines are trimmed, so a whitespace delimiter (e.g. tab)
//! cannot carry an empty first or last field. With a multi-character
//! delimiter, an unenclosed field ending with a prefix of the delimiter is
//! read back differently (see [`encode_table`]).

pub mod charset;
pub mod dialect;
pub mod dump;
pub mod parse;
pub mod table;

// Re-exports for convenience
pub use charset::{decode, detect_charset, AUTO_CHARSET};
pub use dialect::{CsvDialect, CsvOptions};
pub use dump::{detect_table, dump, encode_table};
pub use parse::{parse, parse_with_mode, rows_to_records};
pub use table::{CsvData, CsvTable, DumpMode, ParseMode, Record, Row};
