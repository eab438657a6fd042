//! CSV dialect: delimiter, enclosure and escape sequences.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CHARSET, DEFAULT_DELIMITER, DEFAULT_ENCLOSURE, DEFAULT_ESCAPE};
use crate::error::{CsvError, CsvResult};

/// Delimiter, enclosure and escape sequence of a CSV document.
///
/// Unlike most CSV libraries, every part may be longer than one character
/// (e.g. `||` as delimiter). An empty `escape` disables escaping; the
/// enclosure is then escaped by doubling it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvDialect {
    pub delimiter: String,
    pub enclosure: String,
    pub escape: String,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            enclosure: DEFAULT_ENCLOSURE.to_string(),
            escape: DEFAULT_ESCAPE.to_string(),
        }
    }
}

impl CsvDialect {
    /// Create a dialect with the default enclosure and escape.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            ..Self::default()
        }
    }

    pub fn enclosure(mut self, enclosure: impl Into<String>) -> Self {
        self.enclosure = enclosure.into();
        self
    }

    pub fn escape(mut self, escape: impl Into<String>) -> Self {
        self.escape = escape.into();
        self
    }

    /// Reject dialects the codec cannot work with.
    pub fn validate(&self) -> CsvResult<()> {
        if self.delimiter.is_empty() {
            return Err(CsvError::InvalidDialect("delimiter must not be empty".into()));
        }
        if self.enclosure.is_empty() {
            return Err(CsvError::InvalidDialect("enclosure must not be empty".into()));
        }
        if self.delimiter == self.enclosure {
            return Err(CsvError::InvalidDialect(format!(
                "delimiter and enclosure are both '{}'",
                self.delimiter
            )));
        }
        if self.delimiter.contains('\n') || self.enclosure.contains('\n') {
            return Err(CsvError::InvalidDialect(
                "delimiter and enclosure must not contain a newline".into(),
            ));
        }
        Ok(())
    }

    /// The escape sequence, or `None` when escaping is disabled.
    pub fn escape_seq(&self) -> Option<&str> {
        if self.escape.is_empty() {
            None
        } else {
            Some(&self.escape)
        }
    }

    /// Single-byte form of the dialect, if every part is exactly one byte.
    ///
    /// Returns `(delimiter, enclosure, escape)`.
    pub fn as_single_bytes(&self) -> Option<(u8, u8, Option<u8>)> {
        let delimiter = single_byte(&self.delimiter)?;
        let enclosure = single_byte(&self.enclosure)?;
        let escape = match self.escape_seq() {
            None => None,
            Some(seq) => Some(single_byte(seq)?),
        };
        Some((delimiter, enclosure, escape))
    }
}

fn single_byte(s: &str) -> Option<u8> {
    match s.as_bytes() {
        [b] => Some(*b),
        _ => None,
    }
}

/// Options for reading a CSV file: the dialect plus the source charset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    pub dialect: CsvDialect,
    /// Any `encoding_rs` label, or `auto` to detect it.
    pub charset: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            dialect: CsvDialect::default(),
            charset: DEFAULT_CHARSET.to_string(),
        }
    }
}

impl CsvOptions {
    pub fn with_dialect(dialect: CsvDialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }
}
