//! Error types for xfs.
//!
//! The hierarchy follows the layers of the crate:
//!
//! - [`FsError`] - raw file access (local reads, remote reads, dumps)
//! - [`CsvError`] - CSV parsing and dumping
//! - [`FormatError`] - JSON, YAML and TOML encoding/decoding
//! - [`GlobError`] - glob pattern resolution
//! - [`XfsError`] - top-level error returned by [`crate::XFilesystem`]
//!
//! Every lower-level error converts into [`XfsError`] through `From`,
//! so `?` works across layer boundaries.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// File Access Errors
// =============================================================================

/// Why a path could not be opened as a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Nothing exists at the path (dead symlinks included).
    Absent,
    /// Something exists at the path, but it is not a regular file.
    NotAFile,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Absent => write!(f, "does not exist"),
            Missing::NotAFile => write!(f, "exists but is not a file"),
        }
    }
}

/// Errors while reading or writing raw file contents.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path does not exist or is not a regular file.
    #[error("Path \"{}\" {kind}", path.display())]
    NotFound { path: PathBuf, kind: Missing },

    /// Path exists but cannot be read.
    #[error("File \"{}\" exists but is not readable", path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination cannot be written.
    #[error("Failed to write \"{}\": {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote source could not be fetched.
    #[error("Could not read from \"{url}\": {source}")]
    Remote {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

// =============================================================================
// CSV Errors
// =============================================================================

/// Position of a row handed to the CSV encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    /// The header row synthesized from the first record's keys.
    Header,
    /// A data item, 1-based.
    Item(usize),
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRef::Header => write!(f, "headline"),
            RowRef::Item(n) => write!(f, "item #{}", n),
        }
    }
}

/// Errors during CSV parsing and dumping.
#[derive(Debug, Error)]
pub enum CsvError {
    /// A row disagrees with the column count of the first row.
    ///
    /// `row` is 1-based. When parsing it counts every line of the
    /// document (header included); when dumping it counts data items.
    #[error(
        "Column count mismatch: header row has {expected} columns, {found} columns found in row {row} of {file}"
    )]
    ColumnCountMismatch {
        file: String,
        expected: usize,
        found: usize,
        row: usize,
    },

    /// Dump mode auto-detection could not classify the data.
    #[error("Could not detect dump mode from CSV data: {0}")]
    InvalidDumpShape(String),

    /// A row could not be encoded.
    #[error("Invalid data in {row}: {reason}")]
    InvalidRowData { row: RowRef, reason: String },

    /// A line could not be split into fields.
    #[error("Malformed CSV in row {row}: {message}")]
    Malformed { row: usize, message: String },

    /// Delimiter, enclosure or escape sequence is unusable.
    #[error("Invalid CSV dialect: {0}")]
    InvalidDialect(String),
}

// =============================================================================
// Format Errors
// =============================================================================

/// Errors from the JSON, YAML and TOML collaborators.
#[derive(Debug, Error)]
pub enum FormatError {
    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML decoding failed.
    #[error("TOML parse error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    /// TOML encoding failed.
    #[error("TOML dump error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

// =============================================================================
// Glob Errors
// =============================================================================

/// Errors from the glob resolver.
#[derive(Debug, Error)]
pub enum GlobError {
    /// Pattern syntax is invalid.
    #[error("Invalid glob pattern \"{pattern}\": {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A directory entry could not be read (only raised with `GlobFlags::ERR`).
    #[error("Glob failed: {0}")]
    Entry(#[from] glob::GlobError),
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Errors returned by [`crate::XFilesystem`].
#[derive(Debug, Error)]
pub enum XfsError {
    /// File access error.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// CSV codec error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// JSON/YAML/TOML error.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Glob error.
    #[error(transparent)]
    Glob(#[from] GlobError),

    /// Caller supplied an out-of-range mode, flag or setting.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Contents could not be decoded with the requested charset.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for raw file access.
pub type FsResult<T> = Result<T, FsError>;

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for format operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Result type for glob operations.
pub type GlobResult<T> = Result<T, GlobError>;

/// Result type for facade operations.
pub type XfsResult<T> = Result<T, XfsError>;
