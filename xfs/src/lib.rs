//! # xfs - structured file access
//!
//! xfs reads and dumps CSV, JSON, YAML and TOML files through one facade
//! and resolves glob patterns with recursive `**` segments.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ local / URL │────▶│ XFilesystem │────▶│  CSV codec  │──▶ rows / records
//! │   source    │     │ (read/dump) │     │ JSON/YAML/… │──▶ serde values
//! └─────────────┘     └──────┬──────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │GlobResolver │──▶ paths (`**` expanded)
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xfs::{CsvOptions, CsvDialect, DumpMode, ParseMode, XFilesystem};
//!
//! let xfs = XFilesystem::new();
//! let data = xfs.read_csv_file("family.csv", ParseMode::Object, &CsvOptions::default())?;
//! println!("{} records", data.len());
//!
//! let records = data.into_value();
//! if let Some(items) = records.as_array() {
//!     xfs.dump_csv_file("copy.csv", items, &CsvDialect::with_delimiter(";"), DumpMode::Detect)?;
//! }
//! # Ok::<(), xfs::XfsError>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Settings and `XFS_*` environment overrides
//! - [`codec`] - CSV parsing and dumping with arbitrary dialects
//! - [`formats`] - JSON, YAML and TOML wrappers
//! - [`resolver`] - Glob resolution with `**` support
//! - [`fs`] - The [`XFilesystem`] facade

// Core modules
pub mod config;
pub mod error;

// Codecs
pub mod codec;
pub mod formats;

// Glob
pub mod resolver;

// Facade
pub mod fs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, FormatError, FsError, GlobError, Missing, RowRef, XfsError, XfsResult,
};

// =============================================================================
// Re-exports - CSV
// =============================================================================

pub use codec::{
    CsvData, CsvDialect, CsvOptions, CsvTable, DumpMode, ParseMode, Record, Row,
};

// =============================================================================
// Re-exports - Formats
// =============================================================================

pub use formats::{Format, JsonStyle};

// =============================================================================
// Re-exports - Glob
// =============================================================================

pub use resolver::{GlobFlags, GlobResolver, HostGlob, SegmentGlob};

// =============================================================================
// Re-exports - Facade
// =============================================================================

pub use config::Settings;
pub use fs::XFilesystem;
