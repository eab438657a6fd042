//! Format collaborators: JSON, YAML and TOML.
//!
//! Thin wrappers around `serde_json`, `serde_yaml` and `toml`. The grammars
//! are never reimplemented here; this module only fixes the output layout
//! and maps errors into [`crate::error::FormatError`].

pub mod json;
pub mod native;
pub mod yaml;

use std::path::Path;
use std::str::FromStr;

use crate::error::{XfsError, XfsResult};

pub use json::JsonStyle;

/// File formats understood by [`crate::XFilesystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Csv,
    Json,
    Yaml,
    /// TOML, the native configuration format of the Rust ecosystem.
    Toml,
}

impl Format {
    /// Infer the format from a file extension; unknown extensions are text.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Format::Csv,
            Some("json") => Format::Json,
            Some("yml") | Some("yaml") => Format::Yaml,
            Some("toml") => Format::Toml,
            _ => Format::Text,
        }
    }
}

impl FromStr for Format {
    type Err = XfsError;

    fn from_str(s: &str) -> XfsResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(Format::Text),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            other => Err(XfsError::InvalidArgument(format!(
                "unknown format \"{}\", must be one of text, csv, json, yaml, toml",
                other
            ))),
        }
    }
}
