//! Configuration.
//!
//! Defaults are compiled in; [`Settings::from_env`] overrides them from
//! `XFS_*` environment variables (the CLI loads a `.env` file first).

use std::time::Duration;

use crate::codec::{CsvDialect, CsvOptions};
use crate::error::{XfsError, XfsResult};

/// Default CSV field delimiter.
pub const DEFAULT_DELIMITER: &str = ",";

/// Default CSV field enclosure.
pub const DEFAULT_ENCLOSURE: &str = "\"";

/// Default CSV escape sequence.
pub const DEFAULT_ESCAPE: &str = "\\";

/// Default charset of CSV input.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// User-Agent sent with remote reads.
pub const DEFAULT_USER_AGENT: &str = concat!("xfs/", env!("CARGO_PKG_VERSION"));

/// Timeout for remote reads.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings of an [`crate::XFilesystem`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Whether `http://` and `https://` sources may be read.
    pub allow_remote: bool,
    pub http_timeout: Duration,
    pub user_agent: String,
    /// Defaults for CSV reads and dumps.
    pub csv: CsvOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_remote: false,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            csv: CsvOptions::default(),
        }
    }
}

impl Settings {
    /// Load settings from `XFS_*` environment variables.
    pub fn from_env() -> XfsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> XfsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(value) = lookup("XFS_ALLOW_REMOTE") {
            settings.allow_remote = parse_bool("XFS_ALLOW_REMOTE", &value)?;
        }
        if let Some(value) = lookup("XFS_HTTP_TIMEOUT_SECS") {
            let secs = value.trim().parse::<u64>().map_err(|_| {
                XfsError::InvalidArgument(format!(
                    "XFS_HTTP_TIMEOUT_SECS must be a number of seconds, got \"{}\"",
                    value
                ))
            })?;
            settings.http_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("XFS_USER_AGENT") {
            settings.user_agent = value;
        }

        let mut dialect = CsvDialect::default();
        if let Some(value) = lookup("XFS_CSV_DELIMITER") {
            dialect.delimiter = value;
        }
        if let Some(value) = lookup("XFS_CSV_ENCLOSURE") {
            dialect.enclosure = value;
        }
        if let Some(value) = lookup("XFS_CSV_ESCAPE") {
            dialect.escape = value;
        }
        dialect
            .validate()
            .map_err(|e| XfsError::InvalidArgument(e.to_string()))?;
        settings.csv.dialect = dialect;

        if let Some(value) = lookup("XFS_CSV_CHARSET") {
            settings.csv.charset = value;
        }

        Ok(settings)
    }
}

fn parse_bool(key: &str, value: &str) -> XfsResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(XfsError::InvalidArgument(format!(
            "{} must be a boolean, got \"{}\"",
            key, value
        ))),
    }
}
