//! JSON encoding and decoding.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;

use crate::error::{FormatResult, XfsError, XfsResult};

/// Layout of dumped JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// Four-space indentation.
    #[default]
    Pretty,
    /// No whitespace at all.
    Compact,
}

impl FromStr for JsonStyle {
    type Err = XfsError;

    fn from_str(s: &str) -> XfsResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(JsonStyle::Pretty),
            "compact" => Ok(JsonStyle::Compact),
            other => Err(XfsError::InvalidArgument(format!(
                "invalid JSON style \"{}\", must be pretty or compact",
                other
            ))),
        }
    }
}

pub fn decode<T: DeserializeOwned>(text: &str) -> FormatResult<T> {
    Ok(serde_json::from_str(text)?)
}

/// Encode `data`; slashes and non-ASCII characters are written as is.
pub fn encode<T: Serialize + ?Sized>(data: &T, style: JsonStyle) -> FormatResult<String> {
    match style {
        JsonStyle::Compact => Ok(serde_json::to_string(data)?),
        JsonStyle::Pretty => {
            let mut out = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            data.serialize(&mut serializer)?;
            // serde_json only ever writes valid UTF-8
            Ok(String::from_utf8_lossy(&out).into_owned())
        }
    }
}
