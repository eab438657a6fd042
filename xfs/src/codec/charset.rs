//! Charset detection and transcoding to UTF-8.

use encoding_rs::Encoding;
use tracing::debug;

use crate::error::{XfsError, XfsResult};

/// Charset label that asks for detection instead of a fixed charset.
pub const AUTO_CHARSET: &str = "auto";

/// Detect the charset of raw bytes using chardet.
pub fn detect_charset(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Resolve a charset label (or [`AUTO_CHARSET`]) to an encoding.
pub fn resolve_charset(label: &str, bytes: &[u8]) -> XfsResult<&'static Encoding> {
    let label = if label.eq_ignore_ascii_case(AUTO_CHARSET) {
        let detected = detect_charset(bytes);
        debug!(charset = %detected, "detected charset");
        detected
    } else {
        label.to_string()
    };

    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| XfsError::InvalidArgument(format!("unknown charset \"{}\"", label)))
}

/// Decode bytes in the given charset into a UTF-8 string.
///
/// A leading byte order mark is dropped. Malformed input is an error
/// rather than being replaced.
pub fn decode(bytes: &[u8], charset: &str) -> XfsResult<String> {
    let encoding = resolve_charset(charset, bytes)?;
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);

    if had_errors {
        return Err(XfsError::Encoding(format!(
            "contents are not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}
