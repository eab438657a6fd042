//! TOML encoding and decoding.
//!
//! TOML documents are tables at the top level; dumping anything else
//! fails with a format error.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FormatResult;

pub fn decode<T: DeserializeOwned>(text: &str) -> FormatResult<T> {
    Ok(toml::from_str(text)?)
}

pub fn encode<T: Serialize + ?Sized>(data: &T) -> FormatResult<String> {
    Ok(toml::to_string_pretty(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_table_round_trip() {
        let data = json!({ "family": [{ "name": "John" }, { "name": "Jane" }] });
        let text = encode(&data).unwrap();
        let back: Value = decode(&text).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        assert!(encode(&json!(["a", "b"])).is_err());
    }
}
