//! YAML encoding and decoding.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FormatResult;

pub fn decode<T: DeserializeOwned>(text: &str) -> FormatResult<T> {
    Ok(serde_yaml::from_str(text)?)
}

pub fn encode<T: Serialize + ?Sized>(data: &T) -> FormatResult<String> {
    Ok(serde_yaml::to_string(data)?)
}
