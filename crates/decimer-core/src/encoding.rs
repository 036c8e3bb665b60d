//! Base64 transport encoding for image payloads

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode raw image bytes for transport
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a transported image payload.
///
/// Accepts an optional `data:<mime>;base64,` prefix and embedded whitespace
/// (line-wrapped encoders insert newlines every 76 characters).
pub fn decode_image(encoded: &str) -> Result<Vec<u8>> {
    let payload = strip_data_url(encoded.trim())?;

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::invalid_base64("payload is empty"));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::invalid_base64(e.to_string()))
}

/// Length of the encoded form of `len` raw bytes
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

fn strip_data_url(payload: &str) -> Result<&str> {
    let Some(rest) = payload.strip_prefix("data:") else {
        return Ok(payload);
    };

    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| Error::invalid_base64("data URL has no payload"))?;
    if !meta.ends_with(";base64") {
        return Err(Error::invalid_base64("data URLs must specify base64 encoding"));
    }
    Ok(data)
}
