//! Header and attachment encodings
//!
//! <https://tools.ietf.org/html/rfc2047>

use base64::{engine::general_purpose::STANDARD, Engine};

/// Line length of base64 encoded attachment content
pub const BASE64_LINE_LENGTH: usize = 76;

/// Encodes a header value as a base64 encoded-word, `=?charset?B?payload?=`
pub fn encode_word(value: &str, charset: &str) -> String {
    format!("=?{}?B?{}?=", charset, STANDARD.encode(value))
}

/// Decodes a base64 encoded-word, whatever its charset label
///
/// Returns `None` if `value` is not a single base64 encoded-word or if the
/// payload is not valid UTF-8.
pub fn decode_word(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix("=?")?.strip_suffix("?=")?;
    let (_charset, rest) = inner.split_once('?')?;
    let payload = rest
        .strip_prefix("B?")
        .or_else(|| rest.strip_prefix("b?"))?;

    STANDARD
        .decode(payload)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

/// Base64 encodes `content` in lines of [`BASE64_LINE_LENGTH`] characters
///
/// Every line, including the last, ends with CRLF.
pub fn base64_lines(content: &[u8]) -> String {
    let encoded = STANDARD.encode(content);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2 + 2);

    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LENGTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }

    out
}
