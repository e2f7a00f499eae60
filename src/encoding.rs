//! Character encoding probe for fabrication files
//!
//! EDA exports are mostly ASCII, but comments and attributes written by
//! Chinese-localised tools are often GBK. Candidates are tried strictly in
//! order; when none fits, undecodable bytes are dropped.

use crate::error::OffsetError;
use encoding_rs::GBK;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Encoding a file was decoded with, reused to encode the rewritten output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Gbk,
    /// Permissive UTF-8 with undecodable bytes dropped
    Lossy,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Gbk => "gbk",
            TextEncoding::Lossy => "utf-8 (lossy)",
        }
    }

    /// Encode text for output in this encoding
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        match self {
            TextEncoding::Utf8 | TextEncoding::Lossy => Cow::Borrowed(text.as_bytes()),
            TextEncoding::Gbk => {
                let (bytes, _, had_errors) = GBK.encode(text);
                if had_errors {
                    warn!("Some characters could not be represented in GBK");
                }
                bytes
            }
        }
    }
}

/// Text decoded from raw file bytes
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

const CANDIDATES: &[TextEncoding] = &[TextEncoding::Utf8, TextEncoding::Gbk];

fn decode_strict(bytes: &[u8], encoding: TextEncoding) -> Result<String, OffsetError> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| OffsetError::DecodeFailure),
        TextEncoding::Gbk => GBK
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(Cow::into_owned)
            .ok_or(OffsetError::DecodeFailure),
        TextEncoding::Lossy => Ok(decode_lossy(bytes)),
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Decode file bytes with the first candidate encoding that accepts them all
pub fn decode(bytes: &[u8]) -> DecodedText {
    for &encoding in CANDIDATES {
        match decode_strict(bytes, encoding) {
            Ok(text) => {
                debug!("Decoded as {}", encoding.name());
                return DecodedText { text, encoding };
            }
            Err(e) => debug!("{} rejected: {}", encoding.name(), e),
        }
    }

    warn!("{}; dropping undecodable bytes", OffsetError::DecodeFailure);
    DecodedText {
        text: decode_lossy(bytes),
        encoding: TextEncoding::Lossy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_utf8() {
        let decoded = decode(b"M48\nMETRIC\n");
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert_eq!(decoded.text, "M48\nMETRIC\n");
    }

    #[test]
    fn test_gbk_round_trip() {
        // "钻孔" in GBK
        let bytes: &[u8] = &[b';', 0xD7, 0xEA, 0xBF, 0xD7, b'\n'];
        let decoded = decode(bytes);
        assert_eq!(decoded.encoding, TextEncoding::Gbk);
        assert_eq!(decoded.text, ";钻孔\n");
        assert_eq!(decoded.encoding.encode(&decoded.text).as_ref(), bytes);
    }

    #[test]
    fn test_lossy_fallback_drops_bytes() {
        // 0xFF is invalid in both UTF-8 and GBK
        let decoded = decode(&[b'X', b'1', 0xFF, b'\n']);
        assert_eq!(decoded.encoding, TextEncoding::Lossy);
        assert_eq!(decoded.text, "X1\n");
    }
}
