//! Proof transport codec.
//!
//! Binary proof material travels as standard padded base64. [`decode`] is
//! strict, so `decode(encode(b)) == b` and `encode(decode(t)) == t` both hold.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use thiserror::Error;

/// Decoding failure for a transport string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid base64 proof encoding: {0}")]
pub struct CodecError(String);

/// Encode bytes for transport.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a transport string produced by [`encode`].
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD
        .decode(text)
        .map_err(|e| CodecError(e.to_string()))
}

/// Decode base64 with flexible format support (standard, URL-safe, with/without padding).
pub fn decode_lenient(text: &str) -> Result<Vec<u8>, CodecError> {
    let trimmed = text.trim();
    STANDARD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .or_else(|_| URL_SAFE.decode(trimmed))
        .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
        .map_err(|e| CodecError(e.to_string()))
}

/// Serde adapter for byte fields carried as base64 strings.
pub mod serde_b64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode_lenient(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_vector() {
        assert_eq!(encode(b"proof"), "cHJvb2Y=");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn test_decode_known_vector() {
        assert_eq!(decode("cHJvb2Y=").unwrap(), b"proof");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode("not base64!").is_err());
        // Missing padding is not a canonical encoding.
        assert!(decode("cHJvb2Y").is_err());
        // Non-zero trailing bits.
        assert!(decode("cHJvb2Z=").is_err());
    }

    #[test]
    fn test_decode_lenient_accepts_variants() {
        assert_eq!(decode_lenient("cHJvb2Y").unwrap(), b"proof");
        assert_eq!(decode_lenient(" cHJvb2Y= \n").unwrap(), b"proof");
        assert_eq!(decode_lenient("-_8").unwrap(), vec![0xfb, 0xff]);
        assert!(decode_lenient("***").is_err());
    }

    #[test]
    fn test_error_message_is_descriptive() {
        let err = decode("@@@@").unwrap_err();
        assert!(err.to_string().starts_with("invalid base64 proof encoding"));
    }
}
