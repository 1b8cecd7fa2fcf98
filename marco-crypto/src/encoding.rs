//! Base64url helpers.
//!
//! Envelope fields are unpadded base64url. Decoding accepts padded input
//! too, since older clients padded their output.

use crate::error::{CryptoError, CryptoResult};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes as unpadded base64url.
pub fn encode_b64url(bytes: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

/// Decodes base64url with or without padding.
pub fn decode_b64url(input: &str) -> CryptoResult<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(input.trim())
        .map_err(|e| CryptoError::InvalidEncoding(format!("invalid base64url: {e}")))
}
