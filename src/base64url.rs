// src/base64url.rs

//! Base64url handling shared by the JWT decoder and the JWK converter.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::{DecodeError, Engine};

/// URL-safe alphabet, padding optional. Providers are inconsistent about
/// padding JWK members, so both forms decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub(crate) fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_LENIENT.decode(input)
}
