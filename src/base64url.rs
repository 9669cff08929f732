//! Unpadded URL-safe base64, the encoding used throughout the U2F wire format
//!
//! Key handles, challenges and the `registrationData`/`signatureData` blobs
//! all use the URL-safe alphabet (`-` and `_` instead of `+` and `/`) with
//! the trailing `=` padding stripped. Some user agents nevertheless send the
//! padding, so decoding accepts both forms.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{Error, Result};

/// URL-safe engine: never emits padding, tolerates it on input.
const URL_SAFE_FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded URL-safe base64
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_FORGIVING.encode(data)
}

/// Decode URL-safe base64, with or without trailing padding
pub fn decode(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_FORGIVING
        .decode(data)
        .map_err(|_| Error::MalformedWireData("invalid base64url"))
}
