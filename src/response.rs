//! Authenticator response types, the untrusted boundary of the engine
//!
//! These structs deserialize from the JSON the browser's U2F API hands the
//! web application. Everything in them is attacker-controlled until the
//! protocol modules have verified it.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Standard-alphabet engine that tolerates missing `=` padding: the browser
/// U2F API emits clientData both ways.
const STANDARD_FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Response to a registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// base64url registration blob (key, key handle, certificate, signature)
    pub registration_data: String,
    /// base64 JSON client data
    pub client_data: String,
    /// U2F error code; 0 or absent means success
    #[serde(default)]
    pub error_code: i64,
}

/// Response to a sign request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    /// Key handle of the device that produced the assertion
    pub key_handle: String,
    /// base64url signature blob (user presence, counter, signature)
    pub signature_data: String,
    /// base64 JSON client data
    pub client_data: String,
    /// U2F error code; 0 or absent means success
    #[serde(default)]
    pub error_code: i64,
}

/// Client data embedded in every response
///
/// Only `challenge` is validated by this engine; `origin` and `typ` are
/// surfaced for callers that enforce their own origin policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientData {
    pub challenge: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// Decode a response's client data field
///
/// Returns both the parsed structure and the raw JSON bytes: the raw bytes
/// are part of the signed transcript and must be hashed exactly as sent.
pub(crate) fn decode_client_data(encoded: &str) -> Result<(ClientData, Vec<u8>)> {
    let raw = STANDARD_FORGIVING
        .decode(encoded)
        .map_err(|_| Error::MalformedWireData("client data base64"))?;
    let parsed = serde_json::from_slice(&raw)
        .map_err(|_| Error::MalformedWireData("client data JSON"))?;
    Ok((parsed, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_defaults_to_zero() {
        let response: SignResponse = serde_json::from_str(
            r#"{"keyHandle": "kh", "signatureData": "", "clientData": ""}"#,
        )
        .unwrap();
        assert_eq!(response.error_code, 0);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let result: std::result::Result<RegisterResponse, _> =
            serde_json::from_str(r#"{"errorCode": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_client_data() {
        let encoded = STANDARD_FORGIVING
            .encode(r#"{ "challenge": "abc", "origin": "https://example.com", "typ": "navigator.id.getAssertion" }"#);
        let (parsed, raw) = decode_client_data(&encoded).unwrap();
        assert_eq!(parsed.challenge, "abc");
        assert_eq!(parsed.origin.as_deref(), Some("https://example.com"));
        assert_eq!(parsed.typ.as_deref(), Some("navigator.id.getAssertion"));
        assert!(raw.starts_with(b"{ \"challenge\""));
    }

    #[test]
    fn test_decode_client_data_without_padding() {
        let encoded = STANDARD_FORGIVING.encode(r#"{ "challenge": "abc" }"#);
        let stripped = encoded.trim_end_matches('=');
        assert_ne!(encoded, stripped);
        let (parsed, _) = decode_client_data(stripped).unwrap();
        assert_eq!(parsed.challenge, "abc");
    }

    #[test]
    fn test_decode_client_data_rejects_non_json() {
        let encoded = STANDARD_FORGIVING.encode(b"not json");
        let result = decode_client_data(&encoded);
        assert!(matches!(result, Err(Error::MalformedWireData(_))));
    }
}
