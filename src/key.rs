//! P-256 public key handling for U2F (ES256)
//!
//! U2F authenticators expose keys as raw 65-byte uncompressed SEC1 points
//! (`0x04 || x || y`) and sign with ECDSA over P-256 with SHA-256. This
//! module converts raw points into the standard SubjectPublicKeyInfo/PEM
//! form, verifies signatures, and extracts the attestation certificate's
//! embedded key.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use x509_parser::prelude::*;

use crate::error::{Error, Result};

/// Length of an uncompressed SEC1 P-256 point
pub(crate) const PUBLIC_KEY_LEN: usize = 65;

/// Leading byte of an uncompressed SEC1 point
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// SubjectPublicKeyInfo header for a P-256 public key: the outer SEQUENCE,
/// the AlgorithmIdentifier (id-ecPublicKey + prime256v1) and the BIT STRING
/// header the 65 raw point bytes slot into.
const SPKI_HEADER: [u8; 26] = [
    0x30, 0x59, // SEQUENCE (89 bytes)
    0x30, 0x13, // SEQUENCE (19 bytes), AlgorithmIdentifier
    0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, // OID 1.2.840.10045.2.1 (ecPublicKey)
    0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, // OID 1.2.840.10045.3.1.7 (prime256v1)
    0x03, 0x42, 0x00, // BIT STRING (66 bytes, 0 unused bits)
];

/// Convert a raw uncompressed P-256 point into PEM `PUBLIC KEY` text
///
/// Returns `None` unless `raw` is exactly 65 bytes starting with `0x04`;
/// callers must check. The output uses 64-column lines with CRLF endings and
/// no line terminator after the footer, suitable for any verifier expecting
/// a textual SPKI key.
pub fn public_key_to_pem(raw: &[u8]) -> Option<String> {
    if raw.len() != PUBLIC_KEY_LEN || raw[0] != UNCOMPRESSED_POINT_TAG {
        return None;
    }

    let mut der = Vec::with_capacity(SPKI_HEADER.len() + PUBLIC_KEY_LEN);
    der.extend_from_slice(&SPKI_HEADER);
    der.extend_from_slice(raw);

    let encoded = BASE64_STANDARD.encode(&der);
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\r\n");
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(64));
        pem.push_str(line);
        pem.push_str("\r\n");
        rest = tail;
    }
    pem.push_str("-----END PUBLIC KEY-----");
    Some(pem)
}

/// Verify a DER-encoded ES256 signature over `data` with a raw SEC1 key
pub(crate) fn verify(public_key: &[u8], data: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_der(signature) else {
        return false;
    };
    key.verify(data, &signature).is_ok()
}

/// Extract the subject public key bytes from a DER attestation certificate
pub(crate) fn certificate_public_key(der: &[u8]) -> Result<Vec<u8>> {
    let (_, certificate) = X509Certificate::from_der(der)
        .map_err(|_| Error::MalformedWireData("attestation certificate"))?;
    Ok(certificate.public_key().subject_public_key.data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Public key for "CN=PilotGnubby-0.4.1-47901280001155957352", with the
    // PEM rendering cross-checked against KeyStore Explorer.
    const GNUBBY_POINT_HEX: &str = "048d617e65c9508e64bcc5673ac82a6799da3c1446682c2\
58c463fffdf58dfd2fa3e6c378b53d795c4a4dffb4199edd7862f23abaf0203b4b8911ba0569994e101";

    const GNUBBY_PEM: &str = "-----BEGIN PUBLIC KEY-----\r\n\
MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEjWF+ZclQjmS8xWc6yCpnmdo8FEZo\r\n\
LCWMRj//31jf0vo+bDeLU9eVxKTf+0GZ7deGLyOrrwIDtLiRG6BWmZThAQ==\r\n\
-----END PUBLIC KEY-----";

    #[test]
    fn test_known_point_renders_exact_pem() {
        let point = hex::decode(GNUBBY_POINT_HEX).unwrap();
        assert_eq!(public_key_to_pem(&point).unwrap(), GNUBBY_PEM);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(public_key_to_pem(&[]), None);
    }

    #[test]
    fn test_wrong_leading_byte() {
        assert_eq!(public_key_to_pem(b"d"), None);
        let mut point = hex::decode(GNUBBY_POINT_HEX).unwrap();
        point[0] = 0x02;
        assert_eq!(public_key_to_pem(&point), None);
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(public_key_to_pem(&[0x04]), None);
        let mut short = vec![0x04];
        short.extend_from_slice(&[0x2a; 63]);
        assert_eq!(public_key_to_pem(&short), None);
        let mut long = vec![0x04];
        long.extend_from_slice(&[0x2a; 65]);
        assert_eq!(public_key_to_pem(&long), None);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let point = hex::decode(GNUBBY_POINT_HEX).unwrap();
        assert!(!verify(&point, b"data", b"not a signature"));
        assert!(!verify(b"not a key", b"data", b"not a signature"));
    }
}
