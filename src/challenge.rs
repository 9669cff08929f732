//! Cryptographically random challenge strings
//!
//! A challenge binds one handshake to one response: it is issued in a
//! request, signed by the authenticator inside the client data, and compared
//! byte-for-byte on the way back. Challenges must never be reused across
//! handshakes.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::base64url;

/// Number of random bytes per challenge (43 base64url characters).
const CHALLENGE_BYTES: usize = 32;

/// Generate a fresh random challenge, base64url encoded
pub fn generate() -> String {
    let mut buf = [0u8; CHALLENGE_BYTES];
    OsRng.fill_bytes(&mut buf);
    base64url::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_length() {
        let challenge = generate();
        assert!(challenge.len() > 20);
        assert!(!challenge.contains('='));
    }

    #[test]
    fn test_challenge_is_valid_base64url() {
        let challenge = generate();
        let decoded = base64url::decode(&challenge).unwrap();
        assert_eq!(decoded.len(), CHALLENGE_BYTES);
    }

    #[test]
    fn test_consecutive_challenges_differ() {
        assert_ne!(generate(), generate());
    }
}
