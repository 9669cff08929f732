//! Registration handshake: enrolling a new device
//!
//! The relying party issues a fresh challenge, the authenticator answers
//! with a registration blob carrying its new key pair, key handle and
//! attestation certificate, and the engine verifies the attestation
//! signature before handing the caller a [`Registration`] to persist.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::request::{Registration, RegistrationRequest, SignRequest};
use crate::response::{self, RegisterResponse};
use crate::{base64url, challenge, der, key};

/// Leading reserved byte of the registration blob
const REGISTRATION_RESERVED_BYTE: u8 = 0x05;

/// Build a registration request plus sign requests for existing devices
///
/// Every sign request carries the *same* challenge as the registration
/// request and one existing device's key handle, so the client side can
/// detect an already-registered device before completing a new enrollment.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if any existing registration record is not
/// well-formed.
pub fn make_registration(
    app_id: &str,
    existing: &[Registration],
) -> Result<(RegistrationRequest, Vec<SignRequest>)> {
    let challenge = challenge::generate();
    let request = RegistrationRequest::new(challenge.clone(), app_id);

    let mut signatures = Vec::with_capacity(existing.len());
    for registration in existing {
        registration.validate()?;
        signatures.push(SignRequest::new(
            challenge.clone(),
            registration.key_handle.clone(),
            app_id,
        ));
    }

    debug!(app_id, devices = signatures.len(), "registration request built");
    Ok((request, signatures))
}

/// Validate a registration response and produce the credential record
///
/// Decodes the registration blob, repairs the attestation certificate's
/// signature BIT STRING if needed, and verifies the attestation signature
/// over `0x00 || SHA256(appId) || SHA256(clientData) || keyHandle || pubkey`
/// with the key embedded in the certificate.
///
/// The returned [`Registration`] carries the counter sentinel
/// [`Registration::UNUSED_COUNTER`]; persisting it is the caller's job.
pub fn register(request: &RegistrationRequest, response: &RegisterResponse) -> Result<Registration> {
    trace!(?response, "validating registration response");

    if response.error_code != 0 {
        return Err(Error::UserAgent(response.error_code));
    }

    let (client_data, client_data_raw) = response::decode_client_data(&response.client_data)?;
    if client_data.challenge != request.challenge() {
        return Err(Error::ChallengeMismatch);
    }

    let blob = base64url::decode(&response.registration_data)?;

    // 0x05 | pubkey[65] | L | keyHandle[L] | certificate | signature
    if blob.first() != Some(&REGISTRATION_RESERVED_BYTE) {
        return Err(Error::MalformedWireData("registration reserved byte"));
    }
    if blob.len() < 1 + key::PUBLIC_KEY_LEN + 1 {
        return Err(Error::MalformedWireData("registration blob truncated"));
    }
    let public_key = &blob[1..1 + key::PUBLIC_KEY_LEN];
    let key_handle_len = blob[1 + key::PUBLIC_KEY_LEN] as usize;
    let key_handle_end = 1 + key::PUBLIC_KEY_LEN + 1 + key_handle_len;
    if blob.len() < key_handle_end {
        return Err(Error::MalformedWireData("key handle truncated"));
    }
    let key_handle = &blob[1 + key::PUBLIC_KEY_LEN + 1..key_handle_end];

    // The certificate delimits itself; whatever follows it is the signature.
    let certificate_len = der::certificate_length(&blob[key_handle_end..])?;
    let certificate =
        der::fix_signature_unused_bits(&blob[key_handle_end..key_handle_end + certificate_len]);
    let signature = &blob[key_handle_end + certificate_len..];
    if signature.is_empty() {
        return Err(Error::MalformedWireData("attestation signature missing"));
    }

    if key::public_key_to_pem(public_key).is_none() {
        return Err(Error::MalformedWireData("registered public key"));
    }

    let attestation_key = key::certificate_public_key(&certificate)?;

    let mut signed = Vec::with_capacity(1 + 32 + 32 + key_handle.len() + public_key.len());
    signed.push(0x00);
    signed.extend_from_slice(&Sha256::digest(request.app_id().as_bytes()));
    signed.extend_from_slice(&Sha256::digest(&client_data_raw));
    signed.extend_from_slice(key_handle);
    signed.extend_from_slice(public_key);

    if !key::verify(&attestation_key, &signed, signature) {
        return Err(Error::AttestationVerification);
    }

    debug!(app_id = request.app_id(), "registration verified");
    Ok(Registration {
        key_handle: base64url::encode(key_handle),
        public_key: BASE64_STANDARD.encode(public_key),
        certificate: BASE64_STANDARD.encode(&certificate),
        counter: Registration::UNUSED_COUNTER,
    })
}
