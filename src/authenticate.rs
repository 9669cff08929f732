//! Authentication handshake: verifying an assertion from a registered device
//!
//! The relying party issues one sign request per registered device, the
//! authenticator answers with a signature blob for one of them, and the
//! engine verifies the assertion against the stored public key and enforces
//! counter monotonicity before returning the updated record.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::request::{Registration, SignRequest};
use crate::response::{self, SignResponse};
use crate::{base64url, challenge, key};

/// Build one sign request per registered device
///
/// All returned requests share one fresh challenge; each carries one
/// device's key handle.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if any registration record is not well-formed.
pub fn make_authentication(
    registrations: &[Registration],
    app_id: &str,
) -> Result<Vec<SignRequest>> {
    let challenge = challenge::generate();

    let mut requests = Vec::with_capacity(registrations.len());
    for registration in registrations {
        registration.validate()?;
        requests.push(SignRequest::new(
            challenge.clone(),
            registration.key_handle.clone(),
            app_id,
        ));
    }

    debug!(app_id, devices = requests.len(), "sign requests built");
    Ok(requests)
}

/// Validate a sign response and return the registration with its new counter
///
/// Verifies the assertion signature over
/// `SHA256(appId) || userPresence || counter(4, BE) || SHA256(clientData)`
/// with the stored public key, then requires the reported counter to be
/// strictly greater than the stored one (the unused sentinel always passes).
///
/// The returned [`Registration`] is a copy of the matched one with only the
/// counter replaced. The caller must serialize read-verify-persist per key
/// handle; two concurrent calls against the same stale counter would both
/// pass the monotonicity check here.
pub fn authenticate(
    requests: &[SignRequest],
    registrations: &[Registration],
    response: &SignResponse,
) -> Result<Registration> {
    trace!(?response, "validating sign response");

    let request = requests
        .iter()
        .find(|request| request.key_handle() == response.key_handle)
        .ok_or(Error::UnknownKeyHandle)?;
    let registration = registrations
        .iter()
        .find(|registration| registration.key_handle == response.key_handle)
        .ok_or(Error::UnknownKeyHandle)?;

    if response.error_code != 0 {
        return Err(Error::UserAgent(response.error_code));
    }

    let (client_data, client_data_raw) = response::decode_client_data(&response.client_data)?;
    if client_data.challenge != request.challenge() {
        return Err(Error::ChallengeMismatch);
    }

    // userPresence[1] | counter[4, BE] | signature
    let blob = base64url::decode(&response.signature_data)?;
    if blob.len() <= 5 {
        return Err(Error::MalformedWireData("signature blob truncated"));
    }
    let user_presence = blob[0];
    let counter = u32::from_be_bytes([blob[1], blob[2], blob[3], blob[4]]);
    let signature = &blob[5..];

    let public_key = BASE64_STANDARD
        .decode(&registration.public_key)
        .map_err(|_| Error::InvalidArgument("registration public key"))?;
    if key::public_key_to_pem(&public_key).is_none() {
        return Err(Error::InvalidArgument("registration public key"));
    }

    let mut signed = Vec::with_capacity(32 + 1 + 4 + 32);
    signed.extend_from_slice(&Sha256::digest(request.app_id().as_bytes()));
    signed.push(user_presence);
    signed.extend_from_slice(&counter.to_be_bytes());
    signed.extend_from_slice(&Sha256::digest(&client_data_raw));

    if !key::verify(&public_key, &signed, signature) {
        return Err(Error::AuthenticationVerification);
    }

    if i64::from(counter) <= registration.counter {
        warn!(
            key_handle = %registration.key_handle,
            stored = registration.counter,
            reported = counter,
            "counter did not increase, possible cloned authenticator"
        );
        return Err(Error::CounterTooLow);
    }

    debug!(key_handle = %registration.key_handle, counter, "authentication verified");
    Ok(registration.with_counter(i64::from(counter)))
}
