//! Request value objects and the persisted registration record

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{base64url, key};

/// Protocol version tag carried by every request
pub const U2F_VERSION: &str = "U2F_V2";

/// Challenge issued to start a registration handshake
///
/// Immutable; serialized to the `{version, challenge, appId}` JSON shape the
/// client-side U2F API consumes, and echoed back for challenge matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    version: &'static str,
    challenge: String,
    app_id: String,
}

impl RegistrationRequest {
    pub fn new(challenge: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            version: U2F_VERSION,
            challenge: challenge.into(),
            app_id: app_id.into(),
        }
    }

    pub fn version(&self) -> &str {
        self.version
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

/// Challenge issued for one previously registered device
///
/// Immutable; one per device, both for authentication and for the
/// duplicate-enrollment check during registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    version: &'static str,
    challenge: String,
    key_handle: String,
    app_id: String,
}

impl SignRequest {
    pub fn new(
        challenge: impl Into<String>,
        key_handle: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            version: U2F_VERSION,
            challenge: challenge.into(),
            key_handle: key_handle.into(),
            app_id: app_id.into(),
        }
    }

    pub fn version(&self) -> &str {
        self.version
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn key_handle(&self) -> &str {
        &self.key_handle
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

/// A registered device credential, owned and persisted by the caller
///
/// `key_handle` is unpadded base64url; `public_key` (65-byte uncompressed
/// P-256 point) and `certificate` (DER) are standard base64. `key_handle`,
/// `public_key` and `certificate` are immutable for the lifetime of the
/// credential. `counter` starts at [`Registration::UNUSED_COUNTER`] and is
/// replaced, never mutated in place, by a successful authentication; the
/// caller must persist the replacement atomically relative to concurrent
/// uses of the same key handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub key_handle: String,
    pub public_key: String,
    pub certificate: String,
    pub counter: i64,
}

impl Registration {
    /// Sentinel counter for a credential that has never authenticated.
    ///
    /// Kept negative (below any value an authenticator can report) so that
    /// persisted records keep the same convention across deployments.
    pub const UNUSED_COUNTER: i64 = -1;

    /// Check that the record is well-formed enough to build requests from
    ///
    /// Batch operations call this for every supplied record so that an
    /// empty or corrupted row fails up front instead of deep inside a
    /// handshake.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.key_handle.is_empty() || base64url::decode(&self.key_handle).is_err() {
            return Err(Error::InvalidArgument("registration key handle"));
        }
        let public_key = BASE64_STANDARD
            .decode(&self.public_key)
            .map_err(|_| Error::InvalidArgument("registration public key"))?;
        if key::public_key_to_pem(&public_key).is_none() {
            return Err(Error::InvalidArgument("registration public key"));
        }
        if BASE64_STANDARD.decode(&self.certificate).is_err() {
            return Err(Error::InvalidArgument("registration certificate"));
        }
        Ok(())
    }

    /// Copy of this record with the counter replaced
    pub(crate) fn with_counter(&self, counter: i64) -> Self {
        Self {
            counter,
            ..self.clone()
        }
    }
}
