//! Error types for U2F server operations

use thiserror::Error;

/// Error type for U2F registration and authentication operations
///
/// Every variant is terminal for the current handshake attempt: the engine
/// never retries, and no partial [`Registration`](crate::Registration) is
/// returned on failure. The caller decides whether to re-prompt the user.
#[derive(Debug, Error)]
pub enum Error {
    /// The user agent (browser/authenticator) reported a non-zero error code
    #[error("user agent returned error code {0}")]
    UserAgent(i64),

    /// The challenge echoed by the authenticator does not match the issued one
    #[error("challenge does not match the one issued for this handshake")]
    ChallengeMismatch,

    /// A wire blob does not match the expected binary layout
    #[error("malformed wire data: {0}")]
    MalformedWireData(&'static str),

    /// The attestation signature over the registration transcript is invalid
    #[error("attestation signature verification failed")]
    AttestationVerification,

    /// The assertion signature over the authentication transcript is invalid
    #[error("authentication signature verification failed")]
    AuthenticationVerification,

    /// The authenticator's counter did not increase (cloned-device replay suspected)
    #[error("counter value is lower than or equal to the stored one (replay suspected)")]
    CounterTooLow,

    /// The response references a key handle not present in the supplied
    /// requests/registrations
    #[error("unknown key handle")]
    UnknownKeyHandle,

    /// The caller supplied a malformed registration record
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Result type alias for U2F server operations
pub type Result<T> = std::result::Result<T, Error>;
