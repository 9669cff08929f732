#![warn(unused_extern_crates)]

//! # u2f-server
//!
//! Server-side (relying party) engine for the FIDO U2F two-factor protocol:
//! challenge issuance, registration and authentication response validation,
//! and per-device replay-protection counters.
//!
//! The engine is stateless and synchronous. It owns no persistence and no
//! transport: the web application stores [`Registration`] records, ships
//! requests to the browser's U2F API, and hands the responses back.
//!
//! ## Architecture
//!
//! - **Registration**: [`make_registration`] builds the challenge,
//!   [`register`] validates the authenticator's attestation response
//! - **Authentication**: [`make_authentication`] builds per-device sign
//!   requests, [`authenticate`] verifies the assertion and enforces counter
//!   monotonicity
//! - **Trust**: [`trust`] holds the ES256 capability guard and the optional
//!   vendor-root attestation policy
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> u2f_server::Result<()> {
//! let app_id = "https://demo.example.com";
//! let registrations = vec![]; // loaded from the caller's storage
//!
//! // Start an enrollment and send both values to the browser.
//! let (request, sign_requests) = u2f_server::make_registration(app_id, &registrations)?;
//! # let response = serde_json::from_str(r#"{"registrationData":"","clientData":""}"#).unwrap();
//!
//! // Validate the browser's response and persist the returned record.
//! let registration = u2f_server::register(&request, &response)?;
//! # let _ = (sign_requests, registration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! [`authenticate`] compares the authenticator's counter against a read
//! snapshot of the stored record. The caller must serialize
//! read-verify-persist per key handle (transaction or compare-and-swap on
//! the counter); the engine itself holds no locks and never retries.

pub mod base64url;
pub mod challenge;
pub mod trust;

mod authenticate;
mod der;
mod error;
mod key;
mod register;
mod request;
mod response;

pub use authenticate::{authenticate, make_authentication};
pub use der::fix_signature_unused_bits;
pub use error::{Error, Result};
pub use key::public_key_to_pem;
pub use register::{make_registration, register};
pub use request::{Registration, RegistrationRequest, SignRequest, U2F_VERSION};
pub use response::{ClientData, RegisterResponse, SignResponse};
