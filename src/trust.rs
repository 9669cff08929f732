//! Runtime capability guard and optional attestation trust policy
//!
//! Neither piece is on the required path of a handshake: `register` verifies
//! the attestation signature with the certificate's own key regardless. The
//! trust-anchor policy is for deployments that additionally require the
//! attestation certificate to chain to a known vendor root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand::rngs::OsRng;
use tracing::debug;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

use crate::error::{Error, Result};
use crate::key;

/// Whether the cryptographic stack can verify ES256 signatures
///
/// Runs a one-shot sign/verify self-test and caches the outcome for the
/// process. Safe to call from any thread.
pub fn es256_supported() -> bool {
    static SUPPORTED: OnceLock<bool> = OnceLock::new();
    *SUPPORTED.get_or_init(self_test)
}

fn self_test() -> bool {
    let signing_key = SigningKey::random(&mut OsRng);
    let public_key = signing_key.verifying_key().to_encoded_point(false);
    let message = b"u2f-server es256 self test";
    let signature: Signature = signing_key.sign(message);
    key::verify(public_key.as_bytes(), message, signature.to_der().as_bytes())
}

/// Enumerate the files of a trust-anchor directory, sorted by path
pub fn certificate_paths(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// A set of trusted root certificates for attestation chain checking
#[derive(Debug, Default, Clone)]
pub struct TrustAnchors {
    roots: Vec<Vec<u8>>,
}

impl TrustAnchors {
    /// Load root certificates (PEM or DER files) from a directory
    ///
    /// Files that do not parse as certificates are skipped; an attestation
    /// check against an empty anchor set always fails, it never silently
    /// passes.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        let mut roots = Vec::new();
        for path in certificate_paths(&dir)? {
            let bytes = fs::read(&path)?;
            let der = if bytes.starts_with(b"-----BEGIN") {
                match parse_x509_pem(&bytes) {
                    Ok((_, pem)) => pem.contents,
                    Err(_) => {
                        debug!(path = %path.display(), "skipping unparseable PEM file");
                        continue;
                    }
                }
            } else {
                bytes
            };
            if X509Certificate::from_der(&der).is_ok() {
                roots.push(der);
            } else {
                debug!(path = %path.display(), "skipping non-certificate file");
            }
        }
        Ok(Self { roots })
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Check that the attestation certificate is signed by one of the anchors
    ///
    /// Optional policy layered on top of
    /// [`register`](crate::register::register): call it with the DER
    /// certificate of a freshly validated registration when vendor roots
    /// must be enforced.
    pub fn verify_attestation(&self, certificate_der: &[u8]) -> Result<()> {
        let (_, certificate) = X509Certificate::from_der(certificate_der)
            .map_err(|_| Error::MalformedWireData("attestation certificate"))?;
        for root in &self.roots {
            let Ok((_, anchor)) = X509Certificate::from_der(root) else {
                continue;
            };
            if certificate.verify_signature(Some(anchor.public_key())).is_ok() {
                return Ok(());
            }
        }
        Err(Error::AttestationVerification)
    }
}
