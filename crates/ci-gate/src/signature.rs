//! HMAC-SHA256 signature verification for GitHub webhooks
//!
//! GitHub signs each delivery's raw body with the shared webhook secret
//! and sends the result in the `X-Hub-Signature-256` header as
//! `sha256=<hex>`. A delivery whose signature does not verify is rejected
//! before any payload parsing happens.
//!
//! Comparison is constant-time (`subtle`) and the secret lives in a
//! `SecretString` so it cannot end up in logs by accident.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Signature verification failures
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Header is not of the form `sha256=<hex>`
    #[error("invalid signature format: {0}")]
    InvalidFormat(String),

    /// Signature did not match the payload
    #[error("signature verification failed")]
    Mismatch,
}

/// Verifier for GitHub webhook signatures
#[derive(Clone)]
pub struct SignatureValidator {
    secret: SecretString,
}

impl SignatureValidator {
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verify the signature header against the raw request body
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), SignatureError> {
        let signature_hex = signature_header
            .strip_prefix("sha256=")
            .ok_or_else(|| SignatureError::InvalidFormat("missing sha256= prefix".into()))?;

        let expected = hex::decode(signature_hex)
            .map_err(|e| SignatureError::InvalidFormat(format!("invalid hex: {e}")))?;

        let computed = self.compute(payload);

        if computed.ct_eq(&expected).into() {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    fn compute(&self, payload: &[u8]) -> Vec<u8> {
        type HmacSha256 = Hmac<Sha256>;

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
