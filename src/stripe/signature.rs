//! Stripe webhook signature verification.
//!
//! The `stripe-signature` header has the form `t=<unix>,v1=<hex>[,v1=...]`.
//! The signed payload is `"{t}.{raw body}"`, HMAC-SHA256 under the endpoint
//! secret. Verification fails closed: any missing part, a stale timestamp,
//! or a digest mismatch rejects the request before the payload is trusted.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted clock skew between Stripe and this host.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing timestamp in signature header")]
    MissingTimestamp,

    #[error("no v1 signature in header")]
    MissingSignature,

    #[error("timestamp outside tolerance window")]
    StaleTimestamp,

    #[error("signature mismatch")]
    Mismatch,
}

pub fn verify(payload: &[u8], header: &str, secret: &str) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let now = chrono::Utc::now().timestamp();
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(signed_payload.as_bytes());

    // verify_slice is constant-time; accept if any v1 candidate matches.
    let matched = candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
