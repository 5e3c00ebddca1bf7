//! Time-bounded authorization signatures.
//!
//! Three RSA-PSS constructions over the cMix hash:
//!
//! - Node authorization: signs the binary form of a timestamp. Verifiers
//!   also check the signer's ID and that the timestamp is within `delta` of
//!   their clock.
//! - ACME certificate request: signs `token || timestamp`.
//! - Gateway certificate attestation: signs the DER certificate.
//!
//! Timestamps use the 15-byte binary time form (see [`marshal_time`]).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{
    error::{CryptoError, Result},
    hash::cmix_hash,
    id::{Id, IdType},
    rng::CryptoRngCore,
    rsa::{HashAlgorithm, PrivateKey, PublicKey},
};

/// Length of a [`marshal_time`] encoding
pub const TIME_LEN: usize = 15;

const TIME_VERSION: u8 = 1;

/// Seconds from 0001-01-01T00:00:00Z to the Unix epoch
const UNIX_TO_INTERNAL: i64 = 62_135_596_800;

/// UTC zone marker (offset in minutes, -1 for UTC)
const UTC_OFFSET: [u8; 2] = [0xff, 0xff];

/// Binary form of a UTC instant:
/// `0x01 || BE64(seconds since 0001-01-01) || BE32(nanoseconds) || 0xFFFF`.
pub fn marshal_time(t: SystemTime) -> [u8; TIME_LEN] {
    let (secs, nanos) = unix_parts(t);

    let mut out = [0u8; TIME_LEN];
    out[0] = TIME_VERSION;
    out[1..9].copy_from_slice(&(secs + UNIX_TO_INTERNAL).to_be_bytes());
    out[9..13].copy_from_slice(&nanos.to_be_bytes());
    out[13..].copy_from_slice(&UTC_OFFSET);
    out
}

/// Seconds and non-negative nanoseconds relative to the Unix epoch.
fn unix_parts(t: SystemTime) -> (i64, u32) {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
        Err(before) => {
            let d = before.duration();
            let secs = -(d.as_secs() as i64);
            match d.subsec_nanos() {
                0 => (secs, 0),
                n => (secs - 1, 1_000_000_000 - n),
            }
        },
    }
}

fn signed_nanos(t: SystemTime) -> i128 {
    let (secs, nanos) = unix_parts(t);
    i128::from(secs) * 1_000_000_000 + i128::from(nanos)
}

fn sign(rng: &mut impl CryptoRngCore, key: &PrivateKey, digest: &[u8; 32]) -> Result<Vec<u8>> {
    key.sign_pss(rng, HashAlgorithm::CMix, digest, None)
}

fn verify(key: &PublicKey, digest: &[u8; 32], signature: &[u8]) -> Result<()> {
    key.verify_pss(HashAlgorithm::CMix, digest, signature, None)
}

/// Sign `signed_time` as a node.
pub fn sign_node(
    rng: &mut impl CryptoRngCore,
    signed_time: SystemTime,
    key: &PrivateKey,
) -> Result<Vec<u8>> {
    sign(rng, key, &cmix_hash(&[marshal_time(signed_time).as_slice()]))
}

/// Verify a node authorization.
///
/// Checks run in order and stop at the first failure:
///
/// 1. `now` lies within `[signed_time - delta, signed_time + delta]`
/// 2. `node_id` equals the ID derived from `key` and `salt`
/// 3. the signature verifies
///
/// # Errors
///
/// - `TimeOutOfBounds`, `IdentityMismatch` or `InvalidSignature`
pub fn verify_node(
    now: SystemTime,
    signed_time: SystemTime,
    key: &PublicKey,
    node_id: &Id,
    salt: &[u8],
    delta: Duration,
    signature: &[u8],
) -> Result<()> {
    let offset = signed_nanos(now) - signed_nanos(signed_time);
    if offset.unsigned_abs() > delta.as_nanos() {
        let offset_secs = (offset / 1_000_000_000) as i64;
        tracing::debug!(offset_secs, delta_secs = delta.as_secs(), "node signature time out of bounds");
        return Err(CryptoError::TimeOutOfBounds { offset_secs, delta_secs: delta.as_secs() });
    }

    let expected = Id::from_rsa(key, salt, IdType::Node)?;
    if expected != *node_id {
        tracing::debug!(claimed = %node_id, "node ID does not match key");
        return Err(CryptoError::IdentityMismatch);
    }

    verify(key, &cmix_hash(&[marshal_time(signed_time).as_slice()]), signature)
}

fn cert_request_digest(token: &str, time: SystemTime) -> [u8; 32] {
    cmix_hash(&[token.as_bytes(), marshal_time(time).as_slice()])
}

/// Sign an ACME token with the gateway key.
pub fn sign_cert_request(
    rng: &mut impl CryptoRngCore,
    key: &PrivateKey,
    acme_token: &str,
    now: SystemTime,
) -> Result<Vec<u8>> {
    sign(rng, key, &cert_request_digest(acme_token, now))
}

/// Verify an ACME token signature.
pub fn verify_cert_request(
    key: &PublicKey,
    acme_token: &str,
    time: SystemTime,
    signature: &[u8],
) -> Result<()> {
    verify(key, &cert_request_digest(acme_token, time), signature)
}

/// Attest to a gateway TLS certificate.
pub fn sign_gateway_cert(
    rng: &mut impl CryptoRngCore,
    key: &PrivateKey,
    cert_der: &[u8],
) -> Result<Vec<u8>> {
    sign(rng, key, &cmix_hash(&[cert_der]))
}

/// Verify a gateway certificate attestation.
pub fn verify_gateway_cert(key: &PublicKey, cert_der: &[u8], signature: &[u8]) -> Result<()> {
    verify(key, &cmix_hash(&[cert_der]), signature)
}
