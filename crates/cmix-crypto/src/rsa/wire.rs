//! Compact public-key wire form: `BE32(e) || big-endian N`.

use rsa::{BigUint, RsaPublicKey, traits::PublicKeyParts};

use super::{MIN_BITS, map_rsa_err};
use crate::error::{CryptoError, Result};

const EXPONENT_LEN: usize = 4;

/// Shortest accepted wire key: 4-byte exponent plus a 64-bit modulus
pub const MIN_WIRE_LEN: usize = EXPONENT_LEN + MIN_BITS / 8;

pub(super) fn encode(key: &RsaPublicKey) -> Result<Vec<u8>> {
    let e = key.e().to_bytes_be();
    if e.len() > EXPONENT_LEN {
        return Err(CryptoError::InvalidKey {
            reason: format!("public exponent of {} bytes does not fit the wire form", e.len()),
        });
    }

    let n = key.n().to_bytes_be();
    let mut out = vec![0u8; EXPONENT_LEN];
    out[EXPONENT_LEN - e.len()..].copy_from_slice(&e);
    out.extend_from_slice(&n);
    Ok(out)
}

pub(super) fn decode(bytes: &[u8]) -> Result<RsaPublicKey> {
    if bytes.len() < MIN_WIRE_LEN {
        return Err(CryptoError::malformed(format!(
            "RSA wire key: need at least {MIN_WIRE_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let (e, n) = bytes.split_at(EXPONENT_LEN);
    let mut exponent = [0u8; EXPONENT_LEN];
    exponent.copy_from_slice(e);
    let e = BigUint::from(u32::from_be_bytes(exponent));
    let n = BigUint::from_bytes_be(n);
    if n.bits() < MIN_BITS {
        return Err(CryptoError::InvalidKey {
            reason: format!("modulus of {} bits is below {MIN_BITS}", n.bits()),
        });
    }

    RsaPublicKey::new(n, e).map_err(map_rsa_err)
}
