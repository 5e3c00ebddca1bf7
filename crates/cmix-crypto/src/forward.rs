//! Legacy forward-key chain.
//!
//! `expand_key` stretches a key to 256 bytes with one round of
//! PBKDF2-HMAC-SHA-512. `update_key` first ratchets the base key through
//! BLAKE2b-256 and SHA-256. Both are kept for compatibility with stored keys.
//!
//! # Short inputs
//!
//! The two functions reject short inputs at different points, and callers
//! rely on the difference:
//!
//! - `expand_key` checks the key first (`KeyTooShort`), then the salt
//!   (`SaltTooShort`).
//! - `update_key` checks only the base key up front (`KeyTooShort`). The
//!   ratcheted key is always 32 bytes, so a short salt surfaces from the inner
//!   `expand_key` as `SaltTooShort`, after the hashing has run.

use blake2::Digest;
use sha2::{Sha256, Sha512};

use crate::{
    error::{CryptoError, Result},
    hash::CMixHash,
};

/// Minimum key and salt length (32 bytes)
pub const MIN_INPUT_LEN: usize = 32;

/// Output length of the chain (256 bytes)
pub const EXPANDED_KEY_LEN: usize = 256;

/// PBKDF2 iteration count
const ITERATIONS: u32 = 1;

/// Stretch `key` to 256 bytes with PBKDF2-HMAC-SHA-512 over `salt`.
pub fn expand_key(key: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    if key.len() < MIN_INPUT_LEN {
        return Err(CryptoError::KeyTooShort { min: MIN_INPUT_LEN, actual: key.len() });
    }
    if salt.len() < MIN_INPUT_LEN {
        return Err(CryptoError::SaltTooShort { min: MIN_INPUT_LEN, actual: salt.len() });
    }

    let mut out = vec![0u8; EXPANDED_KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(key, salt, ITERATIONS, &mut out);
    Ok(out)
}

/// Ratchet `base_key` with `salt`: SHA-256(BLAKE2b-256(base || salt)), then
/// [`expand_key`].
pub fn update_key(base_key: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    if base_key.len() < MIN_INPUT_LEN {
        return Err(CryptoError::KeyTooShort { min: MIN_INPUT_LEN, actual: base_key.len() });
    }

    let mut blake = CMixHash::new();
    blake.update(base_key);
    blake.update(salt);
    let ratcheted = Sha256::digest(blake.finalize());

    expand_key(&ratcheted, salt)
}

/// Forward-key generator.
///
/// Whether keys are ratcheted is fixed per generator. Callers that need the
/// non-ratcheting behavior build a dedicated generator instead of flipping
/// shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardKeyGenerator {
    ratchet: bool,
}

impl ForwardKeyGenerator {
    /// Generator with ratcheting on or off.
    pub const fn new(ratchet: bool) -> Self {
        Self { ratchet }
    }

    /// Whether this generator ratchets keys.
    pub const fn ratchet_enabled(&self) -> bool {
        self.ratchet
    }

    /// Next 256-byte key for `base_key` and `salt`.
    pub fn next_key(&self, base_key: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
        if self.ratchet { update_key(base_key, salt) } else { expand_key(base_key, salt) }
    }
}

impl Default for ForwardKeyGenerator {
    fn default() -> Self {
        Self::new(true)
    }
}
