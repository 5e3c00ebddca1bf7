//! Password-based key derivation with Argon2id.
//!
//! Derivation is deliberately expensive, so it is kept apart from the
//! encrypt/decrypt calls that use its output. Callers derive once and cache
//! the key across save/load cycles.

use argon2::{Algorithm, Argon2, Version};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CryptoError, Result},
    rng::{self, CryptoRngCore},
};

/// Salt length for password-derived keys (16 bytes)
pub const SALT_LEN: usize = 16;

/// Output length of [`derive_key`] (32 bytes, one AEAD key)
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters.
///
/// Marshals as `LE32(time) || LE32(memory_kib) || u8(threads)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Params {
    /// Number of passes over memory
    pub time: u32,
    /// Memory cost in KiB
    pub memory: u32,
    /// Degree of parallelism
    pub threads: u8,
}

impl Params {
    /// Size of the marshalled form (9 bytes)
    pub const SIZE: usize = 9;

    /// Recommended parameters: one pass, 64 MiB, four lanes.
    pub const RECOMMENDED: Self = Self { time: 1, memory: 64 * 1024, threads: 4 };

    /// Serialize to the 9-byte wire form.
    pub fn marshal(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.time.to_le_bytes());
        out[4..8].copy_from_slice(&self.memory.to_le_bytes());
        out[8] = self.threads;
        out
    }

    /// Parse the 9-byte wire form.
    pub fn unmarshal(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; Self::SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::malformed(format!(
                "argon2 params: expected {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            ))
        })?;

        let mut time = [0u8; 4];
        time.copy_from_slice(&bytes[0..4]);
        let mut memory = [0u8; 4];
        memory.copy_from_slice(&bytes[4..8]);

        Ok(Self {
            time: u32::from_le_bytes(time),
            memory: u32::from_le_bytes(memory),
            threads: bytes[8],
        })
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::RECOMMENDED
    }
}

/// Derive a 32-byte key from `password` with Argon2id.
///
/// Deterministic in `(password, salt, params)`; changing any input changes
/// the key.
///
/// # Errors
///
/// - `SaltTooShort` if the salt is not 16 bytes
/// - `MalformedEncoding` if the parameters are outside Argon2's limits
pub fn derive_key(password: &[u8], salt: &[u8], params: &Params) -> Result<[u8; KEY_LEN]> {
    if salt.len() != SALT_LEN {
        return Err(CryptoError::SaltTooShort { min: SALT_LEN, actual: salt.len() });
    }

    let argon_params = argon2::Params::new(
        params.memory,
        params.time,
        u32::from(params.threads),
        Some(KEY_LEN),
    )
    .map_err(|e| CryptoError::malformed(format!("argon2 params: {e}")))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key = [0u8; KEY_LEN];
    argon
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| CryptoError::malformed(format!("argon2: {e}")))?;

    tracing::debug!(
        time = params.time,
        memory_kib = params.memory,
        threads = params.threads,
        "derived password key"
    );
    Ok(key)
}

/// Draw a fresh 16-byte salt.
///
/// # Errors
///
/// - `EntropyExhausted` if the source cannot supply 16 bytes
pub fn make_salt(rng: &mut impl CryptoRngCore) -> Result<[u8; SALT_LEN]> {
    rng::random_array(rng)
}
