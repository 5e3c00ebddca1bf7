//! Self-contained `XChaCha20-Poly1305` blobs.
//!
//! Output layout is `nonce(24) || ciphertext || tag(16)`. The nonce travels
//! with the ciphertext, so [`decrypt`] takes only the blob and the key.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};

use crate::{
    error::{CryptoError, Result},
    rng::{self, CryptoRngCore},
};

/// AEAD key size (32 bytes)
pub const KEY_SIZE: usize = 32;

/// Extended nonce size (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Smallest blob [`decrypt`] will look at: nonce plus tag plus one byte.
pub const MIN_BLOB_SIZE: usize = NONCE_SIZE + TAG_SIZE + 1;

fn cipher(key: &[u8]) -> Result<XChaCha20Poly1305> {
    XChaCha20Poly1305::new_from_slice(key)
        .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: key.len() })
}

/// Encrypt `plaintext` under `key` with the given `nonce` and return
/// `nonce || ciphertext_with_tag`.
///
/// # Errors
///
/// - `InvalidKeyLength` if the key is not 32 bytes
/// - `InvalidNonceLength` if the nonce is not 24 bytes
/// - `MalformedEncoding` if `plaintext` is empty, since [`decrypt`] would
///   reject the resulting blob
pub fn encrypt(plaintext: &[u8], key: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
    if plaintext.is_empty() {
        return Err(CryptoError::malformed("empty AEAD plaintext"));
    }
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual: nonce.len() });
    }
    let cipher = cipher(key)?;

    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(nonce), plaintext) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Encrypt with a fresh random nonce drawn from `rng`.
pub fn seal(rng: &mut impl CryptoRngCore, plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let nonce: [u8; NONCE_SIZE] = rng::random_array(rng)?;
    encrypt(plaintext, key, &nonce)
}

/// Decrypt a blob produced by [`encrypt`] or [`seal`].
///
/// # Errors
///
/// - `InvalidKeyLength` if the key is not 32 bytes
/// - `ShortBlob` if the blob cannot hold a nonce, a tag and one byte
/// - `DecryptionFailed` if the tag does not verify
pub fn decrypt(blob: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher(key)?;
    if blob.len() < MIN_BLOB_SIZE {
        return Err(CryptoError::ShortBlob { min: MIN_BLOB_SIZE, actual: blob.len() });
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    cipher.decrypt(XNonce::from_slice(nonce), ciphertext).map_err(|_| CryptoError::DecryptionFailed)
}
