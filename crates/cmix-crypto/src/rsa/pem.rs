//! PEM encodings for RSA keys.
//!
//! Private keys decode from PKCS#1 (`RSA PRIVATE KEY`) or PKCS#8
//! (`PRIVATE KEY`). Public keys decode from PKCS#1 (`RSA PUBLIC KEY`) with an
//! SPKI (`PUBLIC KEY`) fallback. Encoding always writes PKCS#1 unless the
//! caller asks for PKCS#8.

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, LineEnding},
    traits::PublicKeyParts,
};

use super::MIN_BITS;
use crate::error::{CryptoError, Result};

pub(super) fn decode_private(pem: &str) -> Result<RsaPrivateKey> {
    let key = RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| CryptoError::malformed(format!("RSA private key PEM: {e}")))?;
    check_bits(key.n().bits())?;
    tracing::debug!(bits = key.n().bits(), "decoded RSA private key");
    Ok(key)
}

pub(super) fn decode_public(pem: &str) -> Result<RsaPublicKey> {
    let key = RsaPublicKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPublicKey::from_public_key_pem(pem))
        .map_err(|e| CryptoError::malformed(format!("RSA public key PEM: {e}")))?;
    check_bits(key.n().bits())?;
    Ok(key)
}

pub(super) fn encode_private_pkcs1(key: &RsaPrivateKey) -> Result<String> {
    let pem = key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| CryptoError::InvalidKey { reason: format!("PKCS#1 encode: {e}") })?;
    Ok(pem.as_str().to_owned())
}

pub(super) fn encode_private_pkcs8(key: &RsaPrivateKey) -> Result<String> {
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::InvalidKey { reason: format!("PKCS#8 encode: {e}") })?;
    Ok(pem.as_str().to_owned())
}

pub(super) fn encode_public_pkcs1(key: &RsaPublicKey) -> Result<String> {
    key.to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| CryptoError::InvalidKey { reason: format!("PKCS#1 encode: {e}") })
}

fn check_bits(bits: usize) -> Result<()> {
    if bits < MIN_BITS {
        return Err(CryptoError::InvalidKey {
            reason: format!("modulus of {bits} bits is below {MIN_BITS}"),
        });
    }
    Ok(())
}
