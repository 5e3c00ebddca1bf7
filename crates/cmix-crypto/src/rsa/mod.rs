//! RSA facade.
//!
//! Typed handles over the RustCrypto `rsa` crate. A [`Scheme`] hands out
//! [`PrivateKey`]s and [`PublicKey`]s that expose PSS and PKCS#1 v1.5
//! signatures, OAEP and PKCS#1 v1.5 encryption, the multicast OAEP variant
//! (see [`multicast`]), PEM encoding and the compact wire form
//! `BE32(e) || N`.
//!
//! # Key sizes
//!
//! Generation below [`SOFT_MIN_BITS`] logs a warning but proceeds; callers
//! own the policy. Decoding refuses moduli shorter than 64 bits.

pub mod multicast;
mod pem;
mod wire;

use std::fmt;

use rsa::{
    Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey,
    traits::PublicKeyParts,
};
use sha2::{Digest, Sha256, Sha512, digest::DynDigest};
use subtle::ConditionallySelectable;

use crate::{
    error::{CryptoError, Result},
    hash::CMixHash,
    rng::CryptoRngCore,
};

pub use rsa::BigUint;
pub use wire::MIN_WIRE_LEN;

/// Default modulus size for [`Scheme::generate_default`]
pub const DEFAULT_BITS: usize = 4096;

/// Smallest modulus generated without a warning
pub const SOFT_MIN_BITS: usize = 2816;

/// Smallest modulus accepted when decoding
pub const MIN_BITS: usize = 64;

/// Hash functions usable with the RSA padding schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
    /// cMix hash (BLAKE2b-256)
    CMix,
}

impl HashAlgorithm {
    /// Digest size in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Sha256 | Self::CMix => 32,
            Self::Sha512 => 64,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
            Self::CMix => "BLAKE2b-256",
        }
    }

    /// Hash `data` in one shot.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let mut h = self.hasher();
        h.update(data);
        h.finalize().into_vec()
    }

    pub(crate) fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            Self::Sha256 => Box::new(Sha256::new()),
            Self::Sha512 => Box::new(Sha512::new()),
            Self::CMix => Box::new(CMixHash::new()),
        }
    }

    fn pss(self, opts: Option<&PssOptions>) -> Pss {
        match (self, opts.and_then(|o| o.salt_len)) {
            (Self::Sha256, None) => Pss::new::<Sha256>(),
            (Self::Sha512, None) => Pss::new::<Sha512>(),
            (Self::CMix, None) => Pss::new::<CMixHash>(),
            (Self::Sha256, Some(len)) => Pss::new_with_salt::<Sha256>(len),
            (Self::Sha512, Some(len)) => Pss::new_with_salt::<Sha512>(len),
            (Self::CMix, Some(len)) => Pss::new_with_salt::<CMixHash>(len),
        }
    }

    fn oaep(self, label: &[u8]) -> Result<Oaep> {
        if label.is_empty() {
            return Ok(match self {
                Self::Sha256 => Oaep::new::<Sha256>(),
                Self::Sha512 => Oaep::new::<Sha512>(),
                Self::CMix => Oaep::new::<CMixHash>(),
            });
        }

        let label = std::str::from_utf8(label)
            .map_err(|_| CryptoError::malformed("OAEP label must be UTF-8"))?;
        Ok(match self {
            Self::Sha256 => Oaep::new_with_label::<Sha256, _>(label),
            Self::Sha512 => Oaep::new_with_label::<Sha512, _>(label),
            Self::CMix => Oaep::new_with_label::<CMixHash, _>(label),
        })
    }

    fn pkcs1v15(self) -> Result<Pkcs1v15Sign> {
        match self {
            Self::Sha256 => Ok(Pkcs1v15Sign::new::<Sha256>()),
            Self::Sha512 => Ok(Pkcs1v15Sign::new::<Sha512>()),
            Self::CMix => {
                Err(CryptoError::UnsupportedHash { hash: self.name(), scheme: "PKCS#1 v1.5" })
            },
        }
    }
}

/// PSS signing/verification options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PssOptions {
    /// Salt length; `None` uses the digest size
    pub salt_len: Option<usize>,
}

/// Largest OAEP payload for a `key_size`-byte modulus: `k - 2*hLen - 2`.
pub const fn max_oaep_payload(key_size: usize, hash: HashAlgorithm) -> usize {
    key_size.saturating_sub(2 * hash.size() + 2)
}

fn map_rsa_err(err: rsa::Error) -> CryptoError {
    match err {
        rsa::Error::Verification => CryptoError::InvalidSignature,
        rsa::Error::Decryption => CryptoError::DecryptionFailed,
        other => CryptoError::InvalidKey { reason: other.to_string() },
    }
}

/// Factory for RSA keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheme {
    /// Modulus size used by [`Scheme::generate_default`]
    pub default_bits: usize,
    /// Modulus size below which generation logs a warning
    pub soft_min_bits: usize,
}

impl Default for Scheme {
    fn default() -> Self {
        Self { default_bits: DEFAULT_BITS, soft_min_bits: SOFT_MIN_BITS }
    }
}

impl Scheme {
    /// Generate a key with a `bits`-bit modulus.
    ///
    /// Sizes below the soft minimum are generated anyway with a warning.
    pub fn generate(&self, rng: &mut impl CryptoRngCore, bits: usize) -> Result<PrivateKey> {
        if bits < self.soft_min_bits {
            tracing::warn!(bits, soft_min = self.soft_min_bits, "generating undersized RSA key");
        }
        let inner = RsaPrivateKey::new(rng, bits).map_err(map_rsa_err)?;
        tracing::debug!(bits, "generated RSA key");
        Ok(PrivateKey(inner))
    }

    /// Generate a key with the scheme's default size.
    pub fn generate_default(&self, rng: &mut impl CryptoRngCore) -> Result<PrivateKey> {
        self.generate(rng, self.default_bits)
    }

    /// Decode a PKCS#1 or PKCS#8 PEM private key.
    pub fn unmarshal_private_key_pem(&self, pem: &str) -> Result<PrivateKey> {
        pem::decode_private(pem).map(PrivateKey)
    }

    /// Decode a PKCS#1 (or SPKI) PEM public key.
    pub fn unmarshal_public_key_pem(&self, pem: &str) -> Result<PublicKey> {
        pem::decode_public(pem).map(PublicKey)
    }

    /// Decode the `BE32(e) || N` wire form.
    pub fn unmarshal_public_key_wire(&self, bytes: &[u8]) -> Result<PublicKey> {
        wire::decode(bytes).map(PublicKey)
    }

    /// Build a public key from its modulus and exponent.
    pub fn public_key_from_parts(&self, n: BigUint, e: BigUint) -> Result<PublicKey> {
        if n.bits() < MIN_BITS {
            return Err(CryptoError::InvalidKey {
                reason: format!("modulus of {} bits is below {MIN_BITS}", n.bits()),
            });
        }
        RsaPublicKey::new(n, e).map(PublicKey).map_err(map_rsa_err)
    }
}

/// RSA private key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(RsaPrivateKey);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").field("bits", &self.bits()).finish_non_exhaustive()
    }
}

impl PrivateKey {
    /// Matching public key.
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// Modulus size in bytes.
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }

    pub(crate) fn inner(&self) -> &RsaPrivateKey {
        &self.0
    }

    /// RSA-PSS signature over a precomputed `digest`.
    pub fn sign_pss(
        &self,
        rng: &mut impl CryptoRngCore,
        hash: HashAlgorithm,
        digest: &[u8],
        opts: Option<&PssOptions>,
    ) -> Result<Vec<u8>> {
        check_digest_len(hash, digest)?;
        self.0.sign_with_rng(rng, hash.pss(opts), digest).map_err(map_rsa_err)
    }

    /// PKCS#1 v1.5 signature over a precomputed `digest`.
    pub fn sign_pkcs1v15(
        &self,
        rng: &mut impl CryptoRngCore,
        hash: HashAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>> {
        let padding = hash.pkcs1v15()?;
        check_digest_len(hash, digest)?;
        self.0.sign_with_rng(rng, padding, digest).map_err(map_rsa_err)
    }

    /// OAEP decryption (blinded).
    pub fn decrypt_oaep(
        &self,
        hash: HashAlgorithm,
        rng: &mut impl CryptoRngCore,
        ciphertext: &[u8],
        label: &[u8],
    ) -> Result<Vec<u8>> {
        let padding = hash.oaep(label)?;
        self.0.decrypt_blinded(rng, padding, ciphertext).map_err(|_| CryptoError::DecryptionFailed)
    }

    /// PKCS#1 v1.5 decryption (blinded).
    pub fn decrypt_pkcs1v15(
        &self,
        rng: &mut impl CryptoRngCore,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.0
            .decrypt_blinded(rng, Pkcs1v15Encrypt, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// PKCS#1 v1.5 session-key decryption.
    ///
    /// Writes the decrypted key into `key` only if decryption succeeds and
    /// the plaintext has exactly `key.len()` bytes. Otherwise `key` keeps its
    /// (random) contents, and no padding error is reported, so an attacker
    /// cannot tell the two outcomes apart.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if `key` cannot fit in the padded message
    pub fn decrypt_pkcs1v15_session_key(
        &self,
        rng: &mut impl CryptoRngCore,
        ciphertext: &[u8],
        key: &mut [u8],
    ) -> Result<()> {
        let k = self.size();
        if k < key.len() + 11 {
            return Err(CryptoError::InvalidKey {
                reason: format!("session key of {} bytes does not fit modulus", key.len()),
            });
        }

        let decrypted = self.0.decrypt_blinded(rng, Pkcs1v15Encrypt, ciphertext).ok();
        let candidate = decrypted.filter(|pt| pt.len() == key.len());
        let accept = subtle::Choice::from(u8::from(candidate.is_some()));
        let candidate = candidate.unwrap_or_else(|| key.to_vec());
        for (dst, src) in key.iter_mut().zip(candidate.iter()) {
            dst.conditional_assign(src, accept);
        }
        Ok(())
    }

    /// PKCS#1 PEM encoding (`RSA PRIVATE KEY`).
    pub fn marshal_pem(&self) -> Result<String> {
        pem::encode_private_pkcs1(&self.0)
    }

    /// PKCS#8 PEM encoding (`PRIVATE KEY`).
    pub fn marshal_pkcs8_pem(&self) -> Result<String> {
        pem::encode_private_pkcs8(&self.0)
    }
}

/// RSA public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Modulus size in bytes.
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }

    /// Modulus.
    pub fn n(&self) -> &BigUint {
        self.0.n()
    }

    /// Public exponent.
    pub fn e(&self) -> &BigUint {
        self.0.e()
    }

    /// Verify an RSA-PSS signature over `digest`.
    pub fn verify_pss(
        &self,
        hash: HashAlgorithm,
        digest: &[u8],
        signature: &[u8],
        opts: Option<&PssOptions>,
    ) -> Result<()> {
        check_digest_len(hash, digest)?;
        self.0
            .verify(hash.pss(opts), digest, signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Verify a PKCS#1 v1.5 signature over `digest`.
    pub fn verify_pkcs1v15(&self, hash: HashAlgorithm, digest: &[u8], signature: &[u8]) -> Result<()> {
        let padding = hash.pkcs1v15()?;
        check_digest_len(hash, digest)?;
        self.0.verify(padding, digest, signature).map_err(|_| CryptoError::InvalidSignature)
    }

    /// OAEP encryption.
    ///
    /// # Errors
    ///
    /// - `MessageTooLong` if the payload exceeds `k - 2*hLen - 2`
    pub fn encrypt_oaep(
        &self,
        hash: HashAlgorithm,
        rng: &mut impl CryptoRngCore,
        msg: &[u8],
        label: &[u8],
    ) -> Result<Vec<u8>> {
        let max = max_oaep_payload(self.size(), hash);
        if msg.len() > max {
            return Err(CryptoError::MessageTooLong { len: msg.len(), max });
        }
        self.0.encrypt(rng, hash.oaep(label)?, msg).map_err(map_rsa_err)
    }

    /// PKCS#1 v1.5 encryption.
    pub fn encrypt_pkcs1v15(&self, rng: &mut impl CryptoRngCore, msg: &[u8]) -> Result<Vec<u8>> {
        let max = self.size().saturating_sub(11);
        if msg.len() > max {
            return Err(CryptoError::MessageTooLong { len: msg.len(), max });
        }
        self.0.encrypt(rng, Pkcs1v15Encrypt, msg).map_err(map_rsa_err)
    }

    /// PKCS#1 PEM encoding (`RSA PUBLIC KEY`).
    pub fn marshal_pem(&self) -> Result<String> {
        pem::encode_public_pkcs1(&self.0)
    }

    /// Wire form `BE32(e) || N`.
    pub fn marshal_wire(&self) -> Result<Vec<u8>> {
        wire::encode(&self.0)
    }
}

fn check_digest_len(hash: HashAlgorithm, digest: &[u8]) -> Result<()> {
    if digest.len() == hash.size() {
        Ok(())
    } else {
        Err(CryptoError::malformed(format!(
            "{} digest must be {} bytes, got {}",
            hash.name(),
            hash.size(),
            digest.len()
        )))
    }
}

impl serde::Serialize for PrivateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let pem = self.marshal_pem().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&pem)
    }
}

impl<'de> serde::Deserialize<'de> for PrivateKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pem = <String as serde::Deserialize>::deserialize(deserializer)?;
        Scheme::default().unmarshal_private_key_pem(&pem).map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let pem = self.marshal_pem().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&pem)
    }
}

impl<'de> serde::Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pem = <String as serde::Deserialize>::deserialize(deserializer)?;
        Scheme::default().unmarshal_public_key_pem(&pem).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{PrivateKey, Scheme};

    /// Deterministic 1024-bit key for tests.
    pub fn test_key(seed: u64) -> PrivateKey {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Scheme::default().generate(&mut rng, 1024).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rsa::traits::PrivateKeyParts;

    use super::{testing::test_key, *};
    use crate::error::ErrorKind;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn generated_key_has_requested_size() {
        let key = test_key(1);
        assert_eq!(key.bits(), 1024);
        assert_eq!(key.size(), 128);
        assert_eq!(key.public().size(), 128);
    }

    #[test]
    fn pss_sign_verify_all_hashes() {
        let key = test_key(1);
        for hash in [HashAlgorithm::Sha256, HashAlgorithm::Sha512, HashAlgorithm::CMix] {
            let digest = hash.digest(b"payload");
            let sig = key.sign_pss(&mut rng(), hash, &digest, None).unwrap();
            assert_eq!(sig.len(), 128);
            key.public().verify_pss(hash, &digest, &sig, None).unwrap();

            let other = hash.digest(b"other payload");
            let err = key.public().verify_pss(hash, &other, &sig, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        }
    }

    #[test]
    fn pss_explicit_salt_length() {
        let key = test_key(1);
        let opts = PssOptions { salt_len: Some(20) };
        let digest = HashAlgorithm::Sha256.digest(b"payload");
        let sig = key.sign_pss(&mut rng(), HashAlgorithm::Sha256, &digest, Some(&opts)).unwrap();
        key.public().verify_pss(HashAlgorithm::Sha256, &digest, &sig, Some(&opts)).unwrap();
    }

    #[test]
    fn pss_rejects_wrong_digest_length() {
        let key = test_key(1);
        let err = key.sign_pss(&mut rng(), HashAlgorithm::Sha256, &[0u8; 20], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding);
    }

    #[test]
    fn pkcs1v15_sign_verify() {
        let key = test_key(2);
        let digest = HashAlgorithm::Sha256.digest(b"payload");
        let sig = key.sign_pkcs1v15(&mut rng(), HashAlgorithm::Sha256, &digest).unwrap();
        key.public().verify_pkcs1v15(HashAlgorithm::Sha256, &digest, &sig).unwrap();

        let mut bad = sig.clone();
        bad[10] ^= 1;
        let err = key.public().verify_pkcs1v15(HashAlgorithm::Sha256, &digest, &bad).unwrap_err();
        assert_eq!(err, CryptoError::InvalidSignature);
    }

    #[test]
    fn pkcs1v15_signature_is_deterministic() {
        let key = test_key(2);
        let digest = HashAlgorithm::Sha512.digest(b"payload");
        let a = key.sign_pkcs1v15(&mut rng(), HashAlgorithm::Sha512, &digest).unwrap();
        let b = key.sign_pkcs1v15(&mut ChaCha8Rng::seed_from_u64(99), HashAlgorithm::Sha512, &digest).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn pkcs1v15_cmix_hash_is_unsupported() {
        let key = test_key(2);
        let digest = HashAlgorithm::CMix.digest(b"payload");
        let err = key.sign_pkcs1v15(&mut rng(), HashAlgorithm::CMix, &digest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedHash);
    }

    #[test]
    fn oaep_roundtrip_with_label() {
        let key = test_key(3);
        let ct = key.public().encrypt_oaep(HashAlgorithm::Sha256, &mut rng(), b"secret", b"label").unwrap();
        let pt = key.decrypt_oaep(HashAlgorithm::Sha256, &mut rng(), &ct, b"label").unwrap();
        assert_eq!(pt, b"secret");

        let err = key.decrypt_oaep(HashAlgorithm::Sha256, &mut rng(), &ct, b"other").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn oaep_rejects_long_messages() {
        let key = test_key(3);
        let max = max_oaep_payload(128, HashAlgorithm::Sha256);
        assert_eq!(max, 62);

        let ok = vec![1u8; max];
        key.public().encrypt_oaep(HashAlgorithm::Sha256, &mut rng(), &ok, b"").unwrap();

        let too_long = vec![1u8; max + 1];
        let err = key.public().encrypt_oaep(HashAlgorithm::Sha256, &mut rng(), &too_long, b"").unwrap_err();
        assert_eq!(err, CryptoError::MessageTooLong { len: 63, max: 62 });
    }

    #[test]
    fn pkcs1v15_encrypt_roundtrip() {
        let key = test_key(4);
        let ct = key.public().encrypt_pkcs1v15(&mut rng(), b"hello").unwrap();
        assert_eq!(key.decrypt_pkcs1v15(&mut rng(), &ct).unwrap(), b"hello");
    }

    #[test]
    fn session_key_written_on_success() {
        let key = test_key(4);
        let session = [0xabu8; 16];
        let ct = key.public().encrypt_pkcs1v15(&mut rng(), &session).unwrap();

        let mut out = [0u8; 16];
        key.decrypt_pkcs1v15_session_key(&mut rng(), &ct, &mut out).unwrap();
        assert_eq!(out, session);
    }

    #[test]
    fn session_key_untouched_on_failure() {
        let key = test_key(4);
        let ct = key.public().encrypt_pkcs1v15(&mut rng(), &[0xabu8; 8]).unwrap();

        let mut out = [0x11u8; 16];
        key.decrypt_pkcs1v15_session_key(&mut rng(), &ct, &mut out).unwrap();
        assert_eq!(out, [0x11u8; 16], "length mismatch must leave key unchanged");

        let mut garbage = ct.clone();
        garbage[0] ^= 0xff;
        key.decrypt_pkcs1v15_session_key(&mut rng(), &garbage, &mut out).unwrap();
        assert_eq!(out, [0x11u8; 16], "bad padding must leave key unchanged");
    }

    #[test]
    fn debug_does_not_print_private_material() {
        let key = test_key(5);
        let printed = format!("{key:?}");
        assert!(printed.contains("1024"));
        assert!(!printed.contains(&key.inner().d().to_string()));
    }

    #[test]
    fn serde_roundtrip_via_pem() {
        let key = test_key(5);
        let json = serde_json::to_string(&key).unwrap();
        assert!(json.contains("RSA PRIVATE KEY"));
        let back: PrivateKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        let json = serde_json::to_string(&key.public()).unwrap();
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key.public());
    }

    #[test]
    fn public_key_from_parts_rejects_tiny_modulus() {
        let err = Scheme::default()
            .public_key_from_parts(BigUint::from(0xffffu32), BigUint::from(65537u32))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
    }
}
