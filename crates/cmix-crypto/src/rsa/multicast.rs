//! Multicast OAEP.
//!
//! OAEP run in reverse: the holder of the private key pads a message with
//! EME-OAEP and raises it to `d`; anyone holding the public key raises the
//! ciphertext to `e` and strips the padding. One publisher, many readers,
//! and readers learn the message came from the key holder.
//!
//! Stock RSA backends do not expose this, so the padding and the raw
//! exponentiation live here. This is the only module that touches the key's
//! big integers directly.

use rsa::{
    BigUint,
    traits::{PrivateKeyParts, PublicKeyParts},
};

use super::{HashAlgorithm, PrivateKey, PublicKey, max_oaep_payload};
use crate::{
    error::{CryptoError, Result},
    hash::ct_eq,
    rng::{self, CryptoRngCore},
};

impl PrivateKey {
    /// Encrypt `msg` with the private exponent.
    ///
    /// # Errors
    ///
    /// - `MessageTooLong` if `msg` exceeds `k - 2*hLen - 2`
    /// - `EntropyExhausted` if the seed cannot be drawn
    pub fn encrypt_oaep_multicast(
        &self,
        hash: HashAlgorithm,
        rng: &mut impl CryptoRngCore,
        msg: &[u8],
        label: &[u8],
    ) -> Result<Vec<u8>> {
        let k = self.size();
        let max = max_oaep_payload(k, hash);
        if k < 2 * hash.size() + 2 || msg.len() > max {
            return Err(CryptoError::MessageTooLong { len: msg.len(), max });
        }

        let em = encode(hash, rng, k, msg, label)?;
        let m = BigUint::from_bytes_be(&em);
        let c = m.modpow(self.inner().d(), self.inner().n());
        Ok(left_pad(&c, k))
    }
}

impl PublicKey {
    /// Decrypt a multicast ciphertext with the public exponent.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` on a wrong-sized or out-of-range ciphertext, a
    ///   label mismatch, or malformed padding
    pub fn decrypt_oaep_multicast(
        &self,
        hash: HashAlgorithm,
        ciphertext: &[u8],
        label: &[u8],
    ) -> Result<Vec<u8>> {
        let k = self.size();
        if ciphertext.len() != k || k < 2 * hash.size() + 2 {
            return Err(CryptoError::DecryptionFailed);
        }

        let c = BigUint::from_bytes_be(ciphertext);
        if &c >= self.n() {
            return Err(CryptoError::DecryptionFailed);
        }
        let m = c.modpow(self.e(), self.n());
        let em = left_pad(&m, k);
        decode(hash, em, label)
    }
}

/// EME-OAEP encoding: `0x00 || maskedSeed || maskedDB`.
fn encode(
    hash: HashAlgorithm,
    rng: &mut impl CryptoRngCore,
    k: usize,
    msg: &[u8],
    label: &[u8],
) -> Result<Vec<u8>> {
    let h_len = hash.size();
    let mut em = vec![0u8; k];
    let (seed, db) = em[1..].split_at_mut(h_len);

    db[..h_len].copy_from_slice(&hash.digest(label));
    let msg_start = db.len() - msg.len();
    db[msg_start - 1] = 0x01;
    db[msg_start..].copy_from_slice(msg);

    rng::fill(rng, seed)?;
    mgf1_xor(hash, db, seed);
    mgf1_xor(hash, seed, db);
    Ok(em)
}

fn decode(hash: HashAlgorithm, mut em: Vec<u8>, label: &[u8]) -> Result<Vec<u8>> {
    let h_len = hash.size();
    let leading_zero = em[0] == 0;
    let (seed, db) = em[1..].split_at_mut(h_len);

    mgf1_xor(hash, seed, db);
    mgf1_xor(hash, db, seed);

    let label_ok = ct_eq(&db[..h_len], &hash.digest(label));

    let rest = &db[h_len..];
    let mut separator = None;
    let mut bad_padding = false;
    for (i, &b) in rest.iter().enumerate() {
        if separator.is_none() {
            match b {
                0x00 => {},
                0x01 => separator = Some(i),
                _ => bad_padding = true,
            }
        }
    }

    match separator {
        Some(i) if leading_zero && label_ok && !bad_padding => Ok(rest[i + 1..].to_vec()),
        _ => Err(CryptoError::DecryptionFailed),
    }
}

/// XOR `out` with MGF1(seed) using `hash`.
fn mgf1_xor(hash: HashAlgorithm, out: &mut [u8], seed: &[u8]) {
    let mut counter = 0u32;
    for chunk in out.chunks_mut(hash.size()) {
        let mut h = hash.hasher();
        h.update(seed);
        h.update(&counter.to_be_bytes());
        let mask = h.finalize();
        for (o, m) in chunk.iter_mut().zip(mask.iter()) {
            *o ^= m;
        }
        counter = counter.wrapping_add(1);
    }
}

fn left_pad(n: &BigUint, k: usize) -> Vec<u8> {
    let bytes = n.to_bytes_be();
    let mut out = vec![0u8; k.saturating_sub(bytes.len())];
    out.extend_from_slice(&bytes);
    out
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        error::ErrorKind,
        rsa::testing::test_key,
    };

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(21)
    }

    #[test]
    fn roundtrip_all_hashes() {
        let key = test_key(20);
        for hash in [HashAlgorithm::Sha256, HashAlgorithm::Sha512, HashAlgorithm::CMix] {
            let ct = key.encrypt_oaep_multicast(hash, &mut rng(), b"broadcast", b"label").unwrap();
            assert_eq!(ct.len(), key.size());
            let pt = key.public().decrypt_oaep_multicast(hash, &ct, b"label").unwrap();
            assert_eq!(pt, b"broadcast");
        }
    }

    #[test]
    fn empty_and_max_payloads() {
        let key = test_key(20);
        let hash = HashAlgorithm::Sha256;
        let max = max_oaep_payload(key.size(), hash);

        for msg in [Vec::new(), vec![0xa5; max]] {
            let ct = key.encrypt_oaep_multicast(hash, &mut rng(), &msg, b"").unwrap();
            assert_eq!(key.public().decrypt_oaep_multicast(hash, &ct, b"").unwrap(), msg);
        }
    }

    #[test]
    #[allow(arithmetic_overflow)]
    fn message_too_long() {
        let key = test_key(20);
        let err = key
            .encrypt_oaep_multicast(HashAlgorithm::Sha512, &mut rng(), &[0u8; 63], b"")
            .unwrap_err();
        assert_eq!(err, CryptoError::MessageTooLong { len: 63, max: 128 - 2 * 64 - 2 });
    }

    #[test]
    fn label_mismatch_fails() {
        let key = test_key(20);
        let ct = key
            .encrypt_oaep_multicast(HashAlgorithm::Sha256, &mut rng(), b"msg", b"one")
            .unwrap();
        let err = key.public().decrypt_oaep_multicast(HashAlgorithm::Sha256, &ct, b"two").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn wrong_public_key_fails() {
        let key = test_key(20);
        let other = test_key(21);
        let ct = key
            .encrypt_oaep_multicast(HashAlgorithm::Sha256, &mut rng(), b"msg", b"")
            .unwrap();
        assert!(other.public().decrypt_oaep_multicast(HashAlgorithm::Sha256, &ct, b"").is_err());
    }

    #[test]
    fn wrong_length_ciphertext_fails() {
        let key = test_key(20);
        let err = key
            .public()
            .decrypt_oaep_multicast(HashAlgorithm::Sha256, &[1u8; 127], b"")
            .unwrap_err();
        assert_eq!(err, CryptoError::DecryptionFailed);
    }

    #[test]
    fn fresh_seed_per_encryption() {
        let key = test_key(20);
        let mut rng = rng();
        let a = key.encrypt_oaep_multicast(HashAlgorithm::Sha256, &mut rng, b"msg", b"").unwrap();
        let b = key.encrypt_oaep_multicast(HashAlgorithm::Sha256, &mut rng, b"msg", b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn mgf1_matches_reference_prefix() {
        // MGF1-SHA-256("", 32) = SHA-256(0x00000000)
        let mut out = [0u8; 32];
        mgf1_xor(HashAlgorithm::Sha256, &mut out, b"");
        assert_eq!(out.to_vec(), HashAlgorithm::Sha256.digest(&[0, 0, 0, 0]));
    }
}
