//! File-transfer key schedule and part encryption.
//!
//! Each transfer has one random [`TransferKey`]. Part `i` is encrypted with
//! Salsa20 under a per-part key and a fresh 8-byte nonce, and authenticated
//! with HMAC over `nonce || plaintext`:
//!
//! ```text
//! part_key(i)    = H(tk || LE16(i) || "FileTransferComponentKey")
//! fingerprint(i) = H(tk || LE16(i) || "FileTransferKeyFingerprint"), top bit clear
//! mac(i)         = HMAC(part_key(i), nonce || plaintext), top bit clear
//! ```
//!
//! Fingerprints let a receiver route parts to the right transfer without
//! knowing the key. Once all parts are in, the reassembled file is checked
//! against a whole-file HMAC under the transfer key.

use crate::{
    error::{CryptoError, Result},
    handle::{Fingerprint, Mac, byte_handle},
    hash::{cmix_hash, ct_eq, hmac_cmix},
    rng::{self, CryptoRngCore},
    stream::{self, NONCE_SIZE},
};

const PART_KEY_SALT: &[u8] = b"FileTransferComponentKey";
const FINGERPRINT_SALT: &[u8] = b"FileTransferKeyFingerprint";

byte_handle! {
    /// Root secret of one transfer.
    secret TransferKey, 32
}

byte_handle! {
    /// Key for a single part, derived from the [`TransferKey`].
    secret PartKey, 32
}

byte_handle! {
    /// Random handle correlating a transfer across calls.
    public TransferId, 32
}

byte_handle! {
    /// Content address of a file: cMix-hash of its bytes.
    public FileId, 32
}

byte_handle! {
    /// HMAC of the whole file under the transfer key.
    public TransferMac, 32
}

impl TransferKey {
    /// Draw a fresh transfer key.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Result<Self> {
        rng::random_array(rng).map(Self::from_bytes)
    }
}

impl TransferId {
    /// Draw a fresh transfer ID.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Result<Self> {
        rng::random_array(rng).map(Self::from_bytes)
    }
}

impl FileId {
    /// ID of `contents`. Equal bytes give equal IDs.
    pub fn of(contents: &[u8]) -> Self {
        Self::from_bytes(cmix_hash(&[contents]))
    }
}

/// Key for part `index`.
pub fn part_key(key: &TransferKey, index: u16) -> PartKey {
    PartKey::from_bytes(cmix_hash(&[key.as_bytes(), &index.to_le_bytes(), PART_KEY_SALT]))
}

/// Routing fingerprint for part `index`.
pub fn fingerprint(key: &TransferKey, index: u16) -> Fingerprint {
    Fingerprint::from_digest(cmix_hash(&[key.as_bytes(), &index.to_le_bytes(), FINGERPRINT_SALT]))
}

/// Fingerprints for parts `0..count`, computed on demand.
pub fn fingerprints(key: &TransferKey, count: u16) -> Fingerprints<'_> {
    Fingerprints { key, next: 0, end: count }
}

/// Iterator returned by [`fingerprints`].
#[derive(Debug, Clone)]
pub struct Fingerprints<'a> {
    key: &'a TransferKey,
    next: u16,
    end: u16,
}

impl Iterator for Fingerprints<'_> {
    type Item = Fingerprint;

    fn next(&mut self) -> Option<Fingerprint> {
        if self.next >= self.end {
            return None;
        }
        let fp = fingerprint(self.key, self.next);
        self.next += 1;
        Some(fp)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::from(self.end.saturating_sub(self.next));
        (left, Some(left))
    }
}

impl ExactSizeIterator for Fingerprints<'_> {}

/// One encrypted part as it leaves the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPart {
    /// Salsa20 ciphertext, same length as the plaintext
    pub ciphertext: Vec<u8>,
    /// Per-part nonce
    pub nonce: [u8; NONCE_SIZE],
    /// HMAC over `nonce || plaintext`
    pub mac: Mac,
}

fn part_mac(key: &PartKey, nonce: &[u8], plaintext: &[u8]) -> Mac {
    Mac::from_digest(hmac_cmix(key.as_bytes(), &[nonce, plaintext]))
}

/// Encrypt part `index` with a fresh nonce.
///
/// # Errors
///
/// - `EntropyExhausted` if the nonce cannot be drawn
pub fn encrypt_part(
    rng: &mut impl CryptoRngCore,
    key: &TransferKey,
    index: u16,
    plaintext: &[u8],
) -> Result<EncryptedPart> {
    let nonce: [u8; NONCE_SIZE] = rng::random_array(rng)?;
    let pk = part_key(key, index);
    let ciphertext = stream::salsa20_xor(pk.as_bytes(), &nonce, plaintext);
    let mac = part_mac(&pk, &nonce, plaintext);
    Ok(EncryptedPart { ciphertext, nonce, mac })
}

/// Decrypt part `index` and check its MAC.
///
/// # Errors
///
/// - `InvalidNonceLength` if `nonce` is not 8 bytes
/// - `MacMismatch` if the recomputed MAC differs from `mac`
pub fn decrypt_part(
    key: &TransferKey,
    index: u16,
    ciphertext: &[u8],
    nonce: &[u8],
    mac: &[u8],
) -> Result<Vec<u8>> {
    let nonce: &[u8; NONCE_SIZE] = nonce.try_into().map_err(|_| {
        CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual: nonce.len() }
    })?;

    let pk = part_key(key, index);
    let plaintext = stream::salsa20_xor(pk.as_bytes(), nonce, ciphertext);
    if !part_mac(&pk, nonce, &plaintext).verify(mac) {
        tracing::debug!(index, "file part MAC mismatch");
        return Err(CryptoError::MacMismatch);
    }
    Ok(plaintext)
}

/// HMAC of the complete file under the transfer key.
pub fn create_transfer_mac(file: &[u8], key: &TransferKey) -> TransferMac {
    TransferMac::from_bytes(hmac_cmix(key.as_bytes(), &[file]))
}

/// Check a whole-file MAC in constant time.
pub fn verify_transfer_mac(file: &[u8], key: &TransferKey, mac: &[u8]) -> bool {
    ct_eq(create_transfer_mac(file, key).as_bytes(), mac)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{error::ErrorKind, rng::testing::CountingRng};

    fn counting_key() -> (CountingRng, TransferKey) {
        let mut rng = CountingRng::default();
        let key = TransferKey::generate(&mut rng).unwrap();
        (rng, key)
    }

    #[test]
    fn fingerprint_known_answers() {
        let (_, key) = counting_key();
        assert_eq!(fingerprint(&key, 0).to_string(), "aVyx0KvczycF6ngzmo9JTzx6cFB1r5m6olVIIPEFNXI=");
        assert_eq!(fingerprint(&key, 1).to_string(), "L4r85ehaiHRypafSLdBIzBuD1JsOC6XWW7oXg7dW7i8=");
    }

    #[test]
    fn part_key_known_answer() {
        let (_, key) = counting_key();
        assert_eq!(
            hex::encode(part_key(&key, 3)),
            "ffe5c93b45754874fd59d0dde0f48b5a5867a1d4623427f6d1a00657f93a931f"
        );
    }

    #[test]
    fn encrypt_part_known_answer() {
        let (mut rng, key) = counting_key();
        let part = encrypt_part(&mut rng, &key, 3, b"hello file part").unwrap();

        assert_eq!(part.nonce, [33, 34, 35, 36, 37, 38, 39, 40]);
        assert_eq!(hex::encode(&part.ciphertext), "ed3cf83a649a1fd66846a5315295ec");
        assert_eq!(part.mac.to_string(), "ZFctf8nHIyTGkn/3Q8IhNy6TX4RtnX2PSnGbOR14RyA=");

        let pt = decrypt_part(&key, 3, &part.ciphertext, &part.nonce, part.mac.as_bytes()).unwrap();
        assert_eq!(pt, b"hello file part");
    }

    #[test]
    fn decrypt_detects_tampering() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let key = TransferKey::generate(&mut rng).unwrap();
        let part = encrypt_part(&mut rng, &key, 0, b"part body").unwrap();

        for i in 0..part.ciphertext.len() {
            let mut ct = part.ciphertext.clone();
            ct[i] ^= 0x01;
            let err = decrypt_part(&key, 0, &ct, &part.nonce, part.mac.as_bytes()).unwrap_err();
            assert_eq!(err, CryptoError::MacMismatch);
        }
        for i in 0..NONCE_SIZE {
            let mut nonce = part.nonce;
            nonce[i] ^= 0x01;
            assert!(decrypt_part(&key, 0, &part.ciphertext, &nonce, part.mac.as_bytes()).is_err());
        }

        let mut mac = *part.mac.as_bytes();
        mac[31] ^= 0x01;
        let err = decrypt_part(&key, 0, &part.ciphertext, &part.nonce, &mac).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);

        assert!(decrypt_part(&key, 1, &part.ciphertext, &part.nonce, part.mac.as_bytes()).is_err());
    }

    #[test]
    fn decrypt_rejects_bad_nonce_length() {
        let (_, key) = counting_key();
        let err = decrypt_part(&key, 0, b"ct", &[0u8; 7], &[0u8; 32]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidNonceLength { expected: 8, actual: 7 });
    }

    #[test]
    fn fingerprints_iterate_lazily_and_exactly() {
        let (_, key) = counting_key();
        let fps = fingerprints(&key, 300);
        assert_eq!(fps.len(), 300);

        let all: Vec<_> = fps.collect();
        assert_eq!(all[0], fingerprint(&key, 0));
        assert_eq!(all[299], fingerprint(&key, 299));
        assert_eq!(all.iter().collect::<HashSet<_>>().len(), 300);
        assert!(all.iter().all(|fp| fp.as_bytes()[0] & 0x80 == 0));

        assert_eq!(fingerprints(&key, 0).count(), 0);
    }

    #[test]
    fn part_keys_are_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let key = TransferKey::generate(&mut rng).unwrap();
        let keys: HashSet<_> = (0..200).map(|i| part_key(&key, i)).collect();
        assert_eq!(keys.len(), 200);
    }

    #[test]
    fn transfer_mac_and_file_id_known_answers() {
        let (_, key) = counting_key();
        let mac = create_transfer_mac(b"the whole file", &key);
        assert_eq!(mac.to_string(), "9KosdpKa2EReQ/9UBE5KT9cE8oDDcNWTC/t6fFSqylc=");
        assert!(verify_transfer_mac(b"the whole file", &key, mac.as_bytes()));
        assert!(!verify_transfer_mac(b"the whole filf", &key, mac.as_bytes()));

        assert_eq!(FileId::of(b"the whole file").to_string(), "ToMJeWGqA4hDInaAiXBsyYWheN3F7uClwgPinTo6eF8=");
        assert_eq!(FileId::of(b"abc"), FileId::of(&b"xabc"[1..]));
    }

    #[test]
    fn drained_rng_fails_cleanly() {
        let (_, key) = counting_key();
        let err = encrypt_part(&mut crate::rng::testing::DrainedRng, &key, 0, b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EntropyExhausted);
    }
}
