//! Single-use request/response keying.
//!
//! A sender builds an ephemeral DH key pair, derives a shared key `K` with
//! the recipient's static key, and sends its public key `P` alongside the
//! request. Everything the two sides need is derived from `P`, `K` and a
//! message counter `n`:
//!
//! ```text
//! transmit:  fp  = H(P || "singleUseTransmitFingerprintSalt")
//!            key = H(K || "singleUseTransmitKeySalt")
//! request:   fp  = H(K || BE64(n) || "singleUseRequestFingerprintSalt")
//!            key = H(K || BE64(n) || "singleUseRequestKeySalt")
//! response:  fp  = H(P || BE64(n) || "responseFPConstant")
//!            key = H(P || BE64(n) || "responseKeyConstant")
//! MAC:       HMAC(key, ciphertext || "singleUseMacSalt")
//! ```
//!
//! Fingerprints and MACs have the top bit of byte 0 cleared.

use crate::{
    cyclic::Element,
    handle::{Fingerprint, Mac, byte_handle},
    hash::{cmix_hash, hmac_cmix},
    id::{Id, IdType},
};

const TRANSMIT_FP_SALT: &[u8] = b"singleUseTransmitFingerprintSalt";
const TRANSMIT_KEY_SALT: &[u8] = b"singleUseTransmitKeySalt";
const REQUEST_PART_FP_SALT: &[u8] = b"singleUseRequestFingerprintSalt";
const REQUEST_PART_KEY_SALT: &[u8] = b"singleUseRequestKeySalt";
const RESPONSE_FP_SALT: &[u8] = b"responseFPConstant";
const RESPONSE_KEY_SALT: &[u8] = b"responseKeyConstant";
const MAC_SALT: &[u8] = b"singleUseMacSalt";
const TAG_FP_SALT: &[u8] = b"singleUseTagFingerprintSalt";

/// Length of a [`TagFp`]
pub const TAG_FP_LEN: usize = 16;

byte_handle! {
    /// 32-byte symmetric key for one single-use message.
    secret Key, 32
}

byte_handle! {
    /// 16-byte tag used to route responses to the right module.
    public TagFp, TAG_FP_LEN
}

/// Fingerprint of the initial transmission.
pub fn transmit_fingerprint(dh_public: &Element) -> Fingerprint {
    Fingerprint::from_digest(cmix_hash(&[&dh_public.bytes(), TRANSMIT_FP_SALT]))
}

/// Key of the initial transmission.
pub fn transmit_key(dh_shared: &Element) -> Key {
    Key::from_bytes(cmix_hash(&[&dh_shared.bytes(), TRANSMIT_KEY_SALT]))
}

/// Fingerprint of a request. Same derivation as [`transmit_fingerprint`].
pub fn request_fingerprint(dh_public: &Element) -> Fingerprint {
    transmit_fingerprint(dh_public)
}

/// Key of a request. Same derivation as [`transmit_key`].
pub fn request_key(dh_shared: &Element) -> Key {
    transmit_key(dh_shared)
}

/// Fingerprint of request part `n`.
pub fn request_part_fingerprint(dh_shared: &Element, n: u64) -> Fingerprint {
    Fingerprint::from_digest(cmix_hash(&[
        &dh_shared.bytes(),
        &n.to_be_bytes(),
        REQUEST_PART_FP_SALT,
    ]))
}

/// Key of request part `n`.
pub fn request_part_key(dh_shared: &Element, n: u64) -> Key {
    Key::from_bytes(cmix_hash(&[&dh_shared.bytes(), &n.to_be_bytes(), REQUEST_PART_KEY_SALT]))
}

/// Fingerprint of response part `n`.
pub fn response_fingerprint(dh_public: &Element, n: u64) -> Fingerprint {
    Fingerprint::from_digest(cmix_hash(&[&dh_public.bytes(), &n.to_be_bytes(), RESPONSE_FP_SALT]))
}

/// Key of response part `n`.
pub fn response_key(dh_public: &Element, n: u64) -> Key {
    Key::from_bytes(cmix_hash(&[&dh_public.bytes(), &n.to_be_bytes(), RESPONSE_KEY_SALT]))
}

/// Fingerprints of response parts `0..count`.
pub fn response_fingerprints(dh_public: &Element, count: u64) -> impl Iterator<Item = Fingerprint> + '_ {
    (0..count).map(move |n| response_fingerprint(dh_public, n))
}

/// Keys of response parts `0..count`.
pub fn response_keys(dh_public: &Element, count: u64) -> impl Iterator<Item = Key> + '_ {
    (0..count).map(move |n| response_key(dh_public, n))
}

/// MAC over `ciphertext` with `key`.
pub fn make_mac(key: &[u8], ciphertext: &[u8]) -> Mac {
    Mac::from_digest(hmac_cmix(key, &[ciphertext, MAC_SALT]))
}

/// Recompute the MAC and compare in constant time.
pub fn verify_mac(key: &[u8], ciphertext: &[u8], received: &[u8]) -> bool {
    make_mac(key, ciphertext).verify(received)
}

/// Recipient ID bound to the sender's ephemeral key and the unencrypted
/// payload.
pub fn recipient_id(dh_public: &Element, unencrypted_payload: &[u8]) -> Id {
    Id::new(cmix_hash(&[&dh_public.bytes(), unencrypted_payload]), IdType::User)
}

impl TagFp {
    /// Tag fingerprint of `tag`.
    pub fn new(tag: &str) -> Self {
        let digest = cmix_hash(&[tag.as_bytes(), TAG_FP_SALT]);
        let mut out = [0u8; TAG_FP_LEN];
        out.copy_from_slice(&digest[..TAG_FP_LEN]);
        Self::from_bytes(out)
    }
}
