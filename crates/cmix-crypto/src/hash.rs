//! cMix hash (unkeyed BLAKE2b-256), HMAC over it, and constant-time equality.

use blake2::{Blake2b, Digest, digest::consts::U32};
use hmac::{Mac, SimpleHmac};
use subtle::ConstantTimeEq;

/// Output size of the cMix hash.
pub const CMIX_HASH_SIZE: usize = 32;

/// BLAKE2b with a 256-bit output, the project's default digest.
pub type CMixHash = Blake2b<U32>;

/// HMAC keyed over [`CMixHash`]. BLAKE2b needs the "simple" HMAC variant
/// because its core buffers lazily.
pub type HmacCMix = SimpleHmac<CMixHash>;

/// Fresh incremental cMix hasher.
pub fn new_cmix_hash() -> CMixHash {
    CMixHash::new()
}

/// Hash the concatenation of `parts`.
pub fn cmix_hash(parts: &[&[u8]]) -> [u8; CMIX_HASH_SIZE] {
    let mut h = CMixHash::new();
    for part in parts {
        h.update(part);
    }
    let digest = h.finalize();

    let mut out = [0u8; CMIX_HASH_SIZE];
    out.copy_from_slice(&digest);
    out
}

/// HMAC-BLAKE2b-256 over the concatenation of `parts`.
pub fn hmac_cmix(key: &[u8], parts: &[&[u8]]) -> [u8; CMIX_HASH_SIZE] {
    let Ok(mut mac) = HmacCMix::new_from_slice(key) else {
        unreachable!("HMAC accepts any key size");
    };
    for part in parts {
        mac.update(part);
    }
    let result = mac.finalize().into_bytes();

    let mut out = [0u8; CMIX_HASH_SIZE];
    out.copy_from_slice(&result);
    out
}

/// Clear the top bit of byte 0 so the value stays below any group prime
/// whose top bit is set.
pub fn clear_top_bit(bytes: &mut [u8]) {
    if let Some(first) = bytes.first_mut() {
        *first &= 0x7f;
    }
}

/// Constant-time equality. Slices of different length compare unequal.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_blake2b_256() {
        assert_eq!(
            hex::encode(cmix_hash(&[])),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn parts_are_concatenated() {
        assert_eq!(cmix_hash(&[b"ab", b"c"]), cmix_hash(&[b"abc"]));
        assert_eq!(cmix_hash(&[b"abc"]), cmix_hash(&[b"", b"abc", b""]));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut h = new_cmix_hash();
        h.update(b"hello ");
        h.update(b"world");
        let digest = h.finalize();
        assert_eq!(digest.as_slice(), cmix_hash(&[b"hello world"]).as_slice());
    }

    #[test]
    fn hmac_known_answer() {
        assert_eq!(
            hex::encode(hmac_cmix(b"key", &[b"message"])),
            "442d98a3872d3f56220f89e2b23d0645610b37c33dd3315ef224d0e39ada6751"
        );
    }

    #[test]
    fn hmac_depends_on_key() {
        assert_ne!(hmac_cmix(b"key-a", &[b"data"]), hmac_cmix(b"key-b", &[b"data"]));
    }

    #[test]
    fn clear_top_bit_only_touches_first_byte() {
        let mut bytes = [0xffu8; 4];
        clear_top_bit(&mut bytes);
        assert_eq!(bytes, [0x7f, 0xff, 0xff, 0xff]);

        let mut empty: [u8; 0] = [];
        clear_top_bit(&mut empty);
    }

    #[test]
    fn ct_eq_semantics() {
        assert!(ct_eq(b"abc", b"abc"));
        assert!(!ct_eq(b"abc", b"abd"));
        assert!(!ct_eq(b"abc", b"abcd"));
        assert!(ct_eq(b"", b""));
    }
}
