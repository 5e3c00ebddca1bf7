//! Salsa20 stream XOR for file parts.

use salsa20::{
    Salsa20,
    cipher::{KeyIvInit, StreamCipher},
};

/// Salsa20 key size (32 bytes)
pub const KEY_SIZE: usize = 32;

/// Salsa20 nonce size (8 bytes)
pub const NONCE_SIZE: usize = 8;

/// XOR `data` with the Salsa20 keystream for `(key, nonce)`. Applying it
/// twice restores the input.
pub fn salsa20_xor(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    let mut cipher = Salsa20::new(key.into(), nonce.into());
    cipher.apply_keystream(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecrypt_set1_vector0() {
        let mut key = [0u8; KEY_SIZE];
        key[0] = 0x80;
        let stream = salsa20_xor(&key, &[0u8; NONCE_SIZE], &[0u8; 64]);
        assert_eq!(
            hex::encode(stream),
            "e3be8fdd8beca2e3ea8ef9475b29a6e7003951e1097a5c38d23b7a5fad9f6844\
             b22c97559e2723c7cbbd3fe4fc8d9a0744652a83e72a9c461876af4d7ef1a117"
        );
    }

    #[test]
    fn xor_is_an_involution() {
        let key = [9u8; KEY_SIZE];
        let nonce = [3u8; NONCE_SIZE];
        let data: Vec<u8> = (0..=255).collect();

        let once = salsa20_xor(&key, &nonce, &data);
        assert_ne!(once, data);
        assert_eq!(salsa20_xor(&key, &nonce, &once), data);
    }
}
