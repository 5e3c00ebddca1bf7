//! Fuzz target for file-part encryption and routing
//!
//! # Strategy
//!
//! - Arbitrary transfer keys, part indices and plaintexts
//! - Encrypt, then decrypt with the same and with a neighbouring index
//! - Corrupt ciphertext, nonce or MAC before decrypting
//!
//! # Invariants
//!
//! - Encrypt/decrypt roundtrip succeeds
//! - Decrypting under the wrong index fails
//! - Any corruption fails authentication
//! - Fingerprints have the top bit of byte 0 clear

#![no_main]

use arbitrary::Arbitrary;
use cmix_crypto::{
    file_transfer::{self, TransferKey},
    rng::{CryptoRng, RngCore},
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct PartScenario {
    key: [u8; 32],
    index: u16,
    nonce: [u8; 8],
    plaintext: Vec<u8>,
    corruption: Corruption,
}

#[derive(Debug, Clone, Arbitrary)]
enum Corruption {
    None,
    Ciphertext { position: usize, mask: u8 },
    Nonce { position: usize, mask: u8 },
    Mac { position: usize, mask: u8 },
    TruncateNonce,
}

/// Replays a fixed nonce so the scenario is reproducible
struct FixedRng([u8; 8]);

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    fn next_u64(&mut self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for (i, byte) in dest.iter_mut().enumerate() {
            *byte = self.0[i % 8];
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for FixedRng {}

fuzz_target!(|s: PartScenario| {
    let key = TransferKey::from_bytes(s.key);
    let fp = file_transfer::fingerprint(&key, s.index);
    assert_eq!(fp.as_bytes()[0] & 0x80, 0);

    let part = file_transfer::encrypt_part(&mut FixedRng(s.nonce), &key, s.index, &s.plaintext).unwrap();
    assert_eq!(part.nonce, s.nonce);

    let pt = file_transfer::decrypt_part(&key, s.index, &part.ciphertext, &part.nonce, part.mac.as_bytes()).unwrap();
    assert_eq!(pt, s.plaintext);

    let other = s.index.wrapping_add(1);
    assert!(file_transfer::decrypt_part(&key, other, &part.ciphertext, &part.nonce, part.mac.as_bytes()).is_err());

    let mut ct = part.ciphertext.clone();
    let mut nonce = part.nonce.to_vec();
    let mut mac = part.mac.as_bytes().to_vec();
    let corrupted = match s.corruption {
        Corruption::None => false,
        Corruption::Ciphertext { position, mask } if !ct.is_empty() && mask != 0 => {
            let i = position % ct.len();
            ct[i] ^= mask;
            true
        },
        Corruption::Nonce { position, mask } if mask != 0 => {
            nonce[position % 8] ^= mask;
            true
        },
        Corruption::Mac { position, mask } if mask != 0 => {
            mac[position % 32] ^= mask;
            true
        },
        Corruption::TruncateNonce => {
            nonce.pop();
            true
        },
        _ => false,
    };

    if corrupted {
        assert!(file_transfer::decrypt_part(&key, s.index, &ct, &nonce, &mac).is_err());
    }
});
