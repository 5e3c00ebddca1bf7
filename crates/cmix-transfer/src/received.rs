//! Receiver side of a file transfer.
//!
//! The receiver learns the transfer key out of band ([`TransferInfo`]) and
//! builds a fingerprint → part index table from it. Parts are routed by
//! fingerprint, so they can be decrypted in any arrival order. When the
//! last part lands the file is reassembled and checked against the
//! whole-file MAC.

use std::collections::HashMap;

use cmix_crypto::{Fingerprint, file_transfer};

use crate::{error::TransferError, part::TransferInfo};

/// Result of handing a part to [`ReceivedTransfer::receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// New part stored
    Part {
        /// Index of the stored part
        index: u16,
    },
    /// Part was already stored; nothing changed
    Duplicate {
        /// Index of the repeated part
        index: u16,
    },
    /// Last part stored; the file verified against its MAC
    Complete {
        /// Reassembled file
        file: Vec<u8>,
    },
}

/// Reassembly state for one incoming transfer.
#[derive(Debug, Clone)]
pub struct ReceivedTransfer {
    info: TransferInfo,
    routes: HashMap<Fingerprint, u16>,
    parts: Vec<Option<Vec<u8>>>,
    received: u16,
    completed: bool,
    failed: bool,
}

impl ReceivedTransfer {
    /// Start receiving the transfer described by `info`.
    ///
    /// # Errors
    ///
    /// - `EmptyFile` if `info` announces zero parts
    pub fn new(info: TransferInfo) -> Result<Self, TransferError> {
        if info.num_parts == 0 {
            return Err(TransferError::EmptyFile);
        }
        let routes = file_transfer::fingerprints(&info.key, info.num_parts).zip(0..).collect();
        let parts = vec![None; usize::from(info.num_parts)];
        Ok(Self { info, routes, parts, received: 0, completed: false, failed: false })
    }

    /// Transfer description
    pub fn info(&self) -> &TransferInfo {
        &self.info
    }

    /// Whether `fingerprint` routes to this transfer.
    pub fn owns(&self, fingerprint: &Fingerprint) -> bool {
        self.routes.contains_key(fingerprint)
    }

    /// Parts received so far and total parts.
    pub fn progress(&self) -> (u16, u16) {
        (self.received, self.info.num_parts)
    }

    /// Whether the file has been reassembled and verified.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Whether every part arrived but the file failed its MAC check.
    ///
    /// A failed transfer is terminal: its parts are discarded and further
    /// parts are refused.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Decrypt and store one part.
    ///
    /// # Errors
    ///
    /// - `UnknownFingerprint` if the fingerprint is not from this transfer
    /// - `Crypto(MacMismatch)` or `Crypto(InvalidNonceLength)` if the part
    ///   does not authenticate
    /// - `FileMacMismatch` if every part arrived but the file does not match
    ///   its MAC, and on every call after that
    pub fn receive(
        &mut self,
        fingerprint: &Fingerprint,
        ciphertext: &[u8],
        nonce: &[u8],
        mac: &[u8],
    ) -> Result<Received, TransferError> {
        let Some(&index) = self.routes.get(fingerprint) else {
            return Err(TransferError::UnknownFingerprint);
        };
        if self.failed {
            return Err(TransferError::FileMacMismatch);
        }
        let slot = usize::from(index);
        if self.completed || self.parts[slot].is_some() {
            return Ok(Received::Duplicate { index });
        }

        let plaintext = file_transfer::decrypt_part(&self.info.key, index, ciphertext, nonce, mac)?;
        self.parts[slot] = Some(plaintext);
        self.received += 1;
        tracing::trace!(transfer_id = %self.info.transfer_id, index, "stored file part");

        if self.received < self.info.num_parts {
            return Ok(Received::Part { index });
        }

        let file: Vec<u8> = self.parts.iter().flatten().flatten().copied().collect();
        if !file_transfer::verify_transfer_mac(&file, &self.info.key, self.info.mac.as_bytes()) {
            tracing::warn!(transfer_id = %self.info.transfer_id, "reassembled file failed MAC check");
            self.failed = true;
            self.parts.iter_mut().for_each(|p| *p = None);
            return Err(TransferError::FileMacMismatch);
        }

        self.completed = true;
        self.parts.iter_mut().for_each(|p| *p = Some(Vec::new()));
        tracing::info!(transfer_id = %self.info.transfer_id, file_len = file.len(), "file transfer received");
        Ok(Received::Complete { file })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use cmix_crypto::ErrorKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::sent::{OutgoingPart, SendAction, SentTransfer, TransferConfig};

    const FILE: &[u8] = b"The quick brown fox jumps over the lazy dog";

    fn send_all(seed: u64) -> (TransferInfo, Vec<OutgoingPart>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let config = TransferConfig { part_size: 8, ..TransferConfig::default() };
        let mut tx = SentTransfer::new(&mut rng, FILE, config).unwrap();
        tx.arm().unwrap();
        let parts = tx
            .tick(&mut rng, Instant::now())
            .unwrap()
            .into_iter()
            .filter_map(|a| match a {
                SendAction::SendPart(p) => Some(p),
                _ => None,
            })
            .collect();
        (tx.info(), parts)
    }

    fn deliver(rx: &mut ReceivedTransfer, p: &OutgoingPart) -> Result<Received, TransferError> {
        rx.receive(&p.fingerprint, &p.part.ciphertext, &p.part.nonce, p.part.mac.as_bytes())
    }

    #[test]
    fn reassembles_out_of_order() {
        let (info, mut parts) = send_all(1);
        assert_eq!(parts.len(), 6);
        parts.reverse();

        let mut rx = ReceivedTransfer::new(info).unwrap();
        for p in &parts[..5] {
            assert_eq!(deliver(&mut rx, p).unwrap(), Received::Part { index: p.index });
        }
        assert_eq!(rx.progress(), (5, 6));
        assert_eq!(deliver(&mut rx, &parts[5]).unwrap(), Received::Complete { file: FILE.to_vec() });
        assert!(rx.is_complete());
    }

    #[test]
    fn duplicates_are_idempotent() {
        let (info, parts) = send_all(2);
        let mut rx = ReceivedTransfer::new(info).unwrap();

        deliver(&mut rx, &parts[0]).unwrap();
        assert_eq!(deliver(&mut rx, &parts[0]).unwrap(), Received::Duplicate { index: 0 });
        assert_eq!(rx.progress().0, 1);
    }

    #[test]
    fn unknown_fingerprint_is_rejected() {
        let (info, parts) = send_all(3);
        let (_, other) = send_all(4);
        let mut rx = ReceivedTransfer::new(info).unwrap();

        assert!(rx.owns(&parts[0].fingerprint));
        assert!(!rx.owns(&other[0].fingerprint));
        assert_eq!(deliver(&mut rx, &other[0]).unwrap_err(), TransferError::UnknownFingerprint);
    }

    #[test]
    fn tampered_part_is_rejected_and_not_stored() {
        let (info, parts) = send_all(5);
        let mut rx = ReceivedTransfer::new(info).unwrap();

        let mut bad = parts[0].clone();
        bad.part.ciphertext[0] ^= 0x01;
        assert_eq!(deliver(&mut rx, &bad).unwrap_err().kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(rx.progress().0, 0);
        assert_eq!(deliver(&mut rx, &parts[0]).unwrap(), Received::Part { index: 0 });
    }

    #[test]
    fn wrong_file_mac_fails_reassembly() {
        let (mut info, parts) = send_all(6);
        info.mac = file_transfer::create_transfer_mac(b"another file", &info.key);
        let mut rx = ReceivedTransfer::new(info).unwrap();

        let results: Vec<_> = parts.iter().map(|p| deliver(&mut rx, p)).collect();
        assert_eq!(results.last().unwrap(), &Err(TransferError::FileMacMismatch));
        assert!(!rx.is_complete());
        assert!(rx.is_failed());

        // Terminal: redelivery does not look like a harmless duplicate
        assert_eq!(deliver(&mut rx, &parts[0]), Err(TransferError::FileMacMismatch));
        assert!(rx.is_failed());
    }

    #[test]
    fn zero_parts_is_rejected() {
        let (mut info, _) = send_all(7);
        info.num_parts = 0;
        assert_eq!(ReceivedTransfer::new(info).unwrap_err(), TransferError::EmptyFile);
    }
}
