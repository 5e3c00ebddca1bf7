//! Sender state machine.
//!
//! Uses the action pattern: methods take time as input and return actions
//! for the driver to execute. The machine never touches the network.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐  arm   ┌────────┐  tick   ┌──────────────┐  all acked  ┌───────────┐
//! │ Init │───────>│ Arming │────────>│ Transmitting │────────────>│ Completed │
//! └──────┘        └────────┘         └──────────────┘             └───────────┘
//!                                           │
//!                                           │ retries exhausted / abort
//!                                           ↓
//!                                      ┌─────────┐
//!                                      │ Aborted │
//!                                      └─────────┘
//! ```
//!
//! Parts are encrypted when they are sent. Every retransmission draws a new
//! nonce, so a part never goes out twice under the same key stream.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use cmix_crypto::{
    Fingerprint,
    file_transfer::{self, EncryptedPart, FileId, TransferId, TransferKey, TransferMac},
    rng::CryptoRngCore,
};

use crate::{
    error::TransferError,
    part::{TransferInfo, split_file},
};

/// Default plaintext bytes per part.
pub const DEFAULT_PART_SIZE: usize = 1024;

/// Time to wait for an acknowledgement before resending a part.
pub const DEFAULT_RETRANSMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resends allowed per part before the transfer is aborted.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Parts allowed in flight at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Sender configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Plaintext bytes per part
    pub part_size: usize,
    /// Wait before resending an unacknowledged part
    pub retransmit_timeout: Duration,
    /// Resends allowed per part
    pub max_retries: u32,
    /// Unacknowledged parts allowed at once
    pub max_in_flight: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            retransmit_timeout: DEFAULT_RETRANSMIT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Actions returned by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendAction {
    /// Send this part to the recipient
    SendPart(OutgoingPart),

    /// Every part was acknowledged
    Completed,

    /// The transfer was given up
    Aborted {
        /// Reason for aborting
        reason: String,
    },
}

/// A part ready for the wire. Carries no key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPart {
    /// Part index
    pub index: u16,
    /// Routing fingerprint for the part
    pub fingerprint: Fingerprint,
    /// Ciphertext, nonce and MAC
    pub part: EncryptedPart,
    /// 1 for the first send, incremented on every resend
    pub attempt: u32,
}

/// Sender state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentState {
    /// Keys and fingerprints ready, nothing scheduled
    Init,
    /// Scheduled; the next tick starts sending
    Arming,
    /// Parts in flight
    Transmitting,
    /// Every part acknowledged
    Completed,
    /// Given up
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartStatus<I> {
    Pending,
    InFlight { sent_at: I, attempts: u32 },
    Acked,
}

/// Sender side of one file transfer.
///
/// Generic over `Instant` so tests can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct SentTransfer<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    state: SentState,
    config: TransferConfig,
    transfer_id: TransferId,
    key: TransferKey,
    mac: TransferMac,
    file_id: FileId,
    file_len: usize,
    parts: Vec<Vec<u8>>,
    fingerprints: Vec<Fingerprint>,
    status: Vec<PartStatus<I>>,
    acked: u16,
}

impl<I> SentTransfer<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a transfer in [`SentState::Init`]: draw the transfer key and
    /// ID, split the file and precompute every fingerprint.
    ///
    /// # Errors
    ///
    /// - `EmptyFile` if `file` is empty
    /// - `InvalidConfig` if the part size or window is zero
    /// - `FileTooLarge` if the file needs more than [`crate::MAX_PARTS`] parts
    /// - `Crypto(EntropyExhausted)` if the random source fails
    pub fn new(
        rng: &mut impl CryptoRngCore,
        file: &[u8],
        config: TransferConfig,
    ) -> Result<Self, TransferError> {
        if file.is_empty() {
            return Err(TransferError::EmptyFile);
        }
        if config.max_in_flight == 0 {
            return Err(TransferError::InvalidConfig { reason: "window must be non-zero" });
        }
        let parts = split_file(file, config.part_size)?;
        let Ok(num_parts) = u16::try_from(parts.len()) else {
            unreachable!("split_file caps the part count at u16::MAX")
        };

        let key = TransferKey::generate(rng)?;
        let transfer_id = TransferId::generate(rng)?;
        let fingerprints = file_transfer::fingerprints(&key, num_parts).collect();
        let mac = file_transfer::create_transfer_mac(file, &key);

        tracing::debug!(%transfer_id, num_parts, file_len = file.len(), "created file transfer");

        Ok(Self {
            state: SentState::Init,
            config,
            transfer_id,
            key,
            mac,
            file_id: FileId::of(file),
            file_len: file.len(),
            status: vec![PartStatus::Pending; parts.len()],
            parts,
            fingerprints,
            acked: 0,
        })
    }

    /// Current state
    pub fn state(&self) -> SentState {
        self.state
    }

    /// Configuration
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Correlation handle
    pub fn transfer_id(&self) -> TransferId {
        self.transfer_id
    }

    /// Number of parts
    pub fn num_parts(&self) -> u16 {
        self.fingerprints.len() as u16
    }

    /// Parts acknowledged so far
    pub fn acked_parts(&self) -> u16 {
        self.acked
    }

    /// Routing fingerprints, by part index
    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    /// Content address of the file
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Everything the receiver needs, to be sent out of band.
    pub fn info(&self) -> TransferInfo {
        TransferInfo {
            transfer_id: self.transfer_id,
            key: self.key.clone(),
            num_parts: self.num_parts(),
            mac: self.mac,
            file_id: self.file_id,
            file_len: self.file_len,
        }
    }

    /// Schedule the transfer. The next [`tick`](Self::tick) starts sending.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in [`SentState::Init`]
    pub fn arm(&mut self) -> Result<(), TransferError> {
        if self.state != SentState::Init {
            return Err(TransferError::InvalidState { state: self.state, operation: "arm" });
        }
        self.state = SentState::Arming;
        Ok(())
    }

    /// Drive sending: resend timed-out parts and fill the window with
    /// pending ones.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the transfer was never armed
    /// - `Crypto(EntropyExhausted)` if a nonce cannot be drawn. No part
    ///   changes status, so the next tick retries the same parts.
    pub fn tick(
        &mut self,
        rng: &mut impl CryptoRngCore,
        now: I,
    ) -> Result<Vec<SendAction>, TransferError> {
        match self.state {
            SentState::Init => {
                return Err(TransferError::InvalidState { state: self.state, operation: "tick" });
            },
            SentState::Completed | SentState::Aborted => return Ok(Vec::new()),
            SentState::Arming => {
                self.state = SentState::Transmitting;
                tracing::info!(transfer_id = %self.transfer_id, "file transfer started");
            },
            SentState::Transmitting => {},
        }

        let timeout = self.config.retransmit_timeout;
        let expired = |status: &PartStatus<I>| match *status {
            PartStatus::InFlight { sent_at, attempts } if now - sent_at >= timeout => Some(attempts),
            _ => None,
        };

        let max_retries = self.config.max_retries;
        let exhausted = self
            .status
            .iter()
            .enumerate()
            .find_map(|(i, s)| expired(s).filter(|&a| a > max_retries).map(|a| (i, a)));
        if let Some((index, attempts)) = exhausted {
            return Ok(self.abort(format!("part {index} unacknowledged after {attempts} attempts")));
        }

        let mut outgoing = Vec::new();
        for index in 0..self.num_parts() {
            if let Some(attempts) = expired(&self.status[usize::from(index)]) {
                outgoing.push(self.seal_part(rng, index, attempts + 1)?);
            }
        }

        let mut in_flight =
            self.status.iter().filter(|s| matches!(s, PartStatus::InFlight { .. })).count();
        for index in 0..self.num_parts() {
            if in_flight >= self.config.max_in_flight {
                break;
            }
            if self.status[usize::from(index)] == PartStatus::Pending {
                outgoing.push(self.seal_part(rng, index, 1)?);
                in_flight += 1;
            }
        }

        // Every part is sealed; only now do they count as sent
        for part in &outgoing {
            if part.attempt > 1 {
                tracing::debug!(transfer_id = %self.transfer_id, index = part.index, attempt = part.attempt, "resending file part");
            }
            self.status[usize::from(part.index)] =
                PartStatus::InFlight { sent_at: now, attempts: part.attempt };
        }
        Ok(outgoing.into_iter().map(SendAction::SendPart).collect())
    }

    /// Record the recipient's acknowledgement of part `index`.
    ///
    /// Duplicate acknowledgements are ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidState` before transmission starts or after an abort
    /// - `UnknownPart` if `index` is out of range
    pub fn ack(&mut self, index: u16) -> Result<Vec<SendAction>, TransferError> {
        match self.state {
            SentState::Transmitting => {},
            SentState::Completed => return Ok(Vec::new()),
            state => return Err(TransferError::InvalidState { state, operation: "ack" }),
        }

        let Some(status) = self.status.get_mut(usize::from(index)) else {
            return Err(TransferError::UnknownPart { index });
        };
        if *status == PartStatus::Acked {
            return Ok(Vec::new());
        }
        *status = PartStatus::Acked;
        self.acked += 1;

        if self.acked == self.num_parts() {
            self.state = SentState::Completed;
            tracing::info!(transfer_id = %self.transfer_id, num_parts = self.acked, "file transfer completed");
            return Ok(vec![SendAction::Completed]);
        }
        Ok(Vec::new())
    }

    /// Give up on the transfer. Does nothing once it has finished.
    pub fn abort(&mut self, reason: impl Into<String>) -> Vec<SendAction> {
        if matches!(self.state, SentState::Completed | SentState::Aborted) {
            return Vec::new();
        }
        let reason = reason.into();
        tracing::warn!(transfer_id = %self.transfer_id, %reason, "file transfer aborted");
        self.state = SentState::Aborted;
        vec![SendAction::Aborted { reason }]
    }

    fn seal_part(
        &self,
        rng: &mut impl CryptoRngCore,
        index: u16,
        attempt: u32,
    ) -> Result<OutgoingPart, TransferError> {
        let i = usize::from(index);
        let part = file_transfer::encrypt_part(rng, &self.key, index, &self.parts[i])?;
        Ok(OutgoingPart { index, fingerprint: self.fingerprints[i], part, attempt })
    }
}
