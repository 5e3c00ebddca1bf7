//! Error types for the file-transfer state machines.

use cmix_crypto::{CryptoError, ErrorKind};
use thiserror::Error;

use crate::sent::SentState;

/// Errors from file-transfer state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Failure in an underlying primitive
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Operation not allowed in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State when the operation was attempted
        state: SentState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Transfers must carry at least one byte
    #[error("file is empty")]
    EmptyFile,

    /// More parts than a 16-bit part index can address
    #[error("file needs {parts} parts, maximum {max}")]
    FileTooLarge {
        /// Parts required at the configured part size
        parts: usize,
        /// Largest supported part count
        max: usize,
    },

    /// Configuration value out of range
    #[error("invalid transfer config: {reason}")]
    InvalidConfig {
        /// Offending setting
        reason: &'static str,
    },

    /// Part index outside the transfer
    #[error("unknown part {index}")]
    UnknownPart {
        /// Index that was supplied
        index: u16,
    },

    /// Fingerprint does not belong to this transfer
    #[error("fingerprint does not belong to this transfer")]
    UnknownFingerprint,

    /// Reassembled file does not match the whole-file MAC
    #[error("file MAC mismatch")]
    FileMacMismatch,
}

impl TransferError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Crypto(e) => e.kind(),
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::EmptyFile | Self::InvalidConfig { .. } | Self::UnknownPart { .. } => {
                ErrorKind::MalformedEncoding
            },
            Self::FileTooLarge { .. } => ErrorKind::MessageTooLong,
            Self::UnknownFingerprint => ErrorKind::IdentityMismatch,
            Self::FileMacMismatch => ErrorKind::AuthenticationFailed,
        }
    }
}
