//! Codec errors.

use cmix_crypto::{CryptoError, ErrorKind};
use thiserror::Error;

/// Errors from decoding and encoding user-facing formats.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failure in an underlying primitive
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Envelope tag missing or malformed
    #[error("{format}: envelope tag not found")]
    TagMismatch {
        /// Format being decoded
        format: &'static str,
    },

    /// Version not understood by this library
    #[error("{format}: unsupported version {version:?}")]
    VersionUnsupported {
        /// Format being decoded
        format: &'static str,
        /// Version as found in the input
        version: String,
    },

    /// Stored checksum does not match the decoded fields
    #[error("{format}: checksum mismatch")]
    ChecksumMismatch {
        /// Format being decoded
        format: &'static str,
    },

    /// Structural decoding failure
    #[error("{format}: {reason}")]
    Malformed {
        /// Format being decoded
        format: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Fact value cannot be represented
    #[error("invalid fact: {reason}")]
    InvalidFact {
        /// What went wrong
        reason: String,
    },

    /// Data does not fit in a QR code
    #[error("QR encoding failed: {reason}")]
    QrCode {
        /// Backend message
        reason: String,
    },
}

impl CodecError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Crypto(e) => e.kind(),
            Self::TagMismatch { .. } => ErrorKind::TagMismatch,
            Self::VersionUnsupported { .. } => ErrorKind::VersionUnsupported,
            Self::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Self::Malformed { .. } | Self::InvalidFact { .. } => ErrorKind::MalformedEncoding,
            Self::QrCode { .. } => ErrorKind::MessageTooLong,
        }
    }

    pub(crate) fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed { format, reason: reason.into() }
    }
}

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
