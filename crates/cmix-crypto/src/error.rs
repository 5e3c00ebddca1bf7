//! Error types for the cryptographic core.
//!
//! Every failure the core can surface maps onto one [`ErrorKind`]. Higher
//! layers (codecs, file transfer) wrap [`CryptoError`] and report the same
//! kinds, so callers can match on the taxonomy without caring which crate
//! produced the error.
//!
//! Messages carry lengths, versions and indices only. Key material and
//! plaintexts never appear in an error.

use thiserror::Error;

/// Closed taxonomy of failures surfaced by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong-length or otherwise unusable key.
    InvalidKey,
    /// Wrong-length nonce or a blob too short to hold one.
    InvalidNonce,
    /// Salt shorter than the construction requires.
    InvalidSalt,
    /// AEAD tag, MAC or signature did not verify.
    AuthenticationFailed,
    /// `now` lies outside the signed time window.
    TimeOutOfBounds,
    /// A reconstructed identifier differs from the claimed one.
    IdentityMismatch,
    /// Envelope tag missing or malformed.
    TagMismatch,
    /// Unknown or newer codec version.
    VersionUnsupported,
    /// Stored checksum does not verify.
    ChecksumMismatch,
    /// Base64, varint or field-length failure.
    MalformedEncoding,
    /// OAEP plaintext longer than the key allows.
    MessageTooLong,
    /// The random source produced fewer bytes than requested.
    EntropyExhausted,
    /// Hash/padding combination the RSA backend cannot express.
    UnsupportedHash,
    /// Operation not valid in the current state of a transfer.
    InvalidState,
}

/// Errors from primitive, RSA, signature and derivation operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key has the wrong length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Required key length
        expected: usize,
        /// Supplied key length
        actual: usize,
    },

    /// Key is shorter than the construction allows
    #[error("key too short: need at least {min} bytes, got {actual}")]
    KeyTooShort {
        /// Minimum key length
        min: usize,
        /// Supplied key length
        actual: usize,
    },

    /// Key material was rejected by the backend
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Reason for rejection
        reason: String,
    },

    /// Nonce has the wrong length
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Required nonce length
        expected: usize,
        /// Supplied nonce length
        actual: usize,
    },

    /// Blob is too short to contain nonce and tag
    #[error("ciphertext too short: need at least {min} bytes, got {actual}")]
    ShortBlob {
        /// Minimum blob length
        min: usize,
        /// Supplied blob length
        actual: usize,
    },

    /// Salt is shorter than the construction allows
    #[error("salt too short: need at least {min} bytes, got {actual}")]
    SaltTooShort {
        /// Minimum salt length
        min: usize,
        /// Supplied salt length
        actual: usize,
    },

    /// AEAD decryption failed (tag mismatch)
    #[error("decryption failed")]
    DecryptionFailed,

    /// MAC did not verify
    #[error("MAC mismatch")]
    MacMismatch,

    /// Signature did not verify
    #[error("invalid signature")]
    InvalidSignature,

    /// `now` outside `[signed_time - delta, signed_time + delta]`
    #[error("time out of bounds: {offset_secs}s from signed time, allowed {delta_secs}s")]
    TimeOutOfBounds {
        /// Signed offset of `now` from the signed time, in seconds
        offset_secs: i64,
        /// Allowed deviation in seconds
        delta_secs: u64,
    },

    /// Reconstructed ID does not equal the claimed ID
    #[error("identity mismatch")]
    IdentityMismatch,

    /// Malformed encoding of some field
    #[error("malformed encoding: {reason}")]
    MalformedEncoding {
        /// What failed to parse
        reason: String,
    },

    /// OAEP payload exceeds `k - 2*hLen - 2`
    #[error("message too long: {len} bytes, maximum {max}")]
    MessageTooLong {
        /// Supplied payload length
        len: usize,
        /// Maximum payload length for this key and hash
        max: usize,
    },

    /// Random source failed to fill the buffer
    #[error("entropy exhausted: requested {requested} bytes")]
    EntropyExhausted {
        /// Number of bytes requested
        requested: usize,
    },

    /// Hash cannot be used with this padding scheme
    #[error("unsupported hash {hash} for {scheme}")]
    UnsupportedHash {
        /// Hash name
        hash: &'static str,
        /// Padding scheme name
        scheme: &'static str,
    },
}

impl CryptoError {
    /// Taxonomy entry for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKeyLength { .. } | Self::KeyTooShort { .. } | Self::InvalidKey { .. } => {
                ErrorKind::InvalidKey
            },
            Self::InvalidNonceLength { .. } | Self::ShortBlob { .. } => ErrorKind::InvalidNonce,
            Self::SaltTooShort { .. } => ErrorKind::InvalidSalt,
            Self::DecryptionFailed | Self::MacMismatch | Self::InvalidSignature => {
                ErrorKind::AuthenticationFailed
            },
            Self::TimeOutOfBounds { .. } => ErrorKind::TimeOutOfBounds,
            Self::IdentityMismatch => ErrorKind::IdentityMismatch,
            Self::MalformedEncoding { .. } => ErrorKind::MalformedEncoding,
            Self::MessageTooLong { .. } => ErrorKind::MessageTooLong,
            Self::EntropyExhausted { .. } => ErrorKind::EntropyExhausted,
            Self::UnsupportedHash { .. } => ErrorKind::UnsupportedHash,
        }
    }

    /// Shorthand for a [`CryptoError::MalformedEncoding`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEncoding { reason: reason.into() }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failures_share_a_kind() {
        assert_eq!(CryptoError::DecryptionFailed.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(CryptoError::MacMismatch.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(CryptoError::InvalidSignature.kind(), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn short_blob_is_a_nonce_error() {
        let err = CryptoError::ShortBlob { min: 41, actual: 3 };
        assert_eq!(err.kind(), ErrorKind::InvalidNonce);
    }

    #[test]
    fn error_display() {
        let err = CryptoError::MessageTooLong { len: 100, max: 62 };
        assert_eq!(err.to_string(), "message too long: 100 bytes, maximum 62");

        let err = CryptoError::TimeOutOfBounds { offset_secs: -7200, delta_secs: 3600 };
        assert_eq!(err.to_string(), "time out of bounds: -7200s from signed time, allowed 3600s");
    }
}
