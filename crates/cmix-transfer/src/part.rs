//! Splitting files into parts and the information a receiver needs.

use cmix_crypto::file_transfer::{FileId, TransferId, TransferKey, TransferMac};

use crate::error::TransferError;

/// Largest number of parts in one transfer (16-bit part index).
pub const MAX_PARTS: usize = u16::MAX as usize;

/// Split `file` into consecutive chunks of at most `part_size` bytes.
///
/// # Errors
///
/// - `InvalidConfig` if `part_size` is zero
/// - `FileTooLarge` if more than [`MAX_PARTS`] parts are needed
pub fn split_file(file: &[u8], part_size: usize) -> Result<Vec<Vec<u8>>, TransferError> {
    if part_size == 0 {
        return Err(TransferError::InvalidConfig { reason: "part size must be non-zero" });
    }
    let parts = file.len().div_ceil(part_size);
    if parts > MAX_PARTS {
        return Err(TransferError::FileTooLarge { parts, max: MAX_PARTS });
    }
    Ok(file.chunks(part_size).map(<[u8]>::to_vec).collect())
}

/// What the sender hands the receiver out of band to start a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInfo {
    /// Correlation handle
    pub transfer_id: TransferId,
    /// Root key of the transfer
    pub key: TransferKey,
    /// Number of parts
    pub num_parts: u16,
    /// Whole-file MAC under `key`
    pub mac: TransferMac,
    /// Content address of the complete file
    pub file_id: FileId,
    /// Total file length in bytes
    pub file_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_exact_and_ragged() {
        assert_eq!(split_file(b"abcdef", 3).unwrap(), vec![b"abc".to_vec(), b"def".to_vec()]);
        assert_eq!(split_file(b"abcdefg", 3).unwrap().last().unwrap(), b"g");
        assert!(split_file(b"", 3).unwrap().is_empty());
    }

    #[test]
    fn split_rejects_bad_sizes() {
        assert!(matches!(split_file(b"abc", 0), Err(TransferError::InvalidConfig { .. })));

        let big = vec![0u8; MAX_PARTS + 1];
        assert_eq!(
            split_file(&big, 1).unwrap_err(),
            TransferError::FileTooLarge { parts: MAX_PARTS + 1, max: MAX_PARTS }
        );
        assert_eq!(split_file(&big[..MAX_PARTS], 1).unwrap().len(), MAX_PARTS);
    }
}
