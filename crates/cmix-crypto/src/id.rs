//! Network identifiers.
//!
//! An [`Id`] is 33 bytes: a 32-byte digest followed by an [`IdType`] tag.
//! Users, nodes and gateways derive theirs from an RSA public key and a
//! 32-byte salt.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::{CryptoError, Result},
    hash::cmix_hash,
    rsa::PublicKey,
};

/// Length of an ID in bytes
pub const ID_LEN: usize = 33;

/// Length of the digest part of an ID
pub const DATA_LEN: usize = 32;

/// Salt length for [`Id::from_rsa`]
pub const SALT_LEN: usize = 32;

/// Kind of entity an [`Id`] names. Stored in the last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IdType {
    /// Untyped
    Generic = 0,
    /// Gateway
    Gateway = 1,
    /// Mix node
    Node = 2,
    /// End user
    User = 3,
    /// Group
    Group = 4,
}

impl TryFrom<u8> for IdType {
    type Error = CryptoError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Generic),
            1 => Ok(Self::Gateway),
            2 => Ok(Self::Node),
            3 => Ok(Self::User),
            4 => Ok(Self::Group),
            other => Err(CryptoError::malformed(format!("unknown ID type {other}"))),
        }
    }
}

/// 33-byte network identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; ID_LEN]);

impl Id {
    /// Build an ID from a digest and a type tag.
    pub fn new(data: [u8; DATA_LEN], ty: IdType) -> Self {
        let mut id = [0u8; ID_LEN];
        id[..DATA_LEN].copy_from_slice(&data);
        id[DATA_LEN] = ty as u8;
        Self(id)
    }

    /// Derive an ID from an RSA public key: cMix-hash(PKCS#1 PEM || salt).
    ///
    /// # Errors
    ///
    /// - `InvalidSalt` if `salt` is not 32 bytes
    pub fn from_rsa(key: &PublicKey, salt: &[u8], ty: IdType) -> Result<Self> {
        if salt.len() != SALT_LEN {
            return Err(CryptoError::SaltTooShort { min: SALT_LEN, actual: salt.len() });
        }
        let pem = key.marshal_pem()?;
        Ok(Self::new(cmix_hash(&[pem.as_bytes(), salt]), ty))
    }

    /// Parse 33 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let id: [u8; ID_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::malformed(format!("ID: expected {ID_LEN} bytes, got {}", bytes.len()))
        })?;
        IdType::try_from(id[DATA_LEN])?;
        Ok(Self(id))
    }

    /// Parse standard base64.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD.decode(s).map_err(|e| CryptoError::malformed(format!("ID: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Raw bytes.
    pub const fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Type tag.
    pub fn id_type(&self) -> IdType {
        // Constructors only admit known tags.
        IdType::try_from(self.0[DATA_LEN]).unwrap_or(IdType::Generic)
    }

    /// Digest part, without the type tag.
    pub fn data(&self) -> &[u8] {
        &self.0[..DATA_LEN]
    }
}

impl AsRef<[u8]> for Id {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}
