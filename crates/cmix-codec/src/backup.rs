//! Encrypted account backups.
//!
//! ```text
//! "XXACCTBK" || version(1) || salt(16) || params(9) || AEAD(JSON(backup))
//! ```
//!
//! The AEAD key is derived with [`kdf::derive_key`] from the password, salt
//! and params stored in the header. Derivation is slow, so [`Backup::encrypt`]
//! and [`Backup::decrypt`] take the derived key and callers cache it.

use cmix_crypto::{
    Id, aead,
    cyclic::{Element, Group},
    hash::ct_eq,
    kdf::{self, Params},
    rng::CryptoRngCore,
    rsa::PrivateKey,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{
    error::{CodecError, Result},
    fact::FactList,
};

const FORMAT: &str = "backup";

/// Leading tag of every backup.
pub const TAG: &[u8; 8] = b"XXACCTBK";

/// Version written by [`Backup::encrypt`].
pub const VERSION: u8 = 0;

/// Bytes before the AEAD blob.
pub const HEADER_LEN: usize = TAG.len() + 1 + kdf::SALT_LEN + Params::SIZE;

/// Identity used to send messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransmissionIdentity {
    /// RSA key that signs for this identity
    pub rsa_signing_private_key: PrivateKey,
    /// Registrar signature over the public key
    #[serde(with = "base64_bytes")]
    pub registrar_signature: Vec<u8>,
    /// Salt used to mint `computed_id`
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// ID derived from the key and salt
    #[serde(rename = "ComputedID")]
    pub computed_id: Id,
}

/// Identity used to receive messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceptionIdentity {
    /// RSA key that signs for this identity
    pub rsa_signing_private_key: PrivateKey,
    /// Registrar signature over the public key
    #[serde(with = "base64_bytes")]
    pub registrar_signature: Vec<u8>,
    /// Salt used to mint `computed_id`
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// ID derived from the key and salt
    #[serde(rename = "ComputedID")]
    pub computed_id: Id,
    /// DH private key
    #[serde(rename = "DHPrivateKey")]
    pub dh_private_key: Element,
    /// DH public key
    #[serde(rename = "DHPublicKey")]
    pub dh_public_key: Element,
    /// Group both DH keys belong to
    pub dh_group: Group,
}

/// Facts registered with user discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDiscoveryRegistration {
    /// Registered facts
    pub facts: FactList,
}

/// Known contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Contacts {
    /// Contact IDs
    pub identities: Vec<Id>,
}

/// Account state needed to restore a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Backup {
    /// Registration time, Unix nanoseconds
    pub registration_timestamp: i64,
    /// Code used to register
    pub registration_code: String,
    /// Client parameters as JSON
    #[serde(rename = "JSONParams")]
    pub params_json: String,
    /// Sending identity
    pub transmission_identity: TransmissionIdentity,
    /// Receiving identity
    pub reception_identity: ReceptionIdentity,
    /// User discovery registration
    pub user_discovery_registration: UserDiscoveryRegistration,
    /// Contacts
    pub contacts: Contacts,
}

/// Unencrypted prefix of a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Format version
    pub version: u8,
    /// Argon2id salt
    pub salt: [u8; kdf::SALT_LEN],
    /// Argon2id cost
    pub params: Params,
}

impl Backup {
    /// Encrypt with a key from [`kdf::derive_key`] over `salt` and `params`.
    pub fn encrypt(
        &self,
        rng: &mut impl CryptoRngCore,
        key: &[u8],
        salt: &[u8; kdf::SALT_LEN],
        params: &Params,
    ) -> Result<Vec<u8>> {
        let json = Zeroizing::new(
            serde_json::to_vec(self).map_err(|e| CodecError::malformed(FORMAT, e.to_string()))?,
        );
        let blob = aead::seal(rng, &json, key)?;

        let mut out = Vec::with_capacity(HEADER_LEN + blob.len());
        out.extend_from_slice(TAG);
        out.push(VERSION);
        out.extend_from_slice(salt);
        out.extend_from_slice(&params.marshal());
        out.extend_from_slice(&blob);
        Ok(out)
    }

    /// Decrypt with a cached key.
    ///
    /// # Errors
    ///
    /// - `TagMismatch`, `VersionUnsupported` or `Malformed` on a bad header
    /// - `Crypto(DecryptionFailed)` on a wrong key or tampered blob
    /// - `Malformed` if the plaintext is not a backup document
    pub fn decrypt(blob: &[u8], key: &[u8]) -> Result<Self> {
        read_header(blob)?;
        let json = Zeroizing::new(aead::decrypt(&blob[HEADER_LEN..], key)?);
        serde_json::from_slice(&json).map_err(|e| CodecError::malformed(FORMAT, e.to_string()))
    }

    /// Derive the key from `password` and the header, then decrypt.
    pub fn decrypt_with_password(blob: &[u8], password: &[u8]) -> Result<Self> {
        let header = read_header(blob)?;
        let key = Zeroizing::new(kdf::derive_key(password, &header.salt, &header.params)?);
        Self::decrypt(blob, key.as_slice())
    }
}

/// Validate and parse the unencrypted header.
pub fn read_header(blob: &[u8]) -> Result<Header> {
    if blob.len() < TAG.len() || !ct_eq(&blob[..TAG.len()], TAG) {
        return Err(CodecError::TagMismatch { format: FORMAT });
    }
    if blob.len() < HEADER_LEN {
        return Err(CodecError::malformed(
            FORMAT,
            format!("{} bytes, header needs {HEADER_LEN}", blob.len()),
        ));
    }

    let version = blob[TAG.len()];
    if version != VERSION {
        return Err(CodecError::VersionUnsupported { format: FORMAT, version: version.to_string() });
    }

    let salt_start = TAG.len() + 1;
    let params_start = salt_start + kdf::SALT_LEN;
    let mut salt = [0u8; kdf::SALT_LEN];
    salt.copy_from_slice(&blob[salt_start..params_start]);
    let params = Params::unmarshal(&blob[params_start..HEADER_LEN])?;

    Ok(Header { version, salt, params })
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
