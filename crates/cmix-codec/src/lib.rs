//! Versioned encodings for user-facing cMix artifacts.
//!
//! Everything here is something a user copies, scans or stores: contact
//! cards, exported channel identities and encrypted account backups. Each
//! format carries a tag and a version so old exports stay readable.
//!
//! | Format | Envelope | Integrity |
//! |--------|----------|-----------|
//! | [`contact::Contact`] | `<xxc(2)` base64 `xxc>` | BLAKE2b checksum (MD5 in v1) |
//! | [`identity::PrivateIdentity`] export | `<xxChannelIdentity(1)` base64 `xxChannelIdentity>` | XChaCha20-Poly1305 |
//! | [`backup::Backup`] | `XXACCTBK` binary header | XChaCha20-Poly1305 |
//!
//! Decoders never panic on untrusted input. Failures map onto
//! [`cmix_crypto::ErrorKind`] through [`CodecError::kind`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backup;
pub mod contact;
pub mod error;
pub mod fact;
pub mod identity;

pub use contact::Contact;
pub use error::{CodecError, Result};
pub use fact::{Fact, FactList, FactType};
pub use identity::{Codeset, Identity, PrivateIdentity};
