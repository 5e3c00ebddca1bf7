//! cMix Cryptographic Core
//!
//! Primitives, key derivations and identifiers shared by the cMix client,
//! gateways and nodes. Every operation is a synchronous function of its
//! inputs plus a caller-supplied random source, so tests can pin outputs
//! with seeded generators.
//!
//! # Key Hierarchy
//!
//! Most derived material comes from one of three roots and is separated by
//! fixed salts fed to the cMix hash (unkeyed BLAKE2b-256):
//!
//! ```text
//! DH shared key K ──┬─► single-use transmit/request keys, fingerprints
//! DH public key P ──┴─► response keys, fingerprints, recipient ID
//!
//! Transfer key ─────┬─► part key(i)    ─► Salsa20 part ciphertext + MAC
//!                   ├─► fingerprint(i) ─► routing
//!                   └─► whole-file HMAC
//!
//! Password ── Argon2id(salt, params) ─► AEAD key ─► XChaCha20-Poly1305 blob
//! ```
//!
//! RSA keys authenticate nodes and gateways ([`authorize`]) and mint network
//! IDs ([`id`]). Multicast OAEP ([`rsa::multicast`]) lets one key holder
//! publish ciphertext that any holder of the public key can read.
//!
//! # Security
//!
//! - Fingerprints and MACs have the top bit of byte 0 cleared so they stay
//!   valid group elements downstream.
//! - Tags, MACs, checksums and signatures are compared in constant time.
//! - Secret handles zeroize on drop and redact their `Debug` output.
//! - Error values carry lengths and indices, never key material.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod authorize;
pub mod cyclic;
pub mod error;
pub mod file_transfer;
pub mod forward;
pub mod handle;
pub mod hash;
pub mod id;
pub mod kdf;
pub mod rng;
pub mod rsa;
pub mod single_use;
pub mod stream;

pub use error::{CryptoError, ErrorKind, Result};
pub use handle::{Fingerprint, Mac};
pub use hash::{CMixHash, cmix_hash, ct_eq, hmac_cmix};
pub use id::{Id, IdType};
