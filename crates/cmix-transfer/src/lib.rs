//! Sans-IO file transfer over cMix.
//!
//! [`SentTransfer`] splits a file into parts, encrypts each part under its
//! own key and tracks acknowledgements, resending on timeout.
//! [`ReceivedTransfer`] routes incoming parts by fingerprint, decrypts them
//! in any order and verifies the reassembled file.
//!
//! Neither side performs I/O or reads the clock. Callers pass `now` and a
//! random source in, and execute the returned actions.
//!
//! ```text
//! sender                                   receiver
//!   new ─► arm ─► tick ── (fp, ct, nonce, mac) ──► receive
//!                  ▲                                  │
//!                  └──────────── ack(index) ◄─────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod part;
pub mod received;
pub mod sent;

pub use error::TransferError;
pub use part::{MAX_PARTS, TransferInfo, split_file};
pub use received::{Received, ReceivedTransfer};
pub use sent::{OutgoingPart, SendAction, SentState, SentTransfer, TransferConfig};
