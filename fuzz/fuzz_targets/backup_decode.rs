//! Fuzz target for backup header parsing and decryption
//!
//! Exercises the tag check, version check and params decoding, then AEAD
//! decryption under a fixed key. A random blob must never authenticate.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use cmix_codec::backup::{self, Backup};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if backup::read_header(data).is_err() {
        return;
    }
    assert!(Backup::decrypt(data, &[0x42; 32]).is_err());
});
