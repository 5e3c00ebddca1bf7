//! Fuzz target for channel identity decoding
//!
//! Covers the public identity wire form and the export envelope. The
//! envelope is wrapped around fixed cheap Argon2id params so every input
//! reaches AEAD decryption without attacker-chosen memory costs.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use base64::{Engine as _, engine::general_purpose::STANDARD};
use cmix_codec::{Identity, PrivateIdentity};
use cmix_crypto::kdf::Params;
use libfuzzer_sys::fuzz_target;

const CHEAP: Params = Params { time: 1, memory: 64, threads: 1 };
const TAG: &[u8] = b"xxChannelIdentity";

fuzz_target!(|data: &[u8]| {
    if let Ok(identity) = Identity::unmarshal(data) {
        assert_eq!(Identity::unmarshal(&identity.marshal()), Ok(identity));
    }

    let mut payload = vec![0u8; 16];
    payload.extend_from_slice(&CHEAP.marshal());
    payload.extend_from_slice(data);
    let envelope = format!("<xxChannelIdentity(1){}xxChannelIdentity>", STANDARD.encode(&payload));
    assert!(PrivateIdentity::import(b"fuzz", envelope.as_bytes()).is_err());

    // Raw bytes exercise the tag scanner; skip anything that could carry its own params
    if !data.windows(TAG.len()).any(|w| w == TAG) {
        let _ = PrivateIdentity::import(b"fuzz", data);
    }
});
