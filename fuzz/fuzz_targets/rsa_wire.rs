//! Fuzz target for the RSA public-key wire format
//!
//! Arbitrary `BE32(e) || N` buffers must either be rejected or decode to a
//! key that re-encodes to the same bytes once leading zeros are dropped.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use cmix_crypto::rsa::Scheme;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let scheme = Scheme::default();
    let Ok(key) = scheme.unmarshal_public_key_wire(data) else {
        return;
    };

    let wire = key.marshal_wire().unwrap();
    assert_eq!(scheme.unmarshal_public_key_wire(&wire).unwrap(), key);
});
