//! Fuzz target for Contact::unmarshal
//!
//! Feeds arbitrary bytes to the contact decoder to find:
//! - Panics in envelope parsing (tags, version, base64)
//! - Length prefixes or legacy uvarint slots that over-read
//! - Bodies that decode but do not re-encode to an equal contact
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use cmix_codec::Contact;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(contact) = Contact::unmarshal(data) else {
        return;
    };

    // Anything that decodes must survive a round trip through the writer
    if let Ok(marshalled) = contact.marshal() {
        let again = Contact::unmarshal(marshalled.as_bytes());
        assert_eq!(again.as_ref(), Ok(&contact));
    }
});
