//! Property-based tests for user-facing encodings
//!
//! 1. **Round-trip**: contacts, fact lists and public identities decode to
//!    what was encoded
//! 2. **Checksum**: any single-bit change to a contact body outside the DH
//!    group tag is rejected
//! 3. **Codenames**: always at most 32 characters and deterministic
//! 4. **Robustness**: decoders return errors on arbitrary input, never panic

use cmix_codec::{
    Contact, Fact, FactList, FactType, Identity, PrivateIdentity, backup,
    identity::{Codeset, MAX_CODENAME_LEN},
};
use cmix_crypto::{Id, IdType, cyclic::Group};
use ed25519_dalek::SigningKey;
use proptest::prelude::*;

fn fact_type() -> impl Strategy<Value = FactType> {
    prop_oneof![
        Just(FactType::Username),
        Just(FactType::Email),
        Just(FactType::Phone),
        Just(FactType::Nickname),
    ]
}

fn fact() -> impl Strategy<Value = Fact> {
    (fact_type(), "[a-zA-Z0-9@+._ -]{1,24}").prop_map(|(ty, value)| Fact::new(ty, value).unwrap())
}

fn contact() -> impl Strategy<Value = Contact> {
    (
        any::<[u8; 32]>(),
        prop::option::of(prop::collection::vec(1u8..=255, 1..64)),
        prop::collection::vec(any::<u8>(), 0..128),
        prop::collection::vec(fact(), 0..6),
    )
        .prop_map(|(data, dh, ownership_proof, facts)| {
            let group = Group::rfc3526_2048();
            Contact {
                id: Id::new(data, IdType::User),
                dh_pub_key: dh.map(|bytes| group.element_from_bytes(&bytes).unwrap()),
                ownership_proof,
                facts: FactList::from(facts),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_contact_roundtrip(contact in contact()) {
        let marshalled = contact.marshal().unwrap();
        prop_assert_eq!(Contact::unmarshal(marshalled.as_bytes()).unwrap(), contact);
    }

    #[test]
    fn prop_contact_marshal_is_deterministic(contact in contact()) {
        prop_assert_eq!(contact.marshal().unwrap(), contact.clone().marshal().unwrap());
    }

    #[test]
    fn prop_fact_list_roundtrip(facts in prop::collection::vec(fact(), 0..10)) {
        let list = FactList::from(facts);
        prop_assert_eq!(FactList::parse(&list.stringify()).unwrap(), list);
    }

    #[test]
    fn prop_codename_fits(seed in any::<[u8; 32]>()) {
        let id = PrivateIdentity::from_signing_key(SigningKey::from_bytes(&seed), Codeset::V0);
        let identity = id.identity();
        prop_assert!(identity.codename().chars().count() <= MAX_CODENAME_LEN);
        prop_assert_eq!(identity, &Identity::from_public_key(*identity.public_key(), Codeset::V0));
    }

    #[test]
    fn prop_public_identity_roundtrip(seed in any::<[u8; 32]>()) {
        let id = PrivateIdentity::from_signing_key(SigningKey::from_bytes(&seed), Codeset::V0);
        let bytes = id.identity().marshal();
        prop_assert_eq!(&Identity::unmarshal(&bytes).unwrap(), id.identity());
    }

    #[test]
    fn prop_contact_decoder_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Contact::unmarshal(&data);
    }

    #[test]
    fn prop_backup_header_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = backup::read_header(&data);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_contact_body_tamper_detected(
        contact in contact(),
        flip in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        let marshalled = contact.marshal().unwrap();
        let encoded = &marshalled["<xxc(2)".len()..marshalled.len() - "xxc>".len()];
        let mut body = STANDARD.decode(encoded).unwrap();
        let i = flip.index(body.len());
        // The 8-byte group tag ahead of the DH value is not checksummed
        let tag = 33 + 2..33 + 2 + 8;
        prop_assume!(contact.dh_pub_key.is_none() || !tag.contains(&i));
        body[i] ^= 1 << bit;

        let tampered = format!("<xxc(2){}xxc>", STANDARD.encode(&body));
        prop_assert!(Contact::unmarshal(tampered.as_bytes()).is_err());
    }
}
