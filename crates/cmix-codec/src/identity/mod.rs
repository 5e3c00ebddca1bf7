//! Channel identities and their codenames.
//!
//! A channel identity is an Ed25519 key pair. The public key maps
//! deterministically to a codename (`honorific adjective noun`), a color and
//! a 30-character extension, so peers can recognize each other without a
//! directory.
//!
//! # Codename derivation (codeset 0)
//!
//! ```text
//! input = pubkey
//! loop:
//!     input     = H(input || "codenamePubkeyHashingConstant")
//!     honorific = sample(HONORIFICS, input, "honorificSalt")
//!     adjective = sample(ADJECTIVES, input, "adjectiveSalt")
//!     noun      = sample(NOUNS, input, "nounSalt")
//!     stop when honorific + adjective + noun is at most 32 characters
//! ```
//!
//! `sample` rehashes `data = H(data || salt)` and masks the first eight
//! bytes (big-endian) to the list's bit depth until the index lands inside
//! the list, which keeps every entry equally likely.

mod words;

use std::{fmt, sync::LazyLock};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use cmix_crypto::{
    CryptoError, aead,
    hash::cmix_hash,
    kdf::{self, Params},
    rng::CryptoRngCore,
};
use ed25519_dalek::{KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use crate::error::{CodecError, Result};

const FORMAT: &str = "channel identity";

/// Longest codename, in characters.
pub const MAX_CODENAME_LEN: usize = 32;

/// Length of the extension, in base64 characters.
pub const EXTENSION_LEN: usize = 30;

/// Version byte of the public and private encodings.
pub const ENCODING_VERSION: u8 = 1;

/// Length of [`Identity::marshal`] output.
pub const PUBLIC_ENCODED_LEN: usize = 2 + PUBLIC_KEY_LENGTH;

/// Length of the private payload inside an export.
pub const PRIVATE_ENCODED_LEN: usize = 2 + KEYPAIR_LENGTH + PUBLIC_KEY_LENGTH;

const PUBKEY_CONSTANT: &[u8] = b"codenamePubkeyHashingConstant";
const HONORIFIC_SALT: &[u8] = b"honorificSalt";
const ADJECTIVE_SALT: &[u8] = b"adjectiveSalt";
const NOUN_SALT: &[u8] = b"nounSalt";
const COLOR_SALT: &[u8] = b"colorSalt";
const EXTENSION_SALT: &[u8] = b"extensionSalt";

const OPEN_TAG: &str = "<xxChannelIdentity";
const CLOSE_TAG: &str = "xxChannelIdentity>";

/// Honorifics repeated by weight.
static HONORIFICS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    words::HONORIFICS
        .iter()
        .flat_map(|&(word, weight)| std::iter::repeat_n(word, weight))
        .collect()
});

/// Word lists and derivation rules used to build a codename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Codeset {
    /// The original English lists
    #[default]
    V0 = 0,
}

impl TryFrom<u8> for Codeset {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::V0),
            other => Err(CodecError::VersionUnsupported {
                format: "codeset",
                version: other.to_string(),
            }),
        }
    }
}

/// Public half of a channel identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    public_key: VerifyingKey,
    honorific: &'static str,
    adjective: String,
    noun: String,
    codename: String,
    color: &'static str,
    extension: String,
    codeset: Codeset,
}

impl Identity {
    /// Derive the codename, color and extension of `public_key`.
    pub fn from_public_key(public_key: VerifyingKey, codeset: Codeset) -> Self {
        match codeset {
            Codeset::V0 => Self::construct_v0(public_key),
        }
    }

    fn construct_v0(public_key: VerifyingKey) -> Self {
        let pubkey = public_key.as_bytes();

        let mut input: [u8; 32] = cmix_hash(&[pubkey, PUBKEY_CONSTANT]);
        let (honorific, adjective, noun, codename) = loop {
            let honorific = sample(&HONORIFICS, &input, HONORIFIC_SALT);
            let mut adjective = sample(words::ADJECTIVES, &input, ADJECTIVE_SALT).to_owned();
            let mut noun = sample(words::NOUNS, &input, NOUN_SALT).to_owned();

            if !honorific.is_empty() {
                adjective = title_case(&adjective);
            }
            if !honorific.is_empty() || !adjective.is_empty() {
                noun = title_case(&noun);
            }

            let codename = format!("{honorific}{adjective}{noun}");
            if codename.chars().count() <= MAX_CODENAME_LEN {
                break (honorific, adjective, noun, codename);
            }
            tracing::trace!(len = codename.chars().count(), "codename too long, rehashing");
            input = cmix_hash(&[&input, PUBKEY_CONSTANT]);
        };

        let color = sample(words::COLORS, pubkey, COLOR_SALT);

        let mut extension = STANDARD.encode(cmix_hash(&[pubkey, EXTENSION_SALT]));
        extension.truncate(EXTENSION_LEN);

        Self {
            public_key,
            honorific,
            adjective,
            noun,
            codename,
            color,
            extension,
            codeset: Codeset::V0,
        }
    }

    /// Ed25519 public key.
    pub const fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    /// Honorific; may be empty.
    pub const fn honorific(&self) -> &str {
        self.honorific
    }

    /// Adjective, title-cased after a non-empty honorific.
    pub fn adjective(&self) -> &str {
        &self.adjective
    }

    /// Noun, title-cased after a non-empty prefix.
    pub fn noun(&self) -> &str {
        &self.noun
    }

    /// Honorific, adjective and noun concatenated.
    pub fn codename(&self) -> &str {
        &self.codename
    }

    /// Color as `0xRRGGBB`.
    pub const fn color(&self) -> &str {
        self.color
    }

    /// First 30 characters of a base64 digest of the public key.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Codeset used to derive the codename.
    pub const fn codeset(&self) -> Codeset {
        self.codeset
    }

    /// `version || codeset || public key`
    pub fn marshal(&self) -> [u8; PUBLIC_ENCODED_LEN] {
        let mut out = [0u8; PUBLIC_ENCODED_LEN];
        out[0] = ENCODING_VERSION;
        out[1] = self.codeset as u8;
        out[2..].copy_from_slice(self.public_key.as_bytes());
        out
    }

    /// Inverse of [`Identity::marshal`]; recomputes the codename.
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let Ok(bytes) = <[u8; PUBLIC_ENCODED_LEN]>::try_from(data) else {
            return Err(CodecError::malformed(
                FORMAT,
                format!("public identity is {} bytes, expected {PUBLIC_ENCODED_LEN}", data.len()),
            ));
        };
        check_version(bytes[0])?;
        let codeset = Codeset::try_from(bytes[1])?;
        let public_key = verifying_key(&bytes[2..])?;
        Ok(Self::from_public_key(public_key, codeset))
    }
}

/// `codename#extensioncolor`
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}{}", self.codename, self.extension, self.color)
    }
}

/// A channel identity with its signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateIdentity {
    identity: Identity,
    signing_key: SigningKey,
}

impl PrivateIdentity {
    /// Generate a fresh identity under codeset 0.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        Self::from_signing_key(SigningKey::generate(rng), Codeset::V0)
    }

    /// Wrap an existing signing key.
    pub fn from_signing_key(signing_key: SigningKey, codeset: Codeset) -> Self {
        let identity = Identity::from_public_key(signing_key.verifying_key(), codeset);
        Self { identity, signing_key }
    }

    /// Public half.
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Ed25519 signing key.
    pub const fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Token that addresses direct messages to this identity.
    pub fn dm_token(&self) -> u32 {
        let digest = cmix_hash(&[self.signing_key.as_bytes()]);
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    /// Password-encrypt the identity for transport between devices.
    ///
    /// Output: `<xxChannelIdentity(1)` + base64(salt || params || blob) +
    /// `xxChannelIdentity>`.
    pub fn export(
        &self,
        rng: &mut impl CryptoRngCore,
        password: &[u8],
        params: &Params,
    ) -> Result<String> {
        let salt = kdf::make_salt(rng)?;
        let key = Zeroizing::new(kdf::derive_key(password, &salt, params)?);
        let payload = self.encode_private();
        let blob = aead::seal(rng, payload.as_slice(), key.as_slice())?;

        let mut body = Vec::with_capacity(kdf::SALT_LEN + Params::SIZE + blob.len());
        body.extend_from_slice(&salt);
        body.extend_from_slice(&params.marshal());
        body.extend_from_slice(&blob);

        let version = ExportVersion::CURRENT;
        Ok(format!("{OPEN_TAG}({}){}{CLOSE_TAG}", version.as_str(), STANDARD.encode(body)))
    }

    /// Decrypt an [`export`](Self::export) string.
    ///
    /// # Errors
    ///
    /// - `TagMismatch` if the envelope is missing
    /// - `VersionUnsupported` for unknown export versions or codesets
    /// - `Crypto(DecryptionFailed)` on a wrong password or tampered data
    pub fn import(password: &[u8], data: &[u8]) -> Result<Self> {
        let (version, body) = unwrap_envelope(data)?;
        let identity = version.decode(password, &body);
        if let Err(e) = &identity {
            tracing::debug!(version = version.as_str(), error = %e, "identity import failed");
        }
        identity
    }

    fn encode_private(&self) -> Zeroizing<[u8; PRIVATE_ENCODED_LEN]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_ENCODED_LEN]);
        out[0] = ENCODING_VERSION;
        out[1] = self.identity.codeset as u8;
        out[2..2 + KEYPAIR_LENGTH].copy_from_slice(&self.signing_key.to_keypair_bytes());
        out[2 + KEYPAIR_LENGTH..].copy_from_slice(self.identity.public_key.as_bytes());
        out
    }

    fn decode_private(payload: &[u8]) -> Result<Self> {
        if payload.len() != PRIVATE_ENCODED_LEN {
            return Err(CodecError::malformed(
                FORMAT,
                format!("payload is {} bytes, expected {PRIVATE_ENCODED_LEN}", payload.len()),
            ));
        }
        check_version(payload[0])?;
        let codeset = Codeset::try_from(payload[1])?;

        let mut keypair = Zeroizing::new([0u8; KEYPAIR_LENGTH]);
        keypair.copy_from_slice(&payload[2..2 + KEYPAIR_LENGTH]);
        let signing_key = SigningKey::from_keypair_bytes(&keypair)
            .map_err(|_| CryptoError::InvalidKey { reason: "Ed25519 key pair mismatch".into() })?;

        let public_key = verifying_key(&payload[2 + KEYPAIR_LENGTH..])?;
        if public_key != signing_key.verifying_key() {
            return Err(CryptoError::IdentityMismatch.into());
        }
        Ok(Self::from_signing_key(signing_key, codeset))
    }
}

impl fmt::Debug for PrivateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateIdentity").field("identity", &self.identity.to_string()).finish_non_exhaustive()
    }
}

/// Versions of the export envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportVersion {
    /// salt || params || XChaCha20-Poly1305 blob
    V1,
}

impl ExportVersion {
    /// Version written by [`PrivateIdentity::export`]
    pub const CURRENT: Self = Self::V1;

    /// Tag text between the parentheses.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "1" => Ok(Self::V1),
            other => Err(CodecError::VersionUnsupported { format: FORMAT, version: other.into() }),
        }
    }

    fn decode(self, password: &[u8], body: &[u8]) -> Result<PrivateIdentity> {
        match self {
            Self::V1 => {
                let header = kdf::SALT_LEN + Params::SIZE;
                if body.len() < header {
                    return Err(CodecError::malformed(
                        FORMAT,
                        format!("body is {} bytes, need at least {header}", body.len()),
                    ));
                }
                let (salt, rest) = body.split_at(kdf::SALT_LEN);
                let (params, blob) = rest.split_at(Params::SIZE);
                let params = Params::unmarshal(params)?;

                let key = Zeroizing::new(kdf::derive_key(password, salt, &params)?);
                let payload = Zeroizing::new(aead::decrypt(blob, key.as_slice())?);
                PrivateIdentity::decode_private(&payload)
            },
        }
    }
}

fn unwrap_envelope(data: &[u8]) -> Result<(ExportVersion, Vec<u8>)> {
    let tag_err = || CodecError::TagMismatch { format: FORMAT };

    let text = std::str::from_utf8(data).map_err(|_| tag_err())?;
    let start = text.find(OPEN_TAG).ok_or_else(tag_err)?;
    let inner = &text[start + OPEN_TAG.len()..];
    let end = inner.rfind(CLOSE_TAG).ok_or_else(tag_err)?;
    let inner = &inner[..end];

    let rest = inner.strip_prefix('(').ok_or_else(tag_err)?;
    let (version, encoded) = rest.split_once(')').ok_or_else(tag_err)?;
    let version = ExportVersion::parse(version)?;

    let body = STANDARD
        .decode(encoded)
        .map_err(|e| CodecError::malformed(FORMAT, format!("base64: {e}")))?;
    Ok((version, body))
}

fn check_version(version: u8) -> Result<()> {
    if version == ENCODING_VERSION {
        Ok(())
    } else {
        Err(CodecError::VersionUnsupported { format: FORMAT, version: version.to_string() })
    }
}

fn verifying_key(bytes: &[u8]) -> Result<VerifyingKey> {
    let Ok(bytes) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(bytes) else {
        return Err(CryptoError::InvalidKeyLength { expected: PUBLIC_KEY_LENGTH, actual: bytes.len() }.into());
    };
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| CryptoError::InvalidKey { reason: "not an Ed25519 point".into() }.into())
}

/// Pick a list entry uniformly by rehashing `seed` with `salt`.
fn sample<'a>(list: &[&'a str], seed: &[u8], salt: &[u8]) -> &'a str {
    let mask = bit_mask(list.len());
    let mut data = cmix_hash(&[seed, salt]);
    loop {
        let mut head = [0u8; 8];
        head.copy_from_slice(&data[..8]);
        let index = u64::from_be_bytes(head) & mask;
        if let Some(word) = usize::try_from(index).ok().and_then(|i| list.get(i)) {
            return word;
        }
        data = cmix_hash(&[&data, salt]);
    }
}

/// `(1 << ceil(log2(len))) - 1`
fn bit_mask(len: usize) -> u64 {
    let depth = len.next_power_of_two().trailing_zeros();
    (1u64 << depth) - 1
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use cmix_crypto::ErrorKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    const CHEAP: Params = Params { time: 1, memory: 256, threads: 1 };

    fn identity_from_seed(seed: [u8; 32]) -> PrivateIdentity {
        PrivateIdentity::from_signing_key(SigningKey::from_bytes(&seed), Codeset::V0)
    }

    #[test]
    fn weighted_honorifics_expand() {
        assert_eq!(HONORIFICS.len(), 6412);
        assert_eq!(HONORIFICS.iter().filter(|w| **w == "this").count(), 1000);
        assert_eq!(HONORIFICS.iter().filter(|w| **w == "emperor").count(), 1);
    }

    #[test]
    fn mask_covers_list() {
        assert_eq!(bit_mask(1), 0);
        assert_eq!(bit_mask(2), 1);
        assert_eq!(bit_mask(50), 63);
        assert_eq!(bit_mask(256), 255);
        assert_eq!(bit_mask(6412), 8191);
    }

    #[test]
    fn title_case_rules() {
        assert_eq!(title_case("wellKnown"), "WellKnown");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn known_codenames() {
        let cases = [
            ([0u8; 32], "thisStellarGrove#CzUU0K3gQg3PQy4szukioSojcU8EXv0x656D78"),
            ([1u8; 32], "crispPebble#y5P1X0twIMGyH3e8/8sDBS0LA76Yer0x48CFAD"),
            ([42u8; 32], "nauticalWalrus#Ryfgo5GlOtqRxg3iT0/uWZlIawuNjH0xCB99C9"),
        ];
        for (seed, expected) in cases {
            assert_eq!(identity_from_seed(seed).identity().to_string(), expected);
        }
    }

    #[test]
    fn known_dm_token() {
        assert_eq!(identity_from_seed([0u8; 32]).dm_token(), 0x89eb_0d6a);
    }

    #[test]
    fn codenames_fit_and_are_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let id = PrivateIdentity::generate(&mut rng);
            let identity = id.identity();
            assert!(identity.codename().chars().count() <= MAX_CODENAME_LEN);
            assert_eq!(identity.extension().len(), EXTENSION_LEN);
            assert!(words::COLORS.contains(&identity.color()));
            assert!(seen.insert(identity.to_string()));
        }
    }

    #[test]
    fn public_marshal_roundtrip() {
        let id = identity_from_seed([3u8; 32]);
        let bytes = id.identity().marshal();
        assert_eq!(bytes.len(), 34);
        assert_eq!(bytes[..2], [ENCODING_VERSION, 0]);
        assert_eq!(&Identity::unmarshal(&bytes).unwrap(), id.identity());
    }

    #[test]
    fn public_unmarshal_rejects_bad_input() {
        let mut bytes = identity_from_seed([3u8; 32]).identity().marshal();
        assert!(matches!(Identity::unmarshal(&bytes[..33]), Err(CodecError::Malformed { .. })));

        bytes[1] = 9;
        let err = Identity::unmarshal(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionUnsupported);
    }

    #[test]
    fn export_import_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let id = PrivateIdentity::generate(&mut rng);
        let exported = id.export(&mut rng, b"correct horse", &CHEAP).unwrap();

        assert!(exported.starts_with("<xxChannelIdentity(1)"));
        assert!(exported.ends_with("xxChannelIdentity>"));
        assert_eq!(PrivateIdentity::import(b"correct horse", exported.as_bytes()).unwrap(), id);
    }

    #[test]
    fn import_tolerates_surrounding_text() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let id = PrivateIdentity::generate(&mut rng);
        let exported = format!("  {}\n", id.export(&mut rng, b"pw", &CHEAP).unwrap());
        assert_eq!(PrivateIdentity::import(b"pw", exported.as_bytes()).unwrap(), id);
    }

    #[test]
    fn import_with_wrong_password_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let exported = PrivateIdentity::generate(&mut rng).export(&mut rng, b"right", &CHEAP).unwrap();

        let err = PrivateIdentity::import(b"wrong", exported.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn import_envelope_errors() {
        let err = PrivateIdentity::import(b"pw", b"no tags here").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagMismatch);

        let err = PrivateIdentity::import(b"pw", b"<xxChannelIdentity(9)AAAAxxChannelIdentity>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionUnsupported);

        let err = PrivateIdentity::import(b"pw", b"<xxChannelIdentity(1)AAAAxxChannelIdentity>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding);
    }

    #[test]
    fn private_payload_layout() {
        let id = identity_from_seed([5u8; 32]);
        let payload = id.encode_private();
        assert_eq!(payload.len(), 98);
        assert_eq!(payload[0], ENCODING_VERSION);
        assert_eq!(&payload[2..34], &[5u8; 32]);
        assert_eq!(&payload[66..], id.identity().public_key().as_bytes());
        assert_eq!(PrivateIdentity::decode_private(payload.as_slice()).unwrap(), id);
    }

    #[test]
    fn mismatched_public_key_is_rejected() {
        let id = identity_from_seed([5u8; 32]);
        let mut payload = *id.encode_private();
        payload[66..].copy_from_slice(identity_from_seed([6u8; 32]).identity().public_key().as_bytes());
        assert!(PrivateIdentity::decode_private(&payload).is_err());
    }

    #[test]
    fn debug_hides_signing_key() {
        let id = identity_from_seed([5u8; 32]);
        let debug = format!("{id:?}");
        assert!(debug.contains(id.identity().codename()));
        assert!(!debug.contains(&hex::encode([5u8; 32])));
    }
}
