//! Contact records.
//!
//! A marshalled contact is `<xxc(V)` + base64(body) + `xxc>`. The writer
//! always emits the current version (2). Versions 1 and 0 are read-only.
//!
//! Version 2 body:
//!
//! ```text
//! id(33) || LE16 len || dh_key (group-tagged) ||
//! LE16 len || ownership proof ||
//! LE16 len || facts ||
//! checksum(16) = BLAKE2b-256(id || dh_value || ownership || facts)[..16]
//! ```
//!
//! The checksum covers the big-endian DH value only, not its group tag.
//!
//! Version 1 is the same layout with an MD5 checksum. Version 0 starts with
//! three 8-byte uvarint length slots (DH key, ownership, facts), then the ID
//! and the three fields. Its DH key is `uvarint(group fingerprint) || value`,
//! and it has no checksum.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use cmix_crypto::{
    cyclic::Element,
    hash::{cmix_hash, ct_eq},
    id::{ID_LEN, Id},
    rsa::BigUint,
};
use md5::{Digest as _, Md5};
use qrcode::{EcLevel, QrCode, render::svg};
use sha2::Sha256;

use crate::{
    error::{CodecError, Result},
    fact::FactList,
};

const FORMAT: &str = "contact";
const OPEN_TAG: &str = "<xxc(";
const CLOSE_TAG: &str = "xxc>";
const CHECKSUM_LEN: usize = 16;
const LEN_PREFIX: usize = 2;
const V0_SLOT: usize = 8;
const FINGERPRINT_CHARS: usize = 15;

/// Contact encoding versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// Length-slot header, legacy DH encoding, no checksum
    V0,
    /// Current layout with an MD5 checksum
    V1,
    /// Current layout with a BLAKE2b checksum
    V2,
}

impl Version {
    /// Version written by [`Contact::marshal`]
    pub const CURRENT: Self = Self::V2;

    /// Tag text between the parentheses.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V0 => "0",
            Self::V1 => "1",
            Self::V2 => "2",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "0" => Ok(Self::V0),
            "1" => Ok(Self::V1),
            "2" => Ok(Self::V2),
            other => Err(CodecError::VersionUnsupported { format: FORMAT, version: other.into() }),
        }
    }
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrLevel {
    /// ~7% recovery
    Low,
    /// ~15% recovery
    #[default]
    Medium,
    /// ~25% recovery
    Quartile,
    /// ~30% recovery
    High,
}

impl From<QrLevel> for EcLevel {
    fn from(level: QrLevel) -> Self {
        match level {
            QrLevel::Low => Self::L,
            QrLevel::Medium => Self::M,
            QrLevel::Quartile => Self::Q,
            QrLevel::High => Self::H,
        }
    }
}

/// A shareable contact record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Network ID
    pub id: Id,
    /// DH public key, if known
    pub dh_pub_key: Option<Element>,
    /// Proof of ownership issued by the registrar
    pub ownership_proof: Vec<u8>,
    /// Discoverable facts
    pub facts: FactList,
}

impl Contact {
    /// Contact with only an ID.
    pub fn new(id: Id) -> Self {
        Self { id, dh_pub_key: None, ownership_proof: Vec::new(), facts: FactList::new() }
    }

    /// Encode at the current version.
    ///
    /// # Errors
    ///
    /// - `Malformed` if a field is longer than 65535 bytes
    pub fn marshal(&self) -> Result<String> {
        let body = encode_body(self, Checksum::Blake2b)?;
        Ok(wrap(Version::CURRENT, &body))
    }

    /// Decode any supported version.
    ///
    /// # Errors
    ///
    /// - `TagMismatch` if the `<xxc(..)` / `xxc>` envelope is missing
    /// - `VersionUnsupported` for unknown versions
    /// - `Malformed` on base64 or length errors
    /// - `ChecksumMismatch` if the stored checksum does not verify
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let (version, body) = unwrap_envelope(data)?;
        let contact = match version {
            Version::V2 => decode_body(&body, Checksum::Blake2b),
            Version::V1 => decode_body(&body, Checksum::Md5),
            Version::V0 => decode_v0(&body),
        };
        if let Err(e) = &contact {
            tracing::debug!(version = version.as_str(), error = %e, "contact rejected");
        }
        contact
    }

    /// Short fingerprint for display: base64(SHA-256(id || dh_key))[..15].
    pub fn fingerprint(&self) -> String {
        let mut h = Sha256::new();
        h.update(self.id.as_bytes());
        h.update(self.dh_bytes());
        let mut encoded = STANDARD.encode(h.finalize());
        encoded.truncate(FINGERPRINT_CHARS);
        encoded
    }

    /// Marshalled contact rendered as an SVG QR code.
    pub fn qr_svg(&self, level: QrLevel, size: u32) -> Result<String> {
        let data = self.marshal()?;
        let code = QrCode::with_error_correction_level(data.as_bytes(), level.into())
            .map_err(|e| CodecError::QrCode { reason: e.to_string() })?;
        Ok(code.render::<svg::Color<'_>>().min_dimensions(size, size).build())
    }

    fn dh_bytes(&self) -> Vec<u8> {
        self.dh_pub_key.as_ref().map(Element::bytes).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
enum Checksum {
    Md5,
    Blake2b,
}

impl Checksum {
    fn compute(self, contact: &Contact, facts: &str) -> [u8; CHECKSUM_LEN] {
        let dh = contact.dh_bytes();
        let parts: [&[u8]; 4] =
            [contact.id.as_bytes(), &dh, &contact.ownership_proof, facts.as_bytes()];

        let mut out = [0u8; CHECKSUM_LEN];
        match self {
            Self::Blake2b => out.copy_from_slice(&cmix_hash(&parts)[..CHECKSUM_LEN]),
            Self::Md5 => {
                let mut h = Md5::new();
                for part in parts {
                    h.update(part);
                }
                out.copy_from_slice(&h.finalize());
            },
        }
        out
    }
}

fn wrap(version: Version, body: &[u8]) -> String {
    format!("{OPEN_TAG}{}){}{CLOSE_TAG}", version.as_str(), STANDARD.encode(body))
}

fn unwrap_envelope(data: &[u8]) -> Result<(Version, Vec<u8>)> {
    let tag_err = || CodecError::TagMismatch { format: FORMAT };

    let text = std::str::from_utf8(data).map_err(|_| tag_err())?;
    let rest = text.strip_prefix(OPEN_TAG).ok_or_else(tag_err)?;
    let (version, rest) = rest.split_once(')').ok_or_else(tag_err)?;
    let encoded = rest.strip_suffix(CLOSE_TAG).ok_or_else(tag_err)?;

    let version = Version::parse(version)?;
    let body = STANDARD
        .decode(encoded)
        .map_err(|e| CodecError::malformed(FORMAT, format!("base64: {e}")))?;
    Ok((version, body))
}

fn put_field(out: &mut Vec<u8>, name: &str, field: &[u8]) -> Result<()> {
    let len = u16::try_from(field.len()).map_err(|_| {
        CodecError::malformed(FORMAT, format!("{name} is {} bytes, maximum {}", field.len(), u16::MAX))
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(field);
    Ok(())
}

fn encode_body(contact: &Contact, checksum: Checksum) -> Result<Vec<u8>> {
    let facts = contact.facts.stringify();
    let dh = contact.dh_pub_key.as_ref().map(Element::binary_encode).unwrap_or_default();

    let mut out = Vec::with_capacity(ID_LEN + 3 * LEN_PREFIX + dh.len() + facts.len() + CHECKSUM_LEN);
    out.extend_from_slice(contact.id.as_bytes());
    put_field(&mut out, "DH key", &dh)?;
    put_field(&mut out, "ownership proof", &contact.ownership_proof)?;
    put_field(&mut out, "facts", facts.as_bytes())?;
    out.extend_from_slice(&checksum.compute(contact, &facts));
    Ok(out)
}

/// Cursor over a body being decoded.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(CodecError::malformed(
                FORMAT,
                format!("{what}: need {n} bytes, {} left", self.buf.len()),
            ));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn field(&mut self, what: &str) -> Result<&'a [u8]> {
        let prefix = self.take(LEN_PREFIX, what)?;
        let len = u16::from_le_bytes([prefix[0], prefix[1]]);
        self.take(usize::from(len), what)
    }
}

fn parse_facts(bytes: &[u8]) -> Result<FactList> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| CodecError::malformed(FORMAT, "facts are not UTF-8"))?;
    FactList::parse(text)
}

fn decode_body(body: &[u8], checksum: Checksum) -> Result<Contact> {
    let mut r = Reader { buf: body };
    let id = Id::from_bytes(r.take(ID_LEN, "ID")?)?;
    let dh = r.field("DH key")?;
    let ownership_proof = r.field("ownership proof")?.to_vec();
    let facts_bytes = r.field("facts")?;
    let stored = r.take(CHECKSUM_LEN, "checksum")?;
    if !r.buf.is_empty() {
        return Err(CodecError::malformed(FORMAT, format!("{} trailing bytes", r.buf.len())));
    }

    let dh_pub_key = if dh.is_empty() { None } else { Some(Element::binary_decode(dh)?) };
    let facts = parse_facts(facts_bytes)?;
    let contact = Contact { id, dh_pub_key, ownership_proof, facts };

    let text = std::str::from_utf8(facts_bytes).unwrap_or_default();
    if !ct_eq(&checksum.compute(&contact, text), stored) {
        return Err(CodecError::ChecksumMismatch { format: FORMAT });
    }
    Ok(contact)
}

fn decode_v0(body: &[u8]) -> Result<Contact> {
    let mut r = Reader { buf: body };
    let mut lens = [0usize; 3];
    for len in &mut lens {
        let slot = r.take(V0_SLOT, "length slot")?;
        let (value, _) = read_uvarint(slot)?;
        *len = usize::try_from(value)
            .map_err(|_| CodecError::malformed(FORMAT, "length slot overflows"))?;
    }

    let id = Id::from_bytes(r.take(ID_LEN, "ID")?)?;
    let dh = r.take(lens[0], "DH key")?;
    let ownership_proof = r.take(lens[1], "ownership proof")?.to_vec();
    let facts = parse_facts(r.take(lens[2], "facts")?)?;
    if !r.buf.is_empty() {
        return Err(CodecError::malformed(FORMAT, format!("{} trailing bytes", r.buf.len())));
    }

    let dh_pub_key = if dh.is_empty() {
        None
    } else {
        let (fingerprint, used) = read_uvarint(dh)?;
        let value = &dh[used..];
        if value.is_empty() {
            return Err(CodecError::malformed(FORMAT, "legacy DH key has no value"));
        }
        Some(Element::from_parts(BigUint::from_bytes_be(value), fingerprint))
    };

    Ok(Contact { id, dh_pub_key, ownership_proof, facts })
}

/// Decode an unsigned LEB128 varint, returning the value and bytes used.
fn read_uvarint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate().take(10) {
        let bits = u64::from(byte & 0x7f);
        if i == 9 && byte > 1 {
            break;
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::malformed(FORMAT, "bad uvarint"))
}
