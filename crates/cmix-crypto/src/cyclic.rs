//! Multiplicative cyclic groups for Diffie-Hellman keys.
//!
//! A [`Group`] is a prime modulus and a generator. Its 64-bit fingerprint is
//! the first eight bytes of cMix-hash(p || g), big-endian, and travels with
//! every encoded [`Element`] so a decoder can tell which group a value
//! belongs to.

use std::fmt;

use rsa::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CryptoError, Result},
    hash::{cmix_hash, ct_eq},
    rng::{self, CryptoRngCore},
};

/// Length of the group fingerprint prefix in [`Element::binary_encode`]
pub const FINGERPRINT_LEN: usize = 8;

/// Default DH private key size in bytes
pub const DEFAULT_PRIVATE_KEY_LEN: usize = 32;

/// Draws before [`Group::generate_private`] gives up on a length that cannot
/// land in range.
const MAX_PRIVATE_DRAWS: usize = 1024;

const RFC3526_2048_PRIME: &str = "\
    FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74\
    020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437\
    4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
    EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05\
    98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB\
    9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
    E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718\
    3995497CEA956AE515D2261898FA051015728E5A8AACAA68FFFFFFFFFFFFFFFF";

/// A prime-order-modulus cyclic group.
#[derive(Clone, PartialEq, Eq)]
pub struct Group {
    prime: BigUint,
    generator: BigUint,
    fingerprint: u64,
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("bits", &self.prime.bits())
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .finish()
    }
}

impl Group {
    /// Build a group from a prime and a generator.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the generator is not in `[2, p-1)`
    pub fn new(prime: BigUint, generator: BigUint) -> Result<Self> {
        let two = BigUint::from(2u32);
        if prime <= BigUint::from(3u32) || generator < two || generator >= &prime - &BigUint::from(1u32)
        {
            return Err(CryptoError::InvalidKey { reason: "generator outside [2, p-1)".into() });
        }

        let digest = cmix_hash(&[prime.to_bytes_be().as_slice(), generator.to_bytes_be().as_slice()]);
        let mut fp = [0u8; FINGERPRINT_LEN];
        fp.copy_from_slice(&digest[..FINGERPRINT_LEN]);

        Ok(Self { prime, generator, fingerprint: u64::from_be_bytes(fp) })
    }

    /// The 2048-bit MODP group from RFC 3526, generator 2.
    pub fn rfc3526_2048() -> Self {
        let Some(prime) = BigUint::parse_bytes(RFC3526_2048_PRIME.as_bytes(), 16) else {
            unreachable!("RFC 3526 prime is valid hex")
        };
        let Ok(group) = Self::new(prime, BigUint::from(2u32)) else {
            unreachable!("RFC 3526 parameters are valid")
        };
        group
    }

    /// Prime modulus.
    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// Generator.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// 64-bit group fingerprint.
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Wrap `value` as an element of this group.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if `value` is not in `[1, p)`
    pub fn element(&self, value: BigUint) -> Result<Element> {
        if value < BigUint::from(1u32) || value >= self.prime {
            return Err(CryptoError::InvalidKey { reason: "value outside group".into() });
        }
        Ok(Element { value, fingerprint: self.fingerprint })
    }

    /// Wrap big-endian bytes as an element of this group.
    pub fn element_from_bytes(&self, bytes: &[u8]) -> Result<Element> {
        self.element(BigUint::from_bytes_be(bytes))
    }

    /// Decode a [`Element::binary_encode`] value, checking it belongs here.
    ///
    /// # Errors
    ///
    /// - `MalformedEncoding` on a short buffer
    /// - `InvalidKey` on a foreign fingerprint or out-of-range value
    pub fn binary_decode(&self, bytes: &[u8]) -> Result<Element> {
        let element = Element::binary_decode(bytes)?;
        if element.fingerprint != self.fingerprint {
            return Err(CryptoError::InvalidKey {
                reason: format!("element from group {:016x}", element.fingerprint),
            });
        }
        self.element(element.value)
    }

    /// Draw a DH private key of `len` bytes.
    ///
    /// Redraws until the value lies in `[2, p-1)`.
    ///
    /// # Errors
    ///
    /// - `KeyTooShort` if `len` is zero
    /// - `InvalidKey` if no draw lands in range, which happens when `len` is
    ///   far too long for the prime
    /// - `EntropyExhausted` if `rng` fails
    pub fn generate_private(&self, rng: &mut impl CryptoRngCore, len: usize) -> Result<Element> {
        if len == 0 {
            return Err(CryptoError::KeyTooShort { min: 1, actual: 0 });
        }
        let two = BigUint::from(2u32);
        let upper = &self.prime - &BigUint::from(1u32);
        let mut buf = vec![0u8; len];
        for _ in 0..MAX_PRIVATE_DRAWS {
            rng::fill(rng, &mut buf)?;
            let value = BigUint::from_bytes_be(&buf);
            if value >= two && value < upper {
                return Ok(Element { value, fingerprint: self.fingerprint });
            }
        }
        tracing::debug!(len, draws = MAX_PRIVATE_DRAWS, "no DH private key in range");
        Err(CryptoError::InvalidKey {
            reason: format!("{len}-byte draws never fell in [2, p-1)"),
        })
    }

    /// `g^private mod p`
    pub fn public_key(&self, private: &Element) -> Result<Element> {
        self.check_member(private)?;
        let value = self.generator.modpow(&private.value, &self.prime);
        Ok(Element { value, fingerprint: self.fingerprint })
    }

    /// `public^private mod p`
    pub fn shared_key(&self, public: &Element, private: &Element) -> Result<Element> {
        self.check_member(public)?;
        self.check_member(private)?;
        let value = public.value.modpow(&private.value, &self.prime);
        Ok(Element { value, fingerprint: self.fingerprint })
    }

    fn check_member(&self, element: &Element) -> Result<()> {
        if element.fingerprint == self.fingerprint {
            Ok(())
        } else {
            Err(CryptoError::InvalidKey {
                reason: format!("element from group {:016x}", element.fingerprint),
            })
        }
    }
}

/// A value in a [`Group`], tagged with the group's fingerprint.
#[derive(Clone)]
pub struct Element {
    value: BigUint,
    fingerprint: u64,
}

impl Element {
    /// Canonical big-endian bytes of the value.
    pub fn bytes(&self) -> Vec<u8> {
        self.value.to_bytes_be()
    }

    /// Value as a big integer.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Fingerprint of the owning group.
    pub const fn group_fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// `BE64(group fingerprint) || bytes()`
    pub fn binary_encode(&self) -> Vec<u8> {
        let mut out = self.fingerprint.to_be_bytes().to_vec();
        out.extend_from_slice(&self.bytes());
        out
    }

    /// Decode a `BE64(fingerprint) || value` buffer without group checks.
    pub fn binary_decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() <= FINGERPRINT_LEN {
            return Err(CryptoError::malformed(format!(
                "group element: need more than {FINGERPRINT_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let (fp, value) = bytes.split_at(FINGERPRINT_LEN);
        let mut fp_bytes = [0u8; FINGERPRINT_LEN];
        fp_bytes.copy_from_slice(fp);
        Ok(Self { value: BigUint::from_bytes_be(value), fingerprint: u64::from_be_bytes(fp_bytes) })
    }

    /// Rebuild an element from a value and a group fingerprint.
    pub fn from_parts(value: BigUint, group_fingerprint: u64) -> Self {
        Self { value, fingerprint: group_fingerprint }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint && ct_eq(&self.bytes(), &other.bytes())
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.value.to_str_radix(16);
        let head = hex.get(..8).unwrap_or(&hex);
        write!(f, "Element({head}... in {:016x})", self.fingerprint)
    }
}

#[derive(Serialize, Deserialize)]
struct ElementJson {
    value: String,
    fingerprint: u64,
}

impl Serialize for Element {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ElementJson { value: self.value.to_str_radix(16), fingerprint: self.fingerprint }
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = ElementJson::deserialize(deserializer)?;
        let value = BigUint::parse_bytes(json.value.as_bytes(), 16)
            .ok_or_else(|| serde::de::Error::custom("group element value is not hex"))?;
        Ok(Self { value, fingerprint: json.fingerprint })
    }
}

#[derive(Serialize, Deserialize)]
struct GroupJson {
    prime: String,
    generator: String,
}

impl Serialize for Group {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        GroupJson { prime: self.prime.to_str_radix(16), generator: self.generator.to_str_radix(16) }
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = GroupJson::deserialize(deserializer)?;
        let parse = |s: &str| {
            BigUint::parse_bytes(s.as_bytes(), 16)
                .ok_or_else(|| serde::de::Error::custom("group parameter is not hex"))
        };
        Self::new(parse(&json.prime)?, parse(&json.generator)?).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Small group for fast tests: p = 2^64 - 59, g = 5.
    pub fn small_group() -> Group {
        let Ok(group) = Group::new(BigUint::from(u64::MAX - 58), BigUint::from(5u32)) else {
            unreachable!()
        };
        group
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{testing::small_group, *};
    use crate::error::ErrorKind;

    #[test]
    fn small_group_fingerprint() {
        assert_eq!(small_group().fingerprint(), 0x8b83_9ef4_a4f8_9a53);
    }

    #[test]
    fn rfc3526_group() {
        let group = Group::rfc3526_2048();
        assert_eq!(group.prime().bits(), 2048);
        assert_eq!(group.generator(), &BigUint::from(2u32));
        assert_eq!(group.fingerprint(), 0xb79a_e44e_0d6d_a7b2);
    }

    #[test]
    fn dh_known_answer() {
        let group = small_group();
        let x = group.element(BigUint::from(0x0102_0304_0506_0708u64)).unwrap();
        let y = group.element(BigUint::from(0x1112_1314_1516_1718u64)).unwrap();

        let big_x = group.public_key(&x).unwrap();
        let big_y = group.public_key(&y).unwrap();
        assert_eq!(big_x.value(), &BigUint::from(0xa6ef_d16a_882f_ed8du64));
        assert_eq!(big_y.value(), &BigUint::from(0x93c6_e528_9e67_3a87u64));

        let shared = group.shared_key(&big_y, &x).unwrap();
        assert_eq!(shared.value(), &BigUint::from(0x6ff4_fdef_c4d0_3651u64));
        assert_eq!(shared, group.shared_key(&big_x, &y).unwrap());
    }

    #[test]
    fn dh_agreement_in_modp_group() {
        let group = Group::rfc3526_2048();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let a = group.generate_private(&mut rng, DEFAULT_PRIVATE_KEY_LEN).unwrap();
        let b = group.generate_private(&mut rng, DEFAULT_PRIVATE_KEY_LEN).unwrap();
        let pa = group.public_key(&a).unwrap();
        let pb = group.public_key(&b).unwrap();
        assert_eq!(group.shared_key(&pb, &a).unwrap(), group.shared_key(&pa, &b).unwrap());
    }

    #[test]
    fn generate_private_rejects_unusable_lengths() {
        let group = small_group();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let err = group.generate_private(&mut rng, 0).unwrap_err();
        assert_eq!(err, CryptoError::KeyTooShort { min: 1, actual: 0 });

        // 32 random bytes essentially never fall below a 64-bit prime
        let err = group.generate_private(&mut rng, 32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);

        let key = group.generate_private(&mut rng, 1).unwrap();
        assert!(key.value() >= &BigUint::from(2u32));
    }

    #[test]
    fn binary_encode_prefixes_fingerprint() {
        let group = small_group();
        let e = group.element(BigUint::from(0x0102u32)).unwrap();
        let encoded = e.binary_encode();
        assert_eq!(hex::encode(&encoded), "8b839ef4a4f89a530102");
        assert_eq!(group.binary_decode(&encoded).unwrap(), e);
    }

    #[test]
    fn binary_decode_rejects_foreign_group_and_short_input() {
        let group = small_group();
        let foreign = Group::rfc3526_2048().element(BigUint::from(7u32)).unwrap();
        let err = group.binary_decode(&foreign.binary_encode()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);

        let err = group.binary_decode(&[0u8; 8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding);
    }

    #[test]
    fn element_range_is_checked() {
        let group = small_group();
        assert!(group.element(BigUint::from(0u32)).is_err());
        assert!(group.element(group.prime().clone()).is_err());
        assert!(Group::new(BigUint::from(23u32), BigUint::from(1u32)).is_err());
    }

    #[test]
    fn shared_key_rejects_mixed_groups() {
        let small = small_group();
        let modp = Group::rfc3526_2048();
        let private = small.element(BigUint::from(5u32)).unwrap();
        let public = modp.element(BigUint::from(9u32)).unwrap();
        assert!(small.shared_key(&public, &private).is_err());
    }

    #[test]
    fn json_roundtrip() {
        let group = small_group();
        let e = group.element(BigUint::from(0xdead_beefu32)).unwrap();
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("deadbeef"));
        assert_eq!(serde_json::from_str::<Element>(&json).unwrap(), e);

        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(serde_json::from_str::<Group>(&json).unwrap(), group);
    }
}
