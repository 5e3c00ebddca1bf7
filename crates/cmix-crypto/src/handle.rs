//! Typed fixed-size byte handles.
//!
//! Keys, fingerprints and identifiers travel between layers as newtypes over
//! byte arrays. They print and serialize as standard base64 and parse back
//! from the same form. Secret handles redact their `Debug` output and wipe
//! themselves on drop.

/// Define a fixed-size byte handle.
///
/// `public` handles are `Copy` and print their contents in `Debug`.
/// `secret` handles are zeroized on drop and redact `Debug`.
macro_rules! byte_handle {
    ($(#[$meta:meta])* public $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        $crate::handle::byte_handle!(@common $name, $len);
    };

    ($(#[$meta:meta])* secret $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, ::zeroize::Zeroize, ::zeroize::ZeroizeOnDrop)]
        pub struct $name([u8; $len]);

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}(..)", stringify!($name))
            }
        }

        $crate::handle::byte_handle!(@common $name, $len);
    };

    (@common $name:ident, $len:expr) => {
        impl $name {
            /// Size in bytes
            pub const SIZE: usize = $len;

            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Parse from a slice of exactly [`Self::SIZE`] bytes.
            pub fn from_slice(bytes: &[u8]) -> $crate::error::Result<Self> {
                let arr: [u8; $len] = bytes.try_into().map_err(|_| {
                    $crate::error::CryptoError::malformed(format!(
                        "{}: expected {} bytes, got {}",
                        stringify!($name),
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(arr))
            }

            /// Parse from standard base64.
            pub fn from_base64(s: &str) -> $crate::error::Result<Self> {
                use ::base64::Engine as _;
                let bytes = ::base64::engine::general_purpose::STANDARD.decode(s).map_err(|e| {
                    $crate::error::CryptoError::malformed(format!(
                        "{}: {e}",
                        stringify!($name)
                    ))
                })?;
                Self::from_slice(&bytes)
            }

            /// Raw bytes.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Copy of the raw bytes.
            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                use ::base64::Engine as _;
                f.write_str(&::base64::engine::general_purpose::STANDARD.encode(self.0))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::from_base64(&s).map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use byte_handle;

byte_handle! {
    /// 32-byte routing fingerprint.
    ///
    /// The top bit of byte 0 is always clear so the value stays a valid group
    /// element in downstream arithmetic.
    public Fingerprint, 32
}

impl Fingerprint {
    /// Build a fingerprint from a digest, clearing the top bit.
    pub fn from_digest(mut digest: [u8; 32]) -> Self {
        crate::hash::clear_top_bit(&mut digest);
        Self(digest)
    }
}

byte_handle! {
    /// 32-byte message authentication code, top bit of byte 0 clear.
    public Mac, 32
}

impl Mac {
    /// Build a MAC from an HMAC output, clearing the top bit.
    pub fn from_digest(mut digest: [u8; 32]) -> Self {
        crate::hash::clear_top_bit(&mut digest);
        Self(digest)
    }

    /// Constant-time comparison against received bytes.
    pub fn verify(&self, received: &[u8]) -> bool {
        crate::hash::ct_eq(&self.0, received)
    }
}
