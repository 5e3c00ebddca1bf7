//! Caller-supplied randomness.
//!
//! Every operation that needs entropy takes a `CryptoRngCore` from the
//! caller. Production code passes `OsRng`; tests pass seeded generators so
//! outputs are reproducible.

pub use rand_core::{CryptoRng, CryptoRngCore, OsRng, RngCore};

use crate::error::{CryptoError, Result};

/// Fill `buf` from `rng`, reporting a failed or short read as
/// [`CryptoError::EntropyExhausted`].
pub fn fill(rng: &mut impl CryptoRngCore, buf: &mut [u8]) -> Result<()> {
    rng.try_fill_bytes(buf).map_err(|e| {
        tracing::debug!(requested = buf.len(), error = %e, "random source failed");
        CryptoError::EntropyExhausted { requested: buf.len() }
    })
}

/// Draw `N` random bytes.
pub fn random_array<const N: usize>(rng: &mut impl CryptoRngCore) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    fill(rng, &mut out)?;
    Ok(out)
}

#[cfg(test)]
pub(crate) mod testing {
    use rand_core::{CryptoRng, Error, RngCore, impls};

    /// Deterministic source yielding 1, 2, 3, ... (wrapping).
    #[derive(Debug, Clone, Default)]
    pub struct CountingRng {
        next: u8,
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            impls::next_u32_via_fill(self)
        }

        fn next_u64(&mut self) -> u64 {
            impls::next_u64_via_fill(self)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for byte in dest {
                self.next = self.next.wrapping_add(1);
                *byte = self.next;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for CountingRng {}

    /// Source that always fails.
    #[derive(Debug, Clone, Default)]
    pub struct DrainedRng;

    impl RngCore for DrainedRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), Error> {
            Err(Error::new("drained"))
        }
    }

    impl CryptoRng for DrainedRng {}
}
