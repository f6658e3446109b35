//! randomness capability
//!
//! every operation that draws randomness takes `&mut R` with `R: SecureRng`,
//! so production code passes `OsRng` and tests pass a seeded chacha stream.

use rand::rngs::OsRng;
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};

/// a cryptographically secure random source
pub trait SecureRng: RngCore + CryptoRng {}

impl<T: RngCore + CryptoRng + ?Sized> SecureRng for T {}

/// deterministic rng for tests and reproducible simulations
pub fn seeded(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// chacha stream keyed from the operating system
pub fn from_os() -> ChaCha20Rng {
    ChaCha20Rng::from_seed(OsRng.gen())
}
