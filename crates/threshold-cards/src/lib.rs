//! threshold and mental-poker cryptography over secp256k1
//!
//! lets mutually distrusting peers deal cards and tally secret values with
//! no trusted dealer. every function is synchronous and pure over its
//! inputs apart from drawing randomness from an injected [`SecureRng`].
//!
//! # Components
//!
//! - [`curve`]: scalars, points, hex codecs, lagrange coefficients
//! - [`cipher`]: commutative (SRA) card encryption, deck helpers
//! - [`elgamal`]: exponential ec-elgamal with threshold partial decryption
//! - [`dkg`]: feldman vss and a dealerless 2-of-n key generation
//! - [`dleq`]: chaum-pedersen proofs that a partial decryption is honest
//! - [`shamir`]: K-of-N sharing over GF(2^256 - 189) for key escrow
//! - [`tally`]: verified combination of partial decryptions
//! - [`wire`]: camelCase hex payloads for the transport
//!
//! # Example
//!
//! ```ignore
//! use threshold_cards::{dkg::DkgParticipant, elgamal, tally, rng};
//!
//! let mut rng = rng::from_os();
//! let mut me = DkgParticipant::new(1, 2)?;
//! let commitment = me.commit(&mut rng)?;
//! // ... broadcast commitment, exchange shares, verify_shares ...
//! let output = me.finalize()?;
//!
//! let (ct, _) = elgamal::encrypt_exp_random(&output.aggregate_public_key, 3, &mut rng)?;
//! let partial = tally::partial_decryption(&ct, output.index, &output.private_share, "threshold-tally|round:1", &mut rng)?;
//! ```

pub mod cipher;
pub mod config;
pub mod curve;
pub mod dkg;
pub mod dleq;
pub mod elgamal;
mod error;
pub mod lagrange;
pub mod rng;
pub mod shamir;
pub mod tally;
pub mod wire;

pub use cipher::{CardLookup, EncryptedCard};
pub use config::ThresholdConfig;
pub use curve::{KeyPair, Point, Scalar};
pub use dkg::{DealerCommitment, DkgOutput, DkgParticipant, DkgPhase};
pub use dleq::{DleqProof, DleqStatement};
pub use elgamal::ElGamalCiphertext;
pub use error::{Error, Result};
pub use rng::SecureRng;
pub use shamir::{KeyShare, SecretShare, SharingParams};
pub use tally::PartialDecryption;
