//! error types for threshold-cards

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // === encoding errors ===
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid scalar encoding (expected 64 hex chars below the group order)")]
    InvalidScalar,

    #[error("invalid point encoding (expected 66 hex chars on secp256k1 or \"00\")")]
    InvalidPoint,

    // === arithmetic errors ===
    #[error("scalar must be non-zero")]
    ZeroScalar,

    #[error("point must not be the identity")]
    IdentityPoint,

    // === card cipher errors ===
    #[error("cannot decrypt a plaintext card (layers = 0)")]
    PlaintextCard,

    #[error("card is still encrypted under {layers} layer(s)")]
    StillEncrypted { layers: u32 },

    #[error("decrypted point does not match any card in the deck")]
    UnknownCard,

    // === elgamal errors ===
    #[error("encoded message (m + offset) is zero mod n")]
    DegenerateMessage,

    // === interpolation errors ===
    #[error("no indices provided")]
    EmptyIndexSet,

    #[error("index must be in 1..={max}, got {index}")]
    InvalidIndex { index: u32, max: u32 },

    #[error("duplicate participant index: {0}")]
    DuplicateIndex(u32),

    #[error("conflicting shares for index {0}")]
    ConflictingShare(u32),

    // === threshold errors ===
    #[error("invalid threshold {threshold} for {total} shares")]
    InvalidThreshold { threshold: usize, total: usize },

    #[error("insufficient shares: provided {shares_provided}, threshold requires {threshold_required}")]
    InsufficientShares {
        shares_provided: usize,
        threshold_required: usize,
    },

    #[error("secret is out of range for the sharing field")]
    SecretOutOfRange,

    #[error("reconstructed key does not match the expected public key")]
    RecoveredKeyMismatch,

    #[error("shares were issued by different owners or thresholds")]
    MixedShares,

    // === dkg errors ===
    #[error("dkg phase violation: expected {expected}, currently {actual}")]
    PhaseViolation {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown participant: {0}")]
    UnknownParticipant(u32),

    #[error("missing contributions from participants {missing:?}")]
    MissingContributions { missing: Vec<u32> },

    #[error("dealers {dealers:?} sent shares that fail verification")]
    DealerFault { dealers: Vec<u32> },

    // === proof errors ===
    #[error("secret does not satisfy the dleq statement")]
    StatementMismatch,

    // === tally errors ===
    #[error("partial decryption from participant {index} has an invalid proof")]
    InvalidPartialDecryption { index: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
