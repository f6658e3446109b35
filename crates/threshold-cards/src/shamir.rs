//! shamir secret sharing over a 256-bit prime field
//!
//! generic K-of-N splitting used for private-key escrow, independent of the
//! dkg. the field is GF(p) with p = 2^256 - 189, the largest 256-bit prime,
//! so every secp256k1 scalar (< n < p) embeds directly. share values are
//! field elements and may exceed n; they travel as 32-byte big-endian values.
//!
//! escrow flow: when a player may abandon a game, they split their private
//! key with [`create_key_shares`] and hand one [`KeyShare`] to every other
//! player. if the owner disappears, the remaining players pool their shares
//! in [`recover_key`] and check the result against the owner's public key.

use num_bigint::BigUint;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::curve::{strip_hex_prefix, Point, Scalar, SCALAR_BYTES};
use crate::error::{Error, Result};
use crate::lagrange::{self, InterpolationField};
use crate::rng::SecureRng;

/// most shares a single split may produce
pub const MAX_SHARES: usize = 255;

/// p = 2^256 - 189, big-endian
const MODULUS_BYTES: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x43,
];

fn modulus() -> BigUint {
    BigUint::from_bytes_be(&MODULUS_BYTES)
}

/// element of GF(p)
#[derive(Clone, PartialEq, Eq)]
struct Fp(BigUint);

impl core::fmt::Debug for Fp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Fp(..)")
    }
}

impl Fp {
    fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let v = BigUint::from_bytes_be(bytes);
        (v < modulus()).then_some(Self(v))
    }

    fn to_bytes(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - raw.len()..].copy_from_slice(&raw);
        out
    }

    /// uniform element by rejection sampling
    fn random<R: SecureRng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let candidate = Self::from_bytes(&bytes);
            bytes.zeroize();
            if let Some(v) = candidate {
                return v;
            }
        }
    }
}

impl InterpolationField for Fp {
    fn zero() -> Self {
        Self(BigUint::from(0u32))
    }

    fn one() -> Self {
        Self(BigUint::from(1u32))
    }

    fn from_u32(v: u32) -> Self {
        Self(BigUint::from(v))
    }

    fn add(&self, other: &Self) -> Self {
        Self((&self.0 + &other.0) % modulus())
    }

    fn sub(&self, other: &Self) -> Self {
        let p = modulus();
        Self((&self.0 + &p - &other.0) % p)
    }

    fn mul(&self, other: &Self) -> Self {
        Self((&self.0 * &other.0) % modulus())
    }

    /// a^(p-2) by fermat
    fn invert(&self) -> Option<Self> {
        if self.0 == BigUint::from(0u32) {
            return None;
        }
        let p = modulus();
        let exp = &p - BigUint::from(2u32);
        Some(Self(self.0.modpow(&exp, &p)))
    }
}

/// horner evaluation of Σ coeffs[i]·x^i
fn evaluate(coeffs: &[Fp], x: u32) -> Fp {
    let x = Fp::from_u32(x);
    coeffs
        .iter()
        .rev()
        .fold(Fp::zero(), |acc, c| acc.mul(&x).add(c))
}

// ============================================================================
// Splitting and reconstruction
// ============================================================================

/// K-of-N parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SharingParams {
    pub threshold: usize,
    pub total_shares: usize,
}

impl SharingParams {
    pub fn new(threshold: usize, total_shares: usize) -> Result<Self> {
        let params = Self {
            threshold,
            total_shares,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 || self.threshold > self.total_shares || self.total_shares > MAX_SHARES
        {
            return Err(Error::InvalidThreshold {
                threshold: self.threshold,
                total: self.total_shares,
            });
        }
        Ok(())
    }
}

/// a point (index, f(index)) on the sharing polynomial
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct SecretShare {
    /// 1-based evaluation point
    pub index: u32,
    /// f(index) as a 32-byte big-endian field element
    pub value: [u8; 32],
}

impl SecretShare {
    pub fn value_hex(&self) -> String {
        hex::encode(self.value)
    }

    /// parse a share value, rejecting values outside the field
    pub fn from_hex(index: u32, value_hex: &str) -> Result<Self> {
        let s = strip_hex_prefix(value_hex);
        if s.len() != SCALAR_BYTES * 2 {
            return Err(Error::InvalidScalar);
        }
        let value: [u8; 32] = hex::decode(s)
            .map_err(|e| Error::InvalidHex(e.to_string()))?
            .try_into()
            .map_err(|_| Error::InvalidScalar)?;
        if Fp::from_bytes(&value).is_none() {
            return Err(Error::SecretOutOfRange);
        }
        Ok(Self { index, value })
    }
}

impl core::fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecretShare")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// output of [`split_secret`]
#[derive(Clone, Debug)]
pub struct SplitSecret {
    pub shares: Vec<SecretShare>,
    pub threshold: usize,
    pub total_shares: usize,
}

/// split `secret` into `total_shares` shares, any `threshold` of which
/// reconstruct it
pub fn split_secret<R: SecureRng + ?Sized>(
    secret: &Scalar,
    params: SharingParams,
    rng: &mut R,
) -> Result<SplitSecret> {
    params.validate()?;

    let mut secret_bytes = secret.to_bytes();
    let constant = Fp::from_bytes(&secret_bytes).ok_or(Error::SecretOutOfRange);
    secret_bytes.zeroize();

    let mut coeffs = Vec::with_capacity(params.threshold);
    coeffs.push(constant?);
    coeffs.extend((1..params.threshold).map(|_| Fp::random(rng)));

    let shares = (1..=params.total_shares as u32)
        .map(|i| SecretShare {
            index: i,
            value: evaluate(&coeffs, i).to_bytes(),
        })
        .collect();

    debug!(
        threshold = params.threshold,
        total_shares = params.total_shares,
        "split secret"
    );
    Ok(SplitSecret {
        shares,
        threshold: params.threshold,
        total_shares: params.total_shares,
    })
}

/// interpolate f(0) from any `threshold` distinct shares
///
/// exact duplicates are collapsed; two different values for the same index
/// fail with `ConflictingShare`. shares with index 0 or a value outside the
/// field are not counted. the result must be a valid curve scalar.
pub fn reconstruct_secret(shares: &[SecretShare], threshold: usize) -> Result<Scalar> {
    if threshold == 0 || threshold > MAX_SHARES {
        return Err(Error::InvalidThreshold {
            threshold,
            total: shares.len(),
        });
    }

    let mut unique: Vec<(u32, Fp)> = Vec::with_capacity(shares.len());
    for share in shares {
        let value = match Fp::from_bytes(&share.value) {
            Some(v) if share.index != 0 => v,
            _ => {
                warn!(index = share.index, "skipping invalid secret share");
                continue;
            }
        };
        match unique.iter().find(|(i, _)| *i == share.index) {
            Some((_, existing)) if *existing != value => {
                return Err(Error::ConflictingShare(share.index));
            }
            Some(_) => {}
            None => unique.push((share.index, value)),
        }
    }

    if unique.len() < threshold {
        return Err(Error::InsufficientShares {
            shares_provided: unique.len(),
            threshold_required: threshold,
        });
    }
    unique.truncate(threshold);

    let indices: Vec<u32> = unique.iter().map(|(i, _)| *i).collect();
    let lambdas = lagrange::coefficients_at_zero::<Fp>(&indices)?;

    let secret = unique
        .iter()
        .zip(lambdas.iter())
        .fold(Fp::zero(), |acc, ((_, y), lambda)| acc.add(&lambda.mul(y)));

    let mut bytes = secret.to_bytes();
    let result = Scalar::from_bytes(&bytes).ok_or(Error::SecretOutOfRange);
    bytes.zeroize();
    result
}

// ============================================================================
// Key escrow
// ============================================================================

/// one escrow share of `from_player`'s private key, held by `to_player`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyShare {
    pub from_player: String,
    pub to_player: String,
    pub share: SecretShare,
    pub threshold: usize,
    pub total_shares: usize,
}

/// default escrow threshold for `others` recipients: max(2, others)
pub fn default_escrow_threshold(others: usize) -> usize {
    others.max(2)
}

/// split a private key among the other players
///
/// produces `other_players.len() + 1` shares; index 1 is the owner's and is
/// not returned, recipient k (0-based) receives index k + 2
pub fn create_key_shares<R: SecureRng + ?Sized, S: AsRef<str>>(
    private_key: &Scalar,
    from_player: &str,
    other_players: &[S],
    threshold: Option<usize>,
    rng: &mut R,
) -> Result<Vec<KeyShare>> {
    if private_key.is_zero() {
        return Err(Error::ZeroScalar);
    }
    let total_shares = other_players.len() + 1;
    let threshold = threshold.unwrap_or_else(|| default_escrow_threshold(other_players.len()));
    let params = SharingParams::new(threshold, total_shares)?;

    let split = split_secret(private_key, params, rng)?;
    let key_shares = split
        .shares
        .into_iter()
        .skip(1)
        .zip(other_players.iter())
        .map(|(share, to)| KeyShare {
            from_player: from_player.to_string(),
            to_player: to.as_ref().to_string(),
            share,
            threshold,
            total_shares,
        })
        .collect();

    debug!(
        from_player,
        recipients = other_players.len(),
        threshold,
        "created escrow key shares"
    );
    Ok(key_shares)
}

/// reconstruct an escrowed private key
///
/// all shares must come from the same owner and split; when
/// `expected_public_key` is given the recovered key must match it
pub fn recover_key(shares: &[KeyShare], expected_public_key: Option<&Point>) -> Result<Scalar> {
    let first = shares.first().ok_or(Error::InsufficientShares {
        shares_provided: 0,
        threshold_required: 1,
    })?;
    if shares.iter().any(|s| {
        s.from_player != first.from_player
            || s.threshold != first.threshold
            || s.total_shares != first.total_shares
    }) {
        return Err(Error::MixedShares);
    }

    let raw: Vec<SecretShare> = shares.iter().map(|s| s.share.clone()).collect();
    let key = reconstruct_secret(&raw, first.threshold)?;

    if let Some(expected) = expected_public_key {
        if Point::mul_base(&key) != *expected {
            return Err(Error::RecoveredKeyMismatch);
        }
    }

    debug!(from_player = %first.from_player, "recovered escrowed key");
    Ok(key)
}
