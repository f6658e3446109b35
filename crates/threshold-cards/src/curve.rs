//! secp256k1 scalar and point primitives
//!
//! thin newtypes over k256 that fix the wire encoding used everywhere else:
//! - scalars: 32-byte big-endian, 64 hex chars, strictly below the group order n
//! - points: 33-byte compressed sec1, 66 hex chars, identity encoded as `"00"`
//!
//! anything decoded through these types is on the curve, so downstream code
//! never sees an unchecked point.

use core::fmt;

use k256::{
    elliptic_curve::{
        group::Group,
        ops::Reduce,
        sec1::{FromEncodedPoint, ToEncodedPoint},
        PrimeField,
    },
    AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, U256,
};
use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::lagrange::{self, InterpolationField};
use crate::rng::SecureRng;

/// hex encoding of the point at infinity
pub const IDENTITY_HEX: &str = "00";

/// compressed sec1 point length
pub const POINT_BYTES: usize = 33;

/// canonical scalar length
pub const SCALAR_BYTES: usize = 32;

/// strip an optional `0x` prefix
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| Error::InvalidHex(e.to_string()))
}

// ============================================================================
// Scalar
// ============================================================================

/// element of Z_n, n = secp256k1 group order
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Scalar(pub(crate) k256::Scalar);

impl Scalar {
    pub const ZERO: Self = Self(k256::Scalar::ZERO);
    pub const ONE: Self = Self(k256::Scalar::ONE);

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn one() -> Self {
        Self::ONE
    }

    pub fn from_u64(v: u64) -> Self {
        Self(k256::Scalar::from(v))
    }

    /// canonical big-endian decoding, `None` if the value is >= n
    pub fn from_bytes(bytes: &[u8; SCALAR_BYTES]) -> Option<Self> {
        let repr = FieldBytes::from(*bytes);
        Option::<k256::Scalar>::from(k256::Scalar::from_repr(repr)).map(Self)
    }

    /// reduce an arbitrary 256-bit big-endian value mod n
    pub fn reduce_bytes(bytes: &[u8; SCALAR_BYTES]) -> Self {
        Self(<k256::Scalar as Reduce<U256>>::reduce(U256::from_be_slice(
            bytes,
        )))
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_BYTES] {
        self.0.to_bytes().into()
    }

    /// parse 64 hex chars (optional `0x`), rejecting values >= n
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = strip_hex_prefix(s);
        if s.len() != SCALAR_BYTES * 2 {
            return Err(Error::InvalidScalar);
        }
        let bytes: [u8; SCALAR_BYTES] = decode_hex(s)?
            .try_into()
            .map_err(|_| Error::InvalidScalar)?;
        Self::from_bytes(&bytes).ok_or(Error::InvalidScalar)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// uniform non-zero scalar
    ///
    /// rejection-samples 32 bytes from the rng, resampling on zero or on
    /// values >= n so the output is never biased toward small values
    pub fn random<R: SecureRng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; SCALAR_BYTES];
            rng.fill_bytes(&mut bytes);
            let candidate = Self::from_bytes(&bytes);
            bytes.zeroize();
            match candidate {
                Some(s) if !s.is_zero() => return s,
                _ => continue,
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        bool::from(self.0.is_zero())
    }

    pub fn add(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self(self.0 - other.0)
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self(self.0 * other.0)
    }

    pub fn neg(&self) -> Self {
        Self(-self.0)
    }

    /// modular inverse, zero has none
    pub fn invert(&self) -> Result<Self> {
        Option::<k256::Scalar>::from(self.0.invert())
            .map(Self)
            .ok_or(Error::ZeroScalar)
    }

    /// sum of scalars mod n
    pub fn sum<'a>(scalars: impl IntoIterator<Item = &'a Scalar>) -> Self {
        scalars
            .into_iter()
            .fold(Self::ZERO, |acc, s| acc.add(s))
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar({})", self.to_hex())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl InterpolationField for Scalar {
    fn zero() -> Self {
        Self::ZERO
    }

    fn one() -> Self {
        Self::ONE
    }

    fn from_u32(v: u32) -> Self {
        Self::from_u64(v as u64)
    }

    fn add(&self, other: &Self) -> Self {
        Scalar::add(self, other)
    }

    fn sub(&self, other: &Self) -> Self {
        Scalar::sub(self, other)
    }

    fn mul(&self, other: &Self) -> Self {
        Scalar::mul(self, other)
    }

    fn invert(&self) -> Option<Self> {
        Scalar::invert(self).ok()
    }
}

// ============================================================================
// Point
// ============================================================================

/// element of the secp256k1 group
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Point(pub(crate) ProjectivePoint);

impl Point {
    pub const IDENTITY: Self = Self(ProjectivePoint::IDENTITY);
    pub const GENERATOR: Self = Self(ProjectivePoint::GENERATOR);

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn generator() -> Self {
        Self::GENERATOR
    }

    /// k·G
    pub fn mul_base(k: &Scalar) -> Self {
        Self(ProjectivePoint::GENERATOR * k.0)
    }

    pub fn is_identity(&self) -> bool {
        bool::from(self.0.is_identity())
    }

    /// identity absorbs: P + O = P
    pub fn add(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self(self.0 - other.0)
    }

    pub fn neg(&self) -> Self {
        Self(-self.0)
    }

    /// k·P, zero scalar or identity point yields the identity
    pub fn mul(&self, k: &Scalar) -> Self {
        Self(self.0 * k.0)
    }

    /// fails with `IdentityPoint` if this is the point at infinity
    pub fn ensure_not_identity(&self) -> Result<&Self> {
        if self.is_identity() {
            Err(Error::IdentityPoint)
        } else {
            Ok(self)
        }
    }

    /// sec1 compressed encoding, `[0x00]` for the identity
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.is_identity() {
            return vec![0x00];
        }
        self.0.to_affine().to_encoded_point(true).as_bytes().to_vec()
    }

    /// decode sec1 compressed bytes or the single identity byte
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [0x00] => Ok(Self::IDENTITY),
            [0x02 | 0x03, ..] if bytes.len() == POINT_BYTES => {
                let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| Error::InvalidPoint)?;
                Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
                    .map(|affine| Self(ProjectivePoint::from(affine)))
                    .ok_or(Error::InvalidPoint)
            }
            _ => Err(Error::InvalidPoint),
        }
    }

    /// parse 66 hex chars or `"00"` (optional `0x`)
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = strip_hex_prefix(s);
        if s == IDENTITY_HEX {
            return Ok(Self::IDENTITY);
        }
        if s.len() != POINT_BYTES * 2 {
            return Err(Error::InvalidPoint);
        }
        Self::from_bytes(&decode_hex(s)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// sum of points, identity for an empty iterator
    pub fn sum<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        points
            .into_iter()
            .fold(Self::IDENTITY, |acc, p| acc.add(p))
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({})", self.to_hex())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ============================================================================
// KeyPair
// ============================================================================

/// (x, x·G) with x non-zero
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key: Scalar,
    pub public_key: Point,
}

impl KeyPair {
    pub fn generate<R: SecureRng + ?Sized>(rng: &mut R) -> Self {
        let private_key = Scalar::random(rng);
        Self {
            private_key,
            public_key: Point::mul_base(&private_key),
        }
    }

    pub fn from_private(private_key: Scalar) -> Result<Self> {
        if private_key.is_zero() {
            return Err(Error::ZeroScalar);
        }
        Ok(Self {
            private_key,
            public_key: Point::mul_base(&private_key),
        })
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// lagrange coefficients at x = 0 over Z_n for the given 1-based x-coordinates
pub fn lagrange_coefficients(xs: &[u32]) -> Result<Vec<Scalar>> {
    lagrange::coefficients_at_zero::<Scalar>(xs)
}
