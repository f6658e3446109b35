//! exponential ec-elgamal with threshold partial decryption
//!
//! a small integer m is encoded in the exponent as (m + offset)·G:
//!
//! ```text
//! c1 = r·G
//! c2 = r·Y + (m + offset)·G
//! ```
//!
//! ciphertexts add component-wise, so the sum of k ciphertexts decrypts to
//! (Σm + k·offset)·G. holders of key shares x_i each publish x_i·c1; any
//! threshold subset combines these with lagrange weights into x·c1 without
//! reconstructing x, and c2 - x·c1 leaves the message point.
//!
//! recovering m from (m + offset)·G is a discrete log, solved here by
//! linear search over a caller-supplied bound. this only scales to small
//! application-bounded values (contributions, tallies); callers must pick a
//! bound and treat `None` as "out of domain", never as zero.

use crate::curve::{lagrange_coefficients, Point, Scalar};
use crate::error::{Error, Result};
use crate::rng::SecureRng;

/// added to every message so m = 0 never encodes to the identity
pub const MESSAGE_OFFSET: u64 = 1;

/// exponential elgamal ciphertext (c1, c2)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    /// c1 = r·G (ephemeral key)
    pub c1: Point,
    /// c2 = r·Y + (m + offset)·G
    pub c2: Point,
}

impl ElGamalCiphertext {
    pub fn new(c1: Point, c2: Point) -> Self {
        Self { c1, c2 }
    }
}

/// (m + offset) mod n, rejecting the degenerate zero encoding
fn encode_message(m: u64) -> Result<Scalar> {
    let encoded = Scalar::from_u64(m).add(&Scalar::from_u64(MESSAGE_OFFSET));
    if encoded.is_zero() {
        return Err(Error::DegenerateMessage);
    }
    Ok(encoded)
}

/// encrypt m under `public_key` with caller-supplied randomness r
///
/// r must be fresh per ciphertext: reusing it across messages leaks their
/// difference. this is not checked.
pub fn encrypt_exp(public_key: &Point, m: u64, r: &Scalar) -> Result<ElGamalCiphertext> {
    public_key.ensure_not_identity()?;
    if r.is_zero() {
        return Err(Error::ZeroScalar);
    }
    let encoded = encode_message(m)?;

    Ok(ElGamalCiphertext {
        c1: Point::mul_base(r),
        c2: public_key.mul(r).add(&Point::mul_base(&encoded)),
    })
}

/// encrypt m with fresh randomness drawn from `rng`, returning r alongside
pub fn encrypt_exp_random<R: SecureRng + ?Sized>(
    public_key: &Point,
    m: u64,
    rng: &mut R,
) -> Result<(ElGamalCiphertext, Scalar)> {
    let r = Scalar::random(rng);
    Ok((encrypt_exp(public_key, m, &r)?, r))
}

/// homomorphic addition
pub fn add(a: &ElGamalCiphertext, b: &ElGamalCiphertext) -> ElGamalCiphertext {
    ElGamalCiphertext {
        c1: a.c1.add(&b.c1),
        c2: a.c2.add(&b.c2),
    }
}

/// homomorphic sum of many ciphertexts (identity pair when empty)
pub fn sum<'a>(ciphertexts: impl IntoIterator<Item = &'a ElGamalCiphertext>) -> ElGamalCiphertext {
    ciphertexts.into_iter().fold(
        ElGamalCiphertext::new(Point::IDENTITY, Point::IDENTITY),
        |acc, ct| add(&acc, ct),
    )
}

/// one holder's contribution: x_i · c1
pub fn partial_decrypt(c1: &Point, secret_share: &Scalar) -> Result<Point> {
    c1.ensure_not_identity()?;
    if secret_share.is_zero() {
        return Err(Error::ZeroScalar);
    }
    Ok(c1.mul(secret_share))
}

/// combine partials (x_i, x_i·c1) into x·c1 by lagrange interpolation at 0
///
/// the index set must be distinct and 1-based; at least the threshold of
/// the sharing polynomial is needed for the result to be meaningful
pub fn combine_partials(partials: &[(u32, Point)]) -> Result<Point> {
    let indices: Vec<u32> = partials.iter().map(|(i, _)| *i).collect();
    let lambdas = lagrange_coefficients(&indices)?;

    Ok(partials
        .iter()
        .zip(lambdas.iter())
        .fold(Point::IDENTITY, |acc, ((_, partial), lambda)| {
            acc.add(&partial.mul(lambda))
        }))
}

/// c2 - x·c1 = (m + offset)·G
pub fn recover_message_point(c2: &Point, combined_partial: &Point) -> Point {
    c2.sub(combined_partial)
}

/// brute-force m in 0..=max from (m + offset)·G
pub fn decode_small_message(point: &Point, max: u64) -> Option<u64> {
    decode_small_sum_message(point, max, 1)
}

/// brute-force Σm in 0..=max_sum from (Σm + count·offset)·G
///
/// `count` is the number of ciphertexts that were added together, each of
/// which carried its own offset
pub fn decode_small_sum_message(point: &Point, max_sum: u64, count: u64) -> Option<u64> {
    let base = Scalar::from_u64(count).mul(&Scalar::from_u64(MESSAGE_OFFSET));
    let g = Point::generator();

    let mut candidate = Point::mul_base(&base);
    for m in 0..=max_sum {
        if candidate == *point {
            return Some(m);
        }
        candidate = candidate.add(&g);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::KeyPair;
    use crate::rng;

    /// full-key decryption through the single-holder path
    fn decrypt_with(ct: &ElGamalCiphertext, key: &Scalar) -> Point {
        let partial = partial_decrypt(&ct.c1, key).unwrap();
        let combined = combine_partials(&[(1, partial)]).unwrap();
        recover_message_point(&ct.c2, &combined)
    }

    #[test]
    fn test_encrypt_decrypt_small() {
        let mut rng = rng::seeded(10);
        let keys = KeyPair::generate(&mut rng);

        for m in [0u64, 1, 5, 42] {
            let (ct, _) = encrypt_exp_random(&keys.public_key, m, &mut rng).unwrap();
            let point = decrypt_with(&ct, &keys.private_key);
            assert_eq!(decode_small_message(&point, 100), Some(m));
        }
    }

    #[test]
    fn test_zero_message_is_not_identity() {
        let mut rng = rng::seeded(11);
        let keys = KeyPair::generate(&mut rng);
        let (ct, _) = encrypt_exp_random(&keys.public_key, 0, &mut rng).unwrap();
        let point = decrypt_with(&ct, &keys.private_key);
        assert_eq!(point, Point::generator());
    }

    #[test]
    fn test_out_of_range_is_none() {
        let mut rng = rng::seeded(12);
        let keys = KeyPair::generate(&mut rng);
        let (ct, _) = encrypt_exp_random(&keys.public_key, 50, &mut rng).unwrap();
        let point = decrypt_with(&ct, &keys.private_key);
        assert_eq!(decode_small_message(&point, 49), None);
        assert_eq!(decode_small_message(&point, 50), Some(50));
    }

    #[test]
    fn test_homomorphic_addition() {
        let mut rng = rng::seeded(13);
        let keys = KeyPair::generate(&mut rng);

        let (a, _) = encrypt_exp_random(&keys.public_key, 3, &mut rng).unwrap();
        let (b, _) = encrypt_exp_random(&keys.public_key, 4, &mut rng).unwrap();
        let point = decrypt_with(&add(&a, &b), &keys.private_key);

        assert_eq!(decode_small_sum_message(&point, 20, 2), Some(7));
        // decoding with the wrong count misses the doubled offset
        assert_eq!(decode_small_sum_message(&point, 20, 1), Some(8));
    }

    #[test]
    fn test_sum_many() {
        let mut rng = rng::seeded(14);
        let keys = KeyPair::generate(&mut rng);
        let values = [1u64, 0, 9, 2, 5];
        let cts: Vec<_> = values
            .iter()
            .map(|&m| encrypt_exp_random(&keys.public_key, m, &mut rng).unwrap().0)
            .collect();

        let point = decrypt_with(&sum(&cts), &keys.private_key);
        assert_eq!(
            decode_small_sum_message(&point, 100, values.len() as u64),
            Some(17)
        );
    }

    #[test]
    fn test_threshold_combination() {
        // degree-1 sharing f(x) = x0 + a·x, shares at 1, 2, 3
        let mut rng = rng::seeded(15);
        let x0 = Scalar::random(&mut rng);
        let a = Scalar::random(&mut rng);
        let share = |i: u64| x0.add(&a.mul(&Scalar::from_u64(i)));
        let y = Point::mul_base(&x0);

        let (ct, _) = encrypt_exp_random(&y, 6, &mut rng).unwrap();

        for subset in [[1u32, 2], [1, 3], [2, 3]] {
            let partials: Vec<(u32, Point)> = subset
                .iter()
                .map(|&i| (i, partial_decrypt(&ct.c1, &share(i as u64)).unwrap()))
                .collect();
            let combined = combine_partials(&partials).unwrap();
            assert_eq!(combined, ct.c1.mul(&x0));
            let point = recover_message_point(&ct.c2, &combined);
            assert_eq!(decode_small_message(&point, 10), Some(6));
        }
    }

    #[test]
    fn test_validation() {
        let r = Scalar::from_u64(7);
        assert_eq!(
            encrypt_exp(&Point::identity(), 1, &r),
            Err(Error::IdentityPoint)
        );
        assert_eq!(
            encrypt_exp(&Point::generator(), 1, &Scalar::zero()),
            Err(Error::ZeroScalar)
        );
        assert_eq!(
            partial_decrypt(&Point::identity(), &r),
            Err(Error::IdentityPoint)
        );
        assert!(matches!(
            combine_partials(&[(1, Point::generator()), (1, Point::generator())]),
            Err(Error::DuplicateIndex(1))
        ));
    }
}
