//! lagrange interpolation at x = 0
//!
//! shared by threshold decryption (curve scalars mod n) and escrow
//! reconstruction (the 256-bit shamir field). for an index set Q:
//!
//! ```text
//! λ_i = Π_{j ∈ Q, j ≠ i} x_j / (x_j - x_i)
//! ```
//!
//! computed with a common denominator so the whole set costs one inversion:
//! ξ = Π x_j, d_i = x_i · Π_{j≠i} (x_j - x_i), λ_i = ξ · (Π_{j≠i} d_j) / Π d_j

use crate::error::{Error, Result};

/// prime field arithmetic needed for interpolation
pub trait InterpolationField: Clone + PartialEq + Sized {
    fn zero() -> Self;

    fn one() -> Self;

    fn from_u32(v: u32) -> Self;

    fn add(&self, other: &Self) -> Self;

    fn sub(&self, other: &Self) -> Self;

    fn mul(&self, other: &Self) -> Self;

    /// multiplicative inverse, `None` for zero
    fn invert(&self) -> Option<Self>;
}

/// reject empty sets, zero indices and duplicates
pub(crate) fn check_indices(indices: &[u32]) -> Result<()> {
    if indices.is_empty() {
        return Err(Error::EmptyIndexSet);
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    if sorted[0] == 0 {
        return Err(Error::InvalidIndex {
            index: 0,
            max: u32::MAX,
        });
    }
    for pair in sorted.windows(2) {
        if pair[0] == pair[1] {
            return Err(Error::DuplicateIndex(pair[0]));
        }
    }
    Ok(())
}

/// lagrange coefficients at x = 0, returned in input order
pub fn coefficients_at_zero<F: InterpolationField>(indices: &[u32]) -> Result<Vec<F>> {
    check_indices(indices)?;

    let k = indices.len();
    if k == 1 {
        return Ok(vec![F::one()]);
    }

    let xs: Vec<F> = indices.iter().map(|&i| F::from_u32(i)).collect();

    let xi = xs.iter().fold(F::one(), |acc, x| acc.mul(x));

    let d: Vec<F> = (0..k)
        .map(|i| {
            xs.iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold(xs[i].clone(), |acc, (_, xj)| acc.mul(&xj.sub(&xs[i])))
        })
        .collect();

    // prefix/suffix products give Π_{j≠i} d_j without dividing
    let mut rho = vec![F::one(); k];
    for i in 1..k {
        rho[i] = rho[i - 1].mul(&d[i - 1]);
    }
    let mut suffix = F::one();
    for i in (0..k).rev() {
        rho[i] = rho[i].mul(&suffix);
        suffix = suffix.mul(&d[i]);
    }

    // distinct non-zero indices below the field modulus keep d̄ invertible
    let d_bar_inv = suffix.invert().ok_or(Error::EmptyIndexSet)?;
    let delta = xi.mul(&d_bar_inv);

    Ok(rho.iter().map(|r| delta.mul(r)).collect())
}

/// single coefficient λ_i for `index` within `indices`
pub fn coefficient_at_zero<F: InterpolationField>(index: u32, indices: &[u32]) -> Result<F> {
    let position = indices
        .iter()
        .position(|&i| i == index)
        .ok_or(Error::UnknownParticipant(index))?;
    let mut all = coefficients_at_zero::<F>(indices)?;
    Ok(all.swap_remove(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Scalar;

    fn s(v: u64) -> Scalar {
        Scalar::from_u64(v)
    }

    #[test]
    fn test_single_index() {
        let coeffs = coefficients_at_zero::<Scalar>(&[7]).unwrap();
        assert_eq!(coeffs, vec![Scalar::one()]);
    }

    #[test]
    fn test_two_points() {
        // Q = {1, 2}: λ_1 = 2, λ_2 = -1
        let coeffs = coefficients_at_zero::<Scalar>(&[1, 2]).unwrap();
        assert_eq!(coeffs[0], s(2));
        assert_eq!(coeffs[1], s(1).neg());
    }

    #[test]
    fn test_interpolates_quadratic() {
        // f(x) = 1 + 2x + 3x², f(1) = 6, f(3) = 34, f(5) = 86
        let coeffs = coefficients_at_zero::<Scalar>(&[1, 3, 5]).unwrap();
        let at_zero = coeffs[0]
            .mul(&s(6))
            .add(&coeffs[1].mul(&s(34)))
            .add(&coeffs[2].mul(&s(86)));
        assert_eq!(at_zero, s(1));
    }

    #[test]
    fn test_partition_of_unity() {
        for k in 2..=12u32 {
            let indices: Vec<u32> = (1..=k).collect();
            let coeffs = coefficients_at_zero::<Scalar>(&indices).unwrap();
            let sum = coeffs.iter().fold(Scalar::zero(), |acc, c| acc.add(c));
            assert_eq!(sum, Scalar::one(), "k = {}", k);
        }
    }

    #[test]
    fn test_single_coefficient_matches_batch() {
        let indices = [2, 4, 9];
        let all = coefficients_at_zero::<Scalar>(&indices).unwrap();
        let one = coefficient_at_zero::<Scalar>(4, &indices).unwrap();
        assert_eq!(one, all[1]);
        assert!(matches!(
            coefficient_at_zero::<Scalar>(5, &indices),
            Err(Error::UnknownParticipant(5))
        ));
    }

    #[test]
    fn test_rejects_bad_sets() {
        assert!(matches!(
            coefficients_at_zero::<Scalar>(&[]),
            Err(Error::EmptyIndexSet)
        ));
        assert!(matches!(
            coefficients_at_zero::<Scalar>(&[0, 1]),
            Err(Error::InvalidIndex { index: 0, .. })
        ));
        assert!(matches!(
            coefficients_at_zero::<Scalar>(&[1, 2, 2]),
            Err(Error::DuplicateIndex(2))
        ));
    }
}
