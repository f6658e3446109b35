//! threshold tally: verified partial decryptions of an aggregate ciphertext
//!
//! every participant encrypts a contribution under the dkg's aggregate key,
//! the ciphertexts are summed, and each key-share holder publishes
//! x_j·c1 together with a dleq proof against its public share x_j·G.
//! partials are only combined after their proofs check out.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::curve::{Point, Scalar};
use crate::dleq::{self, DleqProof, DleqStatement};
use crate::elgamal::{self, ElGamalCiphertext};
use crate::error::{Error, Result};
use crate::rng::SecureRng;

/// x_j·c1 from participant `index`, with its proof of correctness
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialDecryption {
    pub index: u32,
    pub partial: Point,
    pub proof: DleqProof,
}

/// compute and prove this participant's partial decryption of `ciphertext`
pub fn partial_decryption<R: SecureRng + ?Sized>(
    ciphertext: &ElGamalCiphertext,
    index: u32,
    private_share: &Scalar,
    context: &str,
    rng: &mut R,
) -> Result<PartialDecryption> {
    let partial = elgamal::partial_decrypt(&ciphertext.c1, private_share)?;
    let statement = DleqStatement::new(ciphertext.c1, Point::mul_base(private_share), partial);
    let proof = dleq::prove(&statement, private_share, context, rng)?;

    debug!(index, "produced partial decryption");
    Ok(PartialDecryption {
        index,
        partial,
        proof,
    })
}

/// check one partial against the sender's published public share
pub fn verify_partial(
    ciphertext: &ElGamalCiphertext,
    partial: &PartialDecryption,
    public_share: &Point,
    context: &str,
) -> bool {
    let statement = DleqStatement::new(ciphertext.c1, *public_share, partial.partial);
    dleq::verify(&statement, &partial.proof, context)
}

/// verify every partial, then lagrange-combine them into x·c1
///
/// a failed proof or a sender without a known public share rejects the
/// whole set, naming the sender; fewer than `threshold` distinct senders is
/// an insufficiency error the caller can retry once more partials arrive
pub fn combine_verified(
    ciphertext: &ElGamalCiphertext,
    partials: &[PartialDecryption],
    public_shares: &BTreeMap<u32, Point>,
    threshold: usize,
    context: &str,
) -> Result<Point> {
    let mut accepted: BTreeMap<u32, Point> = BTreeMap::new();
    for p in partials {
        let public_share = public_shares
            .get(&p.index)
            .ok_or(Error::UnknownParticipant(p.index))?;
        if !verify_partial(ciphertext, p, public_share, context) {
            warn!(index = p.index, "partial decryption failed dleq verification");
            return Err(Error::InvalidPartialDecryption { index: p.index });
        }
        if let Some(existing) = accepted.insert(p.index, p.partial) {
            if existing != p.partial {
                return Err(Error::ConflictingShare(p.index));
            }
        }
    }

    if accepted.len() < threshold {
        return Err(Error::InsufficientShares {
            shares_provided: accepted.len(),
            threshold_required: threshold,
        });
    }

    let chosen: Vec<(u32, Point)> = accepted.into_iter().take(threshold).collect();
    debug!(partials = chosen.len(), "combining verified partials");
    elgamal::combine_partials(&chosen)
}

/// decode Σm from the combined partial of a sum of `count` ciphertexts
///
/// `None` if the sum lies outside 0..=max_sum
pub fn decode_tally(
    ciphertext: &ElGamalCiphertext,
    combined_partial: &Point,
    max_sum: u64,
    count: u64,
) -> Option<u64> {
    let point = elgamal::recover_message_point(&ciphertext.c2, combined_partial);
    elgamal::decode_small_sum_message(&point, max_sum, count)
}

/// [`combine_verified`] followed by [`decode_tally`]
pub fn decrypt_sum(
    ciphertext: &ElGamalCiphertext,
    partials: &[PartialDecryption],
    public_shares: &BTreeMap<u32, Point>,
    threshold: usize,
    context: &str,
    max_sum: u64,
    count: u64,
) -> Result<Option<u64>> {
    let combined = combine_verified(ciphertext, partials, public_shares, threshold, context)?;
    Ok(decode_tally(ciphertext, &combined, max_sum, count))
}
