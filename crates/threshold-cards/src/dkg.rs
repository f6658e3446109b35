//! feldman verifiable secret sharing and dealerless key generation (t = 2)
//!
//! every participant acts as a dealer of a degree-1 polynomial
//!
//! ```text
//! f_d(x) = s_d + a_d·x        commitment (C0, C1) = (s_d·G, a_d·G)
//! ```
//!
//! and sends f_d(j) to participant j. a share is checked against the public
//! commitment without learning the polynomial:
//!
//! ```text
//! f_d(j)·G == C0 + j·C1
//! ```
//!
//! participant j's private share is x_j = Σ_d f_d(j), a point on the summed
//! polynomial F whose constant term S = Σ_d s_d nobody knows. the group
//! public key is Y = Σ_d C0_d = S·G.
//!
//! # phases
//!
//! `NoCommitment → Committed → SharesDistributed → SharesVerified → Finalized`
//!
//! [`DkgParticipant`] enforces the order; a dealer whose share fails
//! verification blocks finalization with [`Error::DealerFault`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::curve::{Point, Scalar};
use crate::error::{Error, Result};
use crate::rng::SecureRng;

/// shares needed to decrypt (polynomial degree + 1)
pub const THRESHOLD: usize = 2;

/// a dealer's secret polynomial f(x) = secret + coefficient·x
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DealerSecrets {
    /// constant term, the dealer's contribution to the group secret
    secret: Scalar,
    /// degree-1 coefficient
    coefficient: Scalar,
}

impl DealerSecrets {
    /// public commitment (secret·G, coefficient·G)
    pub fn commitment(&self) -> DealerCommitment {
        DealerCommitment {
            c0: Point::mul_base(&self.secret),
            c1: Point::mul_base(&self.coefficient),
        }
    }
}

impl core::fmt::Debug for DealerSecrets {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("DealerSecrets(..)")
    }
}

/// public commitment to a dealer polynomial
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DealerCommitment {
    /// C0 = secret·G
    pub c0: Point,
    /// C1 = coefficient·G
    pub c1: Point,
}

impl DealerCommitment {
    /// g^{f(x)} = C0 + x·C1
    pub fn evaluate_at(&self, x: u32) -> Point {
        self.c0.add(&self.c1.mul(&Scalar::from_u64(x as u64)))
    }

    /// both points present and non-identity
    pub fn validate(&self) -> Result<()> {
        self.c0.ensure_not_identity()?;
        self.c1.ensure_not_identity()?;
        Ok(())
    }
}

/// draw a fresh random polynomial
pub fn make_dealer_secrets<R: SecureRng + ?Sized>(rng: &mut R) -> DealerSecrets {
    DealerSecrets {
        secret: Scalar::random(rng),
        coefficient: Scalar::random(rng),
    }
}

/// f(x) for participant x (1-based)
pub fn evaluate_share(secrets: &DealerSecrets, x: u32) -> Result<Scalar> {
    if x == 0 {
        return Err(Error::InvalidIndex {
            index: 0,
            max: u32::MAX,
        });
    }
    Ok(secrets
        .secret
        .add(&secrets.coefficient.mul(&Scalar::from_u64(x as u64))))
}

/// feldman check: share·G == C0 + x·C1
///
/// `false` means the dealer sent a corrupt share or a degenerate commitment
/// and must be excluded
pub fn verify_share(commitment: &DealerCommitment, x: u32, share: &Scalar) -> bool {
    if x == 0 || commitment.validate().is_err() {
        return false;
    }
    Point::mul_base(share) == commitment.evaluate_at(x)
}

/// x_j = Σ received shares mod n (including the participant's own)
pub fn private_share_from_received_shares(shares: &[Scalar]) -> Result<Scalar> {
    if shares.is_empty() {
        return Err(Error::InsufficientShares {
            shares_provided: 0,
            threshold_required: 1,
        });
    }
    Ok(Scalar::sum(shares))
}

/// x_j·G
pub fn public_share_from_private_share(private_share: &Scalar) -> Point {
    Point::mul_base(private_share)
}

/// Y = Σ C0 over all dealers
pub fn aggregate_public_key<'a>(
    commitments: impl IntoIterator<Item = &'a DealerCommitment>,
) -> Result<Point> {
    let mut count = 0usize;
    let key = commitments.into_iter().fold(Point::IDENTITY, |acc, c| {
        count += 1;
        acc.add(&c.c0)
    });
    if count == 0 {
        return Err(Error::InsufficientShares {
            shares_provided: 0,
            threshold_required: 1,
        });
    }
    key.ensure_not_identity()?;
    Ok(key)
}

/// public share of participant j derived from the dealers' commitments
///
/// Y_j = Σ_d (C0_d + j·C1_d); lets any peer check a published public share
pub fn expected_public_share<'a>(
    commitments: impl IntoIterator<Item = &'a DealerCommitment>,
    j: u32,
) -> Point {
    commitments
        .into_iter()
        .fold(Point::IDENTITY, |acc, c| acc.add(&c.evaluate_at(j)))
}

// ============================================================================
// Participant state machine
// ============================================================================

/// dkg phase of a single participant
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DkgPhase {
    NoCommitment,
    Committed,
    SharesDistributed,
    SharesVerified,
    Finalized,
}

impl DkgPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoCommitment => "no-commitment",
            Self::Committed => "committed",
            Self::SharesDistributed => "shares-distributed",
            Self::SharesVerified => "shares-verified",
            Self::Finalized => "finalized",
        }
    }
}

/// key material a participant holds after the dkg
#[derive(Clone, Debug)]
pub struct DkgOutput {
    pub index: u32,
    /// x_j, never leaves this participant
    pub private_share: Scalar,
    /// x_j·G, published for dleq verification
    pub public_share: Point,
    /// Y = S·G
    pub aggregate_public_key: Point,
    /// expected public shares of every participant, from the commitments
    pub public_shares: BTreeMap<u32, Point>,
}

impl Drop for DkgOutput {
    fn drop(&mut self) {
        self.private_share.zeroize();
    }
}

/// one participant's view of a 2-of-n dkg
pub struct DkgParticipant {
    index: u32,
    participants: u32,
    phase: DkgPhase,
    secrets: Option<DealerSecrets>,
    commitments: BTreeMap<u32, DealerCommitment>,
    received: BTreeMap<u32, Scalar>,
    faulty: BTreeSet<u32>,
}

impl DkgParticipant {
    /// participant `index` (1-based) among `participants` dealers
    pub fn new(index: u32, participants: u32) -> Result<Self> {
        if (participants as usize) < THRESHOLD {
            return Err(Error::InvalidThreshold {
                threshold: THRESHOLD,
                total: participants as usize,
            });
        }
        if index == 0 || index > participants {
            return Err(Error::InvalidIndex {
                index,
                max: participants,
            });
        }
        Ok(Self {
            index,
            participants,
            phase: DkgPhase::NoCommitment,
            secrets: None,
            commitments: BTreeMap::new(),
            received: BTreeMap::new(),
            faulty: BTreeSet::new(),
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn phase(&self) -> DkgPhase {
        self.phase
    }

    /// dealers whose shares failed verification
    pub fn faulty_dealers(&self) -> Vec<u32> {
        self.faulty.iter().copied().collect()
    }

    fn expect_phase(&self, expected: DkgPhase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::PhaseViolation {
                expected: expected.name(),
                actual: self.phase.name(),
            });
        }
        Ok(())
    }

    fn check_peer(&self, dealer: u32) -> Result<()> {
        if dealer == 0 || dealer > self.participants {
            return Err(Error::UnknownParticipant(dealer));
        }
        Ok(())
    }

    /// draw our polynomial and return the commitment to broadcast
    pub fn commit<R: SecureRng + ?Sized>(&mut self, rng: &mut R) -> Result<DealerCommitment> {
        self.expect_phase(DkgPhase::NoCommitment)?;

        let secrets = make_dealer_secrets(rng);
        let commitment = secrets.commitment();
        self.commitments.insert(self.index, commitment);
        self.secrets = Some(secrets);
        self.phase = DkgPhase::Committed;

        debug!(index = self.index, "dkg committed");
        Ok(commitment)
    }

    /// record a peer's broadcast commitment
    pub fn receive_commitment(&mut self, dealer: u32, commitment: DealerCommitment) -> Result<()> {
        if !matches!(self.phase, DkgPhase::Committed | DkgPhase::SharesDistributed) {
            return Err(Error::PhaseViolation {
                expected: DkgPhase::Committed.name(),
                actual: self.phase.name(),
            });
        }
        self.check_peer(dealer)?;
        commitment.validate()?;

        match self.commitments.get(&dealer) {
            Some(existing) if *existing != commitment => Err(Error::DuplicateIndex(dealer)),
            Some(_) => Ok(()),
            None => {
                self.commitments.insert(dealer, commitment);
                Ok(())
            }
        }
    }

    /// evaluate our polynomial for every other participant
    ///
    /// returns `(recipient, share)` pairs; our own share is kept internally
    pub fn distribute_shares(&mut self) -> Result<Vec<(u32, Scalar)>> {
        self.expect_phase(DkgPhase::Committed)?;
        let secrets = self.secrets.as_ref().ok_or(Error::PhaseViolation {
            expected: DkgPhase::Committed.name(),
            actual: self.phase.name(),
        })?;

        let mut outgoing = Vec::with_capacity(self.participants as usize - 1);
        for j in 1..=self.participants {
            let share = evaluate_share(secrets, j)?;
            if j == self.index {
                self.received.insert(j, share);
            } else {
                outgoing.push((j, share));
            }
        }
        self.phase = DkgPhase::SharesDistributed;

        debug!(index = self.index, recipients = outgoing.len(), "dkg shares distributed");
        Ok(outgoing)
    }

    /// check a share sent to us by `dealer` against its commitment
    ///
    /// returns the verification outcome; a failing dealer is remembered and
    /// blocks [`verify_shares`](Self::verify_shares)
    pub fn receive_share(&mut self, dealer: u32, share: Scalar) -> Result<bool> {
        self.expect_phase(DkgPhase::SharesDistributed)?;
        self.check_peer(dealer)?;
        let commitment = self
            .commitments
            .get(&dealer)
            .ok_or(Error::MissingContributions {
                missing: vec![dealer],
            })?;

        if !verify_share(commitment, self.index, &share) {
            warn!(index = self.index, dealer, "dkg share failed feldman verification");
            self.faulty.insert(dealer);
            return Ok(false);
        }

        if let Some(existing) = self.received.get(&dealer) {
            if *existing != share {
                return Err(Error::ConflictingShare(dealer));
            }
        }
        self.received.insert(dealer, share);
        Ok(true)
    }

    /// every dealer has committed and sent a verified share
    pub fn verify_shares(&mut self) -> Result<()> {
        self.expect_phase(DkgPhase::SharesDistributed)?;

        if !self.faulty.is_empty() {
            return Err(Error::DealerFault {
                dealers: self.faulty_dealers(),
            });
        }

        let missing: Vec<u32> = (1..=self.participants)
            .filter(|d| !self.commitments.contains_key(d) || !self.received.contains_key(d))
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingContributions { missing });
        }
        if self.received.len() < THRESHOLD {
            return Err(Error::InsufficientShares {
                shares_provided: self.received.len(),
                threshold_required: THRESHOLD,
            });
        }

        self.phase = DkgPhase::SharesVerified;
        debug!(index = self.index, "dkg shares verified");
        Ok(())
    }

    /// sum shares into x_j and derive the group public key
    pub fn finalize(&mut self) -> Result<DkgOutput> {
        self.expect_phase(DkgPhase::SharesVerified)?;

        let shares: Vec<Scalar> = self.received.values().copied().collect();
        let private_share = private_share_from_received_shares(&shares)?;
        let public_share = public_share_from_private_share(&private_share);
        let aggregate_public_key = aggregate_public_key(self.commitments.values())?;

        let public_shares: BTreeMap<u32, Point> = (1..=self.participants)
            .map(|j| (j, expected_public_share(self.commitments.values(), j)))
            .collect();

        // our own view must agree with what peers will derive for us
        if public_shares.get(&self.index) != Some(&public_share) {
            return Err(Error::DealerFault {
                dealers: vec![self.index],
            });
        }

        self.secrets = None;
        self.received.clear();
        self.phase = DkgPhase::Finalized;

        debug!(
            index = self.index,
            aggregate_public_key = %aggregate_public_key,
            "dkg finalized"
        );
        Ok(DkgOutput {
            index: self.index,
            private_share,
            public_share,
            aggregate_public_key,
            public_shares,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng;

    /// run a full dkg among `n` honest participants
    fn run_dkg(n: u32, seed: u64) -> Vec<DkgOutput> {
        let mut rng = rng::seeded(seed);
        let mut parts: Vec<DkgParticipant> = (1..=n)
            .map(|i| DkgParticipant::new(i, n).unwrap())
            .collect();

        let commitments: Vec<DealerCommitment> =
            parts.iter_mut().map(|p| p.commit(&mut rng).unwrap()).collect();
        for p in parts.iter_mut() {
            for (d, c) in commitments.iter().enumerate() {
                p.receive_commitment(d as u32 + 1, *c).unwrap();
            }
        }

        let outgoing: Vec<Vec<(u32, Scalar)>> = parts
            .iter_mut()
            .map(|p| p.distribute_shares().unwrap())
            .collect();
        for (d, shares) in outgoing.iter().enumerate() {
            for (to, share) in shares {
                let ok = parts[*to as usize - 1]
                    .receive_share(d as u32 + 1, *share)
                    .unwrap();
                assert!(ok);
            }
        }

        parts
            .iter_mut()
            .map(|p| {
                p.verify_shares().unwrap();
                p.finalize().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_share_verifies() {
        let mut rng = rng::seeded(20);
        let secrets = make_dealer_secrets(&mut rng);
        let commitment = secrets.commitment();

        for x in 1..=5 {
            let share = evaluate_share(&secrets, x).unwrap();
            assert!(verify_share(&commitment, x, &share));
        }
    }

    #[test]
    fn test_tampered_share_fails() {
        let mut rng = rng::seeded(21);
        let secrets = make_dealer_secrets(&mut rng);
        let commitment = secrets.commitment();

        let share = evaluate_share(&secrets, 2).unwrap();
        assert!(!verify_share(&commitment, 2, &share.add(&Scalar::one())));
        // right share, wrong recipient
        assert!(!verify_share(&commitment, 3, &share));
        assert!(!verify_share(&commitment, 0, &share));
    }

    #[test]
    fn test_identity_commitment_never_verifies() {
        let degenerate = DealerCommitment {
            c0: Point::identity(),
            c1: Point::identity(),
        };
        assert!(!verify_share(&degenerate, 1, &Scalar::zero()));

        let mut rng = rng::seeded(30);
        let secrets = make_dealer_secrets(&mut rng);
        let half = DealerCommitment {
            c1: Point::identity(),
            ..secrets.commitment()
        };
        let share = evaluate_share(&secrets, 1).unwrap();
        assert!(!verify_share(&half, 1, &share));
    }

    #[test]
    fn test_zero_index_rejected() {
        let mut rng = rng::seeded(22);
        let secrets = make_dealer_secrets(&mut rng);
        assert!(matches!(
            evaluate_share(&secrets, 0),
            Err(Error::InvalidIndex { index: 0, .. })
        ));
    }

    #[test]
    fn test_full_dkg_agrees() {
        let outputs = run_dkg(3, 23);

        let key = outputs[0].aggregate_public_key;
        for out in &outputs {
            assert_eq!(out.aggregate_public_key, key);
            assert_eq!(out.public_share, Point::mul_base(&out.private_share));
            assert_eq!(out.public_shares, outputs[0].public_shares);
        }
    }

    #[test]
    fn test_any_two_shares_interpolate_group_secret() {
        let outputs = run_dkg(3, 24);
        let key = outputs[0].aggregate_public_key;

        for (a, b) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let indices = [outputs[a].index, outputs[b].index];
            let lambdas = crate::curve::lagrange_coefficients(&indices).unwrap();
            let secret = lambdas[0]
                .mul(&outputs[a].private_share)
                .add(&lambdas[1].mul(&outputs[b].private_share));
            assert_eq!(Point::mul_base(&secret), key);
        }
    }

    #[test]
    fn test_faulty_dealer_blocks_finalize() {
        let mut rng = rng::seeded(25);
        let mut alice = DkgParticipant::new(1, 2).unwrap();
        let mut bob = DkgParticipant::new(2, 2).unwrap();

        let ca = alice.commit(&mut rng).unwrap();
        let cb = bob.commit(&mut rng).unwrap();
        alice.receive_commitment(2, cb).unwrap();
        bob.receive_commitment(1, ca).unwrap();

        let from_alice = alice.distribute_shares().unwrap();
        let _ = bob.distribute_shares().unwrap();

        let (_, share) = from_alice[0];
        let ok = bob.receive_share(1, share.add(&Scalar::one())).unwrap();
        assert!(!ok);
        assert_eq!(bob.faulty_dealers(), vec![1]);
        assert_eq!(
            bob.verify_shares(),
            Err(Error::DealerFault { dealers: vec![1] })
        );
        assert!(matches!(bob.finalize(), Err(Error::PhaseViolation { .. })));
    }

    #[test]
    fn test_missing_share_blocks_verification() {
        let mut rng = rng::seeded(26);
        let mut alice = DkgParticipant::new(1, 2).unwrap();
        let mut bob = DkgParticipant::new(2, 2).unwrap();
        let ca = alice.commit(&mut rng).unwrap();
        let cb = bob.commit(&mut rng).unwrap();
        alice.receive_commitment(2, cb).unwrap();
        bob.receive_commitment(1, ca).unwrap();
        alice.distribute_shares().unwrap();

        assert_eq!(
            alice.verify_shares(),
            Err(Error::MissingContributions { missing: vec![2] })
        );
    }

    #[test]
    fn test_phase_order_enforced() {
        let mut rng = rng::seeded(27);
        let mut p = DkgParticipant::new(1, 2).unwrap();
        assert_eq!(p.phase(), DkgPhase::NoCommitment);
        assert!(matches!(p.distribute_shares(), Err(Error::PhaseViolation { .. })));
        assert!(matches!(
            p.receive_share(2, Scalar::one()),
            Err(Error::PhaseViolation { .. })
        ));

        p.commit(&mut rng).unwrap();
        assert!(matches!(p.commit(&mut rng), Err(Error::PhaseViolation { .. })));
        assert_eq!(p.phase(), DkgPhase::Committed);
    }

    #[test]
    fn test_participant_bounds() {
        assert!(DkgParticipant::new(1, 1).is_err());
        assert!(DkgParticipant::new(0, 3).is_err());
        assert!(DkgParticipant::new(4, 3).is_err());

        let mut rng = rng::seeded(28);
        let mut p = DkgParticipant::new(1, 3).unwrap();
        let c = p.commit(&mut rng).unwrap();
        assert_eq!(p.receive_commitment(9, c), Err(Error::UnknownParticipant(9)));
    }

    #[test]
    fn test_aggregate_is_sum_of_constant_terms() {
        let mut rng = rng::seeded(29);
        let a = make_dealer_secrets(&mut rng);
        let b = make_dealer_secrets(&mut rng);
        let key = aggregate_public_key([a.commitment(), b.commitment()].iter()).unwrap();
        assert_eq!(key, a.commitment().c0.add(&b.commitment().c0));

        let single = aggregate_public_key([a.commitment()].iter()).unwrap();
        assert_eq!(single, a.commitment().c0);
    }
}
