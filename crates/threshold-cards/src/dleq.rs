//! chaum-pedersen proof of discrete log equality
//!
//! proves knowledge of x such that Y = x·G and P = x·B for a second base B
//! without revealing x. in threshold decryption B is the ciphertext's c1, Y
//! the sender's published public share and P its partial decryption, so a
//! verifier learns that the partial was computed with the committed share.
//!
//! ```text
//! prover:   w random, a1 = w·G, a2 = w·B
//!           e = H(domain | context | G | B | Y | P | a1 | a2) mod n
//!           z = w + e·x
//! verifier: z·G == a1 + e·Y  and  z·B == a2 + e·P
//! ```
//!
//! the challenge hashes the canonical hex encodings joined with `|`; the
//! caller's `context` (e.g. `"threshold-tally|round:3"`) binds a proof to
//! one protocol round so it cannot be replayed in another.

use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

use crate::curve::{Point, Scalar};
use crate::error::{Error, Result};
use crate::rng::SecureRng;
use crate::wire::DleqProofWire;

/// domain separator for dleq challenges
const DLEQ_DOMAIN: &str = "threshold-cards.dleq.v1";

/// public values of a dleq claim: log_G(public_share) == log_base2(partial)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DleqStatement {
    /// second base B (the ciphertext's c1 for partial decryptions)
    pub base2: Point,
    /// Y = x·G
    pub public_share: Point,
    /// P = x·B
    pub partial: Point,
}

/// non-interactive dleq proof
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DleqProof {
    /// a1 = w·G
    pub a1: Point,
    /// a2 = w·B
    pub a2: Point,
    /// z = w + e·x
    pub z: Scalar,
}

impl DleqStatement {
    pub fn new(base2: Point, public_share: Point, partial: Point) -> Self {
        Self {
            base2,
            public_share,
            partial,
        }
    }

    fn ensure_well_formed(&self) -> Result<()> {
        self.base2.ensure_not_identity()?;
        self.public_share.ensure_not_identity()?;
        self.partial.ensure_not_identity()?;
        Ok(())
    }
}

/// fiat-shamir challenge over the canonical hex transcript
fn challenge(statement: &DleqStatement, a1: &Point, a2: &Point, context: &str) -> Scalar {
    let transcript = [
        DLEQ_DOMAIN.to_string(),
        context.to_string(),
        Point::generator().to_hex(),
        statement.base2.to_hex(),
        statement.public_share.to_hex(),
        statement.partial.to_hex(),
        a1.to_hex(),
        a2.to_hex(),
    ]
    .join("|");

    let digest: [u8; 32] = Sha256::digest(transcript.as_bytes()).into();
    Scalar::reduce_bytes(&digest)
}

/// prove that `secret` links `public_share` and `partial`
///
/// fails on identity points or when the secret does not satisfy the statement
pub fn prove<R: SecureRng + ?Sized>(
    statement: &DleqStatement,
    secret: &Scalar,
    context: &str,
    rng: &mut R,
) -> Result<DleqProof> {
    statement.ensure_well_formed()?;
    if secret.is_zero() {
        return Err(Error::ZeroScalar);
    }
    if Point::mul_base(secret) != statement.public_share
        || statement.base2.mul(secret) != statement.partial
    {
        return Err(Error::StatementMismatch);
    }

    let mut w = Scalar::random(rng);
    let a1 = Point::mul_base(&w);
    let a2 = statement.base2.mul(&w);
    let e = challenge(statement, &a1, &a2, context);
    let z = w.add(&e.mul(secret));
    w.zeroize();

    Ok(DleqProof { a1, a2, z })
}

/// check a proof; any degenerate input yields `false`
pub fn verify(statement: &DleqStatement, proof: &DleqProof, context: &str) -> bool {
    if statement.ensure_well_formed().is_err() {
        return false;
    }
    if proof.a1.is_identity() || proof.a2.is_identity() {
        return false;
    }

    let e = challenge(statement, &proof.a1, &proof.a2, context);

    let lhs1 = Point::mul_base(&proof.z);
    let rhs1 = proof.a1.add(&statement.public_share.mul(&e));
    let lhs2 = statement.base2.mul(&proof.z);
    let rhs2 = proof.a2.add(&statement.partial.mul(&e));

    lhs1 == rhs1 && lhs2 == rhs2
}

/// verify hex-encoded inputs straight off the wire
///
/// malformed hex, off-curve points or out-of-range scalars return `false`
pub fn verify_wire(
    base2_hex: &str,
    public_share_hex: &str,
    partial_hex: &str,
    proof: &DleqProofWire,
    context: &str,
) -> bool {
    let parsed = (|| -> Result<(DleqStatement, DleqProof)> {
        let statement = DleqStatement::new(
            Point::from_hex(base2_hex)?,
            Point::from_hex(public_share_hex)?,
            Point::from_hex(partial_hex)?,
        );
        Ok((statement, DleqProof::try_from(proof)?))
    })();

    match parsed {
        Ok((statement, proof)) => verify(&statement, &proof, context),
        Err(e) => {
            warn!(error = %e, "rejecting malformed dleq input");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng;

    const CONTEXT: &str = "threshold-tally|round:1";

    fn setup(seed: u64) -> (DleqStatement, Scalar) {
        let mut rng = rng::seeded(seed);
        let x = Scalar::random(&mut rng);
        let base2 = Point::mul_base(&Scalar::random(&mut rng));
        let statement = DleqStatement::new(base2, Point::mul_base(&x), base2.mul(&x));
        (statement, x)
    }

    fn flip_bit(hex_point: &str, byte: usize, bit: u8) -> String {
        let mut bytes = hex::decode(hex_point).unwrap();
        bytes[byte] ^= 1 << bit;
        hex::encode(bytes)
    }

    #[test]
    fn test_prove_verify() {
        let (statement, x) = setup(40);
        let mut rng = rng::seeded(41);
        let proof = prove(&statement, &x, CONTEXT, &mut rng).unwrap();
        assert!(verify(&statement, &proof, CONTEXT));
    }

    #[test]
    fn test_wrong_context_rejected() {
        let (statement, x) = setup(42);
        let mut rng = rng::seeded(43);
        let proof = prove(&statement, &x, CONTEXT, &mut rng).unwrap();
        assert!(!verify(&statement, &proof, "threshold-tally|round:2"));
    }

    #[test]
    fn test_wrong_partial_rejected() {
        let (statement, x) = setup(44);
        let mut rng = rng::seeded(45);
        let proof = prove(&statement, &x, CONTEXT, &mut rng).unwrap();

        let forged = DleqStatement {
            partial: statement.partial.add(&Point::generator()),
            ..statement
        };
        assert!(!verify(&forged, &proof, CONTEXT));

        let forged = DleqStatement {
            public_share: statement.public_share.add(&Point::generator()),
            ..statement
        };
        assert!(!verify(&forged, &proof, CONTEXT));
    }

    #[test]
    fn test_tampered_response_rejected() {
        let (statement, x) = setup(46);
        let mut rng = rng::seeded(47);
        let mut proof = prove(&statement, &x, CONTEXT, &mut rng).unwrap();
        proof.z = proof.z.add(&Scalar::one());
        assert!(!verify(&statement, &proof, CONTEXT));
    }

    #[test]
    fn test_prove_rejects_mismatched_secret() {
        let (statement, x) = setup(48);
        let mut rng = rng::seeded(49);
        assert_eq!(
            prove(&statement, &x.add(&Scalar::one()), CONTEXT, &mut rng),
            Err(Error::StatementMismatch)
        );

        let degenerate = DleqStatement {
            base2: Point::identity(),
            ..statement
        };
        assert_eq!(
            prove(&degenerate, &x, CONTEXT, &mut rng),
            Err(Error::IdentityPoint)
        );
    }

    #[test]
    fn test_identity_inputs_fail_verification() {
        let (statement, x) = setup(50);
        let mut rng = rng::seeded(51);
        let proof = prove(&statement, &x, CONTEXT, &mut rng).unwrap();

        let degenerate = DleqStatement {
            partial: Point::identity(),
            ..statement
        };
        assert!(!verify(&degenerate, &proof, CONTEXT));

        let bad_proof = DleqProof {
            a1: Point::identity(),
            ..proof
        };
        assert!(!verify(&statement, &bad_proof, CONTEXT));
    }

    #[test]
    fn test_verify_wire() {
        let (statement, x) = setup(52);
        let mut rng = rng::seeded(53);
        let proof = prove(&statement, &x, CONTEXT, &mut rng).unwrap();
        let wire = DleqProofWire::from(&proof);

        let base2 = statement.base2.to_hex();
        let y = statement.public_share.to_hex();
        let p = statement.partial.to_hex();
        assert!(verify_wire(&base2, &y, &p, &wire, CONTEXT));

        // single bit flips in the partial or the public share
        for (byte, bit) in [(32usize, 0u8), (17, 5), (1, 7)] {
            assert!(!verify_wire(&base2, &y, &flip_bit(&p, byte, bit), &wire, CONTEXT));
            assert!(!verify_wire(&base2, &flip_bit(&y, byte, bit), &p, &wire, CONTEXT));
        }

        assert!(!verify_wire("zz", &y, &p, &wire, CONTEXT));
        assert!(!verify_wire(&base2, &y, "00", &wire, CONTEXT));

        let mut bad = wire.clone();
        bad.z_hex = "ff".repeat(32);
        assert!(!verify_wire(&base2, &y, &p, &bad, CONTEXT));
    }
}
