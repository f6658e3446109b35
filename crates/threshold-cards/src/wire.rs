//! json-able payloads exchanged between peers
//!
//! scalars travel as 64 hex chars, points as 66 hex chars (or `"00"` for
//! the identity). field names are camelCase to match the transport's json.
//! converting a payload into its typed form validates every field; the
//! reverse direction is infallible and emits canonical lowercase hex.

use serde::{Deserialize, Serialize};

use crate::cipher::EncryptedCard;
use crate::curve::{Point, Scalar};
use crate::dkg::DealerCommitment;
use crate::dleq::DleqProof;
use crate::elgamal::ElGamalCiphertext;
use crate::error::Error;
use crate::shamir::{KeyShare, SecretShare};
use crate::tally::PartialDecryption;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DleqProofWire {
    pub a1_hex: String,
    pub a2_hex: String,
    pub z_hex: String,
}

impl From<&DleqProof> for DleqProofWire {
    fn from(p: &DleqProof) -> Self {
        Self {
            a1_hex: p.a1.to_hex(),
            a2_hex: p.a2.to_hex(),
            z_hex: p.z.to_hex(),
        }
    }
}

impl TryFrom<&DleqProofWire> for DleqProof {
    type Error = Error;

    fn try_from(w: &DleqProofWire) -> Result<Self, Error> {
        Ok(Self {
            a1: Point::from_hex(&w.a1_hex)?,
            a2: Point::from_hex(&w.a2_hex)?,
            z: Scalar::from_hex(&w.z_hex)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiphertextWire {
    pub c1_hex: String,
    pub c2_hex: String,
}

impl From<&ElGamalCiphertext> for CiphertextWire {
    fn from(ct: &ElGamalCiphertext) -> Self {
        Self {
            c1_hex: ct.c1.to_hex(),
            c2_hex: ct.c2.to_hex(),
        }
    }
}

impl TryFrom<&CiphertextWire> for ElGamalCiphertext {
    type Error = Error;

    fn try_from(w: &CiphertextWire) -> Result<Self, Error> {
        Ok(Self::new(Point::from_hex(&w.c1_hex)?, Point::from_hex(&w.c2_hex)?))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentWire {
    pub c0_hex: String,
    pub c1_hex: String,
}

impl From<&DealerCommitment> for CommitmentWire {
    fn from(c: &DealerCommitment) -> Self {
        Self {
            c0_hex: c.c0.to_hex(),
            c1_hex: c.c1.to_hex(),
        }
    }
}

/// rejects identity commitments, which no honest dealer produces
impl TryFrom<&CommitmentWire> for DealerCommitment {
    type Error = Error;

    fn try_from(w: &CommitmentWire) -> Result<Self, Error> {
        let commitment = Self {
            c0: Point::from_hex(&w.c0_hex)?,
            c1: Point::from_hex(&w.c1_hex)?,
        };
        commitment.validate()?;
        Ok(commitment)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedCardWire {
    pub ciphertext_hex: String,
    pub layers: u32,
}

impl From<&EncryptedCard> for EncryptedCardWire {
    fn from(c: &EncryptedCard) -> Self {
        Self {
            ciphertext_hex: c.ciphertext.to_hex(),
            layers: c.layers,
        }
    }
}

impl TryFrom<&EncryptedCardWire> for EncryptedCard {
    type Error = Error;

    fn try_from(w: &EncryptedCardWire) -> Result<Self, Error> {
        let ciphertext = Point::from_hex(&w.ciphertext_hex)?;
        ciphertext.ensure_not_identity()?;
        Ok(Self {
            ciphertext,
            layers: w.layers,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretShareWire {
    pub index: u32,
    pub value_hex: String,
}

impl From<&SecretShare> for SecretShareWire {
    fn from(s: &SecretShare) -> Self {
        Self {
            index: s.index,
            value_hex: s.value_hex(),
        }
    }
}

impl TryFrom<&SecretShareWire> for SecretShare {
    type Error = Error;

    fn try_from(w: &SecretShareWire) -> Result<Self, Error> {
        SecretShare::from_hex(w.index, &w.value_hex)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyShareWire {
    pub from_player: String,
    pub to_player: String,
    pub index: u32,
    pub value_hex: String,
    pub threshold: usize,
    pub total_shares: usize,
}

impl From<&KeyShare> for KeyShareWire {
    fn from(k: &KeyShare) -> Self {
        Self {
            from_player: k.from_player.clone(),
            to_player: k.to_player.clone(),
            index: k.share.index,
            value_hex: k.share.value_hex(),
            threshold: k.threshold,
            total_shares: k.total_shares,
        }
    }
}

impl TryFrom<&KeyShareWire> for KeyShare {
    type Error = Error;

    fn try_from(w: &KeyShareWire) -> Result<Self, Error> {
        Ok(Self {
            from_player: w.from_player.clone(),
            to_player: w.to_player.clone(),
            share: SecretShare::from_hex(w.index, &w.value_hex)?,
            threshold: w.threshold,
            total_shares: w.total_shares,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDecryptionWire {
    pub index: u32,
    pub partial_hex: String,
    pub proof: DleqProofWire,
}

impl From<&PartialDecryption> for PartialDecryptionWire {
    fn from(p: &PartialDecryption) -> Self {
        Self {
            index: p.index,
            partial_hex: p.partial.to_hex(),
            proof: DleqProofWire::from(&p.proof),
        }
    }
}

impl TryFrom<&PartialDecryptionWire> for PartialDecryption {
    type Error = Error;

    fn try_from(w: &PartialDecryptionWire) -> Result<Self, Error> {
        Ok(Self {
            index: w.index,
            partial: Point::from_hex(&w.partial_hex)?,
            proof: DleqProof::try_from(&w.proof)?,
        })
    }
}
