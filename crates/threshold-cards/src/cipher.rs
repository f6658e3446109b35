//! commutative card cipher (SRA on secp256k1)
//!
//! a card id maps to a curve point M = H(id). each player holding a key k
//! multiplies the point by k; removing a layer multiplies by k⁻¹. scalar
//! multiplication commutes, so layers can be peeled in any order:
//!
//! ```text
//! k_b⁻¹ · k_a⁻¹ · (k_b · k_a · M) = M
//! ```
//!
//! ## deck flow
//!
//! 1. every player agrees on the card ids, builds a [`CardLookup`]
//! 2. each player in turn encrypts every card with their key and shuffles
//! 3. to reveal a card, every holder strips their layer, in any order
//! 4. the final point (layers = 0) is resolved through the lookup table

use std::collections::HashMap;

use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::curve::{Point, Scalar, POINT_BYTES};
use crate::error::{Error, Result};
use crate::rng::SecureRng;

/// domain separator for card hashing
const CARD_DOMAIN: &[u8] = b"threshold-cards.card-to-point.v1";

/// a card point with the number of encryption layers still applied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptedCard {
    pub ciphertext: Point,
    /// layers = 0 means `ciphertext == hash_to_point(id)`
    pub layers: u32,
}

impl EncryptedCard {
    /// unencrypted card (layers = 0)
    pub fn plaintext(card_id: &str) -> Self {
        Self {
            ciphertext: hash_to_point(card_id),
            layers: 0,
        }
    }

    pub fn is_plaintext(&self) -> bool {
        self.layers == 0
    }
}

/// deterministic try-and-increment map from card id to curve point
///
/// x = SHA-256(domain || len(id) || id || counter), accepted as the x-coordinate
/// of the even-y point when it lies on the curve. about half of all
/// candidates succeed, so the loop terminates after a couple of rounds.
pub fn hash_to_point(card_id: &str) -> Point {
    let mut counter: u32 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(CARD_DOMAIN);
        hasher.update((card_id.len() as u64).to_be_bytes());
        hasher.update(card_id.as_bytes());
        hasher.update(counter.to_be_bytes());
        let x = hasher.finalize();

        let mut encoded = [0u8; POINT_BYTES];
        encoded[0] = 0x02;
        encoded[1..].copy_from_slice(&x);
        if let Ok(point) = Point::from_bytes(&encoded) {
            return point;
        }
        counter = counter.wrapping_add(1);
    }
}

/// add one layer: (k · C, layers + 1)
pub fn encrypt(card: &EncryptedCard, private_key: &Scalar) -> Result<EncryptedCard> {
    if private_key.is_zero() {
        return Err(Error::ZeroScalar);
    }
    card.ciphertext.ensure_not_identity()?;

    Ok(EncryptedCard {
        ciphertext: card.ciphertext.mul(private_key),
        layers: card.layers + 1,
    })
}

/// hash a raw card id and add the first layer
pub fn encrypt_card(card_id: &str, private_key: &Scalar) -> Result<EncryptedCard> {
    encrypt(&EncryptedCard::plaintext(card_id), private_key)
}

/// remove one layer: (k⁻¹ · C, layers - 1)
///
/// decrypting a plaintext card is a protocol violation and fails
pub fn decrypt(card: &EncryptedCard, private_key: &Scalar) -> Result<EncryptedCard> {
    if card.layers == 0 {
        return Err(Error::PlaintextCard);
    }
    card.ciphertext.ensure_not_identity()?;
    let inverse = private_key.invert()?;

    Ok(EncryptedCard {
        ciphertext: card.ciphertext.mul(&inverse),
        layers: card.layers - 1,
    })
}

/// plaintext deck in the given id order
pub fn plaintext_deck<S: AsRef<str>>(card_ids: &[S]) -> Vec<EncryptedCard> {
    card_ids
        .iter()
        .map(|id| EncryptedCard::plaintext(id.as_ref()))
        .collect()
}

/// encrypt every card, preserving order
pub fn encrypt_deck(deck: &[EncryptedCard], private_key: &Scalar) -> Result<Vec<EncryptedCard>> {
    let out = deck
        .iter()
        .map(|card| encrypt(card, private_key))
        .collect::<Result<Vec<_>>>()?;
    debug!(cards = out.len(), "encrypted deck");
    Ok(out)
}

/// decrypt every card, preserving order
pub fn decrypt_deck(deck: &[EncryptedCard], private_key: &Scalar) -> Result<Vec<EncryptedCard>> {
    let out = deck
        .iter()
        .map(|card| decrypt(card, private_key))
        .collect::<Result<Vec<_>>>()?;
    debug!(cards = out.len(), "decrypted deck");
    Ok(out)
}

/// uniformly permute a copy of the deck
pub fn shuffle_deck<R: SecureRng + ?Sized>(deck: &[EncryptedCard], rng: &mut R) -> Vec<EncryptedCard> {
    let mut shuffled = deck.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// reverse map from plaintext card points to card ids, built once per deck
#[derive(Clone, Debug, Default)]
pub struct CardLookup {
    by_point: HashMap<Vec<u8>, String>,
}

impl CardLookup {
    pub fn new<S: AsRef<str>>(card_ids: &[S]) -> Self {
        let by_point = card_ids
            .iter()
            .map(|id| (hash_to_point(id.as_ref()).to_bytes(), id.as_ref().to_string()))
            .collect();
        Self { by_point }
    }

    pub fn len(&self) -> usize {
        self.by_point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_point.is_empty()
    }

    /// card id for a plaintext point
    pub fn identify(&self, point: &Point) -> Option<&str> {
        self.by_point.get(&point.to_bytes()).map(String::as_str)
    }

    /// card id for a fully decrypted card
    pub fn reveal(&self, card: &EncryptedCard) -> Result<&str> {
        if card.layers != 0 {
            return Err(Error::StillEncrypted {
                layers: card.layers,
            });
        }
        self.identify(&card.ciphertext).ok_or(Error::UnknownCard)
    }
}

/// the standard 52-card deck as two-character ids ("AS", "TD", "2C", ...)
pub fn standard_deck_ids() -> Vec<String> {
    const RANKS: [char; 13] = [
        '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
    ];
    const SUITS: [char; 4] = ['C', 'D', 'H', 'S'];

    SUITS
        .iter()
        .flat_map(|s| RANKS.iter().map(move |r| format!("{}{}", r, s)))
        .collect()
}
