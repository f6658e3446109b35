//! protocol parameters for a threshold session

use serde::{Deserialize, Serialize};

use crate::dkg::THRESHOLD;
use crate::error::{Error, Result};
use crate::shamir::MAX_SHARES;

/// session parameters shared by every peer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThresholdConfig {
    /// number of dkg participants (n), at least the dkg threshold
    pub participants: u32,
    /// largest contribution a single peer may encrypt
    pub max_contribution: u64,
    /// prefix of every dleq context string
    pub context_prefix: String,
    /// escrow threshold override, defaults to max(2, others); checked
    /// against each split's share count (recipients + owner)
    pub escrow_threshold: Option<usize>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            participants: 2,
            max_contribution: 100,
            context_prefix: "threshold-tally".to_string(),
            escrow_threshold: None,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        if (self.participants as usize) < THRESHOLD {
            return Err(Error::InvalidThreshold {
                threshold: THRESHOLD,
                total: self.participants as usize,
            });
        }
        if self.context_prefix.is_empty() || self.context_prefix.contains('|') {
            return Err(Error::InvalidConfig(
                "context prefix must be non-empty and must not contain '|'".into(),
            ));
        }
        if let Some(t) = self.escrow_threshold {
            if t == 0 || t > MAX_SHARES {
                return Err(Error::InvalidThreshold {
                    threshold: t,
                    total: MAX_SHARES,
                });
            }
        }
        Ok(())
    }

    /// dleq context for one protocol round: `"<prefix>|round:<n>"`
    pub fn round_context(&self, round: u64) -> String {
        format!("{}|round:{}", self.context_prefix, round)
    }

    /// upper bound on a tally of every participant's contribution
    pub fn max_tally(&self) -> u64 {
        self.max_contribution.saturating_mul(self.participants as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ThresholdConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.round_context(3), "threshold-tally|round:3");
        assert_eq!(config.max_tally(), 200);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ThresholdConfig {
            participants: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.participants = 3;
        config.context_prefix = "a|b".into();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.context_prefix = "poker".into();
        config.escrow_threshold = Some(0);
        assert!(config.validate().is_err());
        config.escrow_threshold = Some(MAX_SHARES + 1);
        assert!(config.validate().is_err());
        config.escrow_threshold = Some(3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_escrow_threshold_independent_of_participants() {
        // escrow splits go to the --to list, not the dkg participants
        let config = ThresholdConfig {
            participants: 2,
            escrow_threshold: Some(4),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let mut rng = crate::rng::seeded(90);
        let key = crate::curve::Scalar::random(&mut rng);
        let shares = crate::shamir::create_key_shares(
            &key,
            "alice",
            &["bob", "carol", "dave"],
            config.escrow_threshold,
            &mut rng,
        )
        .unwrap();
        assert!(shares.iter().all(|s| s.threshold == 4));

        assert!(matches!(
            crate::shamir::create_key_shares(
                &key,
                "alice",
                &["bob", "carol"],
                config.escrow_threshold,
                &mut rng,
            ),
            Err(Error::InvalidThreshold {
                threshold: 4,
                total: 3
            })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ThresholdConfig =
            serde_json::from_str(r#"{"participants": 4, "contextPrefix": "war"}"#).unwrap();
        assert_eq!(config.participants, 4);
        assert_eq!(config.max_contribution, 100);
        assert_eq!(config.round_context(1), "war|round:1");
    }
}
