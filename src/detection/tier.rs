//! Confidence tiers derived from numeric scores.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse confidence bucket. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// Weak evidence, usually a generic phrase.
    Low,
    /// Plausible evidence.
    Medium,
    /// Strong, tool-specific evidence.
    High,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

/// Invalid threshold configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierError {
    /// A threshold lies outside `[0, 1]`.
    #[error("Tier threshold {0} is outside [0, 1]")]
    OutOfRange(f64),

    /// A higher threshold maps to a lower tier than a lower threshold.
    #[error("Tier thresholds are not monotonic: {higher_tier} at {higher} ranks below {lower_tier} at {lower}")]
    NotMonotonic {
        /// The larger threshold.
        higher: f64,
        /// Tier assigned at the larger threshold.
        higher_tier: ConfidenceTier,
        /// The smaller threshold.
        lower: f64,
        /// Tier assigned at the smaller threshold.
        lower_tier: ConfidenceTier,
    },
}

/// One cut point: scores at or above `min_score` get `tier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThreshold {
    /// Inclusive lower bound of the tier.
    pub min_score: f64,
    /// Tier assigned at or above `min_score`.
    pub tier: ConfidenceTier,
}

/// Ordered cut points mapping a score to a tier.
///
/// Scores below every cut point are [`ConfidenceTier::Low`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierThreshold>", into = "Vec<TierThreshold>")]
pub struct TierThresholds {
    // Sorted by descending `min_score`.
    cuts: Vec<TierThreshold>,
}

impl TierThresholds {
    /// Validates and sorts the cut points.
    pub fn new(mut cuts: Vec<TierThreshold>) -> Result<Self, TierError> {
        if let Some(bad) = cuts.iter().find(|c| !(0.0..=1.0).contains(&c.min_score)) {
            return Err(TierError::OutOfRange(bad.min_score));
        }

        cuts.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));

        for pair in cuts.windows(2) {
            let (higher, lower) = (pair[0], pair[1]);
            if higher.tier < lower.tier {
                return Err(TierError::NotMonotonic {
                    higher: higher.min_score,
                    higher_tier: higher.tier,
                    lower: lower.min_score,
                    lower_tier: lower.tier,
                });
            }
        }

        Ok(Self { cuts })
    }

    /// Maps a score onto a tier.
    pub fn tier_for(&self, score: f64) -> ConfidenceTier {
        self.cuts
            .iter()
            .find(|c| score >= c.min_score)
            .map_or(ConfidenceTier::Low, |c| c.tier)
    }

    /// Returns the cut points, highest first.
    pub fn cuts(&self) -> &[TierThreshold] {
        &self.cuts
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            cuts: vec![
                TierThreshold {
                    min_score: 0.8,
                    tier: ConfidenceTier::High,
                },
                TierThreshold {
                    min_score: 0.6,
                    tier: ConfidenceTier::Medium,
                },
            ],
        }
    }
}

impl TryFrom<Vec<TierThreshold>> for TierThresholds {
    type Error = TierError;

    fn try_from(cuts: Vec<TierThreshold>) -> Result<Self, Self::Error> {
        Self::new(cuts)
    }
}

impl From<TierThresholds> for Vec<TierThreshold> {
    fn from(thresholds: TierThresholds) -> Self {
        thresholds.cuts
    }
}
