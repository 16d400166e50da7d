//! Blend weights for the four ranking factors.

use cachetrail_core::ScoreBreakdown;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative weighting of the ranking factors.
///
/// Valid weights are non-negative and sum to at most one, which keeps
/// composite scores in `0.0..=1.0`. The defaults sum to one.
///
/// # Examples
/// ```
/// use cachetrail_core::ScoreBreakdown;
/// use cachetrail_scorer::FactorWeights;
///
/// let weights = FactorWeights::default().validate()?;
/// let all_neutral = ScoreBreakdown {
///     category: 0.5,
///     difficulty: 0.5,
///     location: 0.5,
///     popularity: 0.5,
/// };
/// assert!((weights.combine(&all_neutral) - 0.5).abs() < 1e-12);
/// # Ok::<(), cachetrail_scorer::FactorWeightsError>(())
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    /// Multiplier applied to category affinity.
    pub category: f64,
    /// Multiplier applied to difficulty fit.
    pub difficulty: f64,
    /// Multiplier applied to proximity.
    pub location: f64,
    /// Multiplier applied to popularity.
    pub popularity: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            category: 0.35,
            difficulty: 0.30,
            location: 0.25,
            popularity: 0.10,
        }
    }
}

/// Errors raised when factor weights cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FactorWeightsError {
    /// A weight was negative, infinite, or NaN.
    #[error("{factor} weight must be finite and non-negative, got {value}")]
    InvalidWeight {
        /// Name of the offending factor.
        factor: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Every weight was zero.
    #[error("factor weights must sum to a positive value")]
    ZeroTotal,
    /// The weights sum to more than one.
    #[error("factor weights must sum to at most 1, got {total}")]
    TotalAboveOne {
        /// Sum of the four weights.
        total: f64,
    },
}

/// Slack allowed when checking that the weights sum to at most one.
const TOTAL_TOLERANCE: f64 = 1e-9;

impl FactorWeights {
    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`FactorWeightsError::InvalidWeight`] for a negative or
    /// non-finite weight, [`FactorWeightsError::ZeroTotal`] when all weights
    /// are zero, and [`FactorWeightsError::TotalAboveOne`] when they sum to
    /// more than one.
    #[expect(
        clippy::float_arithmetic,
        reason = "the bound applies to the sum of the weights"
    )]
    pub fn validate(self) -> Result<Self, FactorWeightsError> {
        for (factor, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(FactorWeightsError::InvalidWeight { factor, value });
            }
        }
        let total: f64 = self.named().iter().map(|(_, value)| value).sum();
        if total == 0.0 {
            return Err(FactorWeightsError::ZeroTotal);
        }
        if total > 1.0 + TOTAL_TOLERANCE {
            return Err(FactorWeightsError::TotalAboveOne { total });
        }
        Ok(self)
    }

    const fn named(self) -> [(&'static str, f64); 4] {
        [
            ("category", self.category),
            ("difficulty", self.difficulty),
            ("location", self.location),
            ("popularity", self.popularity),
        ]
    }

    /// Blend factor scores into a composite score.
    #[expect(
        clippy::float_arithmetic,
        reason = "the composite is a weighted sum of factor scores"
    )]
    #[must_use]
    pub fn combine(self, breakdown: &ScoreBreakdown) -> f64 {
        self.category * breakdown.category
            + self.difficulty * breakdown.difficulty
            + self.location * breakdown.location
            + self.popularity * breakdown.popularity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_are_valid() {
        assert!(FactorWeights::default().validate().is_ok());
    }

    #[rstest]
    #[case(FactorWeights { category: -0.1, ..FactorWeights::default() }, "category")]
    #[case(FactorWeights { location: f64::NAN, ..FactorWeights::default() }, "location")]
    #[case(FactorWeights { popularity: f64::INFINITY, ..FactorWeights::default() }, "popularity")]
    fn rejects_unusable_weights(#[case] weights: FactorWeights, #[case] expected: &str) {
        match weights.validate() {
            Err(FactorWeightsError::InvalidWeight { factor, .. }) => assert_eq!(factor, expected),
            other => panic!("expected invalid weight, got {other:?}"),
        }
    }

    #[rstest]
    fn rejects_zero_total() {
        let weights = FactorWeights {
            category: 0.0,
            difficulty: 0.0,
            location: 0.0,
            popularity: 0.0,
        };
        assert_eq!(weights.validate(), Err(FactorWeightsError::ZeroTotal));
    }

    #[rstest]
    fn rejects_totals_above_one() {
        let weights = FactorWeights {
            category: 0.9,
            ..FactorWeights::default()
        };
        match weights.validate() {
            Err(FactorWeightsError::TotalAboveOne { total }) => assert!(total > 1.0),
            other => panic!("expected total above one, got {other:?}"),
        }
    }

    #[rstest]
    #[expect(
        clippy::float_arithmetic,
        reason = "tests compare floating point values"
    )]
    fn combine_applies_each_weight() {
        let category_only = ScoreBreakdown {
            category: 1.0,
            difficulty: 0.0,
            location: 0.0,
            popularity: 0.0,
        };
        assert!((FactorWeights::default().combine(&category_only) - 0.35).abs() < 1e-12);
        let perfect = ScoreBreakdown {
            category: 1.0,
            difficulty: 1.0,
            location: 1.0,
            popularity: 1.0,
        };
        assert!((FactorWeights::default().combine(&perfect) - 1.0).abs() < 1e-12);
    }

    #[rstest]
    fn partial_configuration_keeps_defaults() {
        let weights: FactorWeights =
            serde_json::from_str(r#"{"popularity":0.2}"#).expect("valid weights");
        assert_eq!(weights.popularity, 0.2);
        assert_eq!(weights.category, 0.35);
    }
}
