//! User preference profiles derived from interaction history.
//!
//! A [`UserProfile`] summarises what a user has engaged with: the share of
//! interaction weight per category, the weighted distribution of cache
//! difficulty, and the regions where the user has found caches. Profiles are
//! rebuilt from scratch for every request and never persisted.

use std::collections::HashMap;

use thiserror::Error;

use crate::cluster::{Cluster, WeightedPoint, cluster_points};
use crate::interaction::{CategoryId, InteractionKind, InteractionRecord};

/// Per-category share of the user's total interaction weight.
///
/// Values lie in `0.0..=1.0` and sum to at most `1.0`. Lookups distinguish an
/// empty mapping (no category data at all) from a missing key (category never
/// engaged with).
///
/// # Examples
/// ```
/// use cachetrail_core::{CategoryId, CategoryScores};
///
/// let scores = CategoryScores::from_iter([(CategoryId::new(1), 0.8)]);
/// assert_eq!(scores.get(CategoryId::new(1)), Some(0.8));
/// assert_eq!(scores.get(CategoryId::new(2)), None);
/// assert!(!scores.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CategoryScores(HashMap<CategoryId, f64>);

impl CategoryScores {
    /// Return the share recorded for `category`, if any.
    #[must_use]
    pub fn get(&self, category: CategoryId) -> Option<f64> {
        self.0.get(&category).copied()
    }

    /// Report whether no category carries a share.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of categories with a recorded share.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sum of all shares.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Iterate over category shares in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, f64)> + '_ {
        self.0.iter().map(|(id, share)| (*id, *share))
    }
}

impl FromIterator<(CategoryId, f64)> for CategoryScores {
    fn from_iter<T: IntoIterator<Item = (CategoryId, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Weighted difficulty preference.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifficultyPreference {
    /// Weighted mean difficulty.
    pub mean: f64,
    /// Weighted population standard deviation; never negative.
    pub std_dev: f64,
}

/// Aggregated preferences of a single user.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserProfile {
    /// Share of interaction weight per category.
    pub category_scores: CategoryScores,
    /// Difficulty distribution over interactions that carried a rating.
    pub difficulty: DifficultyPreference,
    /// Affinity regions built from found locations.
    pub clusters: Vec<Cluster>,
    /// Raw weighted points that fed clustering.
    pub found_locations: Vec<WeightedPoint>,
    /// Number of interactions the profile was built from.
    pub total_interactions: usize,
    /// Sum of all effective weights.
    pub total_weight: f64,
}

impl UserProfile {
    /// Report whether the profile carries any signal worth personalising on.
    #[must_use]
    pub const fn has_signal(&self) -> bool {
        self.total_interactions > 0
    }
}

/// Default weights applied to each interaction kind.
///
/// # Examples
/// ```
/// use cachetrail_core::{InteractionKind, InteractionWeights};
///
/// let weights = InteractionWeights::default();
/// assert_eq!(weights.base_weight(InteractionKind::Favorite), 2.5);
/// assert_eq!(weights.found_multiplier, 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InteractionWeights {
    /// Base weight of a find, before amplification.
    pub found: f64,
    /// Weight of a favourite.
    pub favorite: f64,
    /// Weight of a visit.
    pub visit: f64,
    /// Weight of a view.
    pub view: f64,
    /// Weight of any unrecognised interaction.
    pub other: f64,
    /// Multiplier applied to every find, including explicit overrides.
    pub found_multiplier: f64,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            found: 3.0,
            favorite: 2.5,
            visit: 1.5,
            view: 1.0,
            other: 1.0,
            found_multiplier: 5.0,
        }
    }
}

/// Errors raised when interaction weights cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InteractionWeightsError {
    /// A weight was zero, negative, infinite, or NaN.
    #[error("{field} interaction weight must be finite and positive, got {value}")]
    InvalidWeight {
        /// Name of the offending weight.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

impl InteractionWeights {
    /// Validate the weights and return a copy.
    ///
    /// Every weight feeds clustering, which only accepts positive weights.
    ///
    /// # Errors
    /// Returns [`InteractionWeightsError::InvalidWeight`] for the first weight
    /// that is not finite and strictly positive.
    ///
    /// # Examples
    /// ```
    /// use cachetrail_core::InteractionWeights;
    ///
    /// assert!(InteractionWeights::default().validate().is_ok());
    /// let negative = InteractionWeights {
    ///     found_multiplier: -5.0,
    ///     ..InteractionWeights::default()
    /// };
    /// assert!(negative.validate().is_err());
    /// ```
    pub fn validate(self) -> Result<Self, InteractionWeightsError> {
        let named = [
            ("found", self.found),
            ("favorite", self.favorite),
            ("visit", self.visit),
            ("view", self.view),
            ("other", self.other),
            ("found_multiplier", self.found_multiplier),
        ];
        match named
            .into_iter()
            .find(|(_, value)| !value.is_finite() || *value <= 0.0)
        {
            Some((field, value)) => Err(InteractionWeightsError::InvalidWeight { field, value }),
            None => Ok(self),
        }
    }

    /// Return the default weight of `kind` before amplification.
    #[must_use]
    pub const fn base_weight(&self, kind: InteractionKind) -> f64 {
        match kind {
            InteractionKind::Found => self.found,
            InteractionKind::Favorite => self.favorite,
            InteractionKind::Visit => self.visit,
            InteractionKind::View => self.view,
            InteractionKind::Other => self.other,
        }
    }

    /// Return the weight a record contributes to the profile.
    ///
    /// An explicit override replaces the kind default when it is finite and
    /// positive. Finds are then amplified by `found_multiplier`.
    ///
    /// # Examples
    /// ```
    /// use cachetrail_core::{InteractionKind, InteractionRecord, InteractionWeights};
    ///
    /// let weights = InteractionWeights::default();
    /// let find = InteractionRecord::new(1, InteractionKind::Found);
    /// let view = InteractionRecord::new(2, InteractionKind::View).with_weight(2.0);
    /// assert_eq!(weights.effective_weight(&find), 15.0);
    /// assert_eq!(weights.effective_weight(&view), 2.0);
    /// ```
    #[must_use]
    pub fn effective_weight(&self, record: &InteractionRecord) -> f64 {
        let base = record
            .weight_override
            .filter(|weight| weight.is_finite() && *weight > 0.0)
            .unwrap_or_else(|| self.base_weight(record.kind));
        if record.kind.is_found() {
            base * self.found_multiplier
        } else {
            base
        }
    }
}

/// Builds [`UserProfile`] values from interaction history.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::{CategoryId, InteractionKind, InteractionRecord, ProfileBuilder};
///
/// let history = [
///     InteractionRecord::new(1, InteractionKind::Found)
///         .with_category(CategoryId::new(7))
///         .with_difficulty(2.0)
///         .with_location(Coord { x: -88.2, y: 40.1 }),
///     InteractionRecord::new(2, InteractionKind::View).with_category(CategoryId::new(8)),
/// ];
/// let profile = ProfileBuilder::default().build(&history).expect("non-empty history");
/// assert_eq!(profile.total_interactions, 2);
/// assert_eq!(profile.total_weight, 16.0);
/// assert_eq!(profile.clusters.len(), 1);
/// assert!(ProfileBuilder::default().build(&[]).is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileBuilder {
    weights: InteractionWeights,
}

impl ProfileBuilder {
    /// Construct a builder with custom interaction weights.
    ///
    /// # Errors
    /// Returns [`InteractionWeightsError`] when `weights` fails
    /// [`InteractionWeights::validate`].
    pub fn new(weights: InteractionWeights) -> Result<Self, InteractionWeightsError> {
        Ok(Self {
            weights: weights.validate()?,
        })
    }

    /// Interaction weights in use.
    #[must_use]
    pub const fn weights(&self) -> InteractionWeights {
        self.weights
    }

    /// Aggregate `records` into a profile.
    ///
    /// Returns `None` when `records` is empty.
    #[must_use]
    pub fn build(&self, records: &[InteractionRecord]) -> Option<UserProfile> {
        if records.is_empty() {
            return None;
        }

        let mut category_weights: HashMap<CategoryId, f64> = HashMap::new();
        let mut difficulty = WeightedMoments::default();
        let mut found_locations = Vec::new();
        let mut total_weight = 0.0;

        for record in records {
            let weight = self.weights.effective_weight(record);
            total_weight += weight;

            if let Some(category) = record.category {
                *category_weights.entry(category).or_default() += weight;
            }
            if let Some(rating) = record.difficulty.filter(|value| value.is_finite()) {
                difficulty.push(rating, weight);
            }
            if record.kind.is_found()
                && let Some(location) = record.location
                && let Ok(point) = WeightedPoint::new(location, weight)
            {
                found_locations.push(point);
            }
        }

        let category_scores = category_weights
            .into_iter()
            .map(|(category, weight)| {
                let share = if total_weight > 0.0 {
                    weight / total_weight
                } else {
                    0.0
                };
                (category, share)
            })
            .collect();
        let clusters = cluster_points(&found_locations);

        let profile = UserProfile {
            category_scores,
            difficulty: difficulty.finish(),
            clusters,
            found_locations,
            total_interactions: records.len(),
            total_weight,
        };
        log::debug!(
            "built profile from {} interactions: {} categories, {} clusters, total weight {}",
            profile.total_interactions,
            profile.category_scores.len(),
            profile.clusters.len(),
            profile.total_weight
        );
        Some(profile)
    }
}

#[derive(Debug, Default)]
struct WeightedMoments {
    samples: Vec<(f64, f64)>,
}

impl WeightedMoments {
    fn push(&mut self, value: f64, weight: f64) {
        self.samples.push((value, weight));
    }

    fn finish(self) -> DifficultyPreference {
        let weight_sum: f64 = self.samples.iter().map(|(_, weight)| weight).sum();
        if self.samples.is_empty() || weight_sum <= 0.0 {
            return DifficultyPreference::default();
        }
        let mean = self
            .samples
            .iter()
            .map(|(value, weight)| value * weight)
            .sum::<f64>()
            / weight_sum;
        let variance = self
            .samples
            .iter()
            .map(|(value, weight)| weight * (value - mean).powi(2))
            .sum::<f64>()
            / weight_sum;
        DifficultyPreference {
            mean,
            std_dev: variance.max(0.0).sqrt(),
        }
    }
}
