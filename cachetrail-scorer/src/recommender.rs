//! Request orchestration: read history, build a profile, rank candidates.

use cachetrail_core::{
    CandidateQuery, CandidateSource, DEFAULT_CANDIDATE_LIMIT, FallbackSource, InteractionRecord,
    InteractionSource, InteractionWeights, InteractionWeightsError, ProfileBuilder,
    SecondaryInteractionSource, SecondaryInteractions, SourceError, UserProfile,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ranker::{Ranker, Recommendations, fallback_ranking};
use crate::weights::{FactorWeights, FactorWeightsError};

/// Number of recommendations returned when the caller does not ask for a
/// specific count.
pub const DEFAULT_LIMIT: usize = 10;

/// Tunables for a [`Recommender`].
///
/// Missing fields deserialise to their defaults, so a configuration file only
/// needs the values it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Result count used when a request does not specify one.
    pub default_limit: usize,
    /// Maximum number of candidates scored per request.
    pub candidate_cap: usize,
    /// Weights applied to each interaction kind while building profiles.
    pub interaction_weights: InteractionWeights,
    /// Weights blending the ranking factors.
    pub factor_weights: FactorWeights,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            candidate_cap: DEFAULT_CANDIDATE_LIMIT,
            interaction_weights: InteractionWeights::default(),
            factor_weights: FactorWeights::default(),
        }
    }
}

impl RecommenderConfig {
    /// Validate both weight tables and return a copy.
    ///
    /// # Errors
    /// Returns [`RecommenderConfigError`] naming the table that failed.
    pub fn validate(self) -> Result<Self, RecommenderConfigError> {
        self.factor_weights.validate()?;
        self.interaction_weights.validate()?;
        Ok(self)
    }
}

/// Errors raised when a [`RecommenderConfig`] cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RecommenderConfigError {
    /// The factor weights are unusable.
    #[error("invalid factor weights: {0}")]
    FactorWeights(#[from] FactorWeightsError),
    /// The interaction weights are unusable.
    #[error("invalid interaction weights: {0}")]
    InteractionWeights(#[from] InteractionWeightsError),
}

/// Errors raised while producing recommendations.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The primary interaction source failed.
    #[error("failed to read interactions for user {user_id}")]
    Interactions {
        /// User the request was for.
        user_id: u64,
        /// Underlying source error.
        #[source]
        source: SourceError,
    },
    /// The candidate source failed.
    #[error("failed to read candidates for user {user_id}")]
    Candidates {
        /// User the request was for.
        user_id: u64,
        /// Underlying source error.
        #[source]
        source: SourceError,
    },
    /// The popularity fallback source failed.
    #[error("failed to read popular caches for user {user_id}")]
    Fallback {
        /// User the request was for.
        user_id: u64,
        /// Underlying source error.
        #[source]
        source: SourceError,
    },
}

/// Produces personalised recommendations from pluggable sources.
///
/// Each request reads the user's history (primary source, then the optional
/// secondary source), builds a fresh [`UserProfile`], and either ranks the
/// candidate set against it or, for users without history, returns the
/// popularity fallback. All reads finish before scoring starts.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::test_support::MemoryStore;
/// use cachetrail_core::{CandidateItem, CategoryId};
/// use cachetrail_scorer::{RankingStrategy, Recommender};
///
/// let store = MemoryStore::with_items([
///     CandidateItem::new(1, CategoryId::new(1), 2.0, Coord { x: 0.0, y: 0.0 }),
/// ]);
/// let recommender = Recommender::from_store(&store);
/// let recommendations = recommender.recommend(7, None)?;
/// assert_eq!(recommendations.strategy, RankingStrategy::Popularity);
/// assert_eq!(recommendations.items.len(), 1);
/// # Ok::<(), cachetrail_scorer::RecommendError>(())
/// ```
#[derive(Debug)]
pub struct Recommender<I, S, C, F> {
    interactions: I,
    secondary: S,
    candidates: C,
    fallback: F,
    config: RecommenderConfig,
    profiles: ProfileBuilder,
    ranker: Ranker,
}

impl<'a, T> Recommender<&'a T, &'a T, &'a T, &'a T>
where
    T: InteractionSource + SecondaryInteractionSource + CandidateSource + FallbackSource + ?Sized,
{
    /// Use a single store for every source.
    #[must_use]
    pub fn from_store(store: &'a T) -> Self {
        Self::new(store, store, store, store)
    }
}

impl<I, S, C, F> Recommender<I, S, C, F>
where
    I: InteractionSource,
    S: SecondaryInteractionSource,
    C: CandidateSource,
    F: FallbackSource,
{
    /// Construct a recommender with the default configuration.
    #[must_use]
    pub fn new(interactions: I, secondary: S, candidates: C, fallback: F) -> Self {
        Self {
            interactions,
            secondary,
            candidates,
            fallback,
            config: RecommenderConfig::default(),
            profiles: ProfileBuilder::default(),
            ranker: Ranker::default(),
        }
    }

    /// Construct a recommender with an explicit configuration.
    ///
    /// # Errors
    /// Returns [`RecommenderConfigError`] when either weight table is
    /// unusable; no recommender is built from invalid weights.
    pub fn with_config(
        interactions: I,
        secondary: S,
        candidates: C,
        fallback: F,
        config: RecommenderConfig,
    ) -> Result<Self, RecommenderConfigError> {
        let profiles = ProfileBuilder::new(config.interaction_weights)?;
        let ranker = Ranker::new(config.factor_weights)?;
        Ok(Self {
            interactions,
            secondary,
            candidates,
            fallback,
            config,
            profiles,
            ranker,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Read the combined interaction history of `user_id`.
    ///
    /// Secondary records follow primary records. An unavailable secondary
    /// source contributes nothing.
    ///
    /// # Errors
    /// Returns [`RecommendError::Interactions`] when the primary source fails.
    pub fn history(&self, user_id: u64) -> Result<Vec<InteractionRecord>, RecommendError> {
        let mut records = self
            .interactions
            .interactions(user_id)
            .map_err(|source| RecommendError::Interactions { user_id, source })?;
        match self.secondary.fetch_interactions(user_id) {
            SecondaryInteractions::Available(extra) => records.extend(extra),
            SecondaryInteractions::Unavailable { reason } => {
                log::info!("secondary interactions unavailable for user {user_id}: {reason}");
            }
        }
        Ok(records)
    }

    /// Build the profile of `user_id`, or `None` when the user has no history.
    ///
    /// # Errors
    /// Returns [`RecommendError::Interactions`] when the primary source fails.
    pub fn profile(&self, user_id: u64) -> Result<Option<UserProfile>, RecommendError> {
        let records = self.history(user_id)?;
        Ok(self.profiles.build(&records))
    }

    /// Recommend up to `limit` caches to `user_id`.
    ///
    /// `None` uses [`RecommenderConfig::default_limit`]. Users without history
    /// receive the popularity fallback. A user with history but no eligible
    /// candidates receives an empty personalised list.
    ///
    /// # Errors
    /// Returns [`RecommendError`] when the primary interaction source, the
    /// candidate source, or the fallback source fails. No partial list is
    /// returned.
    pub fn recommend(
        &self,
        user_id: u64,
        limit: Option<usize>,
    ) -> Result<Recommendations, RecommendError> {
        let count = limit.unwrap_or(self.config.default_limit);
        let built = self.profile(user_id)?;
        let Some(profile) = built.filter(UserProfile::has_signal) else {
            log::info!("user {user_id} has no interaction history; using popularity fallback");
            let popular = self
                .fallback
                .popular(user_id, count)
                .map_err(|source| RecommendError::Fallback { user_id, source })?;
            return Ok(fallback_ranking(popular, count));
        };

        let cap = self.config.candidate_cap;
        let query = CandidateQuery::for_user(user_id).with_limit(cap);
        let mut candidates = self
            .candidates
            .candidates(&query)
            .map_err(|source| RecommendError::Candidates { user_id, source })?;
        if candidates.len() > cap {
            log::warn!(
                "candidate source returned {} items for user {user_id}; truncating to {cap}",
                candidates.len()
            );
            candidates.truncate(cap);
        }
        Ok(self.ranker.personalise(&profile, candidates, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachetrail_core::test_support::{FailingSource, MemoryStore};
    use cachetrail_core::{CandidateItem, CategoryId, InteractionKind, NoSecondarySource};
    use geo::Coord;
    use rstest::{fixture, rstest};

    use crate::ranker::RankingStrategy;

    const USER: u64 = 7;
    const TRADITIONAL: CategoryId = CategoryId::new(1);
    const PUZZLE: CategoryId = CategoryId::new(2);

    fn found(id: u64, category: CategoryId) -> InteractionRecord {
        InteractionRecord::new(id, InteractionKind::Found)
            .with_category(category)
            .with_difficulty(2.0)
            .with_location(Coord { x: -88.2, y: 40.1 })
    }

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::with_items([
            CandidateItem::new(10, TRADITIONAL, 2.0, Coord { x: -88.2, y: 40.1 })
                .with_interaction_count(4)
                .created_at(1),
            CandidateItem::new(11, PUZZLE, 5.0, Coord { x: 2.35, y: 48.85 })
                .with_interaction_count(9)
                .created_at(2),
        ])
    }

    #[rstest]
    fn history_drives_personalised_ranking(store: MemoryStore) {
        let seeded = store.with_interactions(USER, [found(1, TRADITIONAL), found(2, TRADITIONAL)]);
        let recommendations = Recommender::from_store(&seeded)
            .recommend(USER, None)
            .expect("recommend");
        assert_eq!(recommendations.strategy, RankingStrategy::Personalised);
        assert_eq!(recommendations.ids().collect::<Vec<_>>(), vec![10, 11]);
    }

    #[rstest]
    fn no_history_uses_popularity(store: MemoryStore) {
        let recommendations = Recommender::from_store(&store)
            .recommend(USER, Some(1))
            .expect("recommend");
        assert_eq!(recommendations.strategy, RankingStrategy::Popularity);
        assert_eq!(recommendations.ids().collect::<Vec<_>>(), vec![11]);
    }

    #[rstest]
    fn secondary_history_alone_personalises(store: MemoryStore) {
        let seeded = store.with_secondary(
            USER,
            [InteractionRecord::new(3, InteractionKind::Favorite).with_category(PUZZLE)],
        );
        let recommendations = Recommender::from_store(&seeded)
            .recommend(USER, None)
            .expect("recommend");
        assert_eq!(recommendations.strategy, RankingStrategy::Personalised);
        assert_eq!(recommendations.ids().next(), Some(11));
    }

    #[rstest]
    fn unavailable_secondary_degrades_to_primary(store: MemoryStore) {
        let seeded = store.with_interactions(USER, [found(1, TRADITIONAL)]);
        let recommender = Recommender::new(&seeded, NoSecondarySource, &seeded, &seeded);
        let history = recommender.history(USER).expect("history");
        assert_eq!(history.len(), 1);
    }

    #[rstest]
    fn primary_failure_propagates(store: MemoryStore) {
        let recommender = Recommender::new(FailingSource, &store, &store, &store);
        let err = recommender.recommend(USER, None).expect_err("primary fails");
        assert!(matches!(err, RecommendError::Interactions { user_id: USER, .. }));
    }

    #[rstest]
    fn candidate_failure_propagates(store: MemoryStore) {
        let seeded = store.with_interactions(USER, [found(1, TRADITIONAL)]);
        let recommender = Recommender::new(&seeded, &seeded, FailingSource, &seeded);
        let err = recommender.recommend(USER, None).expect_err("candidates fail");
        assert!(matches!(err, RecommendError::Candidates { .. }));
    }

    #[rstest]
    fn fallback_failure_propagates(store: MemoryStore) {
        let recommender = Recommender::new(&store, &store, &store, FailingSource);
        let err = recommender.recommend(USER, None).expect_err("fallback fails");
        assert!(matches!(err, RecommendError::Fallback { .. }));
    }

    #[rstest]
    fn oversized_candidate_sets_are_capped(store: MemoryStore) {
        struct Flood;
        impl CandidateSource for Flood {
            fn candidates(
                &self,
                _query: &CandidateQuery,
            ) -> Result<Vec<CandidateItem>, SourceError> {
                Ok((0..250)
                    .map(|id| CandidateItem::new(id, TRADITIONAL, 2.0, Coord { x: 0.0, y: 0.0 }))
                    .collect())
            }
        }
        let seeded = store.with_interactions(USER, [found(1, TRADITIONAL)]);
        let config = RecommenderConfig {
            default_limit: 500,
            ..RecommenderConfig::default()
        };
        let recommender = Recommender::with_config(&seeded, &seeded, Flood, &seeded, config)
            .expect("valid config");
        let recommendations = recommender.recommend(USER, None).expect("recommend");
        assert_eq!(recommendations.items.len(), DEFAULT_CANDIDATE_LIMIT);
    }

    #[rstest]
    fn profile_is_none_without_history(store: MemoryStore) {
        let recommender = Recommender::from_store(&store);
        assert!(recommender.profile(USER).expect("profile").is_none());
    }

    #[rstest]
    fn config_rejects_invalid_factor_weights() {
        let config = RecommenderConfig {
            factor_weights: FactorWeights {
                difficulty: -1.0,
                ..FactorWeights::default()
            },
            ..RecommenderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RecommenderConfigError::FactorWeights(_))
        ));
    }

    #[rstest]
    fn negative_factor_weights_never_reach_scoring(store: MemoryStore) {
        let seeded = store.with_interactions(USER, [found(1, TRADITIONAL)]);
        let config = RecommenderConfig {
            factor_weights: FactorWeights {
                category: -2.0,
                ..FactorWeights::default()
            },
            ..RecommenderConfig::default()
        };
        let err = Recommender::with_config(&seeded, &seeded, &seeded, &seeded, config)
            .expect_err("negative weight rejected");
        assert_eq!(
            err,
            RecommenderConfigError::FactorWeights(FactorWeightsError::InvalidWeight {
                factor: "category",
                value: -2.0,
            })
        );
    }

    #[rstest]
    fn negative_found_multiplier_is_rejected(store: MemoryStore) {
        let config = RecommenderConfig {
            interaction_weights: InteractionWeights {
                found_multiplier: -5.0,
                ..InteractionWeights::default()
            },
            ..RecommenderConfig::default()
        };
        let err = Recommender::with_config(&store, &store, &store, &store, config)
            .expect_err("negative multiplier rejected");
        assert!(matches!(
            err,
            RecommenderConfigError::InteractionWeights(InteractionWeightsError::InvalidWeight {
                field: "found_multiplier",
                ..
            })
        ));
    }

    #[rstest]
    fn custom_weights_shape_the_ranking(store: MemoryStore) {
        let seeded = store.with_interactions(USER, [found(1, TRADITIONAL)]);
        let config = RecommenderConfig {
            factor_weights: FactorWeights {
                category: 0.0,
                difficulty: 0.0,
                location: 0.0,
                popularity: 1.0,
            },
            ..RecommenderConfig::default()
        };
        let recommendations = Recommender::with_config(&seeded, &seeded, &seeded, &seeded, config)
            .expect("valid config")
            .recommend(USER, None)
            .expect("recommend");
        // Popularity alone favours the busier puzzle cache.
        assert_eq!(recommendations.ids().collect::<Vec<_>>(), vec![11, 10]);
    }

    #[rstest]
    fn partial_config_keeps_defaults() {
        let config: RecommenderConfig =
            serde_json::from_str(r#"{"factor_weights":{"popularity":0.05}}"#).expect("parse");
        assert_eq!(config.factor_weights.popularity, 0.05);
        assert_eq!(config.factor_weights.category, 0.35);
        assert_eq!(config.interaction_weights, InteractionWeights::default());
        assert_eq!(config.candidate_cap, DEFAULT_CANDIDATE_LIMIT);
    }
}
