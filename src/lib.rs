//! Facade crate for the Cachetrail recommendation engine.
//!
//! This crate re-exports the core domain types and the scorer, and exposes the
//! SQLite store behind the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use cachetrail_core::{
    CandidateItem, CandidateQuery, CandidateSource, CategoryId, CategoryScores, Cluster,
    DifficultyPreference, FallbackSource, InteractionKind, InteractionRecord, InteractionSource,
    InteractionWeights, InteractionWeightsError, NoSecondarySource, ProfileBuilder,
    ScoreBreakdown, ScoredCandidate, SecondaryInteractionSource, SecondaryInteractions,
    SourceError, UserProfile, WeightedPoint, WeightedPointError, cluster_points,
};
pub use cachetrail_scorer::{
    FactorWeights, FactorWeightsError, Ranker, RankingStrategy, RecommendError, Recommendations,
    Recommender, RecommenderConfig, RecommenderConfigError,
};

#[cfg(feature = "store-sqlite")]
pub use cachetrail_core::{NewCache, SqliteStore, SqliteStoreError};
