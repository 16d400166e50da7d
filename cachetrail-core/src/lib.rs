//! Core domain types for the Cachetrail recommendation engine.
//!
//! This crate turns a user's interaction history into a [`UserProfile`]
//! (category affinities, a difficulty preference, and geographic affinity
//! clusters) and defines the collaborator traits through which histories and
//! candidate caches are read. Scoring and ranking live in
//! `cachetrail-scorer`.
//!
//! Coordinates are `geo::Coord<f64>` in WGS84 with `x = longitude` and
//! `y = latitude`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod candidate;
mod cluster;
pub mod distance;
mod interaction;
mod profile;
mod source;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use candidate::{CandidateItem, ScoreBreakdown, ScoredCandidate};
pub use cluster::{
    CLUSTER_RADIUS_DEGREES, Cluster, SMALL_SET_THRESHOLD, WeightedPoint, WeightedPointError,
    cluster_points,
};
pub use interaction::{CategoryId, InteractionKind, InteractionRecord};
pub use profile::{
    CategoryScores, DifficultyPreference, InteractionWeights, InteractionWeightsError,
    ProfileBuilder, UserProfile,
};
pub use source::{
    CandidateQuery, CandidateSource, DEFAULT_CANDIDATE_LIMIT, FallbackSource, InteractionSource,
    NoSecondarySource, SecondaryInteractionSource, SecondaryInteractions, SourceError,
};
#[cfg(feature = "store-sqlite")]
pub use store::{NewCache, SqliteStore, SqliteStoreError};
