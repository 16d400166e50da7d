//! Scoring and ranking for Cachetrail recommendations.
//!
//! The crate evaluates candidate caches against a
//! [`UserProfile`](cachetrail_core::UserProfile) along four independent
//! factors, each mapped into `0.0..=1.0`:
//! - **Category affinity**: the user's share of interaction weight in the
//!   cache's category.
//! - **Difficulty fit**: a Gaussian (or, without spread, linear) kernel
//!   around the user's weighted mean difficulty.
//! - **Proximity**: a weight-averaged exponential kernel over the user's
//!   affinity clusters.
//! - **Popularity**: the cache's interaction count on a logarithmic scale
//!   relative to the busiest candidate.
//!
//! [`FactorWeights`] blends the factors into a composite score and
//! [`Ranker`] orders candidates by it. [`Recommender`] wires the collaborator
//! traits from `cachetrail-core` together: it reads a user's history, builds
//! the profile, and returns either a personalised ranking or a popularity
//! fallback for users without history.
//!
//! # Examples
//!
//! ```
//! use geo::Coord;
//! use cachetrail_core::{
//!     CandidateItem, CategoryId, InteractionKind, InteractionRecord, ProfileBuilder,
//! };
//! use cachetrail_scorer::{Ranker, RankingStrategy};
//!
//! let history = [InteractionRecord::new(1, InteractionKind::Found)
//!     .with_category(CategoryId::new(1))
//!     .with_difficulty(2.0)
//!     .with_location(Coord { x: -88.2, y: 40.1 })];
//! let profile = ProfileBuilder::default().build(&history);
//! let candidates = vec![
//!     CandidateItem::new(5, CategoryId::new(1), 2.0, Coord { x: -88.2, y: 40.1 }),
//!     CandidateItem::new(6, CategoryId::new(2), 5.0, Coord { x: 2.35, y: 48.85 }),
//! ];
//! let ranked = Ranker::default().rank(profile.as_ref(), candidates, 10);
//! assert_eq!(ranked.strategy, RankingStrategy::Personalised);
//! assert_eq!(ranked.ids().next(), Some(5));
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod factors;
mod ranker;
mod recommender;
mod weights;

pub use factors::{
    DIFFICULTY_RANGE, DIFFICULTY_SPREAD_FLOOR, LOCATION_DECAY_DEGREES, NEUTRAL_SCORE,
    POPULARITY_SCALE, category_score, difficulty_score, location_score, popularity_score,
    sanitise,
};
pub use ranker::{Ranker, RankingStrategy, Recommendations, fallback_ranking};
pub use recommender::{
    DEFAULT_LIMIT, RecommendError, Recommender, RecommenderConfig, RecommenderConfigError,
};
pub use weights::{FactorWeights, FactorWeightsError};
