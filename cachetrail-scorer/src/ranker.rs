//! Composite scoring and ordering of candidate caches.

use std::cmp::{Ordering, Reverse};

use cachetrail_core::{CandidateItem, ScoreBreakdown, ScoredCandidate, UserProfile};
use serde::Serialize;

use crate::factors::{
    NEUTRAL_SCORE, category_score, difficulty_score, location_score, popularity_score,
};
use crate::weights::{FactorWeights, FactorWeightsError};

/// How a recommendation list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// Candidates were scored against the user's profile.
    Personalised,
    /// The user had no usable history; items are ordered by popularity.
    Popularity,
}

/// An ordered recommendation list and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    /// Strategy used for this request.
    pub strategy: RankingStrategy,
    /// Recommended caches, best first.
    pub items: Vec<ScoredCandidate>,
}

impl Recommendations {
    /// Report whether nothing was recommended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Identifiers of the recommended caches, best first.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.iter().map(|scored| scored.item.id)
    }
}

/// Scores candidates against a profile and orders them.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::{CandidateItem, CategoryId};
/// use cachetrail_scorer::{Ranker, RankingStrategy};
///
/// let items = vec![
///     CandidateItem::new(1, CategoryId::new(1), 2.0, Coord { x: 0.0, y: 0.0 })
///         .with_interaction_count(3),
///     CandidateItem::new(2, CategoryId::new(1), 2.0, Coord { x: 0.0, y: 0.0 })
///         .with_interaction_count(8),
/// ];
/// let ranked = Ranker::default().rank(None, items, 10);
/// assert_eq!(ranked.strategy, RankingStrategy::Popularity);
/// assert_eq!(ranked.ids().collect::<Vec<_>>(), vec![2, 1]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    weights: FactorWeights,
}

impl Ranker {
    /// Construct a ranker with custom factor weights.
    ///
    /// # Errors
    /// Returns [`FactorWeightsError`] when `weights` fails
    /// [`FactorWeights::validate`].
    pub fn new(weights: FactorWeights) -> Result<Self, FactorWeightsError> {
        Ok(Self {
            weights: weights.validate()?,
        })
    }

    /// Factor weights in use.
    #[must_use]
    pub const fn weights(&self) -> FactorWeights {
        self.weights
    }

    /// Rank `candidates` for a user.
    ///
    /// Without a profile carrying any interactions the candidates are ordered
    /// by popularity instead, and no factor is evaluated.
    #[must_use]
    pub fn rank(
        &self,
        profile: Option<&UserProfile>,
        candidates: Vec<CandidateItem>,
        limit: usize,
    ) -> Recommendations {
        match profile.filter(|built| built.has_signal()) {
            Some(built) => self.personalise(built, candidates, limit),
            None => fallback_ranking(candidates, limit),
        }
    }

    /// Score every candidate against `profile` and keep the best `limit`.
    #[must_use]
    pub fn personalise(
        &self,
        profile: &UserProfile,
        candidates: Vec<CandidateItem>,
        limit: usize,
    ) -> Recommendations {
        let max_interactions = candidates
            .iter()
            .map(|item| item.interaction_count)
            .max()
            .unwrap_or(0)
            .max(1);
        let total = candidates.len();
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|item| self.score(profile, item, max_interactions))
            .collect();
        scored.sort_by(by_score_then_recency);
        scored.truncate(limit);
        log::debug!(
            "ranked {total} candidates, returning {} (top score {:?})",
            scored.len(),
            scored.first().map(|best| best.score)
        );
        Recommendations {
            strategy: RankingStrategy::Personalised,
            items: scored,
        }
    }

    /// Score a single candidate.
    #[must_use]
    pub fn score(
        &self,
        profile: &UserProfile,
        item: CandidateItem,
        max_interactions: u64,
    ) -> ScoredCandidate {
        let breakdown = ScoreBreakdown {
            category: category_score(item.category, &profile.category_scores),
            difficulty: difficulty_score(
                item.difficulty,
                profile.difficulty.mean,
                profile.difficulty.std_dev,
            ),
            location: location_score(item.location, &profile.clusters),
            popularity: popularity_score(item.interaction_count, max_interactions),
        };
        ScoredCandidate {
            score: self.weights.combine(&breakdown),
            breakdown: Some(breakdown),
            item,
        }
    }
}

/// Order `items` by popularity and assign each the neutral score.
///
/// Items are sorted by interaction count, then recency, then identifier, and
/// the first `limit` are kept.
#[must_use]
pub fn fallback_ranking(mut items: Vec<CandidateItem>, limit: usize) -> Recommendations {
    items.sort_by_key(|item| {
        (
            Reverse(item.interaction_count),
            Reverse(item.created_at),
            item.id,
        )
    });
    items.truncate(limit);
    Recommendations {
        strategy: RankingStrategy::Popularity,
        items: items
            .into_iter()
            .map(|item| ScoredCandidate {
                item,
                score: NEUTRAL_SCORE,
                breakdown: None,
            })
            .collect(),
    }
}

fn by_score_then_recency(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.item.created_at.cmp(&a.item.created_at))
        .then_with(|| a.item.id.cmp(&b.item.id))
}
