//! Caches eligible for recommendation and their scored form.

use geo::Coord;

use crate::interaction::CategoryId;

/// A cache that may be recommended to a user.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::{CandidateItem, CategoryId};
///
/// let item = CandidateItem::new(9, CategoryId::new(2), 3.0, Coord { x: -88.2, y: 40.1 })
///     .with_interaction_count(12)
///     .with_title("Hidden bench");
/// assert_eq!(item.interaction_count, 12);
/// assert_eq!(item.title, "Hidden bench");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateItem {
    /// Cache identifier.
    pub id: u64,
    /// Category of the cache.
    pub category: CategoryId,
    /// Difficulty rating, nominally `1.0..=5.0`.
    pub difficulty: f64,
    /// WGS84 position (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
    /// Aggregate number of interactions every user has had with the cache.
    pub interaction_count: u64,
    /// Unix timestamp of creation, used for recency ordering.
    pub created_at: i64,
    /// Display title.
    pub title: String,
    /// Display name of the category.
    pub category_name: Option<String>,
    /// User who hid the cache.
    pub owner_id: Option<u64>,
}

impl CandidateItem {
    /// Construct a candidate with empty display fields.
    #[must_use]
    pub const fn new(id: u64, category: CategoryId, difficulty: f64, location: Coord<f64>) -> Self {
        Self {
            id,
            category,
            difficulty,
            location,
            interaction_count: 0,
            created_at: 0,
            title: String::new(),
            category_name: None,
            owner_id: None,
        }
    }

    /// Set the aggregate interaction count.
    #[must_use]
    pub fn with_interaction_count(mut self, count: u64) -> Self {
        self.interaction_count = count;
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Per-factor scores behind a composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreBreakdown {
    /// Category affinity.
    pub category: f64,
    /// Difficulty fit.
    pub difficulty: f64,
    /// Proximity to affinity clusters.
    pub location: f64,
    /// Normalised popularity.
    pub popularity: f64,
}

/// A candidate together with its ranking score.
///
/// Personalised results carry the factor breakdown; popularity fallback
/// results carry a flat neutral score and no breakdown.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredCandidate {
    /// The recommended cache.
    pub item: CandidateItem,
    /// Composite score in `0.0..=1.0`.
    pub score: f64,
    /// Factor scores, when the score was personalised.
    pub breakdown: Option<ScoreBreakdown>,
}
