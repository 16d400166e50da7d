//! Raw user interactions with caches.
//!
//! Interaction records are the only input to profile building. Each record
//! carries a snapshot of the referenced cache's category, difficulty, and
//! location taken when the history was read.

use std::fmt;
use std::str::FromStr;

use geo::Coord;

/// Identifier of a cache category.
///
/// # Examples
/// ```
/// use cachetrail_core::CategoryId;
///
/// let id = CategoryId::new(4);
/// assert_eq!(id.get(), 4);
/// assert_eq!(id.to_string(), "4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CategoryId(u64);

impl CategoryId {
    /// Wrap a raw category identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for CategoryId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of action a user performed on a cache.
///
/// `Found` marks task completion and is by far the strongest signal.
///
/// # Examples
/// ```
/// use cachetrail_core::InteractionKind;
///
/// assert_eq!("favorite".parse::<InteractionKind>(), Ok(InteractionKind::Favorite));
/// assert_eq!("bookmark".parse::<InteractionKind>(), Ok(InteractionKind::Other));
/// assert_eq!(InteractionKind::Visit.as_str(), "visit");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InteractionKind {
    /// The user found (completed) the cache.
    Found,
    /// The user marked the cache as a favourite.
    Favorite,
    /// The user opened the cache details.
    View,
    /// The user visited the cache location without logging a find.
    Visit,
    /// Any interaction type the engine does not recognise.
    Other,
}

impl InteractionKind {
    /// Return the kind as the lowercase label used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::Favorite => "favorite",
            Self::View => "view",
            Self::Visit => "visit",
            Self::Other => "other",
        }
    }

    /// Report whether the kind denotes task completion.
    #[must_use]
    pub const fn is_found(self) -> bool {
        matches!(self, Self::Found)
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = std::convert::Infallible;

    /// Parse a storage label. Unknown labels map to [`InteractionKind::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "found" => Self::Found,
            "favorite" | "favourite" => Self::Favorite,
            "view" => Self::View,
            "visit" => Self::Visit,
            _ => Self::Other,
        })
    }
}

/// A single recorded action of a user on a cache.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::{CategoryId, InteractionKind, InteractionRecord};
///
/// let record = InteractionRecord::new(12, InteractionKind::Found)
///     .with_category(CategoryId::new(3))
///     .with_difficulty(2.5)
///     .with_location(Coord { x: -88.2, y: 40.1 });
/// assert!(record.kind.is_found());
/// assert_eq!(record.weight_override, None);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractionRecord {
    /// Cache the interaction refers to.
    pub item_id: u64,
    /// Category of the cache when the interaction was read.
    pub category: Option<CategoryId>,
    /// Difficulty rating of the cache, nominally `1.0..=5.0`.
    pub difficulty: Option<f64>,
    /// Cache position.
    pub location: Option<Coord<f64>>,
    /// What the user did.
    pub kind: InteractionKind,
    /// Explicit weight replacing the kind default.
    pub weight_override: Option<f64>,
    /// Unix timestamp in seconds. Carried for callers; unused by scoring.
    pub occurred_at: i64,
}

impl InteractionRecord {
    /// Construct a record with no cache snapshot attached.
    #[must_use]
    pub const fn new(item_id: u64, kind: InteractionKind) -> Self {
        Self {
            item_id,
            category: None,
            difficulty: None,
            location: None,
            kind,
            weight_override: None,
            occurred_at: 0,
        }
    }

    /// Attach a category.
    #[must_use]
    pub const fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Attach a difficulty rating.
    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: f64) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Attach a cache location.
    #[must_use]
    pub const fn with_location(mut self, location: Coord<f64>) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach an explicit weight.
    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight_override = Some(weight);
        self
    }

    /// Attach a timestamp.
    #[must_use]
    pub const fn at(mut self, occurred_at: i64) -> Self {
        self.occurred_at = occurred_at;
        self
    }
}
