//! Per-factor scoring functions.
//!
//! Each function is pure and maps its inputs into `0.0..=1.0`. Degenerate
//! inputs (no profile data, no clusters, no popularity signal) yield the
//! neutral score [`NEUTRAL_SCORE`] rather than an error, and non-finite
//! intermediates collapse to `0.0`.

use cachetrail_core::distance::degree_distance;
use cachetrail_core::{CategoryId, CategoryScores, Cluster};
use geo::Coord;

/// Score used when a factor has no signal to work with.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Width of the difficulty scale used by the linear fallback.
pub const DIFFICULTY_RANGE: f64 = 5.0;

/// Added to the standard deviation so narrow preferences still tolerate
/// nearby difficulties.
pub const DIFFICULTY_SPREAD_FLOOR: f64 = 0.5;

/// Decay constant, in degrees, of the proximity kernel.
pub const LOCATION_DECAY_DEGREES: f64 = 0.02;

/// Scale applied inside the popularity logarithm so the maximum maps to one.
pub const POPULARITY_SCALE: f64 = 9.0;

/// Clamp `value` into `0.0..=1.0`, mapping non-finite values to `0.0`.
///
/// # Examples
/// ```
/// use cachetrail_scorer::sanitise;
///
/// assert_eq!(sanitise(f64::NAN), 0.0);
/// assert_eq!(sanitise(1.7), 1.0);
/// assert_eq!(sanitise(0.25), 0.25);
/// ```
#[must_use]
pub fn sanitise(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Affinity of the user for `category`.
///
/// Returns the stored share when present, `0.0` when the user has category
/// data but never engaged with `category`, and [`NEUTRAL_SCORE`] when the user
/// has no category data at all.
///
/// # Examples
/// ```
/// use cachetrail_core::{CategoryId, CategoryScores};
/// use cachetrail_scorer::category_score;
///
/// let scores = CategoryScores::from_iter([(CategoryId::new(1), 0.8)]);
/// assert_eq!(category_score(CategoryId::new(1), &scores), 0.8);
/// assert_eq!(category_score(CategoryId::new(2), &scores), 0.0);
/// assert_eq!(category_score(CategoryId::new(2), &CategoryScores::default()), 0.5);
/// ```
#[must_use]
pub fn category_score(category: CategoryId, scores: &CategoryScores) -> f64 {
    if scores.is_empty() {
        return NEUTRAL_SCORE;
    }
    sanitise(scores.get(category).unwrap_or(0.0))
}

/// Fit between a cache's difficulty and the user's preference.
///
/// With no spread (a zero or non-finite standard deviation) the score falls
/// off linearly across [`DIFFICULTY_RANGE`]. Otherwise it follows a Gaussian
/// kernel widened by [`DIFFICULTY_SPREAD_FLOOR`].
#[expect(
    clippy::float_arithmetic,
    reason = "difficulty fit is a continuous kernel over ratings"
)]
#[must_use]
pub fn difficulty_score(difficulty: f64, mean: f64, std_dev: f64) -> f64 {
    let distance = (difficulty - mean).abs();
    let score = if std_dev.is_finite() && std_dev > 0.0 {
        let scaled = distance / (std_dev + DIFFICULTY_SPREAD_FLOOR);
        (-0.5 * scaled * scaled).exp()
    } else {
        (1.0 - distance / DIFFICULTY_RANGE).max(0.0)
    };
    sanitise(score)
}

/// Logarithmically normalised popularity of a cache.
///
/// `max_count` is the largest interaction count across the candidate set.
/// A zero maximum carries no signal and yields [`NEUTRAL_SCORE`].
///
/// # Examples
/// ```
/// use cachetrail_scorer::popularity_score;
///
/// assert!((popularity_score(10, 10) - 1.0).abs() < 1e-12);
/// assert_eq!(popularity_score(0, 10), 0.0);
/// assert_eq!(popularity_score(0, 0), 0.5);
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "popularity is a logarithmic ratio of counts"
)]
#[expect(
    clippy::cast_precision_loss,
    reason = "interaction counts stay far below 2^52"
)]
#[must_use]
pub fn popularity_score(count: u64, max_count: u64) -> f64 {
    if max_count == 0 {
        return NEUTRAL_SCORE;
    }
    let ratio = count as f64 / max_count as f64;
    sanitise(POPULARITY_SCALE.mul_add(ratio, 1.0).log10())
}

/// Proximity of `location` to the user's affinity clusters.
///
/// Each cluster contributes `exp(-distance / LOCATION_DECAY_DEGREES)`,
/// weighted by the cluster's weight. Users without clusters get
/// [`NEUTRAL_SCORE`].
#[expect(
    clippy::float_arithmetic,
    reason = "proximity is a weighted average of exponential kernels"
)]
#[must_use]
pub fn location_score(location: Coord<f64>, clusters: &[Cluster]) -> f64 {
    let total_weight: f64 = clusters.iter().map(|cluster| cluster.weight).sum();
    if clusters.is_empty() || total_weight <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let weighted: f64 = clusters
        .iter()
        .map(|cluster| {
            let distance = degree_distance(location, cluster.centroid);
            cluster.weight * (-distance / LOCATION_DECAY_DEGREES).exp()
        })
        .sum();
    sanitise(weighted / total_weight)
}
