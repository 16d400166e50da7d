//! Greedy single-pass clustering of weighted locations.
//!
//! Small inputs (up to [`SMALL_SET_THRESHOLD`] points) collapse into one
//! weighted centroid. Larger inputs are assigned in order: each point joins
//! the first cluster within [`CLUSTER_RADIUS_DEGREES`] of it, or opens a new
//! one. Clusters only grow; they are never merged, split, or re-centred.

use geo::Coord;
use thiserror::Error;

use crate::distance::degree_distance;

/// Maximum degree-equivalent distance for a point to join a cluster (~0.5 km).
pub const CLUSTER_RADIUS_DEGREES: f64 = 0.0045;

/// Inputs of at most this many points collapse into a single cluster.
pub const SMALL_SET_THRESHOLD: usize = 3;

/// A location carrying a strictly positive weight.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::WeightedPoint;
///
/// let point = WeightedPoint::new(Coord { x: 1.0, y: 2.0 }, 15.0)?;
/// assert_eq!(point.weight(), 15.0);
/// assert!(WeightedPoint::new(Coord { x: 1.0, y: 2.0 }, 0.0).is_err());
/// # Ok::<(), cachetrail_core::WeightedPointError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightedPoint {
    location: Coord<f64>,
    weight: f64,
}

/// Errors returned by [`WeightedPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WeightedPointError {
    /// The weight was zero, negative, or not finite.
    #[error("point weight must be finite and positive, got {0}")]
    InvalidWeight(f64),
}

impl WeightedPoint {
    /// Validate and construct a weighted point.
    ///
    /// # Errors
    /// Returns [`WeightedPointError::InvalidWeight`] unless `weight` is
    /// finite and strictly positive.
    pub fn new(location: Coord<f64>, weight: f64) -> Result<Self, WeightedPointError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(WeightedPointError::InvalidWeight(weight));
        }
        Ok(Self { location, weight })
    }

    /// Position of the point.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        self.location
    }

    /// Weight of the point.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

/// A weight-accumulating centroid of user affinity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cluster {
    /// Running weighted average of every merged point.
    pub centroid: Coord<f64>,
    /// Sum of the weights of every merged point.
    pub weight: f64,
}

impl Cluster {
    const fn seed(point: &WeightedPoint) -> Self {
        Self {
            centroid: point.location,
            weight: point.weight,
        }
    }

    fn absorb(&mut self, point: &WeightedPoint) {
        let total = self.weight + point.weight;
        self.centroid = Coord {
            x: (self.centroid.x * self.weight + point.location.x * point.weight) / total,
            y: (self.centroid.y * self.weight + point.location.y * point.weight) / total,
        };
        self.weight = total;
    }
}

/// Group weighted points into affinity clusters.
///
/// The result is deterministic but depends on input order.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::{WeightedPoint, cluster_points};
///
/// let points = [
///     WeightedPoint::new(Coord { x: 0.0, y: 0.0 }, 1.0)?,
///     WeightedPoint::new(Coord { x: 0.002, y: 0.0 }, 1.0)?,
/// ];
/// let clusters = cluster_points(&points);
/// assert_eq!(clusters.len(), 1);
/// assert!((clusters[0].centroid.x - 0.001).abs() < 1e-12);
/// assert_eq!(clusters[0].weight, 2.0);
/// # Ok::<(), cachetrail_core::WeightedPointError>(())
/// ```
#[must_use]
pub fn cluster_points(points: &[WeightedPoint]) -> Vec<Cluster> {
    match points {
        [] => Vec::new(),
        [first, rest @ ..] if points.len() <= SMALL_SET_THRESHOLD => {
            let mut cluster = Cluster::seed(first);
            for point in rest {
                cluster.absorb(point);
            }
            vec![cluster]
        }
        _ => greedy_assign(points),
    }
}

fn greedy_assign(points: &[WeightedPoint]) -> Vec<Cluster> {
    let mut arena: Vec<Cluster> = Vec::new();
    for point in points {
        let target = arena.iter().position(|cluster| {
            degree_distance(point.location, cluster.centroid) <= CLUSTER_RADIUS_DEGREES
        });
        match target.and_then(|index| arena.get_mut(index)) {
            Some(cluster) => cluster.absorb(point),
            None => arena.push(Cluster::seed(point)),
        }
    }
    log::debug!(
        "clustered {} points into {} clusters",
        points.len(),
        arena.len()
    );
    arena
}
