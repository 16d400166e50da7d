//! Property-based tests for the scoring functions and ranker.
//!
//! # Invariants tested
//!
//! - **Bounded factors:** Every factor score lies in `0.0..=1.0`.
//! - **Bounded composite:** With the default weights every composite score
//!   lies in `0.0..=1.0`.
//! - **Ordering:** Ranked results are sorted by descending score and never
//!   exceed the requested limit.
//! - **Exact matches:** A difficulty equal to the mean always scores one.

use cachetrail_core::{
    CandidateItem, CategoryId, CategoryScores, Cluster, DifficultyPreference, UserProfile,
};
use cachetrail_scorer::{
    Ranker, category_score, difficulty_score, location_score, popularity_score,
};
use geo::Coord;
use proptest::prelude::*;

fn coord_strategy() -> impl Strategy<Value = Coord<f64>> {
    (-180.0_f64..180.0, -85.0_f64..85.0).prop_map(|(x, y)| Coord { x, y })
}

fn cluster_strategy() -> impl Strategy<Value = Cluster> {
    (coord_strategy(), 0.1_f64..100.0).prop_map(|(centroid, weight)| Cluster { centroid, weight })
}

fn candidate_strategy() -> impl Strategy<Value = CandidateItem> {
    (
        0_u64..1_000,
        0_u64..5,
        1.0_f64..=5.0,
        coord_strategy(),
        0_u64..500,
        0_i64..1_000_000,
    )
        .prop_map(|(id, category, difficulty, location, count, created)| {
            CandidateItem::new(id, CategoryId::new(category), difficulty, location)
                .with_interaction_count(count)
                .created_at(created)
        })
}

fn profile_strategy() -> impl Strategy<Value = UserProfile> {
    (
        proptest::collection::vec(0.0_f64..1.0, 0..5),
        1.0_f64..=5.0,
        0.0_f64..3.0,
        proptest::collection::vec(cluster_strategy(), 0..4),
        1_usize..50,
    )
        .prop_map(|(raw_shares, mean, std_dev, clusters, interactions)| {
            let total: f64 = raw_shares.iter().sum::<f64>().max(1.0);
            let category_scores = raw_shares
                .iter()
                .enumerate()
                .map(|(idx, share)| (CategoryId::new(idx as u64), share / total))
                .collect::<CategoryScores>();
            UserProfile {
                category_scores,
                difficulty: DifficultyPreference { mean, std_dev },
                clusters,
                found_locations: Vec::new(),
                total_interactions: interactions,
                total_weight: 1.0,
            }
        })
}

fn in_unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: each factor is bounded.
    #[test]
    fn factor_scores_are_bounded(
        profile in profile_strategy(),
        item in candidate_strategy(),
        max_count in 0_u64..1_000,
    ) {
        prop_assert!(in_unit_interval(category_score(item.category, &profile.category_scores)));
        prop_assert!(in_unit_interval(difficulty_score(
            item.difficulty,
            profile.difficulty.mean,
            profile.difficulty.std_dev,
        )));
        prop_assert!(in_unit_interval(location_score(item.location, &profile.clusters)));
        prop_assert!(in_unit_interval(popularity_score(item.interaction_count, max_count)));
    }

    /// Property: a difficulty equal to the mean is a perfect fit.
    #[test]
    fn exact_difficulty_scores_one(mean in 1.0_f64..=5.0, std_dev in 0.0_f64..3.0) {
        prop_assert_eq!(difficulty_score(mean, mean, std_dev), 1.0);
    }

    /// Property: ranked output is bounded, sorted, and within the limit.
    #[test]
    fn ranking_is_sorted_and_bounded(
        profile in profile_strategy(),
        items in proptest::collection::vec(candidate_strategy(), 0..60),
        limit in 0_usize..20,
    ) {
        let ranked = Ranker::default().rank(Some(&profile), items.clone(), limit);
        prop_assert!(ranked.items.len() <= limit.min(items.len()));
        for scored in &ranked.items {
            prop_assert!(scored.score >= -1e-12 && scored.score <= 1.0 + 1e-12);
            prop_assert!(scored.breakdown.is_some());
        }
        for pair in ranked.items.windows(2) {
            if let [first, second] = pair {
                prop_assert!(first.score >= second.score);
            }
        }
    }
}
