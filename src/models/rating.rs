//! Rating model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One user's live rating of one music entry. Unique per (user, music);
/// re-rating overwrites the previous score.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub user_id: i64,
    pub music_id: i64,
    pub score: i32,
}

/// Compute the aggregate stats stored on a music row from its live ratings.
///
/// Always a full recompute over every score, never an incremental update, so
/// the stored mean cannot drift.
pub fn rating_stats(scores: &[i32]) -> (f64, i64) {
    if scores.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = scores.iter().map(|&s| s as i64).sum();
    (sum as f64 / scores.len() as f64, scores.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ratings_yield_zero() {
        assert_eq!(rating_stats(&[]), (0.0, 0));
    }

    #[test]
    fn mean_over_distinct_scores() {
        let (avg, count) = rating_stats(&[4, 2, 3]);
        assert!((avg - 3.0).abs() < f64::EPSILON);
        assert_eq!(count, 3);
    }

    #[test]
    fn single_score_is_its_own_mean() {
        assert_eq!(rating_stats(&[5]), (5.0, 1));
    }
}
