//! Property tests for the pure navigation and rating arithmetic

use proptest::prelude::*;

use TuneCircle::handlers::views::{clamp_page, last_page, page_slice};
use TuneCircle::models::rating::rating_stats;
use TuneCircle::state::HistoryFlow;

proptest! {
    #[test]
    fn carousel_seek_always_lands_inside_the_snapshot(
        len in 1usize..50,
        target in -100i64..200,
    ) {
        let mut flow = HistoryFlow::new((0..len as i64).collect());
        let index = flow.seek(target);
        prop_assert!(index < len);
        prop_assert!(flow.current().is_some());
    }

    #[test]
    fn carousel_never_wraps_around(len in 2usize..50) {
        let mut flow = HistoryFlow::new((0..len as i64).collect());
        // Step past the start and past the end
        prop_assert_eq!(flow.seek(-1), 0);
        prop_assert_eq!(flow.seek(len as i64), len - 1);
        prop_assert_eq!(flow.seek(len as i64 + 7), len - 1);
    }

    #[test]
    fn page_clamp_stays_in_range(
        len in 0usize..100,
        size in 1usize..10,
        requested in -50i64..150,
    ) {
        let page = clamp_page(len, size, requested);
        prop_assert!(page <= last_page(len, size));
        // Non-empty lists always show something on a clamped page
        if len > 0 {
            prop_assert!(!page_slice(&vec![0u8; len], page, size).is_empty());
        }
    }

    #[test]
    fn rating_mean_lies_between_min_and_max(scores in prop::collection::vec(0i32..=5, 1..30)) {
        let (mean, count) = rating_stats(&scores);
        let min = *scores.iter().min().unwrap() as f64;
        let max = *scores.iter().max().unwrap() as f64;
        prop_assert_eq!(count, scores.len() as i64);
        prop_assert!(mean >= min && mean <= max);
    }

    #[test]
    fn replacing_a_score_changes_the_mean_by_full_recompute(
        scores in prop::collection::vec(0i32..=5, 2..20),
        replacement in 0i32..=5,
    ) {
        // Overwriting one rater's score must yield exactly the mean of the
        // resulting multiset, as if recomputed from scratch.
        let mut updated = scores.clone();
        updated[0] = replacement;
        let (mean, count) = rating_stats(&updated);
        let expected: f64 =
            updated.iter().map(|&s| s as f64).sum::<f64>() / updated.len() as f64;
        prop_assert_eq!(count, updated.len() as i64);
        prop_assert!((mean - expected).abs() < 1e-9);
    }
}
