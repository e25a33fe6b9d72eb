use crate::types::StreakScore;
use std::collections::BTreeMap;

/// Find the most frequent value of a draw.
///
/// Ties on frequency go to the numerically largest value. An empty draw
/// scores `{count: 0, value: 0}`; normalized configs never produce one.
pub fn score(draw: &[i64]) -> StreakScore {
    let mut freq: BTreeMap<i64, u32> = BTreeMap::new();
    for &n in draw {
        *freq.entry(n).or_insert(0) += 1;
    }

    // Ascending key order: `>=` lets a later (larger) value win a tie.
    let mut best = StreakScore { count: 0, value: 0 };
    for (value, count) in freq {
        if count >= best.count {
            best = StreakScore { count, value };
        }
    }
    best
}

/// A draw is perfect when every sampled value is the same.
pub fn is_perfect(score: &StreakScore, count: u32) -> bool {
    score.count == count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_run() {
        assert_eq!(score(&[1, 2, 2, 3, 2]), StreakScore { count: 3, value: 2 });
    }

    #[test]
    fn test_tie_prefers_largest_value() {
        assert_eq!(score(&[7, 1, 7, 1, 4]), StreakScore { count: 2, value: 7 });
        assert_eq!(score(&[-5, -2, -5, -2]), StreakScore { count: 2, value: -2 });
        // all distinct: every value has count 1
        assert_eq!(score(&[3, 9, 0, 4]), StreakScore { count: 1, value: 9 });
    }

    #[test]
    fn test_all_equal_is_perfect() {
        let s = score(&[0; 9]);
        assert_eq!(s, StreakScore { count: 9, value: 0 });
        assert!(is_perfect(&s, 9));
    }

    #[test]
    fn test_near_miss_is_not_perfect() {
        let s = score(&[4, 4, 4, 4, 4, 4, 4, 4, 3]);
        assert_eq!(s.count, 8);
        assert!(!is_perfect(&s, 9));
    }

    #[test]
    fn test_empty_draw() {
        assert_eq!(score(&[]), StreakScore { count: 0, value: 0 });
    }
}
