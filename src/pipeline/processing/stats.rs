//! Dataset-relative statistics used by the cleaner.

use serde::Serialize;

// Absorbs float noise in `(n - 1) * q` so that exact ranks are not rounded up.
const RANK_EPSILON: f64 = 1e-9;

/// Result of an upper clip over one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipOutcome {
    /// Percentile value used as the ceiling; `None` for an empty column
    pub threshold: Option<u64>,
    /// Input values with everything above `threshold` replaced by it
    pub values: Vec<u64>,
    /// How many values were lowered
    pub clipped: usize,
}

/// The `q`-quantile of `values` as an observed value.
///
/// Takes the order statistic at rank `ceil((n - 1) * q)`, so the result is
/// always one of the inputs. Recomputing it over a column already clipped at
/// that value returns the same value.
pub fn quantile(values: &[u64], q: f64) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let last = sorted.len() - 1;
    let position = (last as f64 * q.clamp(0.0, 1.0) - RANK_EPSILON).ceil();
    let index = (position.max(0.0) as usize).min(last);
    Some(sorted[index])
}

/// One-sided upper clip at the column's own `q`-quantile.
///
/// Pure: the input is left untouched and a new column is returned.
pub fn clip_upper(values: &[u64], q: f64) -> ClipOutcome {
    let Some(threshold) = quantile(values, q) else {
        return ClipOutcome {
            threshold: None,
            values: Vec::new(),
            clipped: 0,
        };
    };

    let mut clipped = 0;
    let values = values
        .iter()
        .map(|&v| {
            if v > threshold {
                clipped += 1;
                threshold
            } else {
                v
            }
        })
        .collect();

    ClipOutcome {
        threshold: Some(threshold),
        values,
        clipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_of_empty_column() {
        assert_eq!(quantile(&[], 0.99), None);
        let outcome = clip_upper(&[], 0.99);
        assert_eq!(outcome.threshold, None);
        assert!(outcome.values.is_empty());
    }

    #[test]
    fn test_quantile_picks_observed_value() {
        let values: Vec<u64> = (1..=101).collect();
        assert_eq!(quantile(&values, 0.99), Some(100));
        assert_eq!(quantile(&values, 1.0), Some(101));
        assert_eq!(quantile(&values, 0.5), Some(51));
        assert_eq!(quantile(&[7], 0.99), Some(7));
    }

    #[test]
    fn test_quantile_rounds_partial_rank_up() {
        // (10 - 1) * 0.99 = 8.91 -> rank 9, the maximum
        let values: Vec<u64> = (0..10).collect();
        assert_eq!(quantile(&values, 0.99), Some(9));
        // (10 - 1) * 0.5 = 4.5 -> rank 5
        assert_eq!(quantile(&values, 0.5), Some(5));
    }

    #[test]
    fn test_clip_upper_caps_only_the_tail() {
        let mut values: Vec<u64> = vec![1; 199];
        values.push(1_000_000);
        values.push(2_000_000);

        let outcome = clip_upper(&values, 0.99);
        assert_eq!(outcome.threshold, Some(1));
        assert_eq!(outcome.clipped, 2);
        assert!(outcome.values.iter().all(|&v| v == 1));
        assert_eq!(outcome.values.len(), values.len());
    }

    #[test]
    fn test_clip_upper_is_stable_when_reapplied() {
        let values = vec![5, 3, 900, 12, 40, 7, 7, 1, 0, 250, 33];
        let first = clip_upper(&values, 0.9);
        let second = clip_upper(&first.values, 0.9);
        assert_eq!(first.threshold, second.threshold);
        assert_eq!(second.clipped, 0);
        assert_eq!(first.values, second.values);
    }

    #[test]
    fn test_clip_upper_leaves_input_order() {
        let outcome = clip_upper(&[10, 0, 5], 0.5);
        assert_eq!(outcome.threshold, Some(5));
        assert_eq!(outcome.values, vec![5, 0, 5]);
    }
}
