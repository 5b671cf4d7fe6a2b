//! Interval union for counting active time across input types.

use crate::types::Interval;

/// Merges overlapping or touching intervals into a minimal disjoint set.
///
/// Intervals must be sorted by start time ascending. Runs in O(n).
pub fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut merged: Vec<Interval> = Vec::new();
    for interval in intervals {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
            } else {
                merged.push(*interval);
            }
        } else {
            merged.push(*interval);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ts;

    fn span(start: f64, end: f64) -> Interval {
        Interval::new(ts(start), ts(end))
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge_intervals(&[]).is_empty());
    }

    #[test]
    fn overlapping_intervals_merge() {
        let merged = merge_intervals(&[span(0.0, 10.0), span(5.0, 15.0)]);
        assert_eq!(merged, vec![span(0.0, 15.0)]);
    }

    #[test]
    fn gap_keeps_intervals_apart() {
        let input = [span(0.0, 5.0), span(10.0, 15.0)];
        assert_eq!(merge_intervals(&input), input.to_vec());
    }

    #[test]
    fn touching_intervals_merge() {
        let merged = merge_intervals(&[span(0.0, 5.0), span(5.0, 8.0)]);
        assert_eq!(merged, vec![span(0.0, 8.0)]);
    }

    #[test]
    fn contained_interval_is_absorbed() {
        let merged = merge_intervals(&[span(0.0, 20.0), span(2.0, 3.0), span(19.0, 25.0)]);
        assert_eq!(merged, vec![span(0.0, 25.0)]);
    }

    #[test]
    fn merging_is_idempotent() {
        let input = [
            span(0.0, 4.0),
            span(1.0, 6.0),
            span(9.0, 12.0),
            span(12.5, 13.0),
            span(12.7, 14.0),
        ];
        let once = merge_intervals(&input);
        assert_eq!(once, vec![span(0.0, 6.0), span(9.0, 12.0), span(12.5, 14.0)]);
        assert_eq!(merge_intervals(&once), once);
    }

    #[test]
    fn merged_total_counts_overlap_once() {
        let merged = merge_intervals(&[span(0.0, 10.0), span(5.0, 20.0)]);
        let total: f64 = merged.iter().map(Interval::duration_secs).sum();
        assert!((total - 20.0).abs() < 1e-9);
    }
}
