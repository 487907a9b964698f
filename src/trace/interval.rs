//! Time-interval merging.
//!
//! Concurrent spans from one service overlap in wall-clock time; summing
//! their raw durations would double-count. The merger collapses a set of
//! intervals into a minimal non-overlapping cover before summing.

use chrono::{DateTime, Utc};

/// A closed time interval with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Creates an interval, clamping an inverted pair to zero length
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Interval length in seconds
    pub fn duration_seconds(&self) -> f64 {
        let micros = (self.end - self.start).num_microseconds().unwrap_or(0);
        (micros.max(0) as f64) / 1_000_000.0
    }
}

/// Merges intervals into a minimal non-overlapping cover.
///
/// Sorts by start ascending, then walks once: the current merged interval
/// absorbs the next whenever its start is <= the current end (touching
/// intervals merge too). O(n log n) from the sort, O(n) from the walk.
/// Idempotent: an already-disjoint set passes through unchanged.
pub fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    if intervals.len() < 2 {
        return intervals;
    }
    intervals.sort_by_key(|iv| iv.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        match merged.last_mut() {
            Some(current) if next.start <= current.end => {
                current.end = current.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Merges intervals and sums the non-overlapping cover, in seconds
pub fn merged_duration_seconds(intervals: Vec<Interval>) -> f64 {
    merge(intervals).iter().map(Interval::duration_seconds).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn iv(start: i64, end: i64) -> Interval {
        Interval::new(at(start), at(end))
    }

    #[test]
    fn test_overlap_not_double_counted() {
        // [0,10] and [5,15] overlap; naive summation would yield 25
        let merged = merge(vec![iv(0, 10), iv(5, 15), iv(20, 25)]);
        assert_eq!(merged, vec![iv(0, 15), iv(20, 25)]);
        assert_eq!(
            merged_duration_seconds(vec![iv(0, 10), iv(5, 15), iv(20, 25)]),
            20.0
        );
    }

    #[test]
    fn test_merge_idempotent() {
        let disjoint = vec![iv(0, 5), iv(10, 15), iv(20, 25)];
        assert_eq!(merge(disjoint.clone()), disjoint);
        assert_eq!(merged_duration_seconds(disjoint), 15.0);
    }

    #[test]
    fn test_unsorted_input() {
        let merged = merge(vec![iv(20, 25), iv(0, 10), iv(5, 15)]);
        assert_eq!(merged, vec![iv(0, 15), iv(20, 25)]);
    }

    #[test]
    fn test_touching_intervals_merge() {
        assert_eq!(merge(vec![iv(0, 5), iv(5, 10)]), vec![iv(0, 10)]);
    }

    #[test]
    fn test_contained_interval() {
        assert_eq!(merge(vec![iv(0, 20), iv(5, 10)]), vec![iv(0, 20)]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(merge(Vec::new()).is_empty());
        assert_eq!(merge(vec![iv(1, 2)]), vec![iv(1, 2)]);
        assert_eq!(merged_duration_seconds(Vec::new()), 0.0);
    }

    #[test]
    fn test_inverted_interval_clamped() {
        let clamped = Interval::new(at(10), at(5));
        assert_eq!(clamped.duration_seconds(), 0.0);
    }
}
