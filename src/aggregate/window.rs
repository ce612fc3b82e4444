//! Time windows and bucket generation.
//!
//! A window is a half-open interval `[start, end)` in epoch milliseconds,
//! subdivided into fixed-size buckets anchored at `start`. Bucket keys are
//! the left edges of their intervals; an event at exactly `end` is out of
//! range.

use thiserror::Error;

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;
/// One day in milliseconds.
pub const DAY_MS: i64 = 86_400_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid time range: start {start} must be before end {end}")]
    InvalidRange { start: i64, end: i64 },
    #[error("bucket size must be positive, got {0}")]
    InvalidBucketSize(i64),
}

/// A half-open time range divided into equal buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: i64,
    end: i64,
    bucket_size_ms: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64, bucket_size_ms: i64) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::InvalidRange { start, end });
        }
        if bucket_size_ms <= 0 {
            return Err(WindowError::InvalidBucketSize(bucket_size_ms));
        }
        Ok(Self {
            start,
            end,
            bucket_size_ms,
        })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn bucket_size_ms(&self) -> i64 {
        self.bucket_size_ms
    }

    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// Number of buckets covering the window, counting a trailing partial
    /// bucket as a full one.
    pub fn bucket_count(&self) -> usize {
        (self.duration_ms() as u64).div_ceil(self.bucket_size_ms as u64) as usize
    }

    /// Ordered bucket-start timestamps covering `[start, end)`.
    pub fn buckets(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.bucket_count() as i64).map(move |k| self.start + k * self.bucket_size_ms)
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Bucket key for a timestamp, or `None` when it falls outside the
    /// window. Bucket boundaries are anchored at `start`, not at epoch 0.
    pub fn bucket_key_for(&self, timestamp: i64) -> Option<i64> {
        if !self.contains(timestamp) {
            return None;
        }
        let offset = (timestamp - self.start) / self.bucket_size_ms;
        Some(self.start + offset * self.bucket_size_ms)
    }

    /// Bucket index for an in-window timestamp.
    pub fn bucket_index_for(&self, timestamp: i64) -> Option<usize> {
        if !self.contains(timestamp) {
            return None;
        }
        Some(((timestamp - self.start) / self.bucket_size_ms) as usize)
    }

    /// The immediately preceding window of equal duration:
    /// `[start - (end - start), start)`.
    pub fn previous(&self) -> TimeWindow {
        TimeWindow {
            start: self.start - self.duration_ms(),
            end: self.start,
            bucket_size_ms: self.bucket_size_ms,
        }
    }
}

/// Truncate a timestamp to the start of its UTC day.
pub fn start_of_day(timestamp_ms: i64) -> i64 {
    timestamp_ms - timestamp_ms.rem_euclid(DAY_MS)
}

/// Start of the UTC day after the one containing `timestamp_ms`.
pub fn start_of_next_day(timestamp_ms: i64) -> i64 {
    start_of_day(timestamp_ms) + DAY_MS
}

/// Whole days spanned by `[start, end)`.
pub fn number_of_days(start_ms: i64, end_ms: i64) -> i64 {
    (end_ms - start_ms) / DAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_generation() {
        let w = TimeWindow::new(100, 250, 100).unwrap();
        assert_eq!(w.buckets().collect::<Vec<_>>(), vec![100, 200]);
        assert_eq!(w.bucket_count(), 2);
    }

    #[test]
    fn test_single_bucket_when_range_smaller_than_bucket() {
        let w = TimeWindow::new(0, 50, 100).unwrap();
        assert_eq!(w.buckets().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_end_exclusive() {
        let w = TimeWindow::new(0, 300, 100).unwrap();
        assert!(w.contains(299));
        assert!(!w.contains(300));
        assert_eq!(w.bucket_key_for(300), None);
    }

    #[test]
    fn test_bucket_key_anchored_at_start() {
        // Start not aligned to the bucket size: boundaries follow start.
        let w = TimeWindow::new(50, 350, 100).unwrap();
        assert_eq!(w.bucket_key_for(50), Some(50));
        assert_eq!(w.bucket_key_for(149), Some(50));
        assert_eq!(w.bucket_key_for(150), Some(150));
        assert_eq!(w.bucket_key_for(349), Some(250));
    }

    #[test]
    fn test_previous_window_mirrors_duration() {
        let w = TimeWindow::new(1000, 4000, 1000).unwrap();
        let prev = w.previous();
        assert_eq!(prev.start(), -2000);
        assert_eq!(prev.end(), 1000);
        assert_eq!(prev.duration_ms(), w.duration_ms());
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        assert!(matches!(
            TimeWindow::new(10, 10, 100),
            Err(WindowError::InvalidRange { .. })
        ));
        assert!(matches!(
            TimeWindow::new(20, 10, 100),
            Err(WindowError::InvalidRange { .. })
        ));
        assert!(matches!(
            TimeWindow::new(0, 10, 0),
            Err(WindowError::InvalidBucketSize(0))
        ));
    }

    #[test]
    fn test_day_helpers() {
        assert_eq!(start_of_day(DAY_MS + 123), DAY_MS);
        assert_eq!(start_of_next_day(DAY_MS + 123), 2 * DAY_MS);
        assert_eq!(number_of_days(0, 3 * DAY_MS), 3);
    }
}
