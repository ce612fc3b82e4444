//! Gap-filled bucketed counting.
//!
//! Builds the fixed-length time series behind every dashboard chart: one
//! entry per bucket of the window, zero-filled up front so empty buckets
//! still appear in the output. Accumulation is a pre-sized vector indexed
//! by bucket offset, so entries come out in ascending bucket order by
//! construction.

use serde::Serialize;

use super::status::StatusClass;
use super::window::TimeWindow;

/// Per-bucket deployment counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub bucket_key: i64,
    pub total: i64,
    pub success: i64,
    pub failure: i64,
}

/// One count entry per bucket of a window, in ascending bucket order.
pub type BucketedSeries = Vec<BucketCount>;

/// Count events into the window's buckets.
///
/// Events outside `[start, end)` are skipped; the caller is responsible for
/// previous-period tallies. Active, pending and unclassified statuses
/// increment the total only.
pub fn build_series<'a, I>(window: &TimeWindow, events: I) -> BucketedSeries
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    let mut series: BucketedSeries = window
        .buckets()
        .map(|bucket_key| BucketCount {
            bucket_key,
            total: 0,
            success: 0,
            failure: 0,
        })
        .collect();

    for (timestamp, status) in events {
        let Some(index) = window.bucket_index_for(timestamp) else {
            continue;
        };
        let entry = &mut series[index];
        entry.total += 1;
        match StatusClass::classify(status) {
            StatusClass::Success => entry.success += 1,
            StatusClass::Failure => entry.failure += 1,
            StatusClass::Active | StatusClass::Pending | StatusClass::Unclassified => {}
        }
    }

    series
}

/// Summary totals plus the full bucketed series for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodAggregate {
    pub total: i64,
    pub success: i64,
    pub failure: i64,
    pub series: BucketedSeries,
}

impl PeriodAggregate {
    pub fn from_events<'a, I>(window: &TimeWindow, events: I) -> PeriodAggregate
    where
        I: IntoIterator<Item = (i64, &'a str)>,
    {
        let series = build_series(window, events);
        let (mut total, mut success, mut failure) = (0, 0, 0);
        for entry in &series {
            total += entry.total;
            success += entry.success;
            failure += entry.failure;
        }
        PeriodAggregate {
            total,
            success,
            failure,
            series,
        }
    }

    /// Failure percentage of this period, 0 when nothing ran.
    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failure as f64 * 100.0 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::window::DAY_MS;

    fn day_window(days: i64) -> TimeWindow {
        TimeWindow::new(0, days * DAY_MS, DAY_MS).unwrap()
    }

    #[test]
    fn test_gap_fill_on_empty_input() {
        let w = day_window(4);
        let series = build_series(&w, std::iter::empty());
        assert_eq!(series.len(), 4);
        for (k, entry) in series.iter().enumerate() {
            assert_eq!(entry.bucket_key, k as i64 * DAY_MS);
            assert_eq!(entry.total, 0);
        }
    }

    #[test]
    fn test_three_day_scenario() {
        // SUCCESS in day 0, FAILED and RUNNING in day 1, day 2 empty.
        let w = day_window(3);
        let events = vec![
            (DAY_MS / 2, "SUCCESS"),
            (3 * DAY_MS / 2, "FAILED"),
            (19 * DAY_MS / 10, "RUNNING"),
        ];
        let series = build_series(&w, events.iter().map(|(t, s)| (*t, *s)));
        assert_eq!(series.len(), 3);
        assert_eq!((series[0].total, series[0].success, series[0].failure), (1, 1, 0));
        // RUNNING counts toward the total only.
        assert_eq!((series[1].total, series[1].success, series[1].failure), (2, 0, 1));
        assert_eq!((series[2].total, series[2].success, series[2].failure), (0, 0, 0));
    }

    #[test]
    fn test_out_of_window_events_excluded() {
        let w = day_window(2);
        let events = vec![
            (-1, "SUCCESS"),
            (0, "SUCCESS"),
            (2 * DAY_MS - 1, "FAILED"),
            (2 * DAY_MS, "FAILED"),
        ];
        let series = build_series(&w, events.iter().map(|(t, s)| (*t, *s)));
        let total: i64 = series.iter().map(|e| e.total).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_conservation() {
        let w = day_window(5);
        let events: Vec<(i64, &str)> = (0..97)
            .map(|i| {
                let status = match i % 3 {
                    0 => "SUCCESS",
                    1 => "FAILED",
                    _ => "QUEUED",
                };
                (i * DAY_MS / 20, status)
            })
            .collect();
        let in_window = events.iter().filter(|(t, _)| w.contains(*t)).count() as i64;

        let agg = PeriodAggregate::from_events(&w, events.iter().map(|(t, s)| (*t, *s)));
        assert_eq!(agg.total, in_window);
        assert_eq!(agg.series.len(), 5);
        let success: i64 = agg.series.iter().map(|e| e.success).sum();
        let failure: i64 = agg.series.iter().map(|e| e.failure).sum();
        assert_eq!(success, agg.success);
        assert_eq!(failure, agg.failure);
        assert!(agg.success + agg.failure <= agg.total);
    }

    #[test]
    fn test_failure_rate() {
        let w = day_window(1);
        let agg = PeriodAggregate::from_events(&w, std::iter::empty());
        assert_eq!(agg.failure_rate(), 0.0);

        let events = vec![(0, "FAILED"), (1, "SUCCESS"), (2, "SUCCESS"), (3, "SUCCESS")];
        let agg = PeriodAggregate::from_events(&w, events.iter().map(|(t, s)| (*t, *s)));
        assert_eq!(agg.failure_rate(), 25.0);
    }
}
