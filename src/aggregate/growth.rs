//! Entity growth trend.
//!
//! A point-in-time snapshot per bucket: how many entities were alive at
//! each bucket's end, not how many were created within it. The scan is
//! O(buckets x entities); if entity counts ever grow large, sort by
//! `created_at` and keep a running alive count instead.

use serde::Serialize;

use super::window::TimeWindow;

/// Creation/deletion lifecycle of one entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityLifecycle {
    pub created_at: i64,
    pub deleted: bool,
    pub deleted_at: Option<i64>,
}

impl EntityLifecycle {
    fn alive_at(&self, instant: i64) -> bool {
        if self.created_at > instant {
            return false;
        }
        if !self.deleted {
            return true;
        }
        self.deleted_at.is_some_and(|deleted_at| deleted_at > instant)
    }
}

/// One point of a trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeValuePoint {
    pub timestamp: i64,
    pub value: i64,
}

/// Alive-entity count at the end of each bucket in the window.
pub fn growth_trend(entities: &[EntityLifecycle], window: &TimeWindow) -> Vec<TimeValuePoint> {
    window
        .buckets()
        .map(|bucket_key| {
            let bucket_end = bucket_key + window.bucket_size_ms();
            let value = entities
                .iter()
                .filter(|entity| entity.alive_at(bucket_end))
                .count() as i64;
            TimeValuePoint {
                timestamp: bucket_key,
                value,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::window::DAY_MS;

    fn created(created_at: i64) -> EntityLifecycle {
        EntityLifecycle {
            created_at,
            deleted: false,
            deleted_at: None,
        }
    }

    fn deleted(created_at: i64, deleted_at: i64) -> EntityLifecycle {
        EntityLifecycle {
            created_at,
            deleted: true,
            deleted_at: Some(deleted_at),
        }
    }

    #[test]
    fn test_alive_counts_per_bucket() {
        let w = TimeWindow::new(0, 3 * DAY_MS, DAY_MS).unwrap();
        let entities = vec![
            created(0),
            created(DAY_MS + 1),          // alive from bucket 1's end
            created(5 * DAY_MS),          // created after the window
            deleted(0, DAY_MS + 10),      // gone by bucket 1's end
            deleted(0, 2 * DAY_MS + 10),  // gone by bucket 2's end
        ];

        let trend = growth_trend(&entities, &w);
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0], TimeValuePoint { timestamp: 0, value: 3 });
        assert_eq!(trend[1], TimeValuePoint { timestamp: DAY_MS, value: 3 });
        assert_eq!(trend[2], TimeValuePoint { timestamp: 2 * DAY_MS, value: 2 });
    }

    #[test]
    fn test_snapshot_not_delta() {
        // A single long-lived entity shows up in every bucket.
        let w = TimeWindow::new(0, 4 * DAY_MS, DAY_MS).unwrap();
        let trend = growth_trend(&[created(0)], &w);
        assert!(trend.iter().all(|p| p.value == 1));
    }

    #[test]
    fn test_empty_entities() {
        let w = TimeWindow::new(0, 2 * DAY_MS, DAY_MS).unwrap();
        let trend = growth_trend(&[], &w);
        assert_eq!(trend.len(), 2);
        assert!(trend.iter().all(|p| p.value == 0));
    }
}
