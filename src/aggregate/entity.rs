//! Per-entity metrics aggregation.
//!
//! Groups execution events by entity, builds current and mirrored
//! previous-period aggregates per entity, and merges side-channel lookups
//! (display names, grouped status counts). Entities are keyed structurally
//! rather than by concatenated identifier strings, so no separator can
//! collide with identifier content.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::rate::{change_rate, percent_of, round_rate};
use super::series::PeriodAggregate;
use super::status::StatusClass;
use super::window::{number_of_days, TimeWindow};

/// Result-set cap for per-entity listings, top-N by total deployments.
pub const MAX_ENTITY_RESULTS: usize = 100;

/// Structural identifier of a metrics entity.
///
/// `service` is `None` when aggregating at project granularity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityKey {
    pub org: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl EntityKey {
    pub fn service(org: &str, project: &str, service: &str) -> EntityKey {
        EntityKey {
            org: org.to_string(),
            project: project.to_string(),
            service: Some(service.to_string()),
        }
    }

    pub fn project(org: &str, project: &str) -> EntityKey {
        EntityKey {
            org: org.to_string(),
            project: project.to_string(),
            service: None,
        }
    }
}

/// One execution event attributed to an entity.
#[derive(Debug, Clone)]
pub struct EntityEvent {
    pub key: EntityKey,
    pub timestamp: i64,
    pub status: String,
}

/// Additive per-class counts from the grouped status side query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub success: i64,
    pub failure: i64,
    pub active: i64,
    pub pending: i64,
}

impl StatusBreakdown {
    fn add(&mut self, status: &str, count: i64) {
        match StatusClass::classify(status) {
            StatusClass::Success => self.success += count,
            StatusClass::Failure => self.failure += count,
            StatusClass::Active => self.active += count,
            StatusClass::Pending => self.pending += count,
            StatusClass::Unclassified => {}
        }
    }
}

/// Most recent in-window execution of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastExecution {
    pub timestamp: i64,
    pub status: String,
}

/// Aggregated dashboard record for one entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityMetrics {
    pub key: EntityKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub current: PeriodAggregate,
    pub total_change_rate: f64,
    pub success_change_rate: f64,
    pub failure_change_rate: f64,
    pub percent_success: f64,
    pub failure_rate: f64,
    pub frequency: f64,
    pub frequency_change_rate: f64,
    pub status_breakdown: StatusBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_execution: Option<LastExecution>,
}

/// Build per-entity metrics from events spanning the previous and current
/// periods.
///
/// `events` may cover `[window.previous().start, window.end)`; each entity's
/// current and previous aggregates filter it by period. Only entities with
/// at least one current-period event produce a record; names or breakdown
/// rows for other entities are never synthesized into output. The result is
/// capped at [`MAX_ENTITY_RESULTS`] by total descending, ties broken by
/// entity key ascending.
pub fn aggregate_entities(
    window: &TimeWindow,
    events: &[EntityEvent],
    names: &HashMap<EntityKey, String>,
    status_rows: &[(EntityKey, String, i64)],
) -> Vec<EntityMetrics> {
    let mut grouped: BTreeMap<&EntityKey, Vec<(i64, &str)>> = BTreeMap::new();
    for event in events {
        grouped
            .entry(&event.key)
            .or_default()
            .push((event.timestamp, event.status.as_str()));
    }

    let mut breakdowns: HashMap<&EntityKey, StatusBreakdown> = HashMap::new();
    for (key, status, count) in status_rows {
        breakdowns.entry(key).or_default().add(status, *count);
    }

    let previous_window = window.previous();
    let days = number_of_days(window.start(), window.end()).max(1);

    let mut metrics: Vec<EntityMetrics> = grouped
        .into_iter()
        .filter_map(|(key, entity_events)| {
            let current = PeriodAggregate::from_events(window, entity_events.iter().copied());
            if current.total == 0 {
                return None;
            }
            let previous =
                PeriodAggregate::from_events(&previous_window, entity_events.iter().copied());

            let frequency = current.total as f64 / days as f64;
            let prev_frequency = previous.total as f64 / days as f64;

            let last_execution = entity_events
                .iter()
                .filter(|(timestamp, _)| window.contains(*timestamp))
                .max_by_key(|(timestamp, _)| *timestamp)
                .map(|(timestamp, status)| LastExecution {
                    timestamp: *timestamp,
                    status: status.to_string(),
                });

            Some(EntityMetrics {
                key: key.clone(),
                name: names.get(key).cloned(),
                total_change_rate: round_rate(change_rate(
                    previous.total as f64,
                    current.total as f64,
                )),
                success_change_rate: round_rate(change_rate(
                    previous.success as f64,
                    current.success as f64,
                )),
                failure_change_rate: round_rate(change_rate(
                    previous.failure as f64,
                    current.failure as f64,
                )),
                percent_success: round_rate(percent_of(current.success, current.total)),
                failure_rate: round_rate(percent_of(current.failure, current.total)),
                frequency: round_rate(frequency),
                frequency_change_rate: round_rate(change_rate(prev_frequency, frequency)),
                status_breakdown: breakdowns.get(key).copied().unwrap_or_default(),
                last_execution,
                current,
            })
        })
        .collect();

    metrics.sort_by(|a, b| {
        b.current
            .total
            .cmp(&a.current.total)
            .then_with(|| a.key.cmp(&b.key))
    });
    metrics.truncate(MAX_ENTITY_RESULTS);
    metrics
}
