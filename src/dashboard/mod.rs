//! Dashboard services.
//!
//! One pure transformation function per dashboard endpoint, each taking a
//! `MetricsStore` handle. Every function validates its time range before
//! touching the store; ranges are never clamped or swapped. Store queries
//! go through the bounded retry; on exhaustion the error propagates to the
//! caller rather than degrading to an empty result.

mod dto;

pub use dto::*;

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::aggregate::{
    aggregate_entities, change_rate, growth_trend, number_of_days, percent_of, round_rate,
    simple_rate, start_of_day, start_of_next_day, EntityEvent, EntityKey, EntityLifecycle,
    PeriodAggregate, StatusClass, TimeValuePoint, TimeWindow, WindowError, DAY_MS, HOUR_MS,
};
use crate::db::{with_retry, EventFilter, ExecutionRow, MetricsStore, StoreError, MAX_ATTEMPTS};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("invalid time range: start {start} must not be after end {end}")]
    InvalidTimeRange { start: i64, end: i64 },
    #[error("bucket size must not exceed the queried range ({bucket_size_ms}ms > {range_ms}ms)")]
    BucketTooLarge { bucket_size_ms: i64, range_ms: i64 },
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Scope and time range of one dashboard request, times in epoch ms.
#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub account: String,
    pub org: Option<String>,
    pub project: Option<String>,
    pub service: Option<String>,
    pub start: i64,
    pub end: i64,
}

impl DashboardQuery {
    fn filter(&self, start: i64, end: i64) -> EventFilter {
        EventFilter {
            account: self.account.clone(),
            org: self.org.clone(),
            project: self.project.clone(),
            service: self.service.clone(),
            ..Default::default()
        }
        .with_range(start, end)
    }

    /// Scope-only filter, no time bounds.
    fn scope_filter(&self) -> EventFilter {
        EventFilter {
            account: self.account.clone(),
            org: self.org.clone(),
            project: self.project.clone(),
            service: self.service.clone(),
            ..Default::default()
        }
    }
}

/// Series granularity for trend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGrouping {
    Day,
    Hour,
}

impl TimeGrouping {
    pub fn bucket_size_ms(&self) -> i64 {
        match self {
            TimeGrouping::Day => DAY_MS,
            TimeGrouping::Hour => HOUR_MS,
        }
    }
}

fn validate_range(start: i64, end: i64) -> Result<(), DashboardError> {
    if start > end {
        return Err(DashboardError::InvalidTimeRange { start, end });
    }
    Ok(())
}

/// Day-aligned window over the query range: start of the first day through
/// the start of the day after the last.
fn day_window(query: &DashboardQuery) -> Result<TimeWindow, DashboardError> {
    validate_range(query.start, query.end)?;
    let start = start_of_day(query.start);
    let end = start_of_next_day(query.end);
    Ok(TimeWindow::new(start, end, DAY_MS)?)
}

/// Current-vs-previous period deployment health: totals, per-class counts
/// and change rates, plus daily count series for each class.
///
/// Rates here use the zero policy: a zero previous period reads as 0, not
/// as the no-baseline sentinel used by the per-entity listings.
pub fn health_deployment_summary<S: MetricsStore + ?Sized>(
    store: &S,
    query: &DashboardQuery,
) -> Result<HealthDeploymentSummary, DashboardError> {
    let window = day_window(query)?;
    let previous = window.previous();

    // One query spanning both periods, split in memory.
    let filter = query.filter(previous.start(), window.end());
    let rows = with_retry(MAX_ATTEMPTS, || store.query_executions(&filter))?;

    let bucket_count = window.bucket_count();
    let mut total_series = vec![0i64; bucket_count];
    let mut success_series = vec![0i64; bucket_count];
    let mut failure_series = vec![0i64; bucket_count];
    let mut active_series = vec![0i64; bucket_count];

    let mut current = [0i64; 4]; // total, success, failure, active
    let mut prev = [0i64; 4];

    for row in &rows {
        let class = StatusClass::classify(&row.status);
        if let Some(index) = window.bucket_index_for(row.start_ts) {
            current[0] += 1;
            total_series[index] += 1;
            match class {
                StatusClass::Success => {
                    current[1] += 1;
                    success_series[index] += 1;
                }
                StatusClass::Failure => {
                    current[2] += 1;
                    failure_series[index] += 1;
                }
                StatusClass::Active | StatusClass::Pending => {
                    current[3] += 1;
                    active_series[index] += 1;
                }
                StatusClass::Unclassified => {}
            }
        } else {
            prev[0] += 1;
            match class {
                StatusClass::Success => prev[1] += 1,
                StatusClass::Failure => prev[2] += 1,
                StatusClass::Active | StatusClass::Pending => prev[3] += 1,
                StatusClass::Unclassified => {}
            }
        }
    }

    let to_points = |counts: Vec<i64>| -> Vec<TimeValuePoint> {
        window
            .buckets()
            .zip(counts)
            .map(|(timestamp, value)| TimeValuePoint { timestamp, value })
            .collect()
    };
    let stat = |count: i64, prev_count: i64, series: Vec<i64>| DeploymentStat {
        count,
        change_rate: round_rate(simple_rate(prev_count as f64, count as f64)),
        series: to_points(series),
    };

    Ok(HealthDeploymentSummary {
        start_time: window.start(),
        end_time: window.end(),
        total: stat(current[0], prev[0], total_series),
        success: stat(current[1], prev[1], success_series),
        failure: stat(current[2], prev[2], failure_series),
        active: stat(current[3], prev[3], active_series),
    })
}

/// Gap-filled execution series at the requested bucket size, with summary
/// totals and sentinel-policy change rates against the mirrored previous
/// window.
pub fn execution_deployment_series<S: MetricsStore + ?Sized>(
    store: &S,
    query: &DashboardQuery,
    bucket_size_ms: i64,
) -> Result<ExecutionDeploymentSeries, DashboardError> {
    let window = day_window(query)?;
    if bucket_size_ms > window.duration_ms() {
        return Err(DashboardError::BucketTooLarge {
            bucket_size_ms,
            range_ms: window.duration_ms(),
        });
    }
    let window = TimeWindow::new(window.start(), window.end(), bucket_size_ms)?;
    let previous_window = window.previous();

    let filter = query.filter(window.start(), window.end());
    let rows = with_retry(MAX_ATTEMPTS, || store.query_executions(&filter))?;
    let current = PeriodAggregate::from_events(
        &window,
        rows.iter().map(|r| (r.start_ts, r.status.as_str())),
    );

    // Independent re-run over the mirrored previous window.
    let prev_filter = query.filter(previous_window.start(), previous_window.end());
    let prev_rows = with_retry(MAX_ATTEMPTS, || store.query_executions(&prev_filter))?;
    let previous = PeriodAggregate::from_events(
        &previous_window,
        prev_rows.iter().map(|r| (r.start_ts, r.status.as_str())),
    );

    let days = number_of_days(window.start(), window.end()).max(1);
    let frequency = current.total as f64 / days as f64;
    let prev_frequency = previous.total as f64 / days as f64;

    // Bucket-over-bucket rates, seeded from zero like the summary rates.
    let mut bucket_rates = Vec::with_capacity(current.series.len());
    let mut last_frequency = 0.0;
    let mut last_failure_rate = 0.0;
    for entry in &current.series {
        let bucket_frequency = entry.total as f64;
        let bucket_failure_rate = percent_of(entry.failure, entry.total);
        bucket_rates.push(BucketRates {
            bucket_key: entry.bucket_key,
            frequency: bucket_frequency,
            frequency_change_rate: round_rate(change_rate(last_frequency, bucket_frequency)),
            failure_rate: round_rate(bucket_failure_rate),
            failure_rate_change_rate: round_rate(change_rate(
                last_failure_rate,
                bucket_failure_rate,
            )),
        });
        last_frequency = bucket_frequency;
        last_failure_rate = bucket_failure_rate;
    }

    Ok(ExecutionDeploymentSeries {
        start_time: window.start(),
        end_time: window.end(),
        total_deployments: current.total,
        failure_rate: round_rate(current.failure_rate()),
        frequency: round_rate(frequency),
        total_change_rate: round_rate(change_rate(previous.total as f64, current.total as f64)),
        failure_rate_change_rate: round_rate(change_rate(
            previous.failure_rate(),
            current.failure_rate(),
        )),
        frequency_change_rate: round_rate(change_rate(prev_frequency, frequency)),
        series: current.series,
        bucket_rates,
    })
}

/// Per-service metrics within the query scope, top-100 by deployment count.
pub fn per_service_metrics<S: MetricsStore + ?Sized>(
    store: &S,
    query: &DashboardQuery,
) -> Result<PerServiceMetricsList, DashboardError> {
    let window = day_window(query)?;
    let events = query_entity_events(store, query, &window, |row| {
        row.service_id
            .as_deref()
            .map(|service| EntityKey::service(&row.org_id, &row.project_id, service))
    })?;

    let name_filter = query.scope_filter();
    let names: HashMap<EntityKey, String> =
        with_retry(MAX_ATTEMPTS, || store.query_service_names(&name_filter))?
            .into_iter()
            .map(|row| {
                (
                    EntityKey::service(&row.org_id, &row.project_id, &row.identifier),
                    row.name,
                )
            })
            .collect();

    let breakdown_filter = query.filter(window.start(), window.end());
    let status_rows: Vec<(EntityKey, String, i64)> = with_retry(MAX_ATTEMPTS, || {
        store.query_status_breakdown(&breakdown_filter)
    })?
    .into_iter()
    .filter_map(|row| {
        row.service_id
            .as_deref()
            .map(|service| EntityKey::service(&row.org_id, &row.project_id, service))
            .map(|key| (key, row.status, row.count))
    })
    .collect();

    Ok(PerServiceMetricsList {
        services: aggregate_entities(&window, &events, &names, &status_rows),
    })
}

/// Per-project metrics across the account (or one org), top-100 by
/// deployment count.
pub fn per_project_metrics<S: MetricsStore + ?Sized>(
    store: &S,
    query: &DashboardQuery,
) -> Result<PerProjectMetricsList, DashboardError> {
    let window = day_window(query)?;
    let events = query_entity_events(store, query, &window, |row| {
        Some(EntityKey::project(&row.org_id, &row.project_id))
    })?;

    let breakdown_filter = query.filter(window.start(), window.end());
    let status_rows: Vec<(EntityKey, String, i64)> = with_retry(MAX_ATTEMPTS, || {
        store.query_status_breakdown(&breakdown_filter)
    })?
    .into_iter()
    .map(|row| {
        (
            EntityKey::project(&row.org_id, &row.project_id),
            row.status,
            row.count,
        )
    })
    .collect();

    // No naming collaborator at project granularity; names stay absent.
    Ok(PerProjectMetricsList {
        projects: aggregate_entities(&window, &events, &HashMap::new(), &status_rows),
    })
}

/// One query spanning the previous and current periods, mapped to keyed
/// entity events. Rows the key function cannot attribute are dropped.
fn query_entity_events<S, K>(
    store: &S,
    query: &DashboardQuery,
    window: &TimeWindow,
    key_for: K,
) -> Result<Vec<EntityEvent>, DashboardError>
where
    S: MetricsStore + ?Sized,
    K: Fn(&ExecutionRow) -> Option<EntityKey>,
{
    let filter = query.filter(window.previous().start(), window.end());
    let rows = with_retry(MAX_ATTEMPTS, || store.query_executions(&filter))?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            key_for(&row).map(|key| EntityEvent {
                key,
                timestamp: row.start_ts,
                status: row.status,
            })
        })
        .collect())
}

/// Alive-service count per bucket at the requested granularity.
pub fn growth_trend_series<S: MetricsStore + ?Sized>(
    store: &S,
    query: &DashboardQuery,
    grouping: TimeGrouping,
) -> Result<GrowthTrendSeries, DashboardError> {
    validate_range(query.start, query.end)?;
    let bucket = grouping.bucket_size_ms();
    let start = query.start - query.start.rem_euclid(bucket);
    let end = query.end - query.end.rem_euclid(bucket) + bucket;
    let window = TimeWindow::new(start, end, bucket)?;

    let filter = query.scope_filter();
    let entities: Vec<EntityLifecycle> =
        with_retry(MAX_ATTEMPTS, || store.query_service_entities(&filter))?
            .into_iter()
            .map(|row| EntityLifecycle {
                created_at: row.created_at,
                deleted: row.deleted,
                deleted_at: row.deleted_at,
            })
            .collect();

    Ok(GrowthTrendSeries {
        points: growth_trend(&entities, &window),
    })
}

/// Day-bucketed instance counts for one service, gap-filled with zeros.
pub fn instance_count_trend<S: MetricsStore + ?Sized>(
    store: &S,
    query: &DashboardQuery,
) -> Result<InstanceCountTrend, DashboardError> {
    let window = day_window(query)?;
    let filter = query.filter(window.start(), window.end());
    let rows = with_retry(MAX_ATTEMPTS, || store.query_instance_counts(&filter))?;

    let counts: HashMap<i64, i64> = rows.into_iter().map(|row| (row.day, row.count)).collect();
    let points = window
        .buckets()
        .map(|timestamp| TimeValuePoint {
            timestamp,
            value: counts.get(&timestamp).copied().unwrap_or(0),
        })
        .collect();

    Ok(InstanceCountTrend { points })
}
