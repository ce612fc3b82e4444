//! Dashboard response types.

use serde::Serialize;

use crate::aggregate::{BucketedSeries, EntityMetrics, TimeValuePoint};

/// One metric of the health summary: current count, change rate against
/// the previous period, and the gap-filled daily series.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentStat {
    pub count: i64,
    pub change_rate: f64,
    pub series: Vec<TimeValuePoint>,
}

/// Current-vs-previous period health overview.
#[derive(Debug, Clone, Serialize)]
pub struct HealthDeploymentSummary {
    pub start_time: i64,
    pub end_time: i64,
    pub total: DeploymentStat,
    pub success: DeploymentStat,
    pub failure: DeploymentStat,
    pub active: DeploymentStat,
}

/// Bucket-over-bucket rates for one bucket of an execution series.
#[derive(Debug, Clone, Serialize)]
pub struct BucketRates {
    pub bucket_key: i64,
    pub frequency: f64,
    pub frequency_change_rate: f64,
    pub failure_rate: f64,
    pub failure_rate_change_rate: f64,
}

/// Bucketed execution counts with summary rates.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionDeploymentSeries {
    pub start_time: i64,
    pub end_time: i64,
    pub total_deployments: i64,
    pub failure_rate: f64,
    pub frequency: f64,
    pub total_change_rate: f64,
    pub failure_rate_change_rate: f64,
    pub frequency_change_rate: f64,
    pub series: BucketedSeries,
    pub bucket_rates: Vec<BucketRates>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerServiceMetricsList {
    pub services: Vec<EntityMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerProjectMetricsList {
    pub projects: Vec<EntityMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrowthTrendSeries {
    pub points: Vec<TimeValuePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceCountTrend {
    pub points: Vec<TimeValuePoint>,
}
