//! HTTP request handlers.

use super::AppState;
use crate::dashboard::{
    self, DashboardError, DashboardQuery, TimeGrouping,
};
use crate::db::{NewExecution, ServiceEntityRow};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;

// ============================================================================
// Dashboard queries
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub account: String,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    /// RFC 3339 start of the queried range.
    #[serde(default)]
    pub start: Option<String>,
    /// RFC 3339 end of the queried range.
    #[serde(default)]
    pub end: Option<String>,
    /// Bucket size in days for the execution series.
    #[serde(default)]
    pub bucket_days: Option<i64>,
    /// Granularity for trend endpoints.
    #[serde(default)]
    pub group_by: Option<TimeGrouping>,
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, (StatusCode, String)> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("invalid RFC 3339 timestamp in `{field}`: {e}"),
            )
        })
}

impl MetricsQuery {
    /// Defaults apply only when a parameter is absent; a present but
    /// malformed timestamp is a 400.
    fn to_dashboard_query(
        &self,
        default_range_days: i64,
    ) -> Result<DashboardQuery, (StatusCode, String)> {
        let end = match &self.end {
            Some(raw) => parse_timestamp("end", raw)?,
            None => Utc::now(),
        };
        let start = match &self.start {
            Some(raw) => parse_timestamp("start", raw)?,
            None => end - ChronoDuration::days(default_range_days),
        };

        Ok(DashboardQuery {
            account: self.account.clone(),
            org: self.org.clone(),
            project: self.project.clone(),
            service: self.service.clone(),
            start: start.timestamp_millis(),
            end: end.timestamp_millis(),
        })
    }
}

fn error_response(err: DashboardError) -> (StatusCode, String) {
    let status = match &err {
        DashboardError::InvalidTimeRange { .. }
        | DashboardError::BucketTooLarge { .. }
        | DashboardError::Window(_) => StatusCode::BAD_REQUEST,
        DashboardError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

// ============================================================================
// Dashboard endpoints
// ============================================================================

pub async fn handle_health(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let q = match query.to_dashboard_query(state.config.default_range_days) {
        Ok(q) => q,
        Err(e) => return e.into_response(),
    };
    match dashboard::health_deployment_summary(state.store.as_ref(), &q) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn handle_executions(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let q = match query.to_dashboard_query(state.config.default_range_days) {
        Ok(q) => q,
        Err(e) => return e.into_response(),
    };
    let bucket_size_ms = query.bucket_days.unwrap_or(1) * crate::aggregate::DAY_MS;
    match dashboard::execution_deployment_series(state.store.as_ref(), &q, bucket_size_ms) {
        Ok(series) => Json(series).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn handle_service_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let q = match query.to_dashboard_query(state.config.default_range_days) {
        Ok(q) => q,
        Err(e) => return e.into_response(),
    };
    match dashboard::per_service_metrics(state.store.as_ref(), &q) {
        Ok(list) => Json(list).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn handle_project_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let q = match query.to_dashboard_query(state.config.default_range_days) {
        Ok(q) => q,
        Err(e) => return e.into_response(),
    };
    match dashboard::per_project_metrics(state.store.as_ref(), &q) {
        Ok(list) => Json(list).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn handle_growth_trend(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let q = match query.to_dashboard_query(state.config.default_range_days) {
        Ok(q) => q,
        Err(e) => return e.into_response(),
    };
    let grouping = query.group_by.unwrap_or(TimeGrouping::Day);
    match dashboard::growth_trend_series(state.store.as_ref(), &q, grouping) {
        Ok(trend) => Json(trend).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn handle_instance_trend(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let mut q = match query.to_dashboard_query(state.config.default_range_days) {
        Ok(q) => q,
        Err(e) => return e.into_response(),
    };
    q.service = Some(service_id);
    match dashboard::instance_count_trend(state.store.as_ref(), &q) {
        Ok(trend) => Json(trend).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ============================================================================
// Ingestion endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddExecutionRequest {
    pub account: String,
    pub org: String,
    pub project: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub pipeline: Option<String>,
    pub status: String,
    pub start_ts: i64,
    #[serde(default)]
    pub end_ts: Option<i64>,
}

pub async fn handle_add_execution(
    State(state): State<AppState>,
    Json(req): Json<AddExecutionRequest>,
) -> impl IntoResponse {
    let row = NewExecution {
        account_id: req.account,
        org_id: req.org,
        project_id: req.project,
        service_id: req.service,
        pipeline_id: req.pipeline,
        status: req.status,
        start_ts: req.start_ts,
        end_ts: req.end_ts,
    };
    match state.store.add_execution(&row) {
        Ok(id) => (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertServiceRequest {
    pub account: String,
    pub org: String,
    pub project: String,
    pub identifier: String,
    pub name: String,
    pub created_at: i64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<i64>,
}

pub async fn handle_upsert_service(
    State(state): State<AppState>,
    Json(req): Json<UpsertServiceRequest>,
) -> impl IntoResponse {
    let row = ServiceEntityRow {
        org_id: req.org,
        project_id: req.project,
        identifier: req.identifier,
        name: req.name,
        created_at: req.created_at,
        deleted: req.deleted,
        deleted_at: req.deleted_at,
    };
    match state.store.upsert_service(&req.account, &row) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddInstanceStatRequest {
    pub account: String,
    pub org: String,
    pub project: String,
    pub service: String,
    #[serde(default)]
    pub env: Option<String>,
    pub reported_at: i64,
    pub instance_count: i64,
}

pub async fn handle_add_instance_stat(
    State(state): State<AppState>,
    Json(req): Json<AddInstanceStatRequest>,
) -> impl IntoResponse {
    match state.store.add_instance_stat(
        &req.account,
        &req.org,
        &req.project,
        &req.service,
        req.env.as_deref(),
        req.reported_at,
        req.instance_count,
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
