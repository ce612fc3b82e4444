//! Store row and filter types.

use serde::{Deserialize, Serialize};

/// Conjunctive query filter; every set field narrows the result.
///
/// Time bounds are half-open epoch milliseconds: `start <= ts < end`.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub account: String,
    pub org: Option<String>,
    pub project: Option<String>,
    pub service: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub statuses: Option<Vec<String>>,
}

impl EventFilter {
    pub fn for_account(account: &str) -> EventFilter {
        EventFilter {
            account: account.to_string(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, start: i64, end: i64) -> EventFilter {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// One pipeline execution row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRow {
    pub org_id: String,
    pub project_id: String,
    pub service_id: Option<String>,
    pub pipeline_id: Option<String>,
    pub status: String,
    pub start_ts: i64,
    pub end_ts: Option<i64>,
}

/// One grouped status-count row from the breakdown side query.
#[derive(Debug, Clone)]
pub struct StatusCountRow {
    pub org_id: String,
    pub project_id: String,
    pub service_id: Option<String>,
    pub status: String,
    pub count: i64,
}

/// Day-summed instance count.
#[derive(Debug, Clone, Copy)]
pub struct InstanceCountRow {
    pub day: i64,
    pub count: i64,
}

/// Service registry row, including deleted services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntityRow {
    pub org_id: String,
    pub project_id: String,
    pub identifier: String,
    pub name: String,
    pub created_at: i64,
    pub deleted: bool,
    pub deleted_at: Option<i64>,
}
