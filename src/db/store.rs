//! SQLite metrics store implementation.

use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, Result as SqlResult};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::models::*;
use crate::aggregate::DAY_MS;

/// Store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Abstract metrics collaborator consumed by the dashboard layer.
///
/// Filters compose conjunctively; results come back as flat rows. The
/// dashboard core assumes nothing about the underlying query language.
pub trait MetricsStore: Send + Sync {
    /// Executions matching the filter, ordered by start timestamp.
    fn query_executions(&self, filter: &EventFilter) -> Result<Vec<ExecutionRow>, StoreError>;

    /// Display names of non-deleted services under the filter's scope.
    fn query_service_names(&self, filter: &EventFilter) -> Result<Vec<ServiceEntityRow>, StoreError>;

    /// Execution counts grouped by entity and status.
    fn query_status_breakdown(&self, filter: &EventFilter) -> Result<Vec<StatusCountRow>, StoreError>;

    /// Instance counts summed per UTC day.
    fn query_instance_counts(&self, filter: &EventFilter) -> Result<Vec<InstanceCountRow>, StoreError>;

    /// All service registry rows under the filter's scope, deleted included.
    fn query_service_entities(&self, filter: &EventFilter) -> Result<Vec<ServiceEntityRow>, StoreError>;
}

/// Thread-safe SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with embedded migrations.
    fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| StoreError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    // --- Ingestion ---

    /// Record a pipeline execution and return its row id.
    pub fn add_execution(&self, row: &NewExecution) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO executions (account_id, org_id, project_id, service_id, pipeline_id, status, start_ts, end_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.account_id,
                row.org_id,
                row.project_id,
                row.service_id,
                row.pipeline_id,
                row.status,
                row.start_ts,
                row.end_ts,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Register a service, or refresh its name and lifecycle fields.
    pub fn upsert_service(&self, account_id: &str, row: &ServiceEntityRow) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO services (account_id, org_id, project_id, identifier, name, created_at, deleted, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(account_id, org_id, project_id, identifier) DO UPDATE SET
             name=excluded.name, deleted=excluded.deleted, deleted_at=excluded.deleted_at",
            params![
                account_id,
                row.org_id,
                row.project_id,
                row.identifier,
                row.name,
                row.created_at,
                row.deleted,
                row.deleted_at,
            ],
        )?;
        Ok(())
    }

    /// Record an instance count sample.
    pub fn add_instance_stat(
        &self,
        account_id: &str,
        org_id: &str,
        project_id: &str,
        service_id: &str,
        env_id: Option<&str>,
        reported_at: i64,
        instance_count: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO instance_stats (account_id, org_id, project_id, service_id, env_id, reported_at, instance_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                account_id,
                org_id,
                project_id,
                service_id,
                env_id,
                reported_at,
                instance_count,
            ],
        )?;
        Ok(())
    }
}

/// Execution row as submitted for ingestion.
#[derive(Debug, Clone)]
pub struct NewExecution {
    pub account_id: String,
    pub org_id: String,
    pub project_id: String,
    pub service_id: Option<String>,
    pub pipeline_id: Option<String>,
    pub status: String,
    pub start_ts: i64,
    pub end_ts: Option<i64>,
}

/// Append the filter's conjunctive conditions for the executions table.
fn push_execution_filter(
    filter: &EventFilter,
    sql: &mut String,
    args: &mut Vec<Box<dyn ToSql>>,
) {
    sql.push_str(" WHERE account_id = ?");
    args.push(Box::new(filter.account.clone()));
    if let Some(org) = &filter.org {
        sql.push_str(" AND org_id = ?");
        args.push(Box::new(org.clone()));
    }
    if let Some(project) = &filter.project {
        sql.push_str(" AND project_id = ?");
        args.push(Box::new(project.clone()));
    }
    if let Some(service) = &filter.service {
        sql.push_str(" AND service_id = ?");
        args.push(Box::new(service.clone()));
    }
    if let Some(start) = filter.start {
        sql.push_str(" AND start_ts >= ?");
        args.push(Box::new(start));
    }
    if let Some(end) = filter.end {
        sql.push_str(" AND start_ts < ?");
        args.push(Box::new(end));
    }
    if let Some(statuses) = &filter.statuses {
        sql.push_str(" AND status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            sql.push('?');
            args.push(Box::new(status.clone()));
        }
        sql.push(')');
    }
}

/// Scope conditions for the services table (no time or status fields).
fn push_service_filter(filter: &EventFilter, sql: &mut String, args: &mut Vec<Box<dyn ToSql>>) {
    sql.push_str(" WHERE account_id = ?");
    args.push(Box::new(filter.account.clone()));
    if let Some(org) = &filter.org {
        sql.push_str(" AND org_id = ?");
        args.push(Box::new(org.clone()));
    }
    if let Some(project) = &filter.project {
        sql.push_str(" AND project_id = ?");
        args.push(Box::new(project.clone()));
    }
    if let Some(service) = &filter.service {
        sql.push_str(" AND identifier = ?");
        args.push(Box::new(service.clone()));
    }
}

impl MetricsStore for SqliteStore {
    fn query_executions(&self, filter: &EventFilter) -> Result<Vec<ExecutionRow>, StoreError> {
        let mut sql = String::from(
            "SELECT org_id, project_id, service_id, pipeline_id, status, start_ts, end_ts FROM executions",
        );
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        push_execution_filter(filter, &mut sql, &mut args);
        sql.push_str(" ORDER BY start_ts ASC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(ExecutionRow {
                    org_id: row.get(0)?,
                    project_id: row.get(1)?,
                    service_id: row.get(2)?,
                    pipeline_id: row.get(3)?,
                    status: row.get(4)?,
                    start_ts: row.get(5)?,
                    end_ts: row.get(6)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn query_service_names(&self, filter: &EventFilter) -> Result<Vec<ServiceEntityRow>, StoreError> {
        let mut sql = String::from(
            "SELECT org_id, project_id, identifier, name, created_at, deleted, deleted_at FROM services",
        );
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        push_service_filter(filter, &mut sql, &mut args);
        sql.push_str(" AND deleted = 0");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), map_service_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn query_status_breakdown(&self, filter: &EventFilter) -> Result<Vec<StatusCountRow>, StoreError> {
        let mut sql = String::from(
            "SELECT org_id, project_id, service_id, status, COUNT(*) FROM executions",
        );
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        push_execution_filter(filter, &mut sql, &mut args);
        sql.push_str(" GROUP BY org_id, project_id, service_id, status");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(StatusCountRow {
                    org_id: row.get(0)?,
                    project_id: row.get(1)?,
                    service_id: row.get(2)?,
                    status: row.get(3)?,
                    count: row.get(4)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn query_instance_counts(&self, filter: &EventFilter) -> Result<Vec<InstanceCountRow>, StoreError> {
        // Day keys floor via the euclidean remainder, as `start_of_day`
        // does; plain integer division would shift pre-epoch samples.
        let mut sql = String::from(
            "SELECT reported_at - ((reported_at % ?) + ?) % ? AS day, SUM(instance_count) \
             FROM instance_stats WHERE account_id = ?",
        );
        let mut args: Vec<Box<dyn ToSql>> = vec![
            Box::new(DAY_MS),
            Box::new(DAY_MS),
            Box::new(DAY_MS),
            Box::new(filter.account.clone()),
        ];
        if let Some(org) = &filter.org {
            sql.push_str(" AND org_id = ?");
            args.push(Box::new(org.clone()));
        }
        if let Some(project) = &filter.project {
            sql.push_str(" AND project_id = ?");
            args.push(Box::new(project.clone()));
        }
        if let Some(service) = &filter.service {
            sql.push_str(" AND service_id = ?");
            args.push(Box::new(service.clone()));
        }
        if let Some(start) = filter.start {
            sql.push_str(" AND reported_at >= ?");
            args.push(Box::new(start));
        }
        if let Some(end) = filter.end {
            sql.push_str(" AND reported_at < ?");
            args.push(Box::new(end));
        }
        sql.push_str(" GROUP BY day ORDER BY day ASC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(InstanceCountRow {
                    day: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn query_service_entities(&self, filter: &EventFilter) -> Result<Vec<ServiceEntityRow>, StoreError> {
        let mut sql = String::from(
            "SELECT org_id, project_id, identifier, name, created_at, deleted, deleted_at FROM services",
        );
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        push_service_filter(filter, &mut sql, &mut args);
        sql.push_str(" ORDER BY created_at ASC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), map_service_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_service_row(row: &rusqlite::Row<'_>) -> SqlResult<ServiceEntityRow> {
    Ok(ServiceEntityRow {
        org_id: row.get(0)?,
        project_id: row.get(1)?,
        identifier: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
        deleted: row.get(5)?,
        deleted_at: row.get(6)?,
    })
}
