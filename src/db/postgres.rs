//! PostgreSQL session implementation.
//!
//! Provides `PgConnector`, which opens one dedicated sqlx `PgConnection` per
//! report call, and `PgSession`, which implements the `Session` trait on top
//! of that connection.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, Connector, IsolationLevel, QueryResult, Row, Session, Value};
use crate::error::{ReportError, Result};
use crate::query::Statement;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgColumn, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{
    Column as SqlxColumn, Connection, Executor, Postgres, Row as SqlxRow,
    Statement as SqlxStatement, TypeInfo,
};
use std::time::Instant;
use tracing::debug;

/// Opens dedicated PostgreSQL connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>> {
        let session = PgSession::connect(config).await?;
        Ok(Box::new(session))
    }
}

/// A single PostgreSQL connection owned by one report call.
#[derive(Debug)]
pub struct PgSession {
    conn: Option<PgConnection>,
}

impl PgSession {
    /// Connects to the database described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = config.to_connect_options()?;

        debug!("Opening connection to {}", config.display_string());
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| ReportError::internal("Session is already closed"))
    }
}

#[async_trait]
impl Session for PgSession {
    async fn begin(&mut self, isolation_level: IsolationLevel) -> Result<()> {
        debug!("Beginning transaction at {isolation_level}");
        let sql = format!("BEGIN ISOLATION LEVEL {}", isolation_level.as_sql());
        let conn = self.conn()?;

        sqlx::query(&sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| ReportError::query(format_query_error(e)))?;
        Ok(())
    }

    async fn fetch_all(&mut self, statement: &Statement) -> Result<QueryResult> {
        debug!("Fetching: {}", statement.render());
        let conn = self.conn()?;
        let start = Instant::now();

        let rows = build_query(statement)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| ReportError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match rows.first() {
            Some(first_row) => first_row.columns().iter().map(column_info).collect(),
            // No rows to read columns from; ask the server to describe the statement
            None => conn
                .prepare(statement.sql())
                .await
                .map_err(|e| ReportError::query(format_query_error(e)))?
                .columns()
                .iter()
                .map(column_info)
                .collect(),
        };

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();
        debug!("Fetched {} rows in {:?}", rows.len(), execution_time);

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        debug!("Executing: {}", statement.render());
        let conn = self.conn()?;

        let done = build_query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| ReportError::query(format_query_error(e)))?;

        Ok(done.rows_affected())
    }

    async fn commit(&mut self) -> Result<()> {
        debug!("Committing transaction");
        let conn = self.conn()?;

        sqlx::query("COMMIT")
            .execute(&mut *conn)
            .await
            .map_err(|e| ReportError::query(format_query_error(e)))?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        debug!("Rolling back transaction");
        let conn = self.conn()?;

        sqlx::query("ROLLBACK")
            .execute(&mut *conn)
            .await
            .map_err(|e| ReportError::query(format_query_error(e)))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| ReportError::internal("Session is already closed"))?;

        debug!("Closing connection");
        conn.close()
            .await
            .map_err(|e| ReportError::connection(format!("Failed to close connection: {e}")))
    }
}

/// Builds a sqlx query with the statement's values bound to `$1..$n`.
fn build_query(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    statement
        .binds()
        .iter()
        .fold(sqlx::query(statement.sql()), |query, value| query.bind(*value))
}

fn column_info(col: &PgColumn) -> ColumnInfo {
    ColumnInfo::new(col.name(), col.type_info().name())
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(Value::Date)
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // For all other types, try to get as string
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ReportError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port();
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ReportError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        ReportError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        ReportError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        ReportError::connection(
            "Server requires SSL. Set PGSSLMODE=require in the environment.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ReportError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ReportError::connection(error.to_string())
    }
}

/// Formats a query error with PostgreSQL detail fields if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        let fields = [
            ("DETAIL", pg_error.detail()),
            ("HINT", pg_error.hint()),
            ("TABLE", pg_error.table()),
            ("COLUMN", pg_error.column()),
            ("CONSTRAINT", pg_error.constraint()),
        ];

        for (label, value) in fields {
            if let Some(value) = value {
                result.push_str("\n  ");
                result.push_str(label);
                result.push_str(": ");
                result.push_str(value);
            }
        }
    }

    result
}
