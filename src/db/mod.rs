//! Database abstraction layer for incident reports.
//!
//! Provides a trait-based interface for per-call database sessions, allowing
//! the report executors to run against PostgreSQL or an in-memory mock.

mod mock;
mod postgres;
mod types;

pub use mock::{MockConnector, SessionEvent};
pub use postgres::{PgConnector, PgSession};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::query::Statement;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Transaction isolation level used by statements that commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    #[serde(alias = "read_uncommitted")]
    ReadUncommitted,
    #[default]
    #[serde(alias = "read_committed")]
    ReadCommitted,
    #[serde(alias = "repeatable_read")]
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Returns the level as it appears in `BEGIN ISOLATION LEVEL ...`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }

    /// Numeric code used by libpq-family drivers (1 = read uncommitted .. 4 = serializable).
    pub fn code(&self) -> u8 {
        match self {
            Self::ReadUncommitted => 1,
            Self::ReadCommitted => 2,
            Self::RepeatableRead => 3,
            Self::Serializable => 4,
        }
    }

    /// Parses a level from its name (any case, `-`, `_` or space separated) or numeric code.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "read-uncommitted" | "1" => Some(Self::ReadUncommitted),
            "read-committed" | "2" => Some(Self::ReadCommitted),
            "repeatable-read" | "3" => Some(Self::RepeatableRead),
            "serializable" | "4" => Some(Self::Serializable),
            _ => None,
        }
    }
}

impl FromStr for IsolationLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Invalid isolation level: {s}. Expected: read-uncommitted, read-committed, \
                 repeatable-read, or serializable"
            )
        })
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Opens database sessions.
///
/// Every call to [`Connector::open`] yields a fresh session; sessions are
/// never pooled or shared between calls.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new session using the given connection parameters.
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>>;
}

/// A single database connection scoped to one report call.
#[async_trait]
pub trait Session: Send {
    /// Starts a transaction at the given isolation level.
    async fn begin(&mut self, isolation_level: IsolationLevel) -> Result<()>;

    /// Executes a statement and returns every row it produces.
    async fn fetch_all(&mut self, statement: &Statement) -> Result<QueryResult>;

    /// Executes a statement, returning the number of affected rows.
    async fn execute(&mut self, statement: &Statement) -> Result<u64>;

    /// Commits the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the open transaction.
    async fn rollback(&mut self) -> Result<()>;

    /// Closes the underlying connection. Further calls fail.
    async fn close(&mut self) -> Result<()>;
}
