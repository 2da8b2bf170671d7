//! Connection-scoped statement execution.
//!
//! Each executor opens its own session, runs exactly one statement, and closes
//! the session before returning, whether the statement succeeded or not.

use super::Statement;
use crate::config::ConnectionConfig;
use crate::db::{Connector, IsolationLevel, QueryResult, Session};
use crate::error::Result;
use tracing::{debug, warn};

/// Runs a read statement and returns every row it produces.
///
/// Connection failures surface as `ReportError::Connection`, statement
/// failures as `ReportError::Query`; the session is closed in both cases.
pub async fn select_all(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    statement: &Statement,
) -> Result<QueryResult> {
    let mut session = connector.open(config).await?;

    let result = session.fetch_all(statement).await;
    release(session.as_mut()).await;

    if let Ok(rows) = &result {
        debug!("select_all returned {} rows", rows.row_count);
    }
    result
}

/// Runs a write statement inside a transaction at `isolation_level` and commits it.
///
/// If the statement fails the transaction is rolled back and never committed.
pub async fn commit(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    isolation_level: IsolationLevel,
    statement: &Statement,
) -> Result<()> {
    let mut session = connector.open(config).await?;

    let outcome = run_in_transaction(session.as_mut(), isolation_level, statement).await;
    release(session.as_mut()).await;

    outcome
}

async fn run_in_transaction(
    session: &mut dyn Session,
    isolation_level: IsolationLevel,
    statement: &Statement,
) -> Result<()> {
    session.begin(isolation_level).await?;

    if let Err(e) = session.execute(statement).await {
        if let Err(rollback_err) = session.rollback().await {
            warn!("Rollback failed after statement error: {rollback_err}");
        }
        return Err(e);
    }

    session.commit().await
}

async fn release(session: &mut dyn Session) {
    if let Err(e) = session.close().await {
        warn!("Failed to close session: {e}");
    }
}
