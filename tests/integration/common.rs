//! Shared helpers for the live integration tests.

use incident_reports::config::ConnectionConfig;
use sqlx::{Connection, PgConnection};
use tokio::sync::{Mutex, MutexGuard};

static FIXTURE_LOCK: Mutex<()> = Mutex::const_new(());

/// Returns the test database connection, or None when the tests should be skipped.
pub fn test_connection() -> Option<ConnectionConfig> {
    let url = std::env::var("INCIDENT_REPORTS_TEST_DATABASE_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

/// Recreates the incident tables and their seed rows.
///
/// The returned guard keeps other tests from reseeding until it is dropped.
pub async fn seed(config: &ConnectionConfig) -> MutexGuard<'static, ()> {
    let guard = FIXTURE_LOCK.lock().await;

    let options = config.to_connect_options().unwrap();
    let mut conn = PgConnection::connect_with(&options).await.unwrap();
    sqlx::raw_sql(include_str!("../fixtures/incident_schema.sql"))
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();

    guard
}
