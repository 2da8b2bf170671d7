//! Executor integration tests.
//!
//! Tests session scoping and transaction handling against a live database.

use super::common::{seed, test_connection};
use incident_reports::config::ConnectionConfig;
use incident_reports::db::{IsolationLevel, PgConnector, Value};
use incident_reports::error::ReportError;
use incident_reports::query::{commit, select_all, Statement};

#[tokio::test]
async fn test_select_all_binds_parameters() {
    let Some(config) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };

    let statement = Statement::new("SELECT $1::int8 + $2::int8 AS total")
        .bind(40)
        .bind(2);
    let result = select_all(&PgConnector, &config, &statement).await.unwrap();

    assert_eq!(result.column_names(), vec!["total"]);
    assert_eq!(result.rows, vec![vec![Value::Int(42)]]);
}

#[tokio::test]
async fn test_select_all_query_error() {
    let Some(config) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };

    let err = select_all(
        &PgConnector,
        &config,
        &Statement::new("SELECT * FROM nonexistent_table_xyz"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::Query(_)));
    assert!(err.to_string().contains("nonexistent_table_xyz"));
}

#[tokio::test]
async fn test_commit_persists_and_failure_rolls_back() {
    let Some(config) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };
    let _guard = seed(&config).await;

    commit(
        &PgConnector,
        &config,
        IsolationLevel::Serializable,
        &Statement::new("DELETE FROM incident WHERE report_type_code = 'IS'"),
    )
    .await
    .unwrap();

    // Succeeds, then fails inside the same statement: nothing may be kept
    let err = commit(
        &PgConnector,
        &config,
        IsolationLevel::ReadCommitted,
        &Statement::new("DELETE FROM incident WHERE 1 / (id - id) = 1"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ReportError::Query(_)));

    let result = select_all(
        &PgConnector,
        &config,
        &Statement::new("SELECT count(*) FROM incident"),
    )
    .await
    .unwrap();
    assert_eq!(result.rows, vec![vec![Value::Int(7)]]);
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_host() {
    let config = ConnectionConfig::new(
        "testuser",
        "invalid.host.that.does.not.exist.local",
        "testdb",
    );

    let err = select_all(&PgConnector, &config, &Statement::new("SELECT 1"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ReportError::Connection(_)),
        "Expected connection error, got: {err}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_commit_with_invalid_host() {
    let config = ConnectionConfig::new(
        "testuser",
        "invalid.host.that.does.not.exist.local",
        "testdb",
    );

    let err = commit(
        &PgConnector,
        &config,
        IsolationLevel::ReadCommitted,
        &Statement::new("SELECT 1"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::Connection(_)));
}
