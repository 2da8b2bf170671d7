//! Report integration tests.
//!
//! Runs every report against the seeded fixture in tests/fixtures.

use super::common::{seed, test_connection};
use chrono::NaiveDate;
use incident_reports::db::{IsolationLevel, PgConnector, Value};
use incident_reports::query::{select_all, QueryOptions, Statement};
use incident_reports::reports::{
    create_view_incident_with_details, daily_average_incident_increase,
    three_day_daily_report_type_ct, DailyAverageRequest, ReportTypeCountRequest, ViewRequest,
};

fn date(day: &str) -> Value {
    Value::Date(NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap())
}

#[tokio::test]
async fn test_create_view_incident_with_details() {
    let Some(connection) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };
    let _guard = seed(&connection).await;

    let request = ViewRequest {
        connection: connection.clone(),
        isolation_level: IsolationLevel::Serializable,
        options: QueryOptions::default(),
    };
    create_view_incident_with_details(&PgConnector, &request)
        .await
        .unwrap();

    let result = select_all(
        &PgConnector,
        &connection,
        &Statement::new(
            "SELECT neighborhood, count(*) FROM incident_with_details \
             GROUP BY neighborhood ORDER BY neighborhood",
        ),
    )
    .await
    .unwrap();

    assert_eq!(
        result.rows,
        vec![
            vec![Value::from("Hayes Valley"), Value::Int(4)],
            vec![Value::from("South of Market"), Value::Int(6)],
        ]
    );
}

#[tokio::test]
async fn test_daily_average_incident_increase() {
    let Some(connection) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };
    let _guard = seed(&connection).await;

    let request = DailyAverageRequest {
        connection,
        options: QueryOptions::default(),
    };
    let result = daily_average_incident_increase(&PgConnector, &request)
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["date", "avg_incident_increase"]);
    assert_eq!(
        result.rows,
        vec![
            vec![date("2023-06-30"), Value::Float(-1.5)],
            vec![date("2023-07-01"), Value::Float(-1.0)],
            vec![date("2023-07-02"), Value::Float(-1.33)],
            vec![date("2023-07-03"), Value::Float(-2.5)],
        ]
    );

    let limited = DailyAverageRequest {
        options: QueryOptions::default().with_limit(2),
        ..request
    };
    let result = daily_average_incident_increase(&PgConnector, &limited)
        .await
        .unwrap();
    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows[1][0], date("2023-07-01"));
}

#[tokio::test]
async fn test_three_day_daily_report_type_ct() {
    let Some(connection) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };
    let _guard = seed(&connection).await;

    let request = ReportTypeCountRequest {
        connection,
        year: 2023,
        month: 7,
        options: QueryOptions::default(),
    };
    let result = three_day_daily_report_type_ct(&PgConnector, &request)
        .await
        .unwrap();

    assert_eq!(
        result.column_names(),
        vec!["report_type_description", "date", "lag", "count", "lead"]
    );

    let initial = Value::from("Initial");
    let supplement = Value::from("Supplement");
    assert_eq!(
        result.rows,
        vec![
            vec![initial.clone(), date("2023-07-01"), Value::Null, Value::Int(2), Value::Int(1)],
            vec![initial.clone(), date("2023-07-02"), Value::Int(2), Value::Int(1), Value::Int(3)],
            vec![initial, date("2023-07-03"), Value::Int(1), Value::Int(3), Value::Null],
            vec![supplement.clone(), date("2023-07-01"), Value::Null, Value::Int(1), Value::Int(2)],
            vec![supplement, date("2023-07-03"), Value::Int(1), Value::Int(2), Value::Null],
        ]
    );
}

#[tokio::test]
async fn test_three_day_report_for_empty_month() {
    let Some(connection) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };
    let _guard = seed(&connection).await;

    let request = ReportTypeCountRequest {
        connection,
        year: 2019,
        month: 2,
        options: QueryOptions::default(),
    };
    let result = three_day_daily_report_type_ct(&PgConnector, &request)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(
        result.column_names(),
        vec!["report_type_description", "date", "lag", "count", "lead"]
    );
}

#[tokio::test]
async fn test_explain_returns_query_plan() {
    let Some(connection) = test_connection() else {
        eprintln!("Skipping test: INCIDENT_REPORTS_TEST_DATABASE_URL not set");
        return;
    };
    let _guard = seed(&connection).await;

    let request = ReportTypeCountRequest {
        connection,
        year: 2023,
        month: 7,
        options: QueryOptions::default().with_explain(),
    };
    let result = three_day_daily_report_type_ct(&PgConnector, &request)
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["QUERY PLAN"]);
    assert!(!result.is_empty());
}
