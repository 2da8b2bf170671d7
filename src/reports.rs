//! Incident reports.
//!
//! Each report has a statement producer (pure, returns the SQL it would run)
//! and an async entry point that hands that statement to one of the
//! connection-scoped executors.

use crate::config::ConnectionConfig;
use crate::db::{Connector, IsolationLevel, QueryResult};
use crate::error::Result;
use crate::query::{apply_options, commit, select_all, QueryOptions, Statement};
use tracing::info;

const INCIDENT_WITH_DETAILS_VIEW: &str = "\
CREATE OR REPLACE VIEW incident_with_details AS
SELECT a.id, a.incident_datetime, a.incident_code,
b.incident_category, b.incident_subcategory,
b.incident_description,
a.longitude, a.latitude, a.report_datetime,
d.report_type_code, d.report_type_description,
c.supervisor_district,
c.police_district, c.neighborhood
FROM incident a
LEFT JOIN incident_type b
ON a.incident_code = b.incident_code
LEFT JOIN location c
ON a.longitude = c.longitude AND a.latitude = c.latitude
LEFT JOIN report_type d
ON a.report_type_code = d.report_type_code";

const DAILY_AVERAGE_INCIDENT_INCREASE: &str = "\
SELECT
date,
(round(AVG(count) OVER (ORDER BY date ROWS
BETWEEN 6 PRECEDING AND CURRENT ROW) -
AVG(count) OVER (ORDER BY date ROWS BETWEEN CURRENT ROW
AND 6 FOLLOWING), 2)::FLOAT) AS avg_incident_increase
FROM (SELECT
CAST(incident_datetime AS date) AS date,
COUNT(*)
FROM incident
GROUP BY CAST(incident_datetime AS date)) AS counts
ORDER BY date";

// $1 = year, $2 = month
const THREE_DAY_DAILY_REPORT_TYPE_CT: &str = "\
SELECT report_type_description, date,
lag(count) OVER w AS lag, count, lead(count) OVER w AS lead
FROM
(SELECT b.report_type_description,
CAST(a.incident_datetime AS date) AS date,
count(report_type_description)
FROM incident a
LEFT JOIN report_type b
ON b.report_type_code = a.report_type_code
WHERE EXTRACT(YEAR from a.incident_datetime)=$1
AND EXTRACT(MONTH from a.incident_datetime) = $2
GROUP BY CAST(a.incident_datetime AS date),
b.report_type_description) AS sub
WINDOW w AS (PARTITION BY report_type_description ORDER BY date)
ORDER BY report_type_description, date";

/// Parameters for (re)creating the `incident_with_details` view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub connection: ConnectionConfig,
    pub isolation_level: IsolationLevel,
    pub options: QueryOptions,
}

/// Parameters for the daily average incident increase report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAverageRequest {
    pub connection: ConnectionConfig,
    pub options: QueryOptions,
}

/// Parameters for the three-day report-type count report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTypeCountRequest {
    pub connection: ConnectionConfig,
    pub year: i32,
    /// Calendar month, 1-12. Other values match no rows.
    pub month: u32,
    pub options: QueryOptions,
}

/// Builds the DDL that (re)creates `incident_with_details`.
///
/// The view left-joins every incident with its type, its location (matched on
/// longitude and latitude) and its report type.
pub fn incident_with_details_view(request: &ViewRequest) -> Statement {
    apply_options(Statement::new(INCIDENT_WITH_DETAILS_VIEW), &request.options)
}

/// Builds the daily average increase query.
///
/// For every calendar date with incidents, returns the trailing seven-day
/// average of daily counts minus the leading seven-day average, rounded to two
/// decimals, ordered by date.
pub fn daily_average_incident_increase_statement(request: &DailyAverageRequest) -> Statement {
    apply_options(
        Statement::new(DAILY_AVERAGE_INCIDENT_INCREASE),
        &request.options,
    )
}

/// Builds the three-day report-type count query for one month.
///
/// For every report type and date in the month, returns the count of the
/// previous reported date, the date's count and the count of the next reported
/// date, all within the same report type.
pub fn three_day_daily_report_type_ct_statement(request: &ReportTypeCountRequest) -> Statement {
    let statement = Statement::new(THREE_DAY_DAILY_REPORT_TYPE_CT)
        .bind(request.year)
        .bind(request.month);
    apply_options(statement, &request.options)
}

/// Creates or replaces the `incident_with_details` view and commits.
pub async fn create_view_incident_with_details(
    connector: &dyn Connector,
    request: &ViewRequest,
) -> Result<()> {
    let statement = incident_with_details_view(request);
    commit(
        connector,
        &request.connection,
        request.isolation_level,
        &statement,
    )
    .await?;

    info!("View incident_with_details is up to date");
    Ok(())
}

/// Returns the daily average incident increase rows (`date`, `avg_incident_increase`).
pub async fn daily_average_incident_increase(
    connector: &dyn Connector,
    request: &DailyAverageRequest,
) -> Result<QueryResult> {
    let statement = daily_average_incident_increase_statement(request);
    select_all(connector, &request.connection, &statement).await
}

/// Returns `report_type_description`, `date`, `lag`, `count`, `lead` rows for the month.
pub async fn three_day_daily_report_type_ct(
    connector: &dyn Connector,
    request: &ReportTypeCountRequest,
) -> Result<QueryResult> {
    let statement = three_day_daily_report_type_ct_statement(request);
    select_all(connector, &request.connection, &statement).await
}
