//! incident-reports - analytical reports over an incident-report database.

mod cli;

use cli::{Cli, Command, OutputFormat};
use incident_reports::config::{Config, ConnectionConfig};
use incident_reports::db::{PgConnector, QueryResult};
use incident_reports::error::{ReportError, Result};
use incident_reports::logging;
use incident_reports::output::{format_json, format_text};
use incident_reports::reports::{self, DailyAverageRequest, ReportTypeCountRequest, ViewRequest};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let format = cli.parse_output_format().map_err(ReportError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // Precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    let connection = match resolve_connection(&cli, &config)? {
        Some(conn) => conn,
        // Rendering SQL needs no connection
        None if cli.print => ConnectionConfig::default(),
        None => {
            return Err(ReportError::config(
                "No database connection configured. Use --help for usage information.",
            ))
        }
    };
    let options = cli.query_options();
    let connector = PgConnector;

    match cli.command {
        Command::CreateView { isolation_level } => {
            let request = ViewRequest {
                connection,
                isolation_level: isolation_level.unwrap_or(config.reports.isolation_level),
                options,
            };
            if cli.print {
                println!("{}", reports::incident_with_details_view(&request).render());
                return Ok(());
            }

            info!(
                "Creating view on {} at {}",
                request.connection.display_string(),
                request.isolation_level
            );
            reports::create_view_incident_with_details(&connector, &request).await?;
            println!("View incident_with_details created");
        }
        Command::DailyAverage => {
            let request = DailyAverageRequest {
                connection,
                options,
            };
            if cli.print {
                println!(
                    "{}",
                    reports::daily_average_incident_increase_statement(&request).render()
                );
                return Ok(());
            }

            info!("Connection: {}", request.connection.display_string());
            let result = reports::daily_average_incident_increase(&connector, &request).await?;
            print_result(&result, format)?;
        }
        Command::ReportTypeCounts { year, month } => {
            let request = ReportTypeCountRequest {
                connection,
                year,
                month,
                options,
            };
            if cli.print {
                println!(
                    "{}",
                    reports::three_day_daily_report_type_ct_statement(&request).render()
                );
                return Ok(());
            }

            info!("Connection: {}", request.connection.display_string());
            let result = reports::three_day_daily_report_type_ct(&connector, &request).await?;
            print_result(&result, format)?;
        }
    }

    Ok(())
}

fn print_result(result: &QueryResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", format_text(result)),
        OutputFormat::Json => println!("{}", format_json(result)?),
    }
    info!("{} rows in {:?}", result.row_count, result.execution_time);
    Ok(())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
///
/// Individual CLI args are merged over the named (or default) connection from
/// the config file; PG* environment variables fill whatever is still unset.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    let from_cli = cli.to_connection_config()?;

    let from_file = match cli.connection_name() {
        Some(name) => Some(config.get_connection(Some(name)).cloned().ok_or_else(|| {
            ReportError::config(format!("Connection '{}' not found in config file", name))
        })?),
        None => config.get_connection(None).cloned(),
    };

    let mut connection = match (from_file, from_cli) {
        (Some(mut base), Some(overrides)) => {
            base.merge(&overrides);
            base
        }
        (base, overrides) => overrides.or(base).unwrap_or_default(),
    };
    connection.apply_env_defaults();

    Ok(connection.database.is_some().then_some(connection))
}
