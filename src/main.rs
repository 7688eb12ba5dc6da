//! Entry point for the `air-quality-etl` batch job.
//!
//! This binary runs one refresh and exits:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Running the ETL over the configured city roster
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `AIR_QUALITY_API_URL` (optional) – upstream endpoint (default: Open-Meteo)
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `FETCH_TIMEOUT_SECS` (optional) – per-city fetch timeout (default: 30)
//! - `ETL_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `ETL_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! The process exits 0 once every configured city has been attempted, even
//! when individual cities failed; per-city outcomes go to the log. Only a
//! store that cannot be reached at startup is fatal.

use std::{env, io::IsTerminal, time::Duration};

use anyhow::Result;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use air_quality_etl::{config, etl, fetch};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Successfully connected to database");

    let client = fetch::build_client(Duration::from_secs(cfg.fetch_timeout_secs as u64))?;
    let cities = config::default_cities();

    let report = etl::run(&pool, &client, &cfg, &cities).await;

    if report.failed_count() > 0 {
        tracing::warn!(
            "{} of {} cities failed this run",
            report.failed_count(),
            cities.len()
        );
    }

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `ETL_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `ETL_LOG_LEVEL` env var
///
/// This should be called once at startup before any logging or tracing
/// macros are invoked. It installs the subscriber globally for the
/// lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("ETL_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to ETL_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("ETL_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
