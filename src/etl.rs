//! Run orchestration: fetch each configured city, resolve dimension keys,
//! and merge fact rows.
//!
//! Cities are processed sequentially, each in its own transaction. A
//! failure fetching or persisting one city is caught here, logged with
//! city context, and recorded in the [`RunReport`]; it never prevents the
//! remaining cities from being processed, and per-city commits mean a late
//! failure cannot roll back cities that already landed.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use sqlx::PgPool;
use tracing::{error, info};

use crate::config::Config;
use crate::models::{extract_hours, City};
use crate::{dims, facts, fetch};

/// Source tag written on every fact row.
pub const SOURCE_TAG: &str = "open-meteo";

// ---

/// Outcome of one city within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityOutcome {
    // ---
    /// Fetched and committed; `rows` counts fact upserts (an empty
    /// upstream series is a success with zero rows).
    Loaded { rows: u64 },
    /// Fetch or persistence failed; nothing for this city was committed.
    Failed { reason: String },
}

/// Per-run report: one entry per attempted city, in roster order.
#[derive(Debug, Default)]
pub struct RunReport {
    // ---
    pub cities: Vec<(String, CityOutcome)>,
}

impl RunReport {
    // ---
    pub fn total_rows(&self) -> u64 {
        // ---
        self.cities
            .iter()
            .map(|(_, outcome)| match outcome {
                CityOutcome::Loaded { rows } => *rows,
                CityOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failed_count(&self) -> usize {
        // ---
        self.cities
            .iter()
            .filter(|(_, outcome)| matches!(outcome, CityOutcome::Failed { .. }))
            .count()
    }

    pub fn outcome_for(&self, city: &str) -> Option<&CityOutcome> {
        // ---
        self.cities
            .iter()
            .find(|(name, _)| name == city)
            .map(|(_, outcome)| outcome)
    }
}

// ---

/// Run the ETL over the given city roster.
///
/// Always attempts every city and returns a complete report. Store errors
/// surface as per-city failures in the report rather than aborting the
/// loop; nothing already committed is rolled back.
pub async fn run(pool: &PgPool, client: &Client, config: &Config, cities: &[City]) -> RunReport {
    // ---
    info!("[{}] ETL started, {} cities", Utc::now(), cities.len());

    let mut report = RunReport::default();
    for city in cities {
        match process_city(pool, client, config, city).await {
            Ok(rows) => {
                info!("Loaded city: {}, records: {}", city.name, rows);
                report
                    .cities
                    .push((city.name.clone(), CityOutcome::Loaded { rows }));
            }
            Err(e) => {
                error!("Error processing city {}: {:#}", city.name, e);
                report.cities.push((
                    city.name.clone(),
                    CityOutcome::Failed {
                        reason: format!("{e:#}"),
                    },
                ));
            }
        }
    }

    info!(
        "[{}] ETL finished, {} rows written, {} of {} cities failed",
        Utc::now(),
        report.total_rows(),
        report.failed_count(),
        cities.len()
    );

    report
}

/// Fetch one city and merge its observations inside a single transaction.
/// Returns the number of fact rows upserted.
async fn process_city(
    pool: &PgPool,
    client: &Client,
    config: &Config,
    city: &City,
) -> Result<u64> {
    // ---
    let response = fetch::fetch_city(client, &config.api_url, city).await?;
    let hours = extract_hours(&response.hourly)?;

    if hours.is_empty() {
        info!("No data for {}", city.name);
        return Ok(0);
    }

    let mut tx = pool
        .begin()
        .await
        .with_context(|| format!("failed to open transaction for {}", city.name))?;

    let location_id = dims::resolve_location(&mut tx, city).await?;

    let mut rows = 0u64;
    for hour in &hours {
        // Every fetched hour gets its time-dimension row, readings or not
        let time_id = dims::resolve_time(&mut tx, hour.ts_utc).await?;
        for reading in &hour.readings {
            let pollutant_id =
                dims::resolve_pollutant(&mut tx, reading.field.code, reading.field.unit).await?;
            facts::upsert_observation(
                &mut tx,
                location_id,
                time_id,
                pollutant_id,
                reading.value,
                reading.aqi,
                SOURCE_TAG,
            )
            .await?;
            rows += 1;
        }
    }

    tx.commit()
        .await
        .with_context(|| format!("failed to commit {}", city.name))?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_report_totals_ignore_failures() {
        // ---
        let report = RunReport {
            cities: vec![
                ("Colombo".into(), CityOutcome::Loaded { rows: 48 }),
                (
                    "Delhi".into(),
                    CityOutcome::Failed {
                        reason: "timeout".into(),
                    },
                ),
                ("Tokyo".into(), CityOutcome::Loaded { rows: 0 }),
            ],
        };

        assert_eq!(report.total_rows(), 48);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.outcome_for("Tokyo"),
            Some(&CityOutcome::Loaded { rows: 0 })
        );
        assert_eq!(report.outcome_for("Paris"), None);
    }
}
