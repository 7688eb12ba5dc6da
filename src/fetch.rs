//! Upstream client for the Open-Meteo Air Quality API.
//!
//! Pure read side of the pipeline: one GET per city covering one past day
//! and one forecast day of hourly readings, normalized to UTC by the
//! upstream `timezone` parameter. Failures here are scoped to the city by
//! the orchestrator; nothing in this module touches the database.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::models::{hourly_param, City, HourlyResponse};

// ---

/// Build the shared HTTP client with the per-request timeout applied.
///
/// The timeout covers the whole request including body read, so a stalled
/// upstream fails the city instead of hanging the run.
pub fn build_client(timeout: Duration) -> Result<Client> {
    // ---
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

/// Fetch the hourly series for one city.
///
/// Requests all [`POLLUTANT_FIELDS`](crate::models::POLLUTANT_FIELDS) in a
/// single call. A non-2xx status or a body that does not parse as the
/// expected JSON shape is an error; the caller decides what that means for
/// the rest of the run.
pub async fn fetch_city(client: &Client, base_url: &str, city: &City) -> Result<HourlyResponse> {
    // ---
    tracing::debug!("Fetching hourly series for {} from {}", city.name, base_url);

    let response = client
        .get(base_url)
        .query(&[
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("hourly", hourly_param()),
            ("timezone", "UTC".to_string()),
            ("forecast_days", "1".to_string()),
            ("past_days", "1".to_string()),
        ])
        .send()
        .await
        .with_context(|| format!("request failed for {}", city.name))?
        .error_for_status()
        .with_context(|| format!("upstream returned error status for {}", city.name))?;

    let body: HourlyResponse = response
        .json()
        .await
        .with_context(|| format!("malformed hourly payload for {}", city.name))?;

    tracing::debug!(
        "Fetched {} hourly timestamps for {}",
        body.hourly.time.len(),
        city.name
    );

    Ok(body)
}
