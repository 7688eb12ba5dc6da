//! Fact merger for the air-quality fact table.
//!
//! Fact identity is exactly the (location, time, pollutant) triple.
//! Re-ingesting a key overwrites value, aqi, and source in place, which is
//! what makes repeated runs over overlapping windows idempotent without a
//! separate "already processed" ledger.

use anyhow::Result;
use sqlx::PgConnection;

// ---

/// Insert or overwrite one fact row, keyed by the natural composite key.
///
/// A single atomic statement, not exists-check plus insert/update, so
/// overlapping refresh runs can never race into a duplicate-key failure.
/// Exactly one of `value` / `aqi` is expected to be `Some`, per the
/// pollutant classification in [`models`](crate::models).
pub async fn upsert_observation(
    conn: &mut PgConnection,
    location_id: i32,
    time_id: i32,
    pollutant_id: i32,
    value: Option<f64>,
    aqi: Option<f64>,
    source: &str,
) -> Result<()> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO fact_air_quality (location_id, time_id, pollutant_id, value, aqi, source)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (location_id, time_id, pollutant_id) DO UPDATE SET
            value  = EXCLUDED.value,
            aqi    = EXCLUDED.aqi,
            source = EXCLUDED.source
        "#,
    )
    .bind(location_id)
    .bind(time_id)
    .bind(pollutant_id)
    .bind(value)
    .bind(aqi)
    .bind(source)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
