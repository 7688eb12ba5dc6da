//! Get-or-create resolution for the three star-schema dimensions.
//!
//! Each resolver maps a natural key (UTC timestamp, (city, location) pair,
//! pollutant code) to its surrogate id, inserting the row on first sight.
//! All three use a single conflict-tolerant `INSERT .. ON CONFLICT .. DO
//! UPDATE .. RETURNING` statement rather than check-then-insert, so
//! concurrent refresh runs resolving the same key never double-insert and
//! always get an id back. The `DO UPDATE SET key = EXCLUDED.key` form is a
//! no-op write whose only purpose is making `RETURNING` yield the existing
//! row's id; dimension rows stay immutable after creation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::models::{City, TimeParts};

// ---

/// Resolve an hour-aligned UTC timestamp to its `dim_time` id, deriving
/// the calendar fields (date, hour, day, month, year, Monday=0 weekday)
/// on insert.
pub async fn resolve_time(conn: &mut PgConnection, ts_utc: DateTime<Utc>) -> Result<i32> {
    // ---
    let parts = TimeParts::of(ts_utc);

    let (time_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO dim_time (ts_utc, date, hour, day, month, year, dow)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (ts_utc) DO UPDATE SET ts_utc = EXCLUDED.ts_utc
        RETURNING time_id
        "#,
    )
    .bind(ts_utc)
    .bind(parts.date)
    .bind(parts.hour)
    .bind(parts.day)
    .bind(parts.month)
    .bind(parts.year)
    .bind(parts.dow)
    .fetch_one(&mut *conn)
    .await?;

    Ok(time_id)
}

/// Resolve a configured city to its `dim_location` id. The location label
/// is derived from the city name, so the (city, location) unique pair is
/// effectively keyed by city.
pub async fn resolve_location(conn: &mut PgConnection, city: &City) -> Result<i32> {
    // ---
    let (location_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO dim_location (city, location, latitude, longitude, country)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (city, location) DO UPDATE SET city = EXCLUDED.city
        RETURNING location_id
        "#,
    )
    .bind(&city.name)
    .bind(city.location_label())
    .bind(city.latitude)
    .bind(city.longitude)
    .bind(&city.country)
    .fetch_one(&mut *conn)
    .await?;

    Ok(location_id)
}

/// Resolve a pollutant code to its `dim_pollutant` id, storing the
/// per-field unit on first sight (`None` for unitless indices like AQI).
pub async fn resolve_pollutant(
    conn: &mut PgConnection,
    code: &str,
    unit: Option<&str>,
) -> Result<i32> {
    // ---
    let (pollutant_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO dim_pollutant (code, unit)
        VALUES ($1, $2)
        ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
        RETURNING pollutant_id
        "#,
    )
    .bind(code)
    .bind(unit)
    .fetch_one(&mut *conn)
    .await?;

    Ok(pollutant_id)
}
