//! Data models for the air-quality ETL.
//!
//! Covers three things:
//! - the configured [`City`] descriptor handed to the orchestrator,
//! - the static [`POLLUTANT_FIELDS`] table mapping Open-Meteo hourly field
//!   names to pollutant codes and units,
//! - the deserialized upstream payload ([`HourlyResponse`]) and the pure
//!   extraction of its parallel arrays into per-hour [`HourlyRecord`]s.
//!
//! Everything here is side-effect free; the database-facing modules
//! (`dims`, `facts`) consume these types without knowing about HTTP.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::Deserialize;

// ---

/// A city to ingest: natural identity plus the coordinates the upstream
/// API is queried with.
#[derive(Debug, Clone)]
pub struct City {
    // ---
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
}

impl City {
    // ---
    pub fn new(name: &str, latitude: f64, longitude: f64, country: &str) -> Self {
        // ---
        City {
            name: name.to_string(),
            latitude,
            longitude,
            country: country.to_string(),
        }
    }

    /// Location label stored in the location dimension. Derived from the
    /// city name, so (city, label) is effectively keyed by city.
    pub fn location_label(&self) -> String {
        format!("{} (Open-Meteo)", self.name)
    }
}

// ---

/// One upstream hourly field and the pollutant-dimension entry it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollutantField {
    // ---
    /// Field name in the Open-Meteo `hourly` section.
    pub field: &'static str,
    /// Short code stored in the pollutant dimension.
    pub code: &'static str,
    /// Unit label; `None` for unitless indices.
    pub unit: Option<&'static str>,
}

/// The fixed set of hourly fields requested from the upstream API.
#[rustfmt::skip]
pub const POLLUTANT_FIELDS: [PollutantField; 7] = [
    PollutantField { field: "pm2_5",            code: "pm25", unit: Some("µg/m³") },
    PollutantField { field: "pm10",             code: "pm10", unit: Some("µg/m³") },
    PollutantField { field: "carbon_monoxide",  code: "co",   unit: Some("µg/m³") },
    PollutantField { field: "nitrogen_dioxide", code: "no2",  unit: Some("µg/m³") },
    PollutantField { field: "sulphur_dioxide",  code: "so2",  unit: Some("µg/m³") },
    PollutantField { field: "ozone",            code: "o3",   unit: Some("µg/m³") },
    PollutantField { field: "european_aqi",     code: "aqi",  unit: None },
];

impl PollutantField {
    // ---
    /// Split a raw reading into the fact row's (value, aqi) slots. The
    /// derived air-quality index populates `aqi`; every concentration
    /// field populates `value`. Exactly one slot is non-null.
    pub fn slots(&self, raw: f64) -> (Option<f64>, Option<f64>) {
        // ---
        if self.code == "aqi" {
            (None, Some(raw))
        } else {
            (Some(raw), None)
        }
    }
}

/// Comma-joined field list for the upstream `hourly` query parameter.
pub fn hourly_param() -> String {
    // ---
    POLLUTANT_FIELDS
        .iter()
        .map(|f| f.field)
        .collect::<Vec<_>>()
        .join(",")
}

// ---

/// Top-level upstream response. Only the hourly section is consumed.
#[derive(Debug, Default, Deserialize)]
pub struct HourlyResponse {
    // ---
    #[serde(default)]
    pub hourly: HourlyBlock,
}

/// The `hourly` section: a `time` array plus one parallel value array per
/// requested field. The API may omit a field entirely, return a shorter
/// array, or null individual entries; all of those mean "no observation".
#[derive(Debug, Default, Deserialize)]
pub struct HourlyBlock {
    // ---
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub pm2_5: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub pm10: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub carbon_monoxide: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub nitrogen_dioxide: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub sulphur_dioxide: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub ozone: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub european_aqi: Option<Vec<Option<f64>>>,
}

impl HourlyBlock {
    // ---
    fn series(&self, field: &str) -> Option<&Vec<Option<f64>>> {
        // ---
        match field {
            "pm2_5" => self.pm2_5.as_ref(),
            "pm10" => self.pm10.as_ref(),
            "carbon_monoxide" => self.carbon_monoxide.as_ref(),
            "nitrogen_dioxide" => self.nitrogen_dioxide.as_ref(),
            "sulphur_dioxide" => self.sulphur_dioxide.as_ref(),
            "ozone" => self.ozone.as_ref(),
            "european_aqi" => self.european_aqi.as_ref(),
            _ => None,
        }
    }
}

// ---

/// A single classified pollutant reading within one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    // ---
    pub field: PollutantField,
    pub value: Option<f64>,
    pub aqi: Option<f64>,
}

/// One hour of the fetched series. Every fetched timestamp produces a
/// record, even when all of its field values are null; the time dimension
/// is keyed off the timestamps, not off whichever readings happened to be
/// present.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRecord {
    // ---
    pub ts_utc: DateTime<Utc>,
    pub readings: Vec<Reading>,
}

/// Turn the parallel hourly arrays into one record per timestamp.
///
/// Hours keep upstream order, fields follow [`POLLUTANT_FIELDS`] order
/// within each hour. A null entry, a field array shorter than the `time`
/// array, or a missing field array all produce no reading for that slot;
/// the hour's record remains (possibly with no readings at all). An
/// unparseable timestamp fails the whole series, since parallel indexing
/// is no longer trustworthy.
pub fn extract_hours(hourly: &HourlyBlock) -> Result<Vec<HourlyRecord>> {
    // ---
    let mut records = Vec::with_capacity(hourly.time.len());

    for (idx, ts_str) in hourly.time.iter().enumerate() {
        let ts_utc = parse_utc(ts_str)?;
        let mut readings = Vec::new();
        for field in &POLLUTANT_FIELDS {
            let raw = hourly
                .series(field.field)
                .and_then(|values| values.get(idx))
                .and_then(|v| *v);
            let Some(raw) = raw else {
                continue;
            };
            let (value, aqi) = field.slots(raw);
            readings.push(Reading {
                field: *field,
                value,
                aqi,
            });
        }
        records.push(HourlyRecord { ts_utc, readings });
    }

    Ok(records)
}

/// Parse an upstream timestamp as UTC.
///
/// With `timezone=UTC` Open-Meteo returns naive minute-precision stamps
/// (`2025-01-01T00:00`); offset-bearing stamps are accepted too and
/// converted.
pub fn parse_utc(ts: &str) -> Result<DateTime<Utc>> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(anyhow!("unrecognized timestamp: {ts}"))
}

// ---

/// Calendar fields derived from an hour-aligned UTC timestamp, as stored
/// in the time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    // ---
    pub date: NaiveDate,
    pub hour: i16,
    pub day: i16,
    pub month: i16,
    pub year: i32,
    /// ISO weekday with Monday = 0.
    pub dow: i16,
}

impl TimeParts {
    // ---
    pub fn of(ts_utc: DateTime<Utc>) -> Self {
        // ---
        TimeParts {
            date: ts_utc.date_naive(),
            hour: ts_utc.hour() as i16,
            day: ts_utc.day() as i16,
            month: ts_utc.month() as i16,
            year: ts_utc.year(),
            dow: ts_utc.weekday().num_days_from_monday() as i16,
        }
    }
}
