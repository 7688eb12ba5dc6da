//! Batch ETL: hourly air-quality observations from the Open-Meteo API into
//! a PostgreSQL star schema.
//!
//! Pipeline shape: [`fetch`] pulls one past day and one forecast day of
//! hourly pollutant readings per configured city; [`models`] flattens the
//! parallel arrays into classified observations; [`dims`] resolves the
//! time/location/pollutant dimension keys with get-or-create semantics;
//! [`facts`] merges fact rows keyed by the (location, time, pollutant)
//! natural triple; [`etl`] orchestrates the per-city loop and reporting.
//!
//! The downstream aggregation views and the dashboard that reads them are
//! external consumers of the schema; this crate only writes it.

pub mod config;
pub mod dims;
pub mod etl;
pub mod facts;
pub mod fetch;
pub mod models;

pub use config::Config;
pub use etl::{run, CityOutcome, RunReport, SOURCE_TAG};
pub use models::{City, HourlyBlock, HourlyResponse, PollutantField, POLLUTANT_FIELDS};
