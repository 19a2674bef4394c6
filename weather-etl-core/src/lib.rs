//! Core library for the `weather-etl` pipeline.
//!
//! This crate defines:
//! - Configuration handling
//! - The three pipeline stages: fetch (Open-Meteo), transform, load (SQLite)
//! - Typed error kinds for each stage
//! - A cron-driven runner for unattended operation
//!
//! It is used by `weather-etl-cli`, but the stages can be wired up by any
//! other scheduler through [`Pipeline`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod schedule;
pub mod transform;

pub use config::Config;
pub use error::{EtlError, FetchError, PersistenceError, ValidationError};
pub use fetch::{OpenMeteoFetcher, WeatherSource};
pub use load::{SqliteLoader, WeatherSink};
pub use model::{Coordinates, RawWeatherPayload, WeatherRecord};
pub use pipeline::{Pipeline, RunReport};
pub use schedule::{RunSchedule, ScheduleError, run_scheduled};
pub use transform::transform;
