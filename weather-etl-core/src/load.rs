//! Append-only persistence of weather records.
//!
//! Each call opens its own SQLite connection, ensures the `weather` table
//! exists, inserts one row inside a transaction and commits. The connection
//! is dropped when the call returns, whether it succeeded or not.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use rusqlite::{Connection, params};
use serde_json::Value;

use crate::{error::PersistenceError, model::WeatherRecord};

/// Destination table schema. The timestamp is assigned by the database.
pub const CREATE_TABLE_SQL: &str = r#"CREATE TABLE IF NOT EXISTS weather (
    latitude VARCHAR,
    longitude VARCHAR,
    temperature FLOAT,
    windspeed FLOAT,
    winddirection FLOAT,
    weathercode INTEGER,
    "timestamp" TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)"#;

const INSERT_SQL: &str = "INSERT INTO weather \
    (latitude, longitude, temperature, windspeed, winddirection, weathercode) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// Something that can durably store one record per call.
pub trait WeatherSink: Send + Sync + Debug {
    fn load(&self, record: &WeatherRecord) -> Result<(), PersistenceError>;
}

/// SQLite-backed loader writing to a single database file.
#[derive(Debug, Clone)]
pub struct SqliteLoader {
    path: PathBuf,
}

impl SqliteLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }

        Connection::open(&self.path).map_err(|source| PersistenceError::Open {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl WeatherSink for SqliteLoader {
    fn load(&self, record: &WeatherRecord) -> Result<(), PersistenceError> {
        let mut conn = self.open()?;
        let tx = conn.transaction().map_err(|source| PersistenceError::Begin {
            path: self.path.display().to_string(),
            source,
        })?;

        tx.execute_batch(CREATE_TABLE_SQL)
            .map_err(PersistenceError::CreateTable)?;

        let temperature = real_column("temperature", record.temperature.as_ref())?;
        let windspeed = real_column("windspeed", record.windspeed.as_ref())?;
        let winddirection = real_column("winddirection", record.winddirection.as_ref())?;
        let weathercode = integer_column("weathercode", record.weathercode.as_ref())?;

        tx.execute(
            INSERT_SQL,
            params![
                record.latitude,
                record.longitude,
                temperature,
                windspeed,
                winddirection,
                weathercode,
            ],
        )
        .map_err(PersistenceError::Insert)?;

        tx.commit().map_err(PersistenceError::Commit)?;

        log::info!(
            "Loaded weather row for ({}, {}) into {}",
            record.latitude,
            record.longitude,
            self.path.display()
        );
        Ok(())
    }
}

/// Bind value for a FLOAT column: any JSON number.
fn real_column(
    name: &'static str,
    value: Option<&Value>,
) -> Result<Option<f64>, PersistenceError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| PersistenceError::ColumnType {
            name,
            column: "FLOAT",
            value: v.to_string(),
        }),
    }
}

/// Bind value for an INTEGER column: a JSON integer, or a float with no
/// fractional part.
fn integer_column(
    name: &'static str,
    value: Option<&Value>,
) -> Result<Option<i64>, PersistenceError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .or_else(|| {
                v.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| PersistenceError::ColumnType {
                name,
                column: "INTEGER",
                value: v.to_string(),
            }),
    }
}
