use std::time::{Duration, Instant};

use crate::{
    config::Config,
    error::EtlError,
    fetch::{OpenMeteoFetcher, WeatherSource},
    load::{SqliteLoader, WeatherSink},
    model::{Coordinates, WeatherRecord},
    transform::transform,
};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub record: WeatherRecord,
    pub elapsed: Duration,
}

/// Fetch, transform and load, strictly in that order.
#[derive(Debug)]
pub struct Pipeline<S, L> {
    source: S,
    sink: L,
    coords: Coordinates,
}

impl Pipeline<OpenMeteoFetcher, SqliteLoader> {
    /// Wire the Open-Meteo fetcher and SQLite loader from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = OpenMeteoFetcher::from_config(&config.api)?;
        let sink = SqliteLoader::new(config.database_path()?);
        Ok(Self::new(source, sink, config.location.clone()))
    }
}

impl<S: WeatherSource, L: WeatherSink> Pipeline<S, L> {
    pub fn new(source: S, sink: L, coords: Coordinates) -> Self {
        Self {
            source,
            sink,
            coords,
        }
    }

    pub fn coords(&self) -> &Coordinates {
        &self.coords
    }

    /// Execute one run. The first failing stage aborts the run; nothing is retried.
    pub async fn run(&self) -> Result<RunReport, EtlError> {
        let started = Instant::now();
        log::info!("Starting weather ETL run for {}", self.coords);

        let result = self.run_stages().await;
        let elapsed = started.elapsed();

        match result {
            Ok(record) => {
                log::info!("Weather ETL run finished in {elapsed:?}");
                Ok(RunReport { record, elapsed })
            }
            Err(err) => {
                log::error!("Weather ETL run failed at {} stage: {err}", err.stage());
                Err(err)
            }
        }
    }

    async fn run_stages(&self) -> Result<WeatherRecord, EtlError> {
        log::debug!("Extracting");
        let payload = self.source.fetch(&self.coords).await?;

        log::debug!("Transforming");
        let record = transform(&payload, &self.coords)?;

        log::debug!("Loading");
        self.sink.load(&record)?;

        Ok(record)
    }
}
