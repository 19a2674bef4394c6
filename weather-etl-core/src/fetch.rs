use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::{
    config::ApiConfig,
    error::FetchError,
    model::{Coordinates, RawWeatherPayload},
};

/// Something that can produce the current-conditions payload for a location.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, coords: &Coordinates) -> Result<RawWeatherPayload, FetchError>;
}

/// Open-Meteo forecast endpoint client.
#[derive(Debug, Clone)]
pub struct OpenMeteoFetcher {
    base_url: String,
    http: Client,
}

impl OpenMeteoFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Build a fetcher from the `[api]` section, applying the timeout if one is set.
    pub fn from_config(api: &ApiConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(secs) = api.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(FetchError::Transport)?;

        Ok(Self {
            base_url: api.base_url.clone(),
            http,
        })
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoFetcher {
    async fn fetch(&self, coords: &Coordinates) -> Result<RawWeatherPayload, FetchError> {
        let url = self.forecast_url();
        log::debug!("Requesting current weather for {coords} from {url}");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", coords.latitude.as_str()),
                ("longitude", coords.longitude.as_str()),
                ("current_weather", "true"),
            ])
            .send()
            .await
            .map_err(|e| {
                log::error!("API request failed: {e}");
                FetchError::Transport(e)
            })?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_else(|e| {
                log::warn!("Failed to read error response body: {e}");
                String::new()
            });
            log::error!(
                "Failed to fetch data: {} - {}",
                status.as_u16(),
                truncate_body(&body)
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = res.text().await.map_err(|e| {
            log::error!("Failed to read API response body: {e}");
            FetchError::Transport(e)
        })?;

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            log::error!("API response is not valid JSON: {e}");
            FetchError::Decode(e)
        })?;

        log::info!("Weather data fetched successfully.");
        Ok(RawWeatherPayload(payload))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
