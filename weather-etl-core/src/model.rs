use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the current-conditions object in an Open-Meteo response.
pub const CURRENT_WEATHER_KEY: &str = "current_weather";

/// Latitude/longitude pair in decimal degrees, kept as the exact strings
/// sent to the API and written to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinates {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

impl Default for Coordinates {
    /// London.
    fn default() -> Self {
        Self::new("51.5074", "-0.1278")
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Decoded API response body, untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawWeatherPayload(pub Value);

impl RawWeatherPayload {
    /// The current-conditions object, if the payload has one.
    pub fn current_weather(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.get(CURRENT_WEATHER_KEY).and_then(Value::as_object)
    }
}

impl From<Value> for RawWeatherPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// One flat observation, ready to be appended to the weather table.
///
/// Measured values are kept exactly as the API sent them; converting them to
/// column types happens when the row is bound. Fields missing from the source
/// payload (or sent as `null`) stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub latitude: String,
    pub longitude: String,
    pub temperature: Option<Value>,
    pub windspeed: Option<Value>,
    pub winddirection: Option<Value>,
    pub weathercode: Option<Value>,
}
