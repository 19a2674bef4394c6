use serde_json::{Map, Value};

use crate::{
    error::ValidationError,
    model::{Coordinates, RawWeatherPayload, WeatherRecord},
};

/// Build a [`WeatherRecord`] from the current-conditions object of `payload`.
///
/// Values are copied as the API sent them. A field that is absent or JSON
/// `null` becomes `None`. The only check is that the current-conditions
/// object exists and is not empty.
pub fn transform(
    payload: &RawWeatherPayload,
    coords: &Coordinates,
) -> Result<WeatherRecord, ValidationError> {
    let current = payload
        .current_weather()
        .filter(|current| !current.is_empty())
        .ok_or(ValidationError::MissingCurrentWeather)?;

    let record = WeatherRecord {
        latitude: coords.latitude.clone(),
        longitude: coords.longitude.clone(),
        temperature: field(current, "temperature"),
        windspeed: field(current, "windspeed"),
        winddirection: field(current, "winddirection"),
        weathercode: field(current, "weathercode"),
    };

    log::info!("Transformed weather data: {record:?}");
    Ok(record)
}

fn field(current: &Map<String, Value>, name: &str) -> Option<Value> {
    current.get(name).filter(|value| !value.is_null()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn london() -> Coordinates {
        Coordinates::new("51.5074", "-0.1278")
    }

    #[test]
    fn copies_all_fields_verbatim() {
        let payload = RawWeatherPayload(json!({
            "latitude": 51.5,
            "current_weather": {
                "temperature": 15.2,
                "windspeed": 10.1,
                "winddirection": 200,
                "weathercode": 3,
                "time": "2024-05-01T12:00"
            }
        }));

        let record = transform(&payload, &london()).expect("payload is complete");

        assert_eq!(
            record,
            WeatherRecord {
                latitude: "51.5074".into(),
                longitude: "-0.1278".into(),
                temperature: Some(json!(15.2)),
                windspeed: Some(json!(10.1)),
                winddirection: Some(json!(200)),
                weathercode: Some(json!(3)),
            }
        );
    }

    #[test]
    fn absent_and_null_fields_become_none() {
        let payload = RawWeatherPayload(json!({
            "current_weather": { "temperature": -3.5, "windspeed": null }
        }));

        let record = transform(&payload, &london()).unwrap();

        assert_eq!(record.temperature, Some(json!(-3.5)));
        assert_eq!(record.windspeed, None);
        assert_eq!(record.winddirection, None);
        assert_eq!(record.weathercode, None);
    }

    #[test]
    fn coordinates_come_from_configuration_not_payload() {
        let payload = RawWeatherPayload(json!({
            "latitude": 1.0,
            "longitude": 2.0,
            "current_weather": { "temperature": 1.0 }
        }));

        let record = transform(&payload, &Coordinates::new("48.8566", "2.3522")).unwrap();

        assert_eq!(record.latitude, "48.8566");
        assert_eq!(record.longitude, "2.3522");
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = transform(&RawWeatherPayload(json!({})), &london()).unwrap_err();
        assert_eq!(err, ValidationError::MissingCurrentWeather);
    }

    #[test]
    fn empty_current_weather_is_rejected() {
        let payload = RawWeatherPayload(json!({ "current_weather": {} }));
        let err = transform(&payload, &london()).unwrap_err();
        assert_eq!(err, ValidationError::MissingCurrentWeather);
    }

    #[test]
    fn non_object_current_weather_is_rejected() {
        let payload = RawWeatherPayload(json!({ "current_weather": "sunny" }));
        let err = transform(&payload, &london()).unwrap_err();
        assert_eq!(err, ValidationError::MissingCurrentWeather);
    }

    #[test]
    fn whole_number_float_weathercode_passes_through() {
        let payload = RawWeatherPayload(json!({
            "current_weather": { "temperature": 12.0, "weathercode": 3.0 }
        }));

        let record = transform(&payload, &london()).unwrap();

        assert_eq!(record.weathercode, Some(json!(3.0)));
    }

    #[test]
    fn unexpected_types_are_not_checked_here() {
        let payload = RawWeatherPayload(json!({
            "current_weather": { "temperature": "warm", "weathercode": 3.5 }
        }));

        let record = transform(&payload, &london()).unwrap();

        assert_eq!(record.temperature, Some(json!("warm")));
        assert_eq!(record.weathercode, Some(json!(3.5)));
    }
}
