//! `OpenWeatherMap` current-weather request and response shapes

use chrono::Utc;
use serde::Deserialize;

use crate::models::CurrentReading;
use crate::{ApiErrorKind, Result, TempwatchError};

/// Body of `GET /data/2.5/weather`
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub main: MainBlock,
    #[serde(default)]
    pub weather: Vec<ConditionBlock>,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    /// Celsius when requested with `units=metric`
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConditionBlock {
    pub description: String,
}

/// `q`, `appid` and `units` query parameters for a city
#[must_use]
pub fn query_params<'a>(
    city: &'a str,
    country_code: Option<&'a str>,
    api_key: &'a str,
) -> [(&'static str, String); 3] {
    let q = match country_code {
        Some(country) => format!("{city},{country}"),
        None => city.to_string(),
    };
    [
        ("q", q),
        ("appid", api_key.to_string()),
        ("units", "metric".to_string()),
    ]
}

/// Turn a status code and body into a reading or a classified error
pub fn parse_response(city: &str, status: u16, body: &str) -> Result<CurrentReading> {
    if status != 200 {
        let kind = ApiErrorKind::from_status(status);
        let message = match kind {
            ApiErrorKind::CityNotFound => city.to_string(),
            _ => format!("HTTP {status} for city '{city}'"),
        };
        return Err(TempwatchError::api(kind, message));
    }

    let response: CurrentWeatherResponse = serde_json::from_str(body).map_err(|e| {
        TempwatchError::api(
            ApiErrorKind::InvalidResponse,
            format!("Unexpected weather response for '{city}': {e}"),
        )
    })?;

    Ok(CurrentReading {
        city: city.to_string(),
        temperature: response.main.temp,
        description: response
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .unwrap_or_default(),
        status,
        fetched_at: Utc::now(),
    })
}

/// Classify a transport failure
pub fn transport_error(city: &str, error: &reqwest::Error) -> TempwatchError {
    let message = if error.is_timeout() {
        format!("Request for '{city}' timed out")
    } else {
        format!("Request for '{city}' failed: {error}")
    };
    TempwatchError::api(ApiErrorKind::Network, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let params = query_params("Moscow", None, "key123456");
        assert_eq!(params[0], ("q", "Moscow".to_string()));
        assert_eq!(params[1], ("appid", "key123456".to_string()));
        assert_eq!(params[2], ("units", "metric".to_string()));

        let params = query_params("Paris", Some("FR"), "key123456");
        assert_eq!(params[0].1, "Paris,FR");
    }

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}],
            "main": {"temp": 18.42, "feels_like": 17.9, "humidity": 40},
            "name": "Berlin",
            "cod": 200
        }"#;
        let reading = parse_response("Berlin", 200, body).unwrap();
        assert_eq!(reading.city, "Berlin");
        assert_eq!(reading.temperature, 18.42);
        assert_eq!(reading.description, "clear sky");
        assert_eq!(reading.status, 200);
    }

    #[test]
    fn test_parse_missing_weather_block() {
        let reading = parse_response("Berlin", 200, r#"{"main": {"temp": 1.0}}"#).unwrap();
        assert_eq!(reading.description, "");
    }

    #[test]
    fn test_invalid_key_and_unknown_city() {
        let body = r#"{"cod": 401, "message": "Invalid API key"}"#;
        let err = parse_response("Berlin", 401, body).unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::InvalidApiKey));

        let body = r#"{"cod": "404", "message": "city not found"}"#;
        let err = parse_response("Atlantis", 404, body).unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::CityNotFound));
        assert!(err.user_message().contains("Atlantis"));
    }

    #[test]
    fn test_other_status_and_bad_body() {
        let err = parse_response("Berlin", 500, "").unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::Http(500)));

        let err = parse_response("Berlin", 200, "<html>").unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::InvalidResponse));
    }
}
