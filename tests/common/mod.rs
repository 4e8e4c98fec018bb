//! Local stand-in for the `OpenWeatherMap` current-weather endpoint

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tempfile::NamedTempFile;

use tempwatch::config::WeatherConfig;

pub const API_KEY: &str = "0123456789abcdef";
pub const BAD_API_KEY: &str = "badkey-badkey";

/// Celsius values the mock reports for known cities
pub fn mock_temperature(city: &str) -> Option<f64> {
    match city {
        "Moscow" => Some(-8.5),
        "London" => Some(6.0),
        "Tokyo" => Some(9.25),
        "Sydney" => Some(24.0),
        "Cairo" => Some(19.5),
        _ => None,
    }
}

async fn current_weather(Query(params): Query<HashMap<String, String>>) -> Response {
    if params.get("appid").map(String::as_str) != Some(API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"cod": 401, "message": "Invalid API key"})),
        )
            .into_response();
    }

    let q = params.get("q").cloned().unwrap_or_default();
    let city = q.split(',').next().unwrap_or_default();
    let Some(celsius) = mock_temperature(city) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"cod": "404", "message": "city not found"})),
        )
            .into_response();
    };

    let temp = if params.get("units").map(String::as_str) == Some("metric") {
        celsius
    } else {
        celsius + 273.15
    };

    Json(json!({
        "weather": [{"id": 800, "main": "Clear", "description": format!("clear sky over {q}")}],
        "main": {"temp": temp, "humidity": 50},
        "name": city,
        "cod": 200
    }))
    .into_response()
}

/// Start the mock on an ephemeral port and return its endpoint URL
pub fn spawn_mock_weather() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let app = Router::new().route("/data/2.5/weather", get(current_weather));
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{addr}/data/2.5/weather")
}

pub fn weather_config(base_url: &str, api_key: &str) -> WeatherConfig {
    WeatherConfig {
        api_key: Some(api_key.to_string()),
        base_url: base_url.to_string(),
        timeout_seconds: 5,
        country_code: None,
    }
}

pub fn cities(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| (*c).to_string()).collect()
}

/// Thirty January days per city: 8, 10, 12 repeated around `base`
pub fn winter_csv(cities: &[(&str, f64)]) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(file, "city,timestamp,temperature").unwrap();
    for (city, base) in cities {
        for day in 1..=30_u8 {
            let offset = f64::from((day - 1) % 3) * 2.0 - 2.0;
            writeln!(file, "{city},2020-01-{day:02},{}", base + offset).unwrap();
        }
    }
    file.flush().unwrap();
    file
}

/// Accepts connections and never answers, so every request times out
pub fn spawn_unresponsive_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    format!("http://{addr}/data/2.5/weather")
}
