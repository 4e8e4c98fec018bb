//! Blocking `OpenWeatherMap` client

use std::time::Instant;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use super::{MonitorReport, USER_AGENT, log_response_time, openweathermap};
use crate::config::WeatherConfig;
use crate::history::HistoricalDataset;
use crate::models::CurrentReading;
use crate::{Result, TempwatchError};

/// Sequential weather client built on `reqwest::blocking`
///
/// Must not be created or dropped on an async executor thread.
#[derive(Debug)]
pub struct SyncWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    country_code: Option<String>,
}

impl SyncWeatherClient {
    /// Create a client from configuration; fails when no API key is set
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TempwatchError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            country_code: config.country_code.clone(),
        })
    }

    /// Current weather for one city; `country` overrides the configured code
    #[instrument(skip(self))]
    pub fn fetch_current(&self, city: &str, country: Option<&str>) -> Result<CurrentReading> {
        let country = country.or(self.country_code.as_deref());
        let start = Instant::now();

        let response = self
            .client
            .get(&self.base_url)
            .query(&openweathermap::query_params(city, country, &self.api_key))
            .send()
            .map_err(|e| openweathermap::transport_error(city, &e))?;

        let status = response.status().as_u16();
        debug!("HTTP response received: {}", status);

        let body = response
            .text()
            .map_err(|e| openweathermap::transport_error(city, &e))?;

        log_response_time(city, start.elapsed());
        openweathermap::parse_response(city, status, &body)
    }

    /// One result per city, fetched one after another in input order
    pub fn fetch_all(&self, cities: &[String]) -> Vec<Result<CurrentReading>> {
        cities
            .iter()
            .map(|city| self.fetch_current(city, None))
            .collect()
    }

    /// Fetch every city in order and compare each reading with `dataset`
    pub fn monitor_cities(
        &self,
        cities: &[String],
        dataset: Option<&HistoricalDataset>,
        month: u32,
    ) -> Vec<MonitorReport> {
        cities
            .iter()
            .zip(self.fetch_all(cities))
            .map(|(city, fetched)| MonitorReport::new(city, fetched, dataset, month))
            .collect()
    }
}
