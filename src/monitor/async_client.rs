//! Async `OpenWeatherMap` client

use std::time::Instant;

use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, instrument};

use super::{MonitorReport, USER_AGENT, log_response_time, openweathermap};
use crate::config::WeatherConfig;
use crate::history::HistoricalDataset;
use crate::models::CurrentReading;
use crate::{Result, TempwatchError};

/// Concurrent weather client sharing one connection pool
#[derive(Debug, Clone)]
pub struct AsyncWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    country_code: Option<String>,
}

impl AsyncWeatherClient {
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

    #[instrument(skip(self))]
    pub async fn fetch_current(&self, city: &str, country: Option<&str>) -> Result<CurrentReading> {
        let country = country.or(self.country_code.as_deref());
        let start = Instant::now();

        let response = self
            .client
            .get(&self.base_url)
            .query(&openweathermap::query_params(city, country, &self.api_key))
            .send()
            .await
            .map_err(|e| openweathermap::transport_error(city, &e))?;

        let status = response.status().as_u16();
        debug!("HTTP response received: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| openweathermap::transport_error(city, &e))?;

        log_response_time(city, start.elapsed());
        openweathermap::parse_response(city, status, &body)
    }

    /// All requests in flight at once; results keep input order
    pub async fn fetch_all(&self, cities: &[String]) -> Vec<Result<CurrentReading>> {
        join_all(cities.iter().map(|city| self.fetch_current(city, None))).await
    }

    pub async fn monitor_cities(
        &self,
        cities: &[String],
        dataset: Option<&HistoricalDataset>,
        month: u32,
    ) -> Vec<MonitorReport> {
        cities
            .iter()
            .zip(self.fetch_all(cities).await)
            .map(|(city, fetched)| MonitorReport::new(city, fetched, dataset, month))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let err = AsyncWeatherClient::new(&WeatherConfig::default()).unwrap_err();
        assert!(matches!(err, TempwatchError::Config { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let config = WeatherConfig {
            api_key: Some("0123456789abcdef".to_string()),
            base_url: "http://127.0.0.1:9/data/2.5/weather".to_string(),
            timeout_seconds: 2,
            country_code: None,
        };
        let client = AsyncWeatherClient::new(&config).unwrap();
        let results = client.fetch_all(&["Paris".to_string(), "Rome".to_string()]).await;
        assert_eq!(results.len(), 2);
        for result in results {
            assert_eq!(
                result.unwrap_err().api_kind(),
                Some(crate::ApiErrorKind::Network)
            );
        }
    }
}
