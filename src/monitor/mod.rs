//! Current weather monitoring
//!
//! Two clients fetch the same `OpenWeatherMap` endpoint: a blocking one that
//! walks the city list in order and an async one that issues every request
//! at once. Both produce one [`MonitorReport`] per city, in input order,
//! optionally compared with the historical norms of the current season.

pub mod async_client;
pub mod comparison;
pub mod openweathermap;
pub mod sync_client;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

pub use async_client::AsyncWeatherClient;
pub use comparison::analyze_current;
pub use sync_client::SyncWeatherClient;

use crate::config::WeatherConfig;
use crate::history::HistoricalDataset;
use crate::models::{CurrentAnalysis, CurrentReading};
use crate::{ApiErrorKind, Result, TempwatchError};

pub(crate) const USER_AGENT: &str = concat!("tempwatch/", env!("CARGO_PKG_VERSION"));

const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Which client performs the requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    /// Blocking client, one city after another
    Sync,
    /// Async client, all cities concurrently
    #[default]
    Async,
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorMode::Sync => f.write_str("sync"),
            MonitorMode::Async => f.write_str("async"),
        }
    }
}

impl FromStr for MonitorMode {
    type Err = TempwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "blocking" => Ok(MonitorMode::Sync),
            "async" => Ok(MonitorMode::Async),
            other => Err(TempwatchError::validation(format!(
                "Unknown monitoring mode '{other}'. Use 'sync' or 'async'."
            ))),
        }
    }
}

/// A failed fetch, reduced to what a user needs to see
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorFailure {
    pub kind: Option<ApiErrorKind>,
    pub status: Option<u16>,
    pub message: String,
}

impl From<&TempwatchError> for MonitorFailure {
    fn from(error: &TempwatchError) -> Self {
        let kind = error.api_kind();
        Self {
            kind,
            status: kind.and_then(|k| k.status_code()),
            message: error.user_message(),
        }
    }
}

/// Outcome of monitoring one city
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub city: String,
    pub reading: Option<CurrentReading>,
    pub analysis: Option<CurrentAnalysis>,
    /// Why the reading could not be compared with history
    pub analysis_error: Option<String>,
    pub error: Option<MonitorFailure>,
}

impl MonitorReport {
    /// Build a report from a fetch result, comparing successful readings
    /// with `dataset` when one is loaded
    pub fn new(
        city: &str,
        fetched: Result<CurrentReading>,
        dataset: Option<&HistoricalDataset>,
        month: u32,
    ) -> Self {
        let reading = match fetched {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Monitoring {} failed: {}", city, e);
                return Self {
                    city: city.to_string(),
                    reading: None,
                    analysis: None,
                    analysis_error: None,
                    error: Some(MonitorFailure::from(&e)),
                };
            }
        };

        let (analysis, analysis_error) = match dataset {
            Some(dataset) => {
                match comparison::analyze_current(dataset, city, reading.temperature, month) {
                    Ok(analysis) => (Some(analysis), None),
                    Err(e) => (None, Some(e.user_message())),
                }
            }
            None => (None, None),
        };

        Self {
            city: city.to_string(),
            reading: Some(reading),
            analysis,
            analysis_error,
            error: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.reading.is_some()
    }

    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.reading.as_ref().map(|r| r.temperature)
    }
}

/// Reports for a whole city list plus wall-clock time
#[derive(Debug, Clone, Serialize)]
pub struct MonitorRun {
    pub mode: MonitorMode,
    pub elapsed_ms: u64,
    pub reports: Vec<MonitorReport>,
}

impl MonitorRun {
    #[must_use]
    pub fn successes(&self) -> usize {
        self.reports.iter().filter(|r| r.is_success()).count()
    }
}

/// Current local month (1-12), used to pick the season for comparisons
#[must_use]
pub fn current_month() -> u32 {
    Local::now().month()
}

/// Trimmed, non-empty city names in input order
pub fn normalize_cities<I, S>(cities: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cities: Vec<String> = cities
        .into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if cities.is_empty() {
        return Err(TempwatchError::validation("At least one city is required"));
    }
    Ok(cities)
}

/// Fetch current weather for `cities` with the selected client
///
/// The blocking client is built, used and dropped on a `spawn_blocking`
/// thread so it never runs on the async executor.
#[instrument(skip(config, cities, dataset), fields(cities = cities.len()))]
pub async fn monitor(
    mode: MonitorMode,
    config: &WeatherConfig,
    cities: Vec<String>,
    dataset: Option<Arc<HistoricalDataset>>,
    month: u32,
) -> Result<MonitorRun> {
    let cities = normalize_cities(cities)?;
    let start = Instant::now();

    let reports = match mode {
        MonitorMode::Sync => {
            let config = config.clone();
            tokio::task::spawn_blocking(move || {
                let client = SyncWeatherClient::new(&config)?;
                Ok::<_, TempwatchError>(client.monitor_cities(&cities, dataset.as_deref(), month))
            })
            .await
            .map_err(|e| TempwatchError::general(format!("Blocking monitor task failed: {e}")))??
        }
        MonitorMode::Async => {
            let client = AsyncWeatherClient::new(config)?;
            client
                .monitor_cities(&cities, dataset.as_deref(), month)
                .await
        }
    };

    let elapsed = start.elapsed();
    info!(
        "{} monitoring of {} cities finished in {:.3}s",
        mode,
        reports.len(),
        elapsed.as_secs_f64()
    );

    Ok(MonitorRun {
        mode,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        reports,
    })
}

pub(crate) fn log_response_time(city: &str, elapsed: Duration) {
    info!(
        "Fetched current weather for '{}' in {:.3}s",
        city,
        elapsed.as_secs_f64()
    );
    if elapsed > SLOW_RESPONSE {
        warn!("Slow API response detected: {:.3}s", elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    #[case("sync", MonitorMode::Sync)]
    #[case("Blocking", MonitorMode::Sync)]
    #[case(" async ", MonitorMode::Async)]
    fn test_mode_from_str(#[case] input: &str, #[case] expected: MonitorMode) {
        assert_eq!(input.parse::<MonitorMode>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_mode() {
        assert!("threads".parse::<MonitorMode>().is_err());
        assert_eq!(MonitorMode::default(), MonitorMode::Async);
    }

    #[test]
    fn test_normalize_cities() {
        let cities = normalize_cities([" Moscow", "", "London ", "  "]).unwrap();
        assert_eq!(cities, vec!["Moscow", "London"]);
        assert!(normalize_cities(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_report_from_error() {
        let err = TempwatchError::api(ApiErrorKind::InvalidApiKey, "HTTP 401");
        let report = MonitorReport::new("Paris", Err(err), None, 1);
        assert!(!report.is_success());
        let failure = report.error.unwrap();
        assert_eq!(failure.kind, Some(ApiErrorKind::InvalidApiKey));
        assert_eq!(failure.status, Some(401));
    }

    #[test]
    fn test_report_without_dataset() {
        let reading = CurrentReading {
            city: "Paris".to_string(),
            temperature: 12.3,
            description: "mist".to_string(),
            status: 200,
            fetched_at: Utc::now(),
        };
        let report = MonitorReport::new("Paris", Ok(reading), None, 1);
        assert_eq!(report.temperature(), Some(12.3));
        assert!(report.analysis.is_none());
        assert!(report.analysis_error.is_none());
    }
}
