//! In-memory historical dataset with per-city rolling statistics

use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use super::anomaly::{self, rolling_bounds};
use super::stats;
use super::trends::{self, YearlyAverage};
use crate::config::AnalysisConfig;
use crate::models::{CityTrend, ProcessedObservation, Season, TemperatureObservation};
use crate::{Result, TempwatchError};

/// Processed historical data, grouped by city and sorted by time
#[derive(Debug, Clone)]
pub struct HistoricalDataset {
    cities: BTreeMap<String, Vec<ProcessedObservation>>,
    trends: Vec<CityTrend>,
    window: usize,
    anomaly_sigma: f64,
}

impl HistoricalDataset {
    /// Compute rolling statistics, anomalies and trends for every city
    #[instrument(skip_all, fields(observations = observations.len()))]
    pub fn from_observations(
        observations: Vec<TemperatureObservation>,
        analysis: &AnalysisConfig,
    ) -> Result<Self> {
        if observations.is_empty() {
            return Err(TempwatchError::data("Historical dataset is empty"));
        }

        let mut grouped: BTreeMap<String, Vec<TemperatureObservation>> = BTreeMap::new();
        for observation in observations {
            grouped
                .entry(observation.city.clone())
                .or_default()
                .push(observation);
        }

        let mut cities = BTreeMap::new();
        let mut trends = Vec::with_capacity(grouped.len());

        for (city, mut series) in grouped {
            series.sort_by_key(|o| o.timestamp);

            let temperatures: Vec<f64> = series.iter().map(|o| o.temperature).collect();
            let means = stats::rolling_mean(&temperatures, analysis.window);
            let stds = stats::rolling_std(&temperatures, analysis.window);

            let processed: Vec<ProcessedObservation> = series
                .into_iter()
                .zip(means.into_iter().zip(stds))
                .map(|(observation, (rolling_mean, rolling_std))| {
                    let bounds = rolling_bounds(rolling_mean, rolling_std, analysis.anomaly_sigma);
                    ProcessedObservation {
                        season: observation.season(),
                        anomaly: anomaly::detect(observation.temperature, bounds),
                        upper_bound: bounds.map(|b| b.upper),
                        lower_bound: bounds.map(|b| b.lower),
                        rolling_mean,
                        rolling_std,
                        observation,
                    }
                })
                .collect();

            let yearly = trends::yearly_averages(
                processed.iter().map(|p| (p.observation.year(), p.temperature())),
            );
            let trend = trends::city_trend(&city, &yearly);

            debug!(
                "{}: {} observations, {} anomalies, trend {:.4}°C/year",
                city,
                processed.len(),
                processed.iter().filter(|p| p.is_anomaly()).count(),
                trend.slope
            );

            trends.push(trend);
            cities.insert(city, processed);
        }

        info!(
            "Processed historical data for {} cities (window {}, {}σ)",
            cities.len(),
            analysis.window,
            analysis.anomaly_sigma
        );

        Ok(Self {
            cities,
            trends,
            window: analysis.window,
            anomaly_sigma: analysis.anomaly_sigma,
        })
    }

    /// City names in alphabetical order
    #[must_use]
    pub fn cities(&self) -> Vec<&str> {
        self.cities.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.contains_key(city)
    }

    /// Processed series for one city, oldest first
    #[must_use]
    pub fn city(&self, city: &str) -> Option<&[ProcessedObservation]> {
        self.cities.get(city).map(Vec::as_slice)
    }

    /// Same as [`Self::city`] but reports unknown cities as a data error
    pub fn require_city(&self, city: &str) -> Result<&[ProcessedObservation]> {
        self.city(city)
            .ok_or_else(|| TempwatchError::data(format!("No historical data for city '{city}'")))
    }

    /// Trend table in city order
    #[must_use]
    pub fn trends(&self) -> &[CityTrend] {
        &self.trends
    }

    #[must_use]
    pub fn city_trend(&self, city: &str) -> Option<&CityTrend> {
        self.trends.iter().find(|t| t.city == city)
    }

    /// Yearly averages for a city, oldest first
    #[must_use]
    pub fn yearly_averages(&self, city: &str) -> Vec<YearlyAverage> {
        self.city(city).map_or_else(Vec::new, |series| {
            trends::yearly_averages(series.iter().map(|p| (p.observation.year(), p.temperature())))
        })
    }

    /// All temperatures recorded for a city in the given season
    #[must_use]
    pub fn seasonal_temperatures(&self, city: &str, season: Season) -> Vec<f64> {
        self.city(city).map_or_else(Vec::new, |series| {
            series
                .iter()
                .filter(|p| p.season == season)
                .map(ProcessedObservation::temperature)
                .collect()
        })
    }

    #[must_use]
    pub fn total_observations(&self) -> usize {
        self.cities.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub fn anomaly_sigma(&self) -> f64 {
        self.anomaly_sigma
    }
}
