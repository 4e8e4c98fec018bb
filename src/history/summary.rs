//! Per-city summaries and cross-city comparisons
//!
//! These are the data behind the dashboard charts: the last-year series
//! with its rolling band, anomaly scatter, seasonal box plots, yearly
//! averages with a fitted trend line, and the comparative trend table.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::dataset::HistoricalDataset;
use super::stats;
use crate::models::{AnomalyKind, CityTrend, ProcessedObservation, Season};
use crate::{Result, TempwatchError};

/// Anomaly counts for one city
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyCounts {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
}

/// Five-number summary of one season's temperatures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalDistribution {
    pub season: Season,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// One point of the last-year chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub rolling_mean: Option<f64>,
    /// rolling mean - 1σ
    pub band_lower: Option<f64>,
    /// rolling mean + 1σ
    pub band_upper: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub kind: AnomalyKind,
}

/// Yearly average with the value of the fitted trend line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyPoint {
    pub year: i32,
    pub average: f64,
    pub fitted: Option<f64>,
}

/// Everything the city view displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySummary {
    pub city: String,
    pub observations: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub anomalies: AnomalyCounts,
    pub anomalies_by_season: BTreeMap<Season, usize>,
    pub seasonal_distribution: Vec<SeasonalDistribution>,
    pub yearly: Vec<YearlyPoint>,
    pub trend: Option<CityTrend>,
    pub last_year: i32,
    pub last_year_series: Vec<SeriesPoint>,
    pub anomaly_points: Vec<AnomalyPoint>,
}

/// Column used to order the trend table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSortKey {
    #[default]
    Slope,
    Average,
    Range,
}

impl FromStr for TrendSortKey {
    type Err = TempwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slope" | "trend" => Ok(Self::Slope),
            "average" | "avg" | "mean" => Ok(Self::Average),
            "range" => Ok(Self::Range),
            other => Err(TempwatchError::validation(format!(
                "Unknown sort key '{other}'. Use slope, average or range"
            ))),
        }
    }
}

impl TrendSortKey {
    fn value(&self, trend: &CityTrend) -> f64 {
        match self {
            Self::Slope => trend.slope,
            Self::Average => trend.avg_temperature,
            Self::Range => trend.temperature_range,
        }
    }
}

/// Headline numbers of the comparison view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendOverview {
    pub mean_slope: f64,
    pub strongest_warming: CityTrend,
    pub strongest_cooling: CityTrend,
    pub hottest: CityTrend,
    pub coldest: CityTrend,
}

fn seasonal_distribution(series: &[ProcessedObservation]) -> Vec<SeasonalDistribution> {
    Season::ALL
        .iter()
        .filter_map(|&season| {
            let mut temps: Vec<f64> = series
                .iter()
                .filter(|p| p.season == season)
                .map(ProcessedObservation::temperature)
                .collect();
            temps.sort_by(f64::total_cmp);

            Some(SeasonalDistribution {
                season,
                count: temps.len(),
                min: *temps.first()?,
                q1: stats::quantile(&temps, 0.25)?,
                median: stats::quantile(&temps, 0.5)?,
                q3: stats::quantile(&temps, 0.75)?,
                max: *temps.last()?,
            })
        })
        .collect()
}

impl HistoricalDataset {
    /// Build the city view. Unknown cities are a data error.
    pub fn city_summary(&self, city: &str) -> Result<CitySummary> {
        let series = self.require_city(city)?;
        let temps: Vec<f64> = series.iter().map(ProcessedObservation::temperature).collect();

        let mut anomalies = AnomalyCounts::default();
        let mut anomalies_by_season = BTreeMap::new();
        let mut anomaly_points = Vec::new();
        for p in series.iter().filter(|p| p.is_anomaly()) {
            anomalies.total += 1;
            match p.anomaly {
                AnomalyKind::Positive => anomalies.positive += 1,
                AnomalyKind::Negative => anomalies.negative += 1,
                AnomalyKind::Normal => {}
            }
            *anomalies_by_season.entry(p.season).or_insert(0) += 1;
            anomaly_points.push(AnomalyPoint {
                timestamp: p.observation.timestamp,
                temperature: p.temperature(),
                kind: p.anomaly,
            });
        }

        let yearly_averages = self.yearly_averages(city);
        let fit = super::trends::fit(&yearly_averages);
        let yearly = yearly_averages
            .iter()
            .map(|y| YearlyPoint {
                year: y.year,
                average: y.average,
                fitted: fit.map(|(slope, intercept)| slope * f64::from(y.year) + intercept),
            })
            .collect();

        // series is non-empty and sorted, so the last element holds the latest year
        let last_year = series
            .last()
            .map(|p| p.observation.year())
            .ok_or_else(|| TempwatchError::data(format!("No observations for city '{city}'")))?;

        let last_year_series = series
            .iter()
            .filter(|p| p.observation.year() == last_year)
            .map(|p| SeriesPoint {
                timestamp: p.observation.timestamp,
                temperature: p.temperature(),
                rolling_mean: p.rolling_mean,
                band_lower: p.rolling_mean.zip(p.rolling_std).map(|(m, s)| m - s),
                band_upper: p.rolling_mean.zip(p.rolling_std).map(|(m, s)| m + s),
            })
            .collect();

        Ok(CitySummary {
            city: city.to_string(),
            observations: series.len(),
            mean: stats::mean(&temps).unwrap_or(f64::NAN),
            std: stats::sample_std(&temps),
            min: stats::min(&temps).unwrap_or(f64::NAN),
            max: stats::max(&temps).unwrap_or(f64::NAN),
            anomalies,
            anomalies_by_season,
            seasonal_distribution: seasonal_distribution(series),
            yearly,
            trend: self.city_trend(city).cloned(),
            last_year,
            last_year_series,
            anomaly_points,
        })
    }

    /// Trend table ordered by the given column
    #[must_use]
    pub fn sorted_trends(&self, key: TrendSortKey, ascending: bool) -> Vec<CityTrend> {
        let mut trends = self.trends().to_vec();
        trends.sort_by(|a, b| {
            let ord = key.value(a).total_cmp(&key.value(b));
            if ascending { ord } else { ord.reverse() }
        });
        trends
    }

    /// Mean slope and the extreme cities of the comparison view
    #[must_use]
    pub fn trend_overview(&self) -> Option<TrendOverview> {
        let by_slope = self.sorted_trends(TrendSortKey::Slope, false);
        let by_average = self.sorted_trends(TrendSortKey::Average, false);
        let slopes: Vec<f64> = by_slope.iter().map(|t| t.slope).collect();

        Some(TrendOverview {
            mean_slope: stats::mean(&slopes)?,
            strongest_warming: by_slope.first()?.clone(),
            strongest_cooling: by_slope.last()?.clone(),
            hottest: by_average.first()?.clone(),
            coldest: by_average.last()?.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::history::dataset::tests::daily_series;
    use crate::models::TemperatureObservation;
    use chrono::NaiveDate;

    fn yearly(city: &str, values: &[(i32, f64)]) -> Vec<TemperatureObservation> {
        values
            .iter()
            .map(|(year, t)| {
                TemperatureObservation::new(
                    city,
                    NaiveDate::from_ymd_opt(*year, 7, 1)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap(),
                    *t,
                )
            })
            .collect()
    }

    fn comparison_dataset() -> HistoricalDataset {
        let mut observations = yearly("Oslo", &[(2000, 5.0), (2001, 5.5), (2002, 6.0)]);
        observations.extend(yearly("Cairo", &[(2000, 25.0), (2001, 24.8), (2002, 24.6)]));
        observations.extend(yearly("Lima", &[(2000, 19.0), (2001, 19.0), (2002, 19.0)]));
        HistoricalDataset::from_observations(
            observations,
            &AnalysisConfig {
                window: 2,
                anomaly_sigma: 2.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_sorted_trends() {
        let dataset = comparison_dataset();

        let by_slope: Vec<String> = dataset
            .sorted_trends(TrendSortKey::Slope, false)
            .into_iter()
            .map(|t| t.city)
            .collect();
        assert_eq!(by_slope, vec!["Oslo", "Lima", "Cairo"]);

        let by_average: Vec<String> = dataset
            .sorted_trends(TrendSortKey::Average, true)
            .into_iter()
            .map(|t| t.city)
            .collect();
        assert_eq!(by_average, vec!["Oslo", "Lima", "Cairo"]);

        // ranges: Oslo 1.0, Cairo 0.4, Lima 0.0
        let by_range: Vec<String> = dataset
            .sorted_trends(TrendSortKey::Range, false)
            .into_iter()
            .map(|t| t.city)
            .collect();
        assert_eq!(by_range, vec!["Oslo", "Cairo", "Lima"]);

        let by_range_ascending: Vec<String> = dataset
            .sorted_trends(TrendSortKey::Range, true)
            .into_iter()
            .map(|t| t.city)
            .collect();
        assert_eq!(by_range_ascending, vec!["Lima", "Cairo", "Oslo"]);
    }

    #[test]
    fn test_trend_overview() {
        let overview = comparison_dataset().trend_overview().unwrap();
        assert_eq!(overview.strongest_warming.city, "Oslo");
        assert_eq!(overview.strongest_cooling.city, "Cairo");
        assert_eq!(overview.hottest.city, "Cairo");
        assert_eq!(overview.coldest.city, "Oslo");
        // (0.5 + 0.0 - 0.2) / 3
        assert!((overview.mean_slope - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("slope".parse::<TrendSortKey>().unwrap(), TrendSortKey::Slope);
        assert_eq!("Average".parse::<TrendSortKey>().unwrap(), TrendSortKey::Average);
        assert_eq!("range".parse::<TrendSortKey>().unwrap(), TrendSortKey::Range);
        assert!("colour".parse::<TrendSortKey>().is_err());
    }

    #[test]
    fn test_city_summary() {
        let start = NaiveDate::from_ymd_opt(2021, 12, 30).unwrap();
        let observations = daily_series("Riga", start, &[-5.0, -3.0, -1.0, 1.0]);
        let dataset = HistoricalDataset::from_observations(
            observations,
            &AnalysisConfig {
                window: 3,
                anomaly_sigma: 2.0,
            },
        )
        .unwrap();

        let summary = dataset.city_summary("Riga").unwrap();
        assert_eq!(summary.observations, 4);
        assert_eq!(summary.mean, -2.0);
        assert_eq!(summary.min, -5.0);
        assert_eq!(summary.max, 1.0);
        assert_eq!(summary.anomalies.total, 0);
        assert_eq!(summary.last_year, 2022);
        assert_eq!(summary.last_year_series.len(), 2);
        assert_eq!(summary.yearly.len(), 2);

        let winter = &summary.seasonal_distribution[0];
        assert_eq!(winter.season, Season::Winter);
        assert_eq!(winter.count, 4);
        assert_eq!(winter.median, -2.0);
        assert_eq!(summary.seasonal_distribution.len(), 1);

        // rolling band around index 2: mean -1, std 2
        let point = &summary.last_year_series[0];
        assert_eq!(point.rolling_mean, Some(-1.0));
        assert_eq!(point.band_lower, Some(-3.0));
        assert_eq!(point.band_upper, Some(1.0));
    }

    #[test]
    fn test_unknown_city_summary() {
        let dataset = comparison_dataset();
        assert!(matches!(
            dataset.city_summary("Atlantis"),
            Err(TempwatchError::Data { .. })
        ));
    }
}
