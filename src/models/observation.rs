//! Historical temperature observations

use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::AnomalyKind;

/// Meteorological season of the northern hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Display order used by seasonal charts
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    /// Season for a calendar month (1-12). Out of range months fall back to winter.
    #[must_use]
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the historical CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureObservation {
    /// City or location name
    pub city: String,
    /// Observation time (naive, as written in the file)
    pub timestamp: NaiveDateTime,
    /// Temperature in Celsius
    pub temperature: f64,
}

impl TemperatureObservation {
    #[must_use]
    pub fn new(city: impl Into<String>, timestamp: NaiveDateTime, temperature: f64) -> Self {
        Self {
            city: city.into(),
            timestamp,
            temperature,
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    #[must_use]
    pub fn season(&self) -> Season {
        Season::from_month(self.month())
    }
}

/// Observation enriched with rolling statistics and its anomaly classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedObservation {
    #[serde(flatten)]
    pub observation: TemperatureObservation,
    pub season: Season,
    /// Centred rolling mean, absent where the window is incomplete
    pub rolling_mean: Option<f64>,
    /// Centred rolling sample standard deviation
    pub rolling_std: Option<f64>,
    pub upper_bound: Option<f64>,
    pub lower_bound: Option<f64>,
    pub anomaly: AnomalyKind,
}

impl ProcessedObservation {
    #[must_use]
    pub fn is_anomaly(&self) -> bool {
        self.anomaly.is_anomaly()
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.observation.temperature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case(12, Season::Winter)]
    #[case(1, Season::Winter)]
    #[case(2, Season::Winter)]
    #[case(3, Season::Spring)]
    #[case(5, Season::Spring)]
    #[case(6, Season::Summer)]
    #[case(8, Season::Summer)]
    #[case(9, Season::Autumn)]
    #[case(11, Season::Autumn)]
    fn test_season_from_month(#[case] month: u32, #[case] expected: Season) {
        assert_eq!(Season::from_month(month), expected);
    }

    #[test]
    fn test_observation_derived_fields() {
        let timestamp = NaiveDate::from_ymd_opt(2019, 7, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let obs = TemperatureObservation::new("Moscow", timestamp, 24.5);
        assert_eq!(obs.year(), 2019);
        assert_eq!(obs.month(), 7);
        assert_eq!(obs.season(), Season::Summer);
    }

    #[test]
    fn test_season_serializes_lowercase() {
        let json = serde_json::to_string(&Season::Autumn).unwrap();
        assert_eq!(json, "\"autumn\"");
        assert_eq!(Season::Winter.to_string(), "winter");
    }
}
