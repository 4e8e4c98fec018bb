//! Classification types produced by historical analysis and monitoring

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Season;

/// Direction of a temperature anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    /// Above the upper bound
    Positive,
    /// Below the lower bound
    Negative,
    Normal,
}

impl AnomalyKind {
    #[must_use]
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, AnomalyKind::Normal)
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnomalyKind::Positive => "positive",
            AnomalyKind::Negative => "negative",
            AnomalyKind::Normal => "normal",
        };
        f.write_str(s)
    }
}

/// Long-term trend classification by slope in °C per year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    StrongWarming,
    ModerateWarming,
    Stable,
    ModerateCooling,
    StrongCooling,
}

impl TrendClass {
    /// Classify a slope: |slope| > 0.1 is strong, > 0.01 moderate, otherwise stable
    #[must_use]
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.1 {
            TrendClass::StrongWarming
        } else if slope > 0.01 {
            TrendClass::ModerateWarming
        } else if slope < -0.1 {
            TrendClass::StrongCooling
        } else if slope < -0.01 {
            TrendClass::ModerateCooling
        } else {
            TrendClass::Stable
        }
    }
}

impl fmt::Display for TrendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendClass::StrongWarming => "strong warming",
            TrendClass::ModerateWarming => "moderate warming",
            TrendClass::Stable => "stable",
            TrendClass::ModerateCooling => "moderate cooling",
            TrendClass::StrongCooling => "strong cooling",
        };
        f.write_str(s)
    }
}

/// Long-term trend of one city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityTrend {
    pub city: String,
    /// Least-squares slope of yearly averages, °C per year
    pub slope: f64,
    pub class: TrendClass,
    /// Mean of the yearly averages
    pub avg_temperature: f64,
    /// Spread between the warmest and coldest yearly average
    pub temperature_range: f64,
}

/// Where a current reading sits relative to the seasonal mean ± one σ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureZone {
    BelowAverage,
    WithinNormal,
    AboveAverage,
}

impl fmt::Display for TemperatureZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemperatureZone::BelowAverage => "below average",
            TemperatureZone::WithinNormal => "within normal range",
            TemperatureZone::AboveAverage => "above average",
        };
        f.write_str(s)
    }
}

/// Comparison of a current reading with the city's seasonal history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAnalysis {
    pub city: String,
    pub current_temperature: f64,
    pub season: Season,
    pub historical_mean: f64,
    pub historical_std: f64,
    /// (lower, upper) = mean ∓ 2σ, rounded to two decimals
    pub normal_range: (f64, f64),
    pub is_anomaly: bool,
    pub anomaly_kind: AnomalyKind,
    pub zone: TemperatureZone,
    pub deviation_from_mean: f64,
}
