//! Live weather reading model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for one city as reported by the weather API
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentReading {
    /// City name as it was queried
    pub city: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Human-readable description of weather conditions
    pub description: String,
    /// HTTP status of the response that produced this reading
    pub status: u16,
    /// When the reading was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CurrentReading {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }
}
