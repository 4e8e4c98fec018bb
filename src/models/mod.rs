//! Data models for tempwatch
//!
//! This module contains the core domain models organized by concern:
//! - Observation: historical temperature rows and seasons
//! - Weather: live readings from the weather API
//! - Analysis: anomaly, trend and zone classifications

pub mod analysis;
pub mod observation;
pub mod weather;

// Re-export all public types for convenient access
pub use analysis::{AnomalyKind, CityTrend, CurrentAnalysis, TemperatureZone, TrendClass};
pub use observation::{ProcessedObservation, Season, TemperatureObservation};
pub use weather::CurrentReading;
