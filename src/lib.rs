//! `tempwatch` - historical temperature analysis and live weather monitoring
//!
//! This library loads a CSV of past temperature observations, computes
//! rolling statistics, anomalies and long-term trends per city, and compares
//! live `OpenWeatherMap` readings against the seasonal history.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod monitor;

// Re-export core types for public API
pub use config::TempwatchConfig;
pub use error::{ApiErrorKind, TempwatchError};
pub use history::{HistoricalDataset, LoadReport, load_csv};
pub use models::{CurrentAnalysis, CurrentReading, TemperatureObservation};
pub use monitor::{AsyncWeatherClient, MonitorMode, MonitorReport, MonitorRun, SyncWeatherClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TempwatchError>;
