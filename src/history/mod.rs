//! Historical temperature analysis
//!
//! Loading, rolling statistics, anomaly detection and long-term trends
//! over a CSV of past observations.

pub mod anomaly;
pub mod dataset;
pub mod loader;
pub mod stats;
pub mod summary;
pub mod trends;

pub use dataset::HistoricalDataset;
pub use loader::{LoadReport, SkippedRow, load_csv, parse_csv};
pub use summary::{CitySummary, TrendOverview, TrendSortKey};
pub use trends::YearlyAverage;
