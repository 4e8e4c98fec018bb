//! CSV loading for historical temperature observations
//!
//! Expects a header row naming `city`, `timestamp` and `temperature`
//! (`location` and `date` are accepted as aliases). Rows that cannot be
//! parsed are skipped and listed in the returned [`LoadReport`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::models::TemperatureObservation;
use crate::{Result, TempwatchError};

const CITY_COLUMNS: &[&str] = &["city", "location"];
const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "date"];
const TEMPERATURE_COLUMNS: &[&str] = &["temperature"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A row that was not loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the source file
    pub line: u64,
    pub reason: String,
}

/// Outcome of a CSV load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub rows_loaded: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    #[must_use]
    pub fn rows_skipped(&self) -> usize {
        self.skipped.len()
    }
}

struct ColumnIndex {
    city: usize,
    timestamp: usize,
    temperature: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .ok_or_else(|| {
                    TempwatchError::data(format!(
                        "Missing required column '{}'. Expected columns: city, timestamp, temperature",
                        names[0]
                    ))
                })
        };

        Ok(Self {
            city: find(CITY_COLUMNS)?,
            timestamp: find(TIMESTAMP_COLUMNS)?,
            temperature: find(TEMPERATURE_COLUMNS)?,
        })
    }

    fn parse(&self, record: &StringRecord) -> std::result::Result<TemperatureObservation, String> {
        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .map(str::trim)
                .ok_or_else(|| format!("missing {name} field"))
        };

        let city = field(self.city, "city")?;
        if city.is_empty() {
            return Err("empty city".to_string());
        }

        let raw_timestamp = field(self.timestamp, "timestamp")?;
        let timestamp = parse_timestamp(raw_timestamp)
            .ok_or_else(|| format!("invalid timestamp '{raw_timestamp}'"))?;

        let raw_temperature = field(self.temperature, "temperature")?;
        let temperature = raw_temperature
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| format!("invalid temperature '{raw_temperature}'"))?;

        Ok(TemperatureObservation::new(city, timestamp, temperature))
    }
}

/// Parse the timestamp formats found in exported weather data
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Load observations from a CSV file
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_csv(path: impl AsRef<Path>) -> Result<(Vec<TemperatureObservation>, LoadReport)> {
    let path = path.as_ref();
    info!("Loading historical data from {}", path.display());
    let file = File::open(path)?;
    parse_csv(file)
}

/// Parse observations from any CSV source
pub fn parse_csv<R: Read>(reader: R) -> Result<(Vec<TemperatureObservation>, LoadReport)> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(csv_reader.headers()?)?;

    let mut observations = Vec::new();
    let mut report = LoadReport::default();

    for record in csv_reader.records() {
        let (line, parsed) = match record {
            Ok(record) => (
                record.position().map_or(0, csv::Position::line),
                columns.parse(&record),
            ),
            Err(e) => (
                e.position().map_or(0, csv::Position::line),
                Err(e.to_string()),
            ),
        };

        match parsed {
            Ok(observation) => observations.push(observation),
            Err(reason) => {
                warn!("Skipping CSV line {}: {}", line, reason);
                report.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    report.rows_loaded = observations.len();

    if observations.is_empty() {
        return Err(TempwatchError::data(format!(
            "No valid temperature rows found ({} rows skipped)",
            report.rows_skipped()
        )));
    }

    info!(
        "Loaded {} observations ({} rows skipped)",
        report.rows_loaded,
        report.rows_skipped()
    );

    Ok((observations, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_valid_rows() {
        let data = "city,timestamp,temperature,season\n\
                    Moscow,2010-01-01,-10.5,winter\n\
                    Berlin,2010-01-02,3.25,winter\n";
        let (observations, report) = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(report.rows_loaded, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(observations[0].city, "Moscow");
        assert_eq!(observations[0].temperature, -10.5);
        assert_eq!(observations[1].temperature, 3.25);
    }

    #[test]
    fn test_temperatures_round_trip_as_numbers() {
        let temps = ["-40", "0", "0.1", "12.345", "36.6", "1e1"];
        let mut data = String::from("city,timestamp,temperature\n");
        for t in &temps {
            data.push_str(&format!("Tokyo,2015-06-01,{t}\n"));
        }
        let (observations, _) = parse_csv(data.as_bytes()).unwrap();
        for (obs, raw) in observations.iter().zip(temps) {
            assert_eq!(obs.temperature, raw.parse::<f64>().unwrap());
        }
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_reported() {
        let data = "city,timestamp,temperature\n\
                    Moscow,2010-01-01,-10.5\n\
                    Moscow,not-a-date,1.0\n\
                    Moscow,2010-01-03,warm\n\
                    ,2010-01-04,2.0\n\
                    Moscow,2010-01-05,NaN\n\
                    Moscow,2010-01-06\n\
                    Moscow,2010-01-07,-8.0\n";
        let (observations, report) = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(report.rows_skipped(), 5);
        assert_eq!(report.skipped[0].line, 3);
        assert!(report.skipped[0].reason.contains("invalid timestamp"));
        assert!(report.skipped[1].reason.contains("invalid temperature"));
        assert_eq!(report.skipped[2].reason, "empty city");
        assert!(report.skipped[4].reason.contains("missing"));
    }

    #[test]
    fn test_column_aliases_and_order() {
        let data = "temperature,date,location\n21.0,2020-07-01,Rome\n";
        let (observations, _) = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(observations[0].city, "Rome");
        assert_eq!(observations[0].temperature, 21.0);
    }

    #[test]
    fn test_missing_column_is_error() {
        let data = "city,temperature\nRome,21.0\n";
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TempwatchError::Data { .. }));
        assert!(err.to_string().contains("timestamp"));
    }

    #[test]
    fn test_no_valid_rows_is_error() {
        let data = "city,timestamp,temperature\nRome,bad,bad\n";
        assert!(matches!(
            parse_csv(data.as_bytes()),
            Err(TempwatchError::Data { .. })
        ));
    }

    #[rstest]
    #[case("2020-03-04")]
    #[case("2020-03-04 00:00:00")]
    #[case("2020-03-04T00:00:00")]
    #[case("2020-03-04T00:00:00.000")]
    #[case("2020-03-04 00:00")]
    #[case("2020-03-04T00:00:00+00:00")]
    fn test_timestamp_formats(#[case] raw: &str) {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 4)
            .unwrap()
            .and_time(NaiveTime::MIN);
        assert_eq!(parse_timestamp(raw), Some(expected));
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city,timestamp,temperature").unwrap();
        writeln!(file, "Cairo,2011-08-01,35.2").unwrap();

        let (observations, report) = load_csv(file.path()).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(report.rows_loaded, 1);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let result = load_csv("definitely_missing_file.csv");
        assert!(matches!(result, Err(TempwatchError::Io { .. })));
    }
}
