//! Configuration management for `tempwatch`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TempwatchError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `tempwatch`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TempwatchConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Historical analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Dashboard server settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Current weather endpoint
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Country code appended to every city query (e.g. "RU")
    pub country_code: Option<String>,
}

/// Rolling statistics and anomaly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Rolling window length in observations
    #[serde(default = "default_window")]
    pub window: usize,
    /// Anomaly threshold in standard deviations
    #[serde(default = "default_anomaly_sigma")]
    pub anomaly_sigma: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Dashboard HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_dashboard_host")]
    pub host: String,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    /// Maximum accepted CSV upload in MB
    #[serde(default = "default_upload_limit")]
    pub max_upload_mb: u32,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_weather_timeout() -> u32 {
    10
}

fn default_window() -> usize {
    30
}

fn default_anomaly_sigma() -> f64 {
    2.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_dashboard_host() -> String {
    "127.0.0.1".to_string()
}

fn default_dashboard_port() -> u16 {
    8501
}

fn default_upload_limit() -> u32 {
    50
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            country_code: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            anomaly_sigma: default_anomaly_sigma(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_dashboard_host(),
            port: default_dashboard_port(),
            max_upload_mb: default_upload_limit(),
        }
    }
}

impl WeatherConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    /// The configured API key, or a configuration error naming how to set it
    pub fn require_api_key(&self) -> std::result::Result<&str, TempwatchError> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            TempwatchError::config(
                "Weather API key is not set. Use --api-key or TEMPWATCH_WEATHER__API_KEY.",
            )
        })
    }
}

impl TempwatchConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("tempwatch.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TEMPWATCH_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("TEMPWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TempwatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tempwatch").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.country_code.as_deref() == Some("") {
            self.weather.country_code = None;
        }
        if self.analysis.window == 0 {
            self.analysis.window = default_window();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.dashboard.host.is_empty() {
            self.dashboard.host = default_dashboard_host();
        }
        if self.dashboard.max_upload_mb == 0 {
            self.dashboard.max_upload_mb = default_upload_limit();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the API key, if one is configured
    pub fn validate_api_key(&self) -> Result<()> {
        // The key stays optional: historical analysis works without it
        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(TempwatchError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(TempwatchError::config(
                    "Weather API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }

            if api_key.len() > 100 {
                return Err(TempwatchError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                TempwatchError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.analysis.window < 2 {
            return Err(TempwatchError::config("Rolling window must be at least 2").into());
        }

        if self.analysis.window > 3650 {
            return Err(
                TempwatchError::config("Rolling window cannot exceed 3650 observations").into(),
            );
        }

        if !(self.analysis.anomaly_sigma > 0.0 && self.analysis.anomaly_sigma <= 10.0) {
            return Err(TempwatchError::config(
                "Anomaly sigma must be greater than 0 and at most 10",
            )
            .into());
        }

        if self.dashboard.max_upload_mb > 1024 {
            return Err(
                TempwatchError::config("Dashboard upload limit cannot exceed 1024 MB").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TempwatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TempwatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(TempwatchError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TempwatchConfig::default();
        assert_eq!(
            config.weather.base_url,
            "https://api.openweathermap.org/data/2.5/weather"
        );
        assert_eq!(config.weather.timeout_seconds, 10);
        assert_eq!(config.analysis.window, 30);
        assert_eq!(config.analysis.anomaly_sigma, 2.0);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.dashboard.port, 8501);
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let config = TempwatchConfig::default();
        let err = config.weather.require_api_key().unwrap_err();
        assert!(matches!(err, TempwatchError::Config { .. }));
    }

    #[test]
    fn test_short_api_key_rejected() {
        let mut config = TempwatchConfig::default();
        config.weather.api_key = Some("abc".to_string());
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = TempwatchConfig::default();
        config.logging.level = "loud".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_window_too_small() {
        let mut config = TempwatchConfig::default();
        config.analysis.window = 1;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("at least 2"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "0123456789abcdef"
country_code = "RU"

[analysis]
window = 7
"#
        )
        .unwrap();

        let config = TempwatchConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("0123456789abcdef"));
        assert_eq!(config.weather.country_code.as_deref(), Some("RU"));
        assert_eq!(config.analysis.window, 7);
        assert_eq!(config.analysis.anomaly_sigma, 2.0);
        assert_eq!(config.dashboard.port, 8501);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = TempwatchConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("tempwatch"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
