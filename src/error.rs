//! Error types and handling for `tempwatch`

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failure classes for the current-weather path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum ApiErrorKind {
    /// The weather API rejected the key (HTTP 401)
    InvalidApiKey,
    /// The weather API does not know the city (HTTP 404)
    CityNotFound,
    /// Any other non-success HTTP status
    Http(u16),
    /// Transport level failure (DNS, connect, timeout)
    Network,
    /// Response body did not match the expected shape
    InvalidResponse,
    /// No historical observations to compare a reading against
    NoHistoricalData,
}

impl ApiErrorKind {
    /// Map an HTTP status code to an error kind
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::InvalidApiKey,
            404 => Self::CityNotFound,
            other => Self::Http(other),
        }
    }

    /// HTTP status code reported by the API, if there was one
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::InvalidApiKey => Some(401),
            Self::CityNotFound => Some(404),
            Self::Http(status) => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidApiKey => write!(f, "invalid API key"),
            Self::CityNotFound => write!(f, "city not found"),
            Self::Http(status) => write!(f, "HTTP {status}"),
            Self::Network => write!(f, "network error"),
            Self::InvalidResponse => write!(f, "invalid response"),
            Self::NoHistoricalData => write!(f, "no historical data"),
        }
    }
}

/// Main error type for the `tempwatch` application
#[derive(Error, Debug)]
pub enum TempwatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather API and monitoring errors
    #[error("API error ({kind}): {message}")]
    Api { kind: ApiErrorKind, message: String },

    /// Historical dataset errors (missing columns, empty file, unknown city)
    #[error("Data error: {message}")]
    Data { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// CSV decoding errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TempwatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(kind: ApiErrorKind, message: S) -> Self {
        Self::Api {
            kind,
            message: message.into(),
        }
    }

    /// Create a new data error
    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// API error kind, when this is an API error
    #[must_use]
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TempwatchError::Config { message } => format!("Configuration error: {message}"),
            TempwatchError::Api { kind, message } => match kind {
                ApiErrorKind::InvalidApiKey => {
                    "Invalid API key. Please check your OpenWeatherMap API key.".to_string()
                }
                ApiErrorKind::CityNotFound => format!("City not found: {message}"),
                ApiErrorKind::Network => {
                    "Unable to reach the weather service. Please check your internet connection."
                        .to_string()
                }
                ApiErrorKind::NoHistoricalData => {
                    format!("No historical data to compare against: {message}")
                }
                ApiErrorKind::Http(status) => {
                    format!("Weather service returned HTTP {status}")
                }
                ApiErrorKind::InvalidResponse => {
                    "Weather service returned an unexpected response.".to_string()
                }
            },
            TempwatchError::Data { message } => message.clone(),
            TempwatchError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TempwatchError::Csv { .. } => {
                "The CSV file could not be read. Expected columns: city, timestamp, temperature."
                    .to_string()
            }
            TempwatchError::Io { .. } => {
                "File operation failed. Please check the path and file permissions.".to_string()
            }
            TempwatchError::General { message } => message.clone(),
        }
    }
}
