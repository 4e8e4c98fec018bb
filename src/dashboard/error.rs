use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::monitor::MonitorFailure;
use crate::{ApiErrorKind, TempwatchError};

/// Handler error rendered as `{ "error": .., "message": .. }`
#[derive(Debug)]
pub enum ApiError {
    /// No dataset has been uploaded yet
    NoDataset,
    /// Unknown city in the loaded dataset
    UnknownCity(String),
    /// A weather fetch failed
    Monitor(MonitorFailure),
    Tempwatch(TempwatchError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl From<TempwatchError> for ApiError {
    fn from(error: TempwatchError) -> Self {
        ApiError::Tempwatch(error)
    }
}

fn api_kind_response(kind: ApiErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ApiErrorKind::CityNotFound => (StatusCode::NOT_FOUND, "city_not_found"),
        ApiErrorKind::NoHistoricalData => (StatusCode::NOT_FOUND, "no_historical_data"),
        ApiErrorKind::InvalidApiKey => (StatusCode::BAD_GATEWAY, "invalid_api_key"),
        ApiErrorKind::Http(_) => (StatusCode::BAD_GATEWAY, "upstream_http"),
        ApiErrorKind::Network => (StatusCode::BAD_GATEWAY, "network"),
        ApiErrorKind::InvalidResponse => (StatusCode::BAD_GATEWAY, "invalid_response"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NoDataset => (
                StatusCode::CONFLICT,
                "no_dataset",
                "No historical dataset loaded. Upload a CSV first.".to_string(),
            ),
            ApiError::UnknownCity(city) => (
                StatusCode::NOT_FOUND,
                "unknown_city",
                format!("City '{city}' is not in the historical dataset"),
            ),
            ApiError::Monitor(failure) => {
                let (status, error) = failure
                    .kind
                    .map_or((StatusCode::BAD_GATEWAY, "monitor"), api_kind_response);
                (status, error, failure.message)
            }
            ApiError::Tempwatch(e) => {
                let message = e.user_message();
                let (status, error) = match &e {
                    TempwatchError::Api { kind, .. } => api_kind_response(*kind),
                    TempwatchError::Config { .. } => (StatusCode::BAD_REQUEST, "config"),
                    TempwatchError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation"),
                    TempwatchError::Data { .. } | TempwatchError::Csv { .. } => {
                        (StatusCode::BAD_REQUEST, "data")
                    }
                    TempwatchError::Io { .. } | TempwatchError::General { .. } => {
                        tracing::error!("Dashboard request failed: {}", e);
                        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                    }
                };
                (status, error, message)
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}
