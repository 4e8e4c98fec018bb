use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use super::{ApiError, DashboardState};
use crate::history::{
    CitySummary, HistoricalDataset, SkippedRow, TrendOverview, TrendSortKey, parse_csv,
};
use crate::models::CityTrend;
use crate::monitor::{self, MonitorMode, MonitorReport, MonitorRun};

#[derive(Serialize)]
pub struct ApiLoadReport {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub skipped: Vec<SkippedRow>,
    pub cities: Vec<String>,
}

#[derive(Deserialize)]
pub struct TrendQuery {
    pub sort: Option<String>,
    #[serde(default)]
    pub ascending: bool,
}

#[derive(Deserialize)]
pub struct CurrentQuery {
    pub mode: Option<String>,
    pub country: Option<String>,
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub cities: Vec<String>,
    #[serde(default)]
    pub mode: MonitorMode,
}

/// Dataset routes run under `request_timeout`; weather routes are bounded
/// only by the per-request client timeout.
pub fn router(state: DashboardState, request_timeout: Duration) -> Router {
    let history = Router::new()
        .route("/dataset", post(upload_dataset))
        .route("/cities", get(get_cities))
        .route("/cities/{city}", get(get_city_summary))
        .route("/trends", get(get_trends))
        .route("/trends/overview", get(get_trend_overview))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    let monitoring = Router::new()
        .route("/current/{city}", get(get_current))
        .route("/compare", post(compare_cities));

    history.merge(monitoring).with_state(state)
}

async fn loaded(state: &DashboardState) -> Result<Arc<HistoricalDataset>, ApiError> {
    state.dataset().await.ok_or(ApiError::NoDataset)
}

async fn upload_dataset(
    State(state): State<DashboardState>,
    body: Bytes,
) -> Result<Json<ApiLoadReport>, ApiError> {
    let (observations, report) = parse_csv(&body[..])?;
    let dataset = HistoricalDataset::from_observations(observations, &state.analysis)?;

    let cities: Vec<String> = dataset.cities().into_iter().map(String::from).collect();
    info!(
        "Loaded dataset: {} rows, {} skipped, {} cities",
        report.rows_loaded,
        report.rows_skipped(),
        cities.len()
    );
    state.replace_dataset(dataset).await;

    Ok(Json(ApiLoadReport {
        rows_loaded: report.rows_loaded,
        rows_skipped: report.rows_skipped(),
        skipped: report.skipped,
        cities,
    }))
}

async fn get_cities(State(state): State<DashboardState>) -> Result<Json<Vec<String>>, ApiError> {
    let dataset = loaded(&state).await?;
    Ok(Json(dataset.cities().into_iter().map(String::from).collect()))
}

async fn get_city_summary(
    State(state): State<DashboardState>,
    Path(city): Path<String>,
) -> Result<Json<CitySummary>, ApiError> {
    let dataset = loaded(&state).await?;
    if !dataset.contains_city(&city) {
        return Err(ApiError::UnknownCity(city));
    }
    Ok(Json(dataset.city_summary(&city)?))
}

async fn get_trends(
    State(state): State<DashboardState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<CityTrend>>, ApiError> {
    let key = match query.sort.as_deref() {
        Some(sort) => sort.parse::<TrendSortKey>()?,
        None => TrendSortKey::default(),
    };
    let dataset = loaded(&state).await?;
    Ok(Json(dataset.sorted_trends(key, query.ascending)))
}

async fn get_trend_overview(
    State(state): State<DashboardState>,
) -> Result<Json<TrendOverview>, ApiError> {
    let dataset = loaded(&state).await?;
    dataset.trend_overview().map(Json).ok_or(ApiError::NoDataset)
}

async fn get_current(
    State(state): State<DashboardState>,
    Path(city): Path<String>,
    Query(query): Query<CurrentQuery>,
) -> Result<Json<MonitorReport>, ApiError> {
    let mode = match query.mode.as_deref() {
        Some(mode) => mode.parse::<MonitorMode>()?,
        None => MonitorMode::default(),
    };

    let mut weather = state.weather.clone();
    if let Some(country) = query.country.filter(|c| !c.trim().is_empty()) {
        weather.country_code = Some(country);
    }

    let run = monitor::monitor(
        mode,
        &weather,
        vec![city],
        state.dataset().await,
        monitor::current_month(),
    )
    .await?;

    let report = run
        .reports
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Tempwatch(crate::TempwatchError::general("Empty monitor run")))?;

    match report.error {
        Some(failure) => Err(ApiError::Monitor(failure)),
        None => Ok(Json(report)),
    }
}

async fn compare_cities(
    State(state): State<DashboardState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<MonitorRun>, ApiError> {
    let run = monitor::monitor(
        request.mode,
        &state.weather,
        request.cities,
        state.dataset().await,
        monitor::current_month(),
    )
    .await?;
    Ok(Json(run))
}
