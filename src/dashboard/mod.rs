//! JSON HTTP dashboard over a loaded historical dataset

mod api;
mod error;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

pub use api::{ApiLoadReport, CompareRequest};
pub use error::ApiError;

use crate::config::{AnalysisConfig, TempwatchConfig, WeatherConfig};
use crate::history::HistoricalDataset;

const DATASET_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared state of the dashboard handlers
#[derive(Clone)]
pub struct DashboardState {
    pub weather: WeatherConfig,
    pub analysis: AnalysisConfig,
    dataset: Arc<RwLock<Option<Arc<HistoricalDataset>>>>,
}

impl DashboardState {
    pub fn new(config: &TempwatchConfig, dataset: Option<HistoricalDataset>) -> Self {
        Self {
            weather: config.weather.clone(),
            analysis: config.analysis.clone(),
            dataset: Arc::new(RwLock::new(dataset.map(Arc::new))),
        }
    }

    pub async fn dataset(&self) -> Option<Arc<HistoricalDataset>> {
        self.dataset.read().await.clone()
    }

    pub async fn replace_dataset(&self, dataset: HistoricalDataset) {
        *self.dataset.write().await = Some(Arc::new(dataset));
    }
}

/// The full application: `/api` routes plus CORS and body limit
pub fn app(state: DashboardState, max_upload_mb: u32) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = usize::try_from(max_upload_mb).unwrap_or(usize::MAX) * 1024 * 1024;
    Router::new()
        .nest("/api", api::router(state, DATASET_REQUEST_TIMEOUT))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(cors)
}

pub async fn serve(config: &TempwatchConfig, dataset: Option<HistoricalDataset>) -> Result<()> {
    let state = DashboardState::new(config, dataset);
    let app = app(state, config.dashboard.max_upload_mb);

    let addr = format!("{}:{}", config.dashboard.host, config.dashboard.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {addr}"))?;
    tracing::info!("Dashboard running at http://{}", addr);
    axum::serve(listener, app)
        .await
        .with_context(|| "Dashboard server failed")?;
    Ok(())
}
