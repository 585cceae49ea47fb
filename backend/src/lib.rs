//! Inventory tracking backend
//!
//! REST API for products, suppliers, stock movements, purchase orders and
//! stock alerts.

use std::{sync::Arc, time::Duration};

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod extract;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use error::AppResult;
use external::{DatasetClient, ForecastClient};
use store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub forecast: ForecastClient,
    pub dataset: DatasetClient,
}

impl AppState {
    /// Build the state and the outbound HTTP clients from configuration
    pub fn new(store: Arc<dyn Store>, config: Config) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.forecast.timeout_secs);
        let forecast = ForecastClient::new(config.forecast.service_url.clone(), timeout)?;
        let dataset = DatasetClient::new(config.forecast.dataset_url.clone(), timeout)?;

        Ok(Self {
            store,
            config: Arc::new(config),
            forecast,
            dataset,
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Inventory Tracking API v1"
}

/// Liveness endpoint
async fn health_check() -> &'static str {
    "OK"
}
