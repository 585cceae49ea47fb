//! Forecast HTTP handlers

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};

use crate::error::AppResult;
use crate::extract::AppPath;
use crate::middleware::CurrentUser;
use crate::services::ForecastService;
use crate::AppState;

/// Asset names available in the dataset
pub async fn list_forecast_assets(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = ForecastService::new(state.forecast.clone(), state.dataset.clone());
    let assets = service.available_assets(&current_user).await?;
    Ok(Json(assets))
}

/// Demand forecast for one product, relayed from the forecasting service
pub async fn get_forecast(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(product_name): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let service = ForecastService::new(state.forecast.clone(), state.dataset.clone());
    let forecast = service.forecast(&current_user, &product_name).await?;
    Ok(Json(forecast))
}
