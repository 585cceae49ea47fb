//! Demand forecasting service

use serde::Serialize;
use serde_json::Value;
use shared::{Action, Resource};

use crate::error::{AppError, AppResult};
use crate::external::{DatasetClient, ForecastClient};
use crate::middleware::AuthUser;

/// Forecast service
#[derive(Clone)]
pub struct ForecastService {
    forecast: ForecastClient,
    dataset: DatasetClient,
}

/// Asset names that can be forecast
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableAssets {
    pub available_assets: Vec<String>,
}

impl ForecastService {
    pub fn new(forecast: ForecastClient, dataset: DatasetClient) -> Self {
        Self { forecast, dataset }
    }

    pub async fn available_assets(&self, actor: &AuthUser) -> AppResult<AvailableAssets> {
        actor.require(Resource::Forecast, Action::Read)?;
        let available_assets = self.dataset.asset_names().await?;
        Ok(AvailableAssets { available_assets })
    }

    pub async fn forecast(&self, actor: &AuthUser, product_name: &str) -> AppResult<Value> {
        actor.require(Resource::Forecast, Action::Read)?;

        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err(AppError::validation("productName", "Product name is required"));
        }

        tracing::debug!("Requesting forecast for {}", product_name);
        self.forecast.forecast(product_name).await
    }
}
