//! Demand forecasting service client
//!
//! The forecasting service answers `GET {base}/forecast?product=<name>`; its
//! JSON body is passed through untouched.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Forecasting service client
#[derive(Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the forecast for one product
    pub async fn forecast(&self, product: &str) -> AppResult<Value> {
        let url = format!("{}/forecast", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("product", product)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Forecast request for {} failed: {}", product, e);
                AppError::ExternalService("Forecasting failed".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Forecast service returned {}: {}", status, body);
            return Err(AppError::ExternalService("Forecasting failed".to_string()));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::error!("Failed to parse forecast response: {}", e);
            AppError::ExternalService("Forecasting failed".to_string())
        })
    }
}
