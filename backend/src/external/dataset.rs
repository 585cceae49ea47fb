//! Asset dataset reader
//!
//! The historical inventory dataset is published as a CSV export. Only the
//! `Asset Name` column is used here.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, AppResult};

const ASSET_COLUMN: &str = "Asset Name";

/// Dataset client
#[derive(Clone)]
pub struct DatasetClient {
    client: Client,
    url: String,
}

impl DatasetClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Download the dataset and return the distinct asset names
    pub async fn asset_names(&self) -> AppResult<Vec<String>> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            tracing::error!("Dataset download failed: {}", e);
            dataset_unavailable()
        })?;

        if !response.status().is_success() {
            tracing::error!("Dataset download returned {}", response.status());
            return Err(dataset_unavailable());
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Dataset body could not be read: {}", e);
            dataset_unavailable()
        })?;

        unique_asset_names(&body)
    }
}

fn dataset_unavailable() -> AppError {
    AppError::ExternalService("Could not load dataset".to_string())
}

/// Distinct trimmed values of the `Asset Name` column, in first-seen order
pub fn unique_asset_names(csv_data: &[u8]) -> AppResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data);

    let headers = reader.headers().map_err(|e| {
        tracing::error!("Dataset header row is unreadable: {}", e);
        dataset_unavailable()
    })?;
    let column = headers
        .iter()
        .position(|h| h == ASSET_COLUMN)
        .ok_or_else(|| {
            tracing::error!("Dataset has no `{}` column", ASSET_COLUMN);
            dataset_unavailable()
        })?;

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            tracing::error!("Dataset row is malformed: {}", e);
            dataset_unavailable()
        })?;
        let Some(name) = record.get(column) else {
            continue;
        };
        if !name.is_empty() && seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    Ok(names)
}
