//! Product models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Units on hand; only the ledger changes this after creation
    pub stock: i32,
    pub reorder_point: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Stock has fallen strictly below the reorder point
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.reorder_point
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    pub fn matches(&self, status: StockStatus) -> bool {
        match status {
            StockStatus::Low => self.is_low_stock(),
            StockStatus::Out => self.is_out_of_stock(),
        }
    }
}

/// Stock status filter for product listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// stock < reorder point
    Low,
    /// stock == 0
    Out,
}
