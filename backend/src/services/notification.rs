//! Low-stock and overdue-order alerts

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{Action, Product, Resource};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::store::{OverdueOrder, ProductFilter, Store};

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
}

/// A product whose stock fell below its reorder point
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub stock: i32,
    pub reorder_point: i32,
    pub message: String,
}

impl From<Product> for LowStockAlert {
    fn from(product: Product) -> Self {
        let message = format!(
            "Low stock for {}. Current: {}, Reorder Point: {}",
            product.name, product.stock, product.reorder_point
        );
        Self {
            product_id: product.id,
            name: product.name,
            category: product.category,
            stock: product.stock,
            reorder_point: product.reorder_point,
            message,
        }
    }
}

/// A pending order past its due date
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueOrderAlert {
    #[serde(flatten)]
    pub order: OverdueOrder,
    pub message: String,
}

impl From<OverdueOrder> for OverdueOrderAlert {
    fn from(order: OverdueOrder) -> Self {
        let message = format!(
            "Order #{} for {} from {} is overdue! Due on {}",
            order.order_id,
            order.product_name,
            order.supplier_name,
            order.due_date.format("%a %b %d %Y")
        );
        Self { order, message }
    }
}

/// Alerts with a count
#[derive(Debug, Serialize)]
pub struct AlertReport<T> {
    pub count: usize,
    pub alerts: Vec<T>,
}

impl<T> AlertReport<T> {
    fn new(alerts: Vec<T>) -> Self {
        Self {
            count: alerts.len(),
            alerts,
        }
    }
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Products with stock strictly below their reorder point
    pub async fn low_stock(&self, actor: &AuthUser) -> AppResult<AlertReport<LowStockAlert>> {
        actor.require(Resource::Notification, Action::Read)?;

        let products = self.store.list_products(&ProductFilter::low_stock()).await?;
        if !products.is_empty() {
            tracing::debug!("{} products below reorder point", products.len());
        }
        Ok(AlertReport::new(products.into_iter().map(LowStockAlert::from).collect()))
    }

    /// Pending orders whose due date is before `now`
    pub async fn overdue_orders(
        &self,
        actor: &AuthUser,
        now: DateTime<Utc>,
    ) -> AppResult<AlertReport<OverdueOrderAlert>> {
        actor.require(Resource::Notification, Action::Read)?;

        let overdue = self.store.list_overdue_orders(now).await?;
        Ok(AlertReport::new(overdue.into_iter().map(OverdueOrderAlert::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_message() {
        let now = Utc::now();
        let alert = LowStockAlert::from(Product {
            id: Uuid::new_v4(),
            name: "Widget".to_string(),
            category: "Parts".to_string(),
            stock: 2,
            reorder_point: 5,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(alert.message, "Low stock for Widget. Current: 2, Reorder Point: 5");
    }
}
