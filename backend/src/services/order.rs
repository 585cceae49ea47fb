//! Purchase order service

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use shared::{
    apply_order_completion, plan_order_transition, validation, Action, Order, OrderStatus,
    OrderTransition, Resource, StockLevel,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::check;
use crate::store::{NewOrder, OrderChanges, Store};

/// Purchase order service
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
}

/// Input for placing an order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i32,
    #[serde(default, deserialize_with = "due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for changing an order's status or due date
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderInput {
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
fn due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_due_date(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid dueDate `{}`", raw)))
}

pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &AuthUser, input: CreateOrderInput) -> AppResult<Order> {
        actor.require(Resource::Order, Action::Create)?;
        check("quantity", validation::validate_quantity(input.quantity))?;

        if self.store.get_product(input.product_id).await?.is_none() {
            return Err(AppError::NotFound("Product".to_string()));
        }
        if self.store.get_supplier(input.supplier_id).await?.is_none() {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        let order = self
            .store
            .create_order(NewOrder {
                product_id: input.product_id,
                supplier_id: input.supplier_id,
                quantity: input.quantity,
                due_date: input.due_date,
            })
            .await?;

        tracing::info!(
            "Order {} placed for {} of product {} by {}",
            order.id,
            order.quantity,
            order.product_id,
            actor.user_id
        );
        Ok(order)
    }

    pub async fn get(&self, actor: &AuthUser, id: Uuid) -> AppResult<Order> {
        actor.require(Resource::Order, Action::Read)?;
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    pub async fn list(&self, actor: &AuthUser) -> AppResult<Vec<Order>> {
        actor.require(Resource::Order, Action::Read)?;
        self.store.list_orders().await
    }

    /// Change status and/or due date. The move into COMPLETED receives the
    /// ordered quantity into stock exactly once.
    pub async fn update(&self, actor: &AuthUser, id: Uuid, input: UpdateOrderInput) -> AppResult<Order> {
        actor.require(Resource::Order, Action::Update)?;

        let mut uow = self.store.begin().await?;
        let existing = uow
            .lock_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let status = input.status.unwrap_or(existing.status);
        let transition = plan_order_transition(existing.status, status)?;

        if transition == OrderTransition::Receive {
            let product = uow
                .lock_product(existing.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            let stock = apply_order_completion(StockLevel::from(&product), existing.quantity)?;
            uow.set_stock(product.id, stock).await?;
            tracing::info!(
                "Order {} received: product {} stock {} -> {}",
                id,
                product.id,
                product.stock,
                stock
            );
        }

        let order = uow
            .update_order(
                id,
                OrderChanges {
                    status,
                    due_date: input.due_date.or(existing.due_date),
                },
            )
            .await?;
        uow.commit().await?;

        if transition != OrderTransition::Unchanged {
            tracing::info!(
                "Order {} moved {} -> {} by {}",
                id,
                existing.status,
                order.status,
                actor.user_id
            );
        }
        Ok(order)
    }

    /// Delete an order. Stock already received stays received.
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> AppResult<()> {
        actor.require(Resource::Order, Action::Delete)?;

        if !self.store.delete_order(id).await? {
            return Err(AppError::NotFound("Order".to_string()));
        }

        tracing::info!("Order {} deleted by {}", id, actor.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_due_date_formats() {
        let date_only = parse_due_date("2025-09-30").unwrap();
        assert_eq!((date_only.year(), date_only.month(), date_only.day()), (2025, 9, 30));

        let full = parse_due_date("2025-09-30T12:00:00+02:00").unwrap();
        assert_eq!(full.to_rfc3339(), "2025-09-30T10:00:00+00:00");

        assert!(parse_due_date("next tuesday").is_none());
    }
}
