//! Stock movement service
//!
//! Every write here changes product stock and the movement log together
//! inside one unit of work. Rows are locked movement first, then products in
//! ascending id order.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use shared::{
    apply_new_movement, may_record, reconcile_deletion, reconcile_edit, validation, Action,
    Direction, Movement, Resource, StockLevel, Transaction,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::check;
use crate::store::{NewTransaction, Store, UnitOfWork};

/// Stock movement service
#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn Store>,
}

/// Input for recording a movement
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionInput {
    #[serde(rename = "type")]
    pub direction: Direction,
    pub quantity: i32,
    pub product_id: Uuid,
    pub supplier_id: Option<Uuid>,
}

/// Input for editing a movement; omitted fields keep their value and an
/// explicit `"supplierId": null` clears the supplier
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionInput {
    #[serde(rename = "type")]
    pub direction: Option<Direction>,
    pub quantity: Option<i32>,
    pub product_id: Option<Uuid>,
    #[serde(default, deserialize_with = "present")]
    pub supplier_id: Option<Option<Uuid>>,
}

/// Query string for listing movements
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub supplier_id: Option<Uuid>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl TransactionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record a movement and apply it to the product's stock
    pub async fn create(&self, actor: &AuthUser, input: CreateTransactionInput) -> AppResult<Transaction> {
        actor.require(Resource::Transaction, Action::Create)?;
        if !may_record(actor.role, input.direction) {
            return Err(AppError::AccessDenied(format!(
                "{} users can only record OUT transactions",
                actor.role
            )));
        }
        check("quantity", validation::validate_quantity(input.quantity))?;
        if let Some(supplier_id) = input.supplier_id {
            self.ensure_supplier(supplier_id).await?;
        }

        let mut uow = self.store.begin().await?;
        let product = uow
            .lock_product(input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let stock = apply_new_movement(StockLevel::from(&product), input.direction, input.quantity)?;
        uow.set_stock(product.id, stock).await?;
        let tx = uow
            .insert_transaction(NewTransaction {
                direction: input.direction,
                quantity: input.quantity,
                product_id: product.id,
                supplier_id: input.supplier_id,
                user_id: actor.user_id,
            })
            .await?;
        uow.commit().await?;

        tracing::info!(
            "Transaction {} recorded: {} {} of product {} ({} -> {})",
            tx.id,
            tx.direction,
            tx.quantity,
            product.id,
            product.stock,
            stock
        );
        Ok(tx)
    }

    pub async fn get(&self, actor: &AuthUser, id: Uuid) -> AppResult<Transaction> {
        actor.require(Resource::Transaction, Action::Read)?;
        self.store
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction".to_string()))
    }

    pub async fn list(&self, actor: &AuthUser, query: TransactionQuery) -> AppResult<Vec<Transaction>> {
        actor.require(Resource::Transaction, Action::Read)?;
        self.store.list_transactions(query.supplier_id).await
    }

    /// Replace a movement, reconciling stock on every product involved.
    /// Either both the movement and the stock change, or neither does.
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdateTransactionInput,
    ) -> AppResult<Transaction> {
        actor.require(Resource::Transaction, Action::Update)?;
        if let Some(quantity) = input.quantity {
            check("quantity", validation::validate_quantity(quantity))?;
        }
        if let Some(Some(supplier_id)) = input.supplier_id {
            self.ensure_supplier(supplier_id).await?;
        }

        let mut uow = self.store.begin().await?;
        let existing = uow
            .lock_transaction(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        let old = existing.movement();
        let new = Movement {
            product_id: input.product_id.unwrap_or(old.product_id),
            direction: input.direction.unwrap_or(old.direction),
            quantity: input.quantity.unwrap_or(old.quantity),
        };

        let levels = lock_levels(uow.as_mut(), &[old.product_id, new.product_id]).await?;
        let reconciled = reconcile_edit(&levels, &old, &new)?;
        for level in &reconciled {
            uow.set_stock(level.product_id, level.stock).await?;
        }

        let updated = uow
            .update_transaction(
                id,
                NewTransaction {
                    direction: new.direction,
                    quantity: new.quantity,
                    product_id: new.product_id,
                    supplier_id: input.supplier_id.unwrap_or(existing.supplier_id),
                    user_id: actor.user_id,
                },
            )
            .await?;
        uow.commit().await?;

        tracing::info!(
            "Transaction {} updated by {}: {} {} -> {} {}",
            id,
            actor.user_id,
            old.direction,
            old.quantity,
            new.direction,
            new.quantity
        );
        Ok(updated)
    }

    /// Delete a movement and undo its effect on stock
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> AppResult<()> {
        actor.require(Resource::Transaction, Action::Delete)?;

        let mut uow = self.store.begin().await?;
        let existing = uow
            .lock_transaction(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;
        let movement = existing.movement();

        let levels = lock_levels(uow.as_mut(), &[movement.product_id]).await?;
        let stock = reconcile_deletion(levels[0], &movement)?;
        uow.set_stock(movement.product_id, stock).await?;
        uow.delete_transaction(id).await?;
        uow.commit().await?;

        tracing::info!(
            "Transaction {} deleted by {}; product {} stock now {}",
            id,
            actor.user_id,
            movement.product_id,
            stock
        );
        Ok(())
    }

    async fn ensure_supplier(&self, id: Uuid) -> AppResult<()> {
        match self.store.get_supplier(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Supplier".to_string())),
        }
    }
}

/// Lock each distinct product in ascending id order and return its level
async fn lock_levels(uow: &mut dyn UnitOfWork, product_ids: &[Uuid]) -> AppResult<Vec<StockLevel>> {
    let mut ids = product_ids.to_vec();
    ids.sort();
    ids.dedup();

    let mut levels = Vec::with_capacity(ids.len());
    for id in ids {
        let product = uow
            .lock_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        levels.push(StockLevel::from(&product));
    }
    Ok(levels)
}
