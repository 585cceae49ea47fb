//! Supplier management service

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{summarize, validation, Action, MovementTotals, Resource, Supplier, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::required;
use crate::store::{NewSupplier, Store, SupplierChanges};

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    store: Arc<dyn Store>,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    pub name: String,
    #[validate(length(max = 255))]
    pub contact: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 1000))]
    pub address: Option<String>,
}

/// Input for updating a supplier; omitted fields keep their value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub contact: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 1000))]
    pub address: Option<String>,
}

/// Supply totals for one supplier
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierStatus {
    pub supplier: Supplier,
    pub totals: MovementTotals,
    pub transactions: Vec<Transaction>,
}

impl SupplierService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &AuthUser, input: CreateSupplierInput) -> AppResult<Supplier> {
        actor.require(Resource::Supplier, Action::Create)?;
        input.validate()?;

        let supplier = self
            .store
            .create_supplier(NewSupplier {
                name: required("name", &input.name)?,
                contact: validation::normalize_optional(input.contact),
                email: validation::normalize_optional(input.email),
                address: validation::normalize_optional(input.address),
            })
            .await?;

        tracing::info!("Supplier {} created by {}", supplier.id, actor.user_id);
        Ok(supplier)
    }

    pub async fn get(&self, actor: &AuthUser, id: Uuid) -> AppResult<Supplier> {
        actor.require(Resource::Supplier, Action::Read)?;
        self.find(id).await
    }

    pub async fn list(&self, actor: &AuthUser) -> AppResult<Vec<Supplier>> {
        actor.require(Resource::Supplier, Action::Read)?;
        self.store.list_suppliers().await
    }

    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        actor.require(Resource::Supplier, Action::Update)?;
        input.validate()?;

        let name = input
            .name
            .as_deref()
            .map(|name| required("name", name))
            .transpose()?;

        let supplier = self
            .store
            .update_supplier(
                id,
                SupplierChanges {
                    name,
                    contact: validation::normalize_optional(input.contact),
                    email: validation::normalize_optional(input.email),
                    address: validation::normalize_optional(input.address),
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        tracing::info!("Supplier {} updated by {}", id, actor.user_id);
        Ok(supplier)
    }

    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> AppResult<()> {
        actor.require(Resource::Supplier, Action::Delete)?;

        if !self.store.delete_supplier(id).await? {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        tracing::info!("Supplier {} deleted by {}", id, actor.user_id);
        Ok(())
    }

    /// Movements recorded against a supplier, newest first
    pub async fn history(&self, actor: &AuthUser, id: Uuid) -> AppResult<Vec<Transaction>> {
        actor.require(Resource::Transaction, Action::Read)?;
        self.find(id).await?;
        self.store.list_transactions(Some(id)).await
    }

    /// Supplied and used totals over the supplier's movements
    pub async fn status(&self, actor: &AuthUser, id: Uuid) -> AppResult<SupplierStatus> {
        actor.require(Resource::Supplier, Action::Read)?;
        let supplier = self.find(id).await?;
        let transactions = self.store.list_transactions(Some(id)).await?;
        let totals = summarize(&transactions);

        Ok(SupplierStatus {
            supplier,
            totals,
            transactions,
        })
    }

    async fn find(&self, id: Uuid) -> AppResult<Supplier> {
        self.store
            .get_supplier(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }
}
