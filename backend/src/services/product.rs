//! Product catalogue service

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{validation, Action, Product, Resource, StockStatus};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::{check, required};
use crate::store::{NewProduct, ProductChanges, ProductFilter, Store};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn Store>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub reorder_point: i32,
}

/// Input for updating a product. Stock is not editable here; it only moves
/// through transactions and completed orders.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub reorder_point: Option<i32>,
}

/// Query string for listing and searching products
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub stock_status: Option<StockStatus>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        ProductFilter {
            name: validation::normalize_optional(query.name),
            category: validation::normalize_optional(query.category),
            stock_status: query.stock_status,
        }
    }
}

/// Search result with a match count
#[derive(Debug, Serialize)]
pub struct ProductSearch {
    pub count: usize,
    pub products: Vec<Product>,
}

impl ProductService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &AuthUser, input: CreateProductInput) -> AppResult<Product> {
        actor.require(Resource::Product, Action::Create)?;

        let name = required("name", &input.name)?;
        let category = required("category", &input.category)?;
        check("stock", validation::validate_stock(input.stock))?;
        check("reorderPoint", validation::validate_reorder_point(input.reorder_point))?;

        let product = self
            .store
            .create_product(NewProduct {
                name,
                category,
                stock: input.stock,
                reorder_point: input.reorder_point,
            })
            .await?;

        tracing::info!(
            "Product {} created with stock {} by {}",
            product.id,
            product.stock,
            actor.user_id
        );
        Ok(product)
    }

    pub async fn get(&self, actor: &AuthUser, id: Uuid) -> AppResult<Product> {
        actor.require(Resource::Product, Action::Read)?;
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn list(&self, actor: &AuthUser, query: ProductQuery) -> AppResult<Vec<Product>> {
        actor.require(Resource::Product, Action::Read)?;
        self.store.list_products(&query.into()).await
    }

    pub async fn search(&self, actor: &AuthUser, query: ProductQuery) -> AppResult<ProductSearch> {
        let products = self.list(actor, query).await?;
        Ok(ProductSearch {
            count: products.len(),
            products,
        })
    }

    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        actor.require(Resource::Product, Action::Update)?;

        let name = input
            .name
            .as_deref()
            .map(|name| required("name", name))
            .transpose()?;
        let category = input
            .category
            .as_deref()
            .map(|category| required("category", category))
            .transpose()?;
        if let Some(reorder_point) = input.reorder_point {
            check("reorderPoint", validation::validate_reorder_point(reorder_point))?;
        }

        let product = self
            .store
            .update_product(
                id,
                ProductChanges {
                    name,
                    category,
                    reorder_point: input.reorder_point,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        tracing::info!("Product {} updated by {}", id, actor.user_id);
        Ok(product)
    }

    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> AppResult<()> {
        actor.require(Resource::Product, Action::Delete)?;

        if !self.store.delete_product(id).await? {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!("Product {} deleted by {}", id, actor.user_id);
        Ok(())
    }
}
