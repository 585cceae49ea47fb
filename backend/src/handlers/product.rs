//! Product HTTP handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::CurrentUser;
use crate::services::product::{CreateProductInput, ProductQuery, UpdateProductInput};
use crate::services::ProductService;
use crate::AppState;

/// List products, optionally filtered by category and stock status
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<ProductQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ProductService::new(state.store.clone());
    let products = service.list(&current_user, query).await?;
    Ok(Json(products))
}

/// Search products by name, category and stock status
pub async fn search_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<ProductQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ProductService::new(state.store.clone());
    let result = service.search(&current_user, query).await?;
    Ok(Json(result))
}

pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(product_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = ProductService::new(state.store.clone());
    let product = service.get(&current_user, product_id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateProductInput>,
) -> AppResult<impl IntoResponse> {
    let service = ProductService::new(state.store.clone());
    let product = service.create(&current_user, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Product created successfully", "product": product })),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(product_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateProductInput>,
) -> AppResult<impl IntoResponse> {
    let service = ProductService::new(state.store.clone());
    let product = service.update(&current_user, product_id, input).await?;
    Ok(Json(json!({ "message": "Product updated successfully", "product": product })))
}

pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(product_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = ProductService::new(state.store.clone());
    service.delete(&current_user, product_id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
