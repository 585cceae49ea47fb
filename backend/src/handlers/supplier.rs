//! Supplier HTTP handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::middleware::CurrentUser;
use crate::services::supplier::{CreateSupplierInput, UpdateSupplierInput};
use crate::services::SupplierService;
use crate::AppState;

pub async fn list_suppliers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    let suppliers = service.list(&current_user).await?;
    Ok(Json(suppliers))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(supplier_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    let supplier = service.get(&current_user, supplier_id).await?;
    Ok(Json(supplier))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateSupplierInput>,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    let supplier = service.create(&current_user, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Supplier created successfully", "supplier": supplier })),
    ))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(supplier_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateSupplierInput>,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    let supplier = service.update(&current_user, supplier_id, input).await?;
    Ok(Json(json!({ "message": "Supplier updated successfully", "supplier": supplier })))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(supplier_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    service.delete(&current_user, supplier_id).await?;
    Ok(Json(json!({ "message": "Supplier deleted successfully" })))
}

/// Movements recorded against a supplier
pub async fn get_supplier_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(supplier_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    let transactions = service.history(&current_user, supplier_id).await?;
    Ok(Json(transactions))
}

/// Supplied and used totals for a supplier
pub async fn get_supplier_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(supplier_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    let status = service.status(&current_user, supplier_id).await?;
    Ok(Json(status))
}
