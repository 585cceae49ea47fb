//! Stock movement HTTP handlers

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
use crate::services::transaction::{
    CreateTransactionInput, TransactionQuery, UpdateTransactionInput,
};
use crate::services::{SupplierService, TransactionService};
use crate::AppState;

pub async fn list_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<TransactionQuery>,
) -> AppResult<impl IntoResponse> {
    let service = TransactionService::new(state.store.clone());
    let transactions = service.list(&current_user, query).await?;
    Ok(Json(transactions))
}

/// Movement history for one supplier
pub async fn get_supplier_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(supplier_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = SupplierService::new(state.store.clone());
    let transactions = service.history(&current_user, supplier_id).await?;
    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(transaction_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = TransactionService::new(state.store.clone());
    let transaction = service.get(&current_user, transaction_id).await?;
    Ok(Json(transaction))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateTransactionInput>,
) -> AppResult<impl IntoResponse> {
    let service = TransactionService::new(state.store.clone());
    let transaction = service.create(&current_user, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transaction recorded successfully",
            "transaction": transaction,
        })),
    ))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(transaction_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateTransactionInput>,
) -> AppResult<impl IntoResponse> {
    let service = TransactionService::new(state.store.clone());
    let transaction = service.update(&current_user, transaction_id, input).await?;
    Ok(Json(json!({
        "message": "Transaction updated successfully",
        "transaction": transaction,
    })))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(transaction_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = TransactionService::new(state.store.clone());
    service.delete(&current_user, transaction_id).await?;
    Ok(Json(json!({ "message": "Transaction deleted and stock reverted" })))
}
