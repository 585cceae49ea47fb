//! Purchase order HTTP handlers

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
use crate::services::order::{CreateOrderInput, UpdateOrderInput};
use crate::services::OrderService;
use crate::AppState;

pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.store.clone());
    let orders = service.list(&current_user).await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(order_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.store.clone());
    let order = service.get(&current_user, order_id).await?;
    Ok(Json(order))
}

pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<CreateOrderInput>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.store.clone());
    let order = service.create(&current_user, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Order created successfully", "order": order })),
    ))
}

/// Change an order's status or due date
pub async fn update_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(order_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateOrderInput>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.store.clone());
    let order = service.update(&current_user, order_id, input).await?;
    Ok(Json(json!({ "message": "Order updated successfully", "order": order })))
}

pub async fn delete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppPath(order_id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = OrderService::new(state.store.clone());
    service.delete(&current_user, order_id).await?;
    Ok(Json(json!({ "message": "Order deleted successfully" })))
}
