//! Notification HTTP handlers

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::NotificationService;
use crate::AppState;

/// Products below their reorder point
pub async fn get_low_stock_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(state.store.clone());
    let report = service.low_stock(&current_user).await?;
    Ok(Json(report))
}

/// Pending orders past their due date
pub async fn get_overdue_order_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(state.store.clone());
    let report = service.overdue_orders(&current_user, Utc::now()).await?;
    Ok(Json(report))
}
