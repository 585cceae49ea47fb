//! Authentication handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::{authenticate, bearer_token};
use crate::services::auth::{AuthTokens, LoginInput, RegisterInput};
use crate::services::AuthService;
use crate::AppState;

/// Register endpoint handler. An Authorization header is optional here; when
/// present it must be valid and decides which roles may be granted.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(body): AppJson<RegisterInput>,
) -> AppResult<(StatusCode, Json<AuthTokens>)> {
    let granted_by = match bearer_token(&headers) {
        Some(_) => Some(authenticate(&state, &headers)?.role),
        None => None,
    };

    let auth_service = AuthService::new(state.store.clone(), &state.config);
    let tokens = auth_service.register(body, granted_by).await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.store.clone(), &state.config);
    let tokens = auth_service.login(body).await?;

    Ok(Json(tokens))
}
