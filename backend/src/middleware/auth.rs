//! Authentication middleware
//!
//! Bearer token authentication and the role gate used by handlers

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::{Action, Resource, Role};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::{verify_token, Claims};
use crate::AppState;

/// Authenticated user information extracted from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Check the policy table for `action` on `resource`
    pub fn can(&self, resource: Resource, action: Action) -> bool {
        shared::is_permitted(self.role, resource, action)
    }

    /// Role gate: reject with "access denied" unless the policy allows it
    pub fn require(&self, resource: Resource, action: Action) -> AppResult<()> {
        if self.can(resource, action) {
            Ok(())
        } else {
            tracing::warn!(
                "Access denied: {} may not {} {}",
                self.role,
                action.as_str(),
                resource.as_str()
            );
            Err(AppError::AccessDenied("Access denied".to_string()))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verify the bearer token in `headers` against the configured secret
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<AuthUser> {
    let token = bearer_token(headers).ok_or(AppError::MissingCredential)?;
    verify_token(&state.config.jwt.secret, token).map(AuthUser::from)
}

/// Authentication middleware that validates access tokens and attaches the
/// caller's identity to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_user = match authenticate(&state, request.headers()) {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        // Only reachable without the auth layer, which is a routing bug
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::MissingCredential)
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = AuthUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
