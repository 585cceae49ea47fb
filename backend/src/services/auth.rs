//! Authentication service for user registration, login, and token management

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::check;
use crate::store::{NewUser, Store};
use shared::{Role, User};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a user account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User ID
    #[serde(alias = "id", alias = "sub")]
    pub user_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Issued access token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Sign an access token for `user_id` with `role`
pub fn issue_token(secret: &str, user_id: Uuid, role: Role, expires_in: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        role,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(expires_in)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify signature and expiry of an access token
pub fn verify_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        AppError::InvalidCredential
    })
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a user account.
    ///
    /// `granted_by` is the role of the caller when an Authorization header
    /// was present. Anyone may register a STAFF account; other roles need an
    /// ADMIN caller.
    pub async fn register(&self, input: RegisterInput, granted_by: Option<Role>) -> AppResult<AuthTokens> {
        input.validate()?;
        check("password", shared::validate_password(&input.password))?;

        let role = input.role.unwrap_or(Role::Staff);
        if role != Role::Staff {
            let permitted = granted_by.is_some_and(|caller| {
                shared::is_permitted(caller, shared::Resource::User, shared::Action::Create)
            });
            if !permitted {
                return Err(AppError::AccessDenied(format!(
                    "Only an administrator can register {} accounts",
                    role
                )));
            }
        }

        let email = input.email.trim().to_lowercase();
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!("Email {} is already registered", email)));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = self
            .store
            .create_user(NewUser {
                name: input.name.trim().to_string(),
                email,
                password_hash,
                role,
            })
            .await?;

        tracing::info!("Registered user {} with role {}", user.id, user.role);
        self.tokens_for(user)
    }

    /// Log in with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let email = input.email.trim().to_lowercase();
        let account = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidLogin)?;

        let valid = verify(&input.password, &account.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidLogin);
        }

        self.tokens_for(account.user)
    }

    fn tokens_for(&self, user: User) -> AppResult<AuthTokens> {
        let access_token = issue_token(&self.jwt_secret, user.id, user.role, self.access_token_expiry)?;
        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user,
        })
    }
}
