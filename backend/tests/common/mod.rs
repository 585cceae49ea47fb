//! Shared fixtures for the backend integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use shared::{Product, Role, Supplier};
use tower::ServiceExt;
use uuid::Uuid;

use tims_backend::config::{DatabaseConfig, ForecastConfig, JwtConfig, ServerConfig};
use tims_backend::middleware::AuthUser;
use tims_backend::services::auth::issue_token;
use tims_backend::store::{MemoryStore, NewProduct, NewSupplier, Store};
use tims_backend::{create_app, AppState, Config};

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            access_token_expiry: 3600,
        },
        forecast: ForecastConfig {
            service_url: "http://127.0.0.1:9".to_string(),
            dataset_url: "http://127.0.0.1:9/dataset.csv".to_string(),
            timeout_secs: 1,
        },
    }
}

pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

pub fn actor(role: Role) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role,
    }
}

pub async fn seed_product(store: &Arc<dyn Store>, name: &str, stock: i32, reorder_point: i32) -> Product {
    store
        .create_product(NewProduct {
            name: name.to_string(),
            category: "Hardware".to_string(),
            stock,
            reorder_point,
        })
        .await
        .unwrap()
}

pub async fn seed_supplier(store: &Arc<dyn Store>, name: &str) -> Supplier {
    store
        .create_supplier(NewSupplier {
            name: name.to_string(),
            contact: None,
            email: None,
            address: None,
        })
        .await
        .unwrap()
}

pub async fn stock_of(store: &Arc<dyn Store>, product_id: Uuid) -> i32 {
    store.get_product(product_id).await.unwrap().unwrap().stock
}

/// Router over an in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = memory_store();
        let state = AppState::new(store.clone(), test_config()).unwrap();
        Self {
            router: create_app(state),
            store,
        }
    }

    pub fn token(&self, role: Role) -> String {
        issue_token(JWT_SECRET, Uuid::new_v4(), role, 3600).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
