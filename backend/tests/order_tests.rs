//! Purchase order tests
//!
//! Completion receives stock exactly once; finished orders stay finished.

mod common;

use chrono::{Duration, Utc};
use common::{actor, memory_store, seed_product, seed_supplier, stock_of};
use shared::{OrderStatus, Role};
use tims_backend::error::AppError;
use tims_backend::services::order::{CreateOrderInput, UpdateOrderInput};
use tims_backend::services::{NotificationService, OrderService};
use uuid::Uuid;

fn status(status: OrderStatus) -> UpdateOrderInput {
    UpdateOrderInput {
        status: Some(status),
        due_date: None,
    }
}

#[tokio::test]
async fn test_completion_receives_stock_once() {
    let store = memory_store();
    let service = OrderService::new(store.clone());
    let manager = actor(Role::Manager);
    let product = seed_product(&store, "Widget", 10, 5).await;
    let supplier = seed_supplier(&store, "Acme").await;

    let order = service
        .create(
            &manager,
            CreateOrderInput {
                product_id: product.id,
                supplier_id: supplier.id,
                quantity: 5,
                due_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let completed = service
        .update(&manager, order.id, status(OrderStatus::Completed))
        .await
        .unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert_eq!(stock_of(&store, product.id).await, 15);

    // Re-sending COMPLETED is accepted and changes nothing
    service
        .update(&manager, order.id, status(OrderStatus::Completed))
        .await
        .unwrap();
    assert_eq!(stock_of(&store, product.id).await, 15);

    // Reopening is refused
    let err = service
        .update(&manager, order.id, status(OrderStatus::Pending))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));
    assert_eq!(stock_of(&store, product.id).await, 15);
}

#[tokio::test]
async fn test_cancelled_order_never_receives() {
    let store = memory_store();
    let service = OrderService::new(store.clone());
    let admin = actor(Role::Admin);
    let product = seed_product(&store, "Gadget", 2, 5).await;
    let supplier = seed_supplier(&store, "Globex").await;

    let order = service
        .create(
            &admin,
            CreateOrderInput {
                product_id: product.id,
                supplier_id: supplier.id,
                quantity: 7,
                due_date: None,
            },
        )
        .await
        .unwrap();

    service
        .update(&admin, order.id, status(OrderStatus::Cancelled))
        .await
        .unwrap();
    let err = service
        .update(&admin, order.id, status(OrderStatus::Completed))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));
    assert_eq!(stock_of(&store, product.id).await, 2);
}

#[tokio::test]
async fn test_create_validates_references_and_quantity() {
    let store = memory_store();
    let service = OrderService::new(store.clone());
    let admin = actor(Role::Admin);
    let product = seed_product(&store, "Pump", 1, 1).await;
    let supplier = seed_supplier(&store, "Initech").await;

    let err = service
        .create(
            &admin,
            CreateOrderInput {
                product_id: product.id,
                supplier_id: supplier.id,
                quantity: -3,
                due_date: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = service
        .create(
            &admin,
            CreateOrderInput {
                product_id: product.id,
                supplier_id: Uuid::new_v4(),
                quantity: 3,
                due_date: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref what) if what == "Supplier"));
}

#[tokio::test]
async fn test_staff_cannot_manage_orders() {
    let store = memory_store();
    let service = OrderService::new(store.clone());
    let staff = actor(Role::Staff);
    let product = seed_product(&store, "Valve", 1, 1).await;
    let supplier = seed_supplier(&store, "Umbrella").await;

    let err = service
        .create(
            &staff,
            CreateOrderInput {
                product_id: product.id,
                supplier_id: supplier.id,
                quantity: 3,
                due_date: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
    assert!(service.list(&staff).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_overdue_orders_are_reported_until_completed() {
    let store = memory_store();
    let orders = OrderService::new(store.clone());
    let notifications = NotificationService::new(store.clone());
    let manager = actor(Role::Manager);
    let product = seed_product(&store, "Filter", 10, 2).await;
    let supplier = seed_supplier(&store, "Hooli").await;

    let overdue = orders
        .create(
            &manager,
            CreateOrderInput {
                product_id: product.id,
                supplier_id: supplier.id,
                quantity: 4,
                due_date: Some(Utc::now() - Duration::days(2)),
            },
        )
        .await
        .unwrap();
    orders
        .create(
            &manager,
            CreateOrderInput {
                product_id: product.id,
                supplier_id: supplier.id,
                quantity: 4,
                due_date: Some(Utc::now() + Duration::days(2)),
            },
        )
        .await
        .unwrap();

    let report = notifications.overdue_orders(&manager, Utc::now()).await.unwrap();
    assert_eq!(report.count, 1);
    assert_eq!(report.alerts[0].order.order_id, overdue.id);
    assert!(report.alerts[0].message.contains("Filter"));

    orders
        .update(&manager, overdue.id, status(OrderStatus::Completed))
        .await
        .unwrap();
    let report = notifications.overdue_orders(&manager, Utc::now()).await.unwrap();
    assert_eq!(report.count, 0);
}
