//! Stock movement tests
//!
//! Drives the transaction service against the in-memory store and checks
//! that stock always matches the recorded movements.

mod common;

use common::{actor, memory_store, seed_product, seed_supplier, stock_of};
use shared::{Direction, Role};
use tims_backend::error::AppError;
use tims_backend::services::transaction::{
    CreateTransactionInput, TransactionQuery, UpdateTransactionInput,
};
use tims_backend::services::TransactionService;
use uuid::Uuid;

fn movement(direction: Direction, quantity: i32, product_id: Uuid) -> CreateTransactionInput {
    CreateTransactionInput {
        direction,
        quantity,
        product_id,
        supplier_id: None,
    }
}

// ============================================================================
// Scenario
// ============================================================================

#[tokio::test]
async fn test_stock_follows_movements_end_to_end() {
    let store = memory_store();
    let service = TransactionService::new(store.clone());
    let staff = actor(Role::Staff);
    let admin = actor(Role::Admin);
    let product = seed_product(&store, "Widget", 10, 5).await;

    // STAFF ships 4 out
    let shipped = service
        .create(&staff, movement(Direction::Out, 4, product.id))
        .await
        .unwrap();
    assert_eq!(stock_of(&store, product.id).await, 6);

    // Not enough left for 10
    let err = service
        .create(&staff, movement(Direction::Out, 10, product.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 6 }));
    assert_eq!(stock_of(&store, product.id).await, 6);

    // STAFF may not receive stock
    let err = service
        .create(&staff, movement(Direction::In, 20, product.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
    assert_eq!(stock_of(&store, product.id).await, 6);

    // ADMIN corrects the shipment from 4 to 2
    let edited = service
        .update(
            &admin,
            shipped.id,
            UpdateTransactionInput {
                quantity: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.quantity, 2);
    assert_eq!(edited.direction, Direction::Out);
    assert_eq!(stock_of(&store, product.id).await, 8);

    // ADMIN deletes it
    service.delete(&admin, shipped.id).await.unwrap();
    assert_eq!(stock_of(&store, product.id).await, 10);
    assert!(service.list(&admin, TransactionQuery::default()).await.unwrap().is_empty());
}

// ============================================================================
// Atomicity
// ============================================================================

#[tokio::test]
async fn test_failed_edit_leaves_stock_and_record_untouched() {
    let store = memory_store();
    let service = TransactionService::new(store.clone());
    let admin = actor(Role::Admin);
    let product = seed_product(&store, "Bolt", 10, 0).await;

    let tx = service
        .create(&admin, movement(Direction::Out, 4, product.id))
        .await
        .unwrap();
    assert_eq!(stock_of(&store, product.id).await, 6);

    // Reversal would give 10, but OUT 11 cannot be applied on top of it
    let err = service
        .update(
            &admin,
            tx.id,
            UpdateTransactionInput {
                quantity: Some(11),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 10 }));

    assert_eq!(stock_of(&store, product.id).await, 6);
    let unchanged = service.get(&admin, tx.id).await.unwrap();
    assert_eq!(unchanged.quantity, 4);
}

#[tokio::test]
async fn test_edit_moving_to_another_product() {
    let store = memory_store();
    let service = TransactionService::new(store.clone());
    let manager = actor(Role::Manager);
    let admin = actor(Role::Admin);
    let first = seed_product(&store, "Nut", 10, 0).await;
    let second = seed_product(&store, "Washer", 10, 0).await;

    let tx = service
        .create(&manager, movement(Direction::In, 5, first.id))
        .await
        .unwrap();
    assert_eq!(stock_of(&store, first.id).await, 15);

    let moved = service
        .update(
            &admin,
            tx.id,
            UpdateTransactionInput {
                product_id: Some(second.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.product_id, second.id);
    assert_eq!(stock_of(&store, first.id).await, 10);
    assert_eq!(stock_of(&store, second.id).await, 15);
}

#[tokio::test]
async fn test_deleting_consumed_receipt_is_refused() {
    let store = memory_store();
    let service = TransactionService::new(store.clone());
    let admin = actor(Role::Admin);
    let product = seed_product(&store, "Cable", 0, 0).await;

    let receipt = service
        .create(&admin, movement(Direction::In, 5, product.id))
        .await
        .unwrap();
    service
        .create(&admin, movement(Direction::Out, 3, product.id))
        .await
        .unwrap();

    let err = service.delete(&admin, receipt.id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 2 }));
    assert_eq!(stock_of(&store, product.id).await, 2);
}

// ============================================================================
// Validation and Lookup
// ============================================================================

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let store = memory_store();
    let service = TransactionService::new(store.clone());
    let manager = actor(Role::Manager);
    let product = seed_product(&store, "Drill", 3, 1).await;

    let err = service
        .create(&manager, movement(Direction::In, 0, product.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantity"));

    let err = service
        .create(&manager, movement(Direction::In, 1, Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = service
        .create(
            &manager,
            CreateTransactionInput {
                supplier_id: Some(Uuid::new_v4()),
                ..movement(Direction::In, 1, product.id)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref what) if what == "Supplier"));
    assert_eq!(stock_of(&store, product.id).await, 3);
}

#[tokio::test]
async fn test_staff_cannot_edit_or_delete() {
    let store = memory_store();
    let service = TransactionService::new(store.clone());
    let staff = actor(Role::Staff);
    let product = seed_product(&store, "Tape", 5, 1).await;

    let tx = service
        .create(&staff, movement(Direction::Out, 1, product.id))
        .await
        .unwrap();

    let err = service
        .update(&staff, tx.id, UpdateTransactionInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));

    let err = service.delete(&staff, tx.id).await.unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
    assert_eq!(stock_of(&store, product.id).await, 4);
}

#[tokio::test]
async fn test_supplier_filter_and_clearing_supplier() {
    let store = memory_store();
    let service = TransactionService::new(store.clone());
    let admin = actor(Role::Admin);
    let product = seed_product(&store, "Glue", 0, 0).await;
    let supplier = seed_supplier(&store, "Acme").await;

    let supplied = service
        .create(
            &admin,
            CreateTransactionInput {
                supplier_id: Some(supplier.id),
                ..movement(Direction::In, 8, product.id)
            },
        )
        .await
        .unwrap();
    service
        .create(&admin, movement(Direction::Out, 2, product.id))
        .await
        .unwrap();

    let query = TransactionQuery {
        supplier_id: Some(supplier.id),
    };
    let filtered = service.list(&admin, query).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, supplied.id);

    let cleared = service
        .update(
            &admin,
            supplied.id,
            UpdateTransactionInput {
                supplier_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.supplier_id, None);
    assert_eq!(stock_of(&store, product.id).await, 6);
}
