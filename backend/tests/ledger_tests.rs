//! Stock ledger tests
//!
//! Properties of the reconciliation rules that keep stock equal to the sum
//! of recorded movements.

use proptest::prelude::*;
use shared::{
    apply_new_movement, plan_order_transition, reconcile_deletion, reconcile_edit, Direction,
    LedgerError, Movement, OrderStatus, OrderTransition, StockLevel,
};
use uuid::Uuid;

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::In), Just(Direction::Out)]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// IN always adds the quantity
    #[test]
    fn prop_in_adds_quantity(stock in 0i32..100_000, quantity in 1i32..100_000) {
        let level = StockLevel::new(Uuid::new_v4(), stock);
        prop_assert_eq!(apply_new_movement(level, Direction::In, quantity).unwrap(), stock + quantity);
    }

    /// OUT succeeds exactly when enough stock is on hand
    #[test]
    fn prop_out_never_goes_negative(stock in 0i32..10_000, quantity in 1i32..20_000) {
        let level = StockLevel::new(Uuid::new_v4(), stock);
        match apply_new_movement(level, Direction::Out, quantity) {
            Ok(next) => {
                prop_assert!(quantity <= stock);
                prop_assert_eq!(next, stock - quantity);
            }
            Err(LedgerError::InsufficientStock { available, .. }) => {
                prop_assert!(quantity > stock);
                prop_assert_eq!(available, stock);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// Deleting a movement right after recording it restores the stock
    #[test]
    fn prop_delete_restores_previous_stock(
        stock in 0i32..10_000,
        quantity in 1i32..10_000,
        direction in direction_strategy(),
    ) {
        let product_id = Uuid::new_v4();
        let Ok(after) = apply_new_movement(StockLevel::new(product_id, stock), direction, quantity) else {
            return Ok(());
        };

        let movement = Movement { product_id, direction, quantity };
        let restored = reconcile_deletion(StockLevel::new(product_id, after), &movement).unwrap();
        prop_assert_eq!(restored, stock);
    }

    /// Editing a movement to itself leaves stock unchanged
    #[test]
    fn prop_edit_to_self_is_noop(
        stock in 0i32..10_000,
        quantity in 1i32..10_000,
        direction in direction_strategy(),
    ) {
        let product_id = Uuid::new_v4();
        let Ok(current) = apply_new_movement(StockLevel::new(product_id, stock), direction, quantity) else {
            return Ok(());
        };

        let movement = Movement { product_id, direction, quantity };
        let levels = [StockLevel::new(product_id, current)];
        let reconciled = reconcile_edit(&levels, &movement, &movement).unwrap();
        prop_assert_eq!(reconciled, vec![StockLevel::new(product_id, current)]);
    }

    /// An edit gives the same stock as deleting the old movement and
    /// recording the new one, whenever the final stock is non-negative
    #[test]
    fn prop_edit_matches_delete_then_record(
        stock in 0i32..1_000,
        old_quantity in 1i32..1_000,
        new_quantity in 1i32..1_000,
        old_direction in direction_strategy(),
        new_direction in direction_strategy(),
    ) {
        let product_id = Uuid::new_v4();
        let Ok(current) = apply_new_movement(StockLevel::new(product_id, stock), old_direction, old_quantity) else {
            return Ok(());
        };

        let old = Movement { product_id, direction: old_direction, quantity: old_quantity };
        let new = Movement { product_id, direction: new_direction, quantity: new_quantity };
        let expected = i64::from(stock) + new_direction.sign() * i64::from(new_quantity);

        match reconcile_edit(&[StockLevel::new(product_id, current)], &old, &new) {
            Ok(levels) => prop_assert_eq!(i64::from(levels[0].stock), expected),
            Err(LedgerError::InsufficientStock { .. }) => prop_assert!(expected < 0),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_edit_moving_product_updates_both_sides() {
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let old = Movement { product_id: first, direction: Direction::Out, quantity: 3 };
    let new = Movement { product_id: second, direction: Direction::Out, quantity: 2 };

    let levels = [StockLevel::new(first, 7), StockLevel::new(second, 5)];
    let reconciled = reconcile_edit(&levels, &old, &new).unwrap();

    assert_eq!(
        reconciled,
        vec![StockLevel::new(first, 10), StockLevel::new(second, 3)]
    );
}

#[test]
fn test_edit_moving_product_fails_when_target_lacks_stock() {
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let old = Movement { product_id: first, direction: Direction::Out, quantity: 3 };
    let new = Movement { product_id: second, direction: Direction::Out, quantity: 9 };

    let levels = [StockLevel::new(first, 7), StockLevel::new(second, 5)];
    assert!(matches!(
        reconcile_edit(&levels, &old, &new),
        Err(LedgerError::InsufficientStock { available: 5, .. })
    ));
}

#[test]
fn test_deleting_consumed_in_is_refused() {
    let product_id = Uuid::new_v4();
    let received = Movement { product_id, direction: Direction::In, quantity: 20 };

    // 20 received, 15 since shipped out
    let result = reconcile_deletion(StockLevel::new(product_id, 5), &received);
    assert!(matches!(result, Err(LedgerError::InsufficientStock { available: 5, .. })));
}

#[test]
fn test_order_transitions() {
    use OrderStatus::*;

    assert_eq!(plan_order_transition(Pending, Completed).unwrap(), OrderTransition::Receive);
    assert_eq!(plan_order_transition(Pending, Cancelled).unwrap(), OrderTransition::Cancel);
    assert_eq!(plan_order_transition(Completed, Completed).unwrap(), OrderTransition::Unchanged);
    assert!(plan_order_transition(Completed, Pending).is_err());
    assert!(plan_order_transition(Cancelled, Completed).is_err());
}
