//! Stock ledger reconciliation
//!
//! Pure arithmetic over a product's current stock. Callers read the stock
//! inside a unit of work, ask the ledger for the next value, and write it
//! back in the same unit. Nothing here touches storage.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Direction, Movement, OrderStatus, Product, Transaction};

/// Reasons the ledger refuses a change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Quantity must be a positive integer, got {0}")]
    InvalidQuantity(i32),

    #[error("Insufficient stock. Available: {available}")]
    InsufficientStock { product_id: Uuid, available: i32 },

    #[error("Stock for product {0} is out of range")]
    StockOverflow(Uuid),

    #[error("No stock level supplied for product {0}")]
    UnknownProduct(Uuid),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// A product's stock as read at the start of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub stock: i32,
}

impl StockLevel {
    pub fn new(product_id: Uuid, stock: i32) -> Self {
        Self { product_id, stock }
    }
}

impl From<&Product> for StockLevel {
    fn from(product: &Product) -> Self {
        Self::new(product.id, product.stock)
    }
}

/// Stock after recording a brand new movement.
pub fn apply_new_movement(level: StockLevel, direction: Direction, quantity: i32) -> LedgerResult<i32> {
    let quantity = positive(quantity)?;
    apply_effect(level.product_id, i64::from(level.stock), direction, quantity)
}

/// Stock levels after replacing `old` with `new`.
///
/// When both movements hit the same product the old effect is reversed on
/// the current stock and the new effect is applied to that intermediate
/// value; only the final value has to be non-negative. When the product
/// changes, the reversal and the new effect are validated independently.
/// `levels` must contain every product referenced by the two movements.
/// The returned levels are the values to write back, one per product.
pub fn reconcile_edit(
    levels: &[StockLevel],
    old: &Movement,
    new: &Movement,
) -> LedgerResult<Vec<StockLevel>> {
    let old_quantity = positive(old.quantity)?;
    let new_quantity = positive(new.quantity)?;

    if old.product_id == new.product_id {
        let current = lookup(levels, old.product_id)?;
        let intermediate = i64::from(current.stock) - old.direction.sign() * old_quantity;
        let stock = apply_effect(new.product_id, intermediate, new.direction, new_quantity)?;
        return Ok(vec![StockLevel::new(new.product_id, stock)]);
    }

    let old_level = lookup(levels, old.product_id)?;
    let new_level = lookup(levels, new.product_id)?;

    let reverted = apply_effect(
        old.product_id,
        i64::from(old_level.stock),
        old.direction.reversed(),
        old_quantity,
    )?;
    let applied = apply_effect(
        new.product_id,
        i64::from(new_level.stock),
        new.direction,
        new_quantity,
    )?;

    Ok(vec![
        StockLevel::new(old.product_id, reverted),
        StockLevel::new(new.product_id, applied),
    ])
}

/// Stock after deleting a movement.
///
/// Undoing an OUT always succeeds. Undoing an IN whose units have since
/// been consumed would leave negative stock and is refused.
pub fn reconcile_deletion(level: StockLevel, movement: &Movement) -> LedgerResult<i32> {
    let quantity = positive(movement.quantity)?;
    apply_effect(
        level.product_id,
        i64::from(level.stock),
        movement.direction.reversed(),
        quantity,
    )
}

/// Stock after receiving a completed purchase order.
///
/// Not idempotent: callers must only invoke this on the transition into
/// `COMPLETED` (see [`plan_order_transition`]).
pub fn apply_order_completion(level: StockLevel, quantity: i32) -> LedgerResult<i32> {
    apply_new_movement(level, Direction::In, quantity)
}

/// What a requested order status change means for stock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    /// Status stays the same; no stock effect
    Unchanged,
    /// PENDING -> COMPLETED; stock is received once
    Receive,
    /// PENDING -> CANCELLED; no stock effect
    Cancel,
}

/// Classify a status change. Orders only leave PENDING; completed and
/// cancelled orders cannot be reopened or switched.
pub fn plan_order_transition(current: OrderStatus, requested: OrderStatus) -> LedgerResult<OrderTransition> {
    match (current, requested) {
        (from, to) if from == to => Ok(OrderTransition::Unchanged),
        (OrderStatus::Pending, OrderStatus::Completed) => Ok(OrderTransition::Receive),
        (OrderStatus::Pending, OrderStatus::Cancelled) => Ok(OrderTransition::Cancel),
        (from, to) => Err(LedgerError::InvalidTransition { from, to }),
    }
}

/// Supplied / used totals over a set of movements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementTotals {
    pub total_supplied: i64,
    pub total_used: i64,
    pub current_stock: i64,
}

pub fn summarize<'a, I>(transactions: I) -> MovementTotals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals = MovementTotals::default();
    for tx in transactions {
        match tx.direction {
            Direction::In => totals.total_supplied += i64::from(tx.quantity),
            Direction::Out => totals.total_used += i64::from(tx.quantity),
        }
    }
    totals.current_stock = totals.total_supplied - totals.total_used;
    totals
}

fn positive(quantity: i32) -> LedgerResult<i64> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    Ok(i64::from(quantity))
}

fn lookup(levels: &[StockLevel], product_id: Uuid) -> LedgerResult<StockLevel> {
    levels
        .iter()
        .find(|level| level.product_id == product_id)
        .copied()
        .ok_or(LedgerError::UnknownProduct(product_id))
}

fn apply_effect(product_id: Uuid, stock: i64, direction: Direction, quantity: i64) -> LedgerResult<i32> {
    let next = stock + direction.sign() * quantity;
    if next < 0 {
        return Err(LedgerError::InsufficientStock {
            product_id,
            available: stock.clamp(0, i64::from(i32::MAX)) as i32,
        });
    }
    i32::try_from(next).map_err(|_| LedgerError::StockOverflow(product_id))
}
