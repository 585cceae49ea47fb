//! Persistence capability
//!
//! Services talk to storage only through [`Store`]. Writes that move stock
//! go through a [`UnitOfWork`]: rows read with the `lock_*` methods stay
//! locked until the unit ends, `commit` makes every write visible at once,
//! and dropping an uncommitted unit discards all of its writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{Direction, Order, OrderStatus, Product, Role, StockStatus, Supplier, Transaction, User};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A user row including its password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAccount {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub stock: i32,
    pub reorder_point: i32,
}

/// Partial product update; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub reorder_point: Option<i32>,
}

/// Product listing filter
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive category match
    pub category: Option<String>,
    pub stock_status: Option<StockStatus>,
}

impl ProductFilter {
    pub fn low_stock() -> Self {
        Self {
            stock_status: Some(StockStatus::Low),
            ..Self::default()
        }
    }

    /// Evaluate the filter against a fetched product
    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = self.name.as_ref().map_or(true, |name| {
            product.name.to_lowercase().contains(&name.to_lowercase())
        });
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |category| product.category.eq_ignore_ascii_case(category));
        let status_ok = self.stock_status.map_or(true, |status| product.matches(status));
        name_ok && category_ok && status_ok
    }
}

#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Partial supplier update; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct SupplierChanges {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Values written for a movement record
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub direction: Direction,
    pub quantity: i32,
    pub product_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i32,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct OrderChanges {
    pub status: OrderStatus,
    pub due_date: Option<DateTime<Utc>>,
}

/// A pending order past its due date, joined with display names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OverdueOrder {
    pub order_id: Uuid,
    pub product_name: String,
    pub supplier_name: String,
    pub quantity: i32,
    pub due_date: DateTime<Utc>,
}

/// Storage used by the services
#[async_trait]
pub trait Store: Send + Sync {
    /// Check connectivity
    async fn ping(&self) -> AppResult<()>;

    /// Release connections; called once on shutdown
    async fn close(&self);

    /// Start an all-or-nothing unit of work
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>>;

    async fn create_product(&self, product: NewProduct) -> AppResult<Product>;
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>>;
    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> AppResult<bool>;

    async fn create_supplier(&self, supplier: NewSupplier) -> AppResult<Supplier>;
    async fn get_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>>;
    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>>;
    async fn update_supplier(&self, id: Uuid, changes: SupplierChanges) -> AppResult<Option<Supplier>>;
    async fn delete_supplier(&self, id: Uuid) -> AppResult<bool>;

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<Transaction>>;
    /// Newest first, optionally restricted to one supplier
    async fn list_transactions(&self, supplier_id: Option<Uuid>) -> AppResult<Vec<Transaction>>;

    async fn create_order(&self, order: NewOrder) -> AppResult<Order>;
    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>>;
    /// Newest first
    async fn list_orders(&self) -> AppResult<Vec<Order>>;
    async fn delete_order(&self, id: Uuid) -> AppResult<bool>;
    async fn list_overdue_orders(&self, now: DateTime<Utc>) -> AppResult<Vec<OverdueOrder>>;
}

/// Writes that must land together
#[async_trait]
pub trait UnitOfWork: Send {
    /// Read a product and hold it until the unit ends
    async fn lock_product(&mut self, id: Uuid) -> AppResult<Option<Product>>;
    async fn set_stock(&mut self, product_id: Uuid, stock: i32) -> AppResult<()>;

    async fn lock_transaction(&mut self, id: Uuid) -> AppResult<Option<Transaction>>;
    async fn insert_transaction(&mut self, tx: NewTransaction) -> AppResult<Transaction>;
    async fn update_transaction(&mut self, id: Uuid, tx: NewTransaction) -> AppResult<Transaction>;
    async fn delete_transaction(&mut self, id: Uuid) -> AppResult<()>;

    async fn lock_order(&mut self, id: Uuid) -> AppResult<Option<Order>>;
    async fn update_order(&mut self, id: Uuid, changes: OrderChanges) -> AppResult<Order>;

    /// Make every write of this unit visible. Later calls fail.
    async fn commit(&mut self) -> AppResult<()>;
}
