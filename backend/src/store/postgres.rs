//! PostgreSQL-backed store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{Order, Product, StockStatus, Supplier, Transaction, User};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    NewOrder, NewProduct, NewSupplier, NewTransaction, NewUser, OrderChanges, OverdueOrder,
    ProductChanges, ProductFilter, Store, SupplierChanges, UnitOfWork, UserAccount,
};
use crate::error::{AppError, AppResult};

const PRODUCT_COLUMNS: &str = "id, name, category, stock, reorder_point, created_at, updated_at";
const SUPPLIER_COLUMNS: &str = "id, name, contact, email, address, created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, direction, quantity, product_id, supplier_id, user_id, created_at";
const ORDER_COLUMNS: &str =
    "id, product_id, supplier_id, quantity, status, due_date, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let account = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, name, email, role, created_at, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create_product(&self, product: NewProduct) -> AppResult<Product> {
        let sql = format!(
            "INSERT INTO products (name, category, stock, reorder_point) \
             VALUES ($1, $2, $3, $4) RETURNING {PRODUCT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(&product.category)
            .bind(product.stock)
            .bind(product.reorder_point)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(name) = &filter.name {
            query
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", escape_like(name)));
        }
        if let Some(category) = &filter.category {
            query
                .push(" AND LOWER(category) = LOWER(")
                .push_bind(category.clone())
                .push(")");
        }
        match filter.stock_status {
            Some(StockStatus::Low) => {
                query.push(" AND stock < reorder_point");
            }
            Some(StockStatus::Out) => {
                query.push(" AND stock = 0");
            }
            None => {}
        }
        query.push(" ORDER BY name ASC, id ASC");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        let sql = format!(
            "UPDATE products SET \
                name = COALESCE($2, name), \
                category = COALESCE($3, category), \
                reorder_point = COALESCE($4, reorder_point), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.category)
            .bind(changes.reorder_point)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_supplier(&self, supplier: NewSupplier) -> AppResult<Supplier> {
        let sql = format!(
            "INSERT INTO suppliers (name, contact, email, address) \
             VALUES ($1, $2, $3, $4) RETURNING {SUPPLIER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&supplier.name)
            .bind(&supplier.contact)
            .bind(&supplier.email)
            .bind(&supplier.address)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn get_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name ASC, id ASC");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    async fn update_supplier(&self, id: Uuid, changes: SupplierChanges) -> AppResult<Option<Supplier>> {
        let sql = format!(
            "UPDATE suppliers SET \
                name = COALESCE($2, name), \
                contact = COALESCE($3, contact), \
                email = COALESCE($4, email), \
                address = COALESCE($5, address), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {SUPPLIER_COLUMNS}"
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.contact)
            .bind(changes.email)
            .bind(changes.address)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    async fn delete_supplier(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1");
        let tx = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tx)
    }

    async fn list_transactions(&self, supplier_id: Option<Uuid>) -> AppResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE ($1::uuid IS NULL OR supplier_id = $1) \
             ORDER BY created_at DESC, id ASC"
        );
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(transactions)
    }

    async fn create_order(&self, order: NewOrder) -> AppResult<Order> {
        let sql = format!(
            "INSERT INTO orders (product_id, supplier_id, quantity, due_date) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.product_id)
            .bind(order.supplier_id)
            .bind(order.quantity)
            .bind(order.due_date)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    async fn list_orders(&self) -> AppResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id ASC");
        let orders = sqlx::query_as::<_, Order>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    async fn delete_order(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_overdue_orders(&self, now: DateTime<Utc>) -> AppResult<Vec<OverdueOrder>> {
        let overdue = sqlx::query_as::<_, OverdueOrder>(
            r#"
            SELECT o.id AS order_id, p.name AS product_name, s.name AS supplier_name,
                   o.quantity, o.due_date
            FROM orders o
            JOIN products p ON p.id = o.product_id
            JOIN suppliers s ON s.id = o.supplier_id
            WHERE o.status = 'PENDING'
              AND o.due_date IS NOT NULL
              AND o.due_date < $1
            ORDER BY o.due_date ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(overdue)
    }
}

/// Unit of work over one database transaction. Dropping it without
/// `commit` rolls back.
pub struct PgUnitOfWork {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Unit of work already committed".to_string()))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;

        Ok(product)
    }

    async fn set_stock(&mut self, product_id: Uuid, stock: i32) -> AppResult<()> {
        sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(product_id)
            .bind(stock)
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn lock_transaction(&mut self, id: Uuid) -> AppResult<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 FOR UPDATE");
        let tx = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;

        Ok(tx)
    }

    async fn insert_transaction(&mut self, tx: NewTransaction) -> AppResult<Transaction> {
        let sql = format!(
            "INSERT INTO transactions (direction, quantity, product_id, supplier_id, user_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {TRANSACTION_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Transaction>(&sql)
            .bind(tx.direction)
            .bind(tx.quantity)
            .bind(tx.product_id)
            .bind(tx.supplier_id)
            .bind(tx.user_id)
            .fetch_one(self.conn()?)
            .await?;

        Ok(created)
    }

    async fn update_transaction(&mut self, id: Uuid, tx: NewTransaction) -> AppResult<Transaction> {
        let sql = format!(
            "UPDATE transactions SET \
                direction = $2, quantity = $3, product_id = $4, supplier_id = $5, user_id = $6 \
             WHERE id = $1 RETURNING {TRANSACTION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .bind(tx.direction)
            .bind(tx.quantity)
            .bind(tx.product_id)
            .bind(tx.supplier_id)
            .bind(tx.user_id)
            .fetch_optional(self.conn()?)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        Ok(updated)
    }

    async fn delete_transaction(&mut self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn lock_order(&mut self, id: Uuid) -> AppResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;

        Ok(order)
    }

    async fn update_order(&mut self, id: Uuid, changes: OrderChanges) -> AppResult<Order> {
        let sql = format!(
            "UPDATE orders SET status = $2, due_date = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(changes.status)
            .bind(changes.due_date)
            .fetch_optional(self.conn()?)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        Ok(updated)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("Unit of work already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}

/// Escape LIKE wildcards in user input
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
