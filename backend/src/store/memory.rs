//! In-process store
//!
//! Keeps every table in memory behind one async mutex. A unit of work holds
//! the mutex for its whole lifetime and edits a private copy of the tables,
//! so concurrent units run one after another and an abandoned unit leaves
//! no trace. Used by the test suites and for running without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{Order, OrderStatus, Product, Supplier, Transaction, User};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    NewOrder, NewProduct, NewSupplier, NewTransaction, NewUser, OrderChanges, OverdueOrder,
    ProductChanges, ProductFilter, Store, SupplierChanges, UnitOfWork, UserAccount,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, UserAccount>,
    products: HashMap<Uuid, Product>,
    suppliers: HashMap<Uuid, Supplier>,
    transactions: HashMap<Uuid, Transaction>,
    orders: HashMap<Uuid, Order>,
}

impl Tables {
    fn product_referenced(&self, id: Uuid) -> bool {
        self.transactions.values().any(|t| t.product_id == id)
            || self.orders.values().any(|o| o.product_id == id)
    }

    fn supplier_referenced(&self, id: Uuid) -> bool {
        self.transactions.values().any(|t| t.supplier_id == Some(id))
            || self.orders.values().any(|o| o.supplier_id == id)
    }

    fn check_transaction_refs(&self, tx: &NewTransaction) -> AppResult<()> {
        if !self.products.contains_key(&tx.product_id) {
            return Err(still_referenced());
        }
        if let Some(supplier_id) = tx.supplier_id {
            if !self.suppliers.contains_key(&supplier_id) {
                return Err(still_referenced());
            }
        }
        Ok(())
    }
}

fn still_referenced() -> AppError {
    AppError::Conflict("Record is still referenced by other records".to_string())
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| {
        let (a_at, a_id) = key(a);
        let (b_at, b_id) = key(b);
        b_at.cmp(&a_at).then(a_id.cmp(&b_id))
    });
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    closed: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    // Behaves like a closed pool: reads keep working, ping reports the store down
    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard: Some(guard),
            working,
        }))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|a| a.user.email == user.email) {
            return Err(AppError::Conflict(
                "A record with these values already exists".to_string(),
            ));
        }

        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(
            created.id,
            UserAccount {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|a| a.user.email == email).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> AppResult<Product> {
        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name,
            category: product.category,
            stock: product.stock,
            reorder_point: product.reorder_point,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .await
            .products
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let tables = self.tables.lock().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        let mut tables = self.tables.lock().await;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(category) = changes.category {
            product.category = category;
        }
        if let Some(reorder_point) = changes.reorder_point {
            product.reorder_point = reorder_point;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&id) {
            return Ok(false);
        }
        if tables.product_referenced(id) {
            return Err(still_referenced());
        }
        tables.products.remove(&id);
        Ok(true)
    }

    async fn create_supplier(&self, supplier: NewSupplier) -> AppResult<Supplier> {
        let now = Utc::now();
        let created = Supplier {
            id: Uuid::new_v4(),
            name: supplier.name,
            contact: supplier.contact,
            email: supplier.email,
            address: supplier.address,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .await
            .suppliers
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>> {
        Ok(self.tables.lock().await.suppliers.get(&id).cloned())
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let tables = self.tables.lock().await;
        let mut suppliers: Vec<Supplier> = tables.suppliers.values().cloned().collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(suppliers)
    }

    async fn update_supplier(&self, id: Uuid, changes: SupplierChanges) -> AppResult<Option<Supplier>> {
        let mut tables = self.tables.lock().await;
        let Some(supplier) = tables.suppliers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            supplier.name = name;
        }
        if changes.contact.is_some() {
            supplier.contact = changes.contact;
        }
        if changes.email.is_some() {
            supplier.email = changes.email;
        }
        if changes.address.is_some() {
            supplier.address = changes.address;
        }
        supplier.updated_at = Utc::now();
        Ok(Some(supplier.clone()))
    }

    async fn delete_supplier(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.suppliers.contains_key(&id) {
            return Ok(false);
        }
        if tables.supplier_referenced(id) {
            return Err(still_referenced());
        }
        tables.suppliers.remove(&id);
        Ok(true)
    }

    async fn get_transaction(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        Ok(self.tables.lock().await.transactions.get(&id).cloned())
    }

    async fn list_transactions(&self, supplier_id: Option<Uuid>) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.lock().await;
        let mut transactions: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|t| supplier_id.map_or(true, |id| t.supplier_id == Some(id)))
            .cloned()
            .collect();
        newest_first(&mut transactions, |t| (t.created_at, t.id));
        Ok(transactions)
    }

    async fn create_order(&self, order: NewOrder) -> AppResult<Order> {
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&order.product_id)
            || !tables.suppliers.contains_key(&order.supplier_id)
        {
            return Err(still_referenced());
        }

        let now = Utc::now();
        let created = Order {
            id: Uuid::new_v4(),
            product_id: order.product_id,
            supplier_id: order.supplier_id,
            quantity: order.quantity,
            status: OrderStatus::Pending,
            due_date: order.due_date,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> AppResult<Vec<Order>> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        newest_first(&mut orders, |o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn delete_order(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.lock().await.orders.remove(&id).is_some())
    }

    async fn list_overdue_orders(&self, now: DateTime<Utc>) -> AppResult<Vec<OverdueOrder>> {
        let tables = self.tables.lock().await;
        let mut overdue: Vec<OverdueOrder> = tables
            .orders
            .values()
            .filter(|o| o.is_overdue(now))
            .filter_map(|o| {
                let product = tables.products.get(&o.product_id)?;
                let supplier = tables.suppliers.get(&o.supplier_id)?;
                Some(OverdueOrder {
                    order_id: o.id,
                    product_name: product.name.clone(),
                    supplier_name: supplier.name.clone(),
                    quantity: o.quantity,
                    due_date: o.due_date?,
                })
            })
            .collect();
        overdue.sort_by_key(|o| o.due_date);
        Ok(overdue)
    }
}

/// Unit of work over a private copy of the tables
pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
}

impl MemoryUnitOfWork {
    fn ensure_open(&self) -> AppResult<()> {
        if self.guard.is_some() {
            Ok(())
        } else {
            Err(AppError::Internal("Unit of work already committed".to_string()))
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        self.ensure_open()?;
        Ok(self.working.products.get(&id).cloned())
    }

    async fn set_stock(&mut self, product_id: Uuid, stock: i32) -> AppResult<()> {
        self.ensure_open()?;
        if stock < 0 {
            return Err(AppError::Internal(format!(
                "Refusing negative stock {} for product {}",
                stock, product_id
            )));
        }
        if let Some(product) = self.working.products.get_mut(&product_id) {
            product.stock = stock;
            product.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn lock_transaction(&mut self, id: Uuid) -> AppResult<Option<Transaction>> {
        self.ensure_open()?;
        Ok(self.working.transactions.get(&id).cloned())
    }

    async fn insert_transaction(&mut self, tx: NewTransaction) -> AppResult<Transaction> {
        self.ensure_open()?;
        self.working.check_transaction_refs(&tx)?;
        let created = Transaction {
            id: Uuid::new_v4(),
            direction: tx.direction,
            quantity: tx.quantity,
            product_id: tx.product_id,
            supplier_id: tx.supplier_id,
            user_id: tx.user_id,
            created_at: Utc::now(),
        };
        self.working.transactions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_transaction(&mut self, id: Uuid, tx: NewTransaction) -> AppResult<Transaction> {
        self.ensure_open()?;
        self.working.check_transaction_refs(&tx)?;
        let existing = self
            .working
            .transactions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;
        existing.direction = tx.direction;
        existing.quantity = tx.quantity;
        existing.product_id = tx.product_id;
        existing.supplier_id = tx.supplier_id;
        existing.user_id = tx.user_id;
        Ok(existing.clone())
    }

    async fn delete_transaction(&mut self, id: Uuid) -> AppResult<()> {
        self.ensure_open()?;
        self.working.transactions.remove(&id);
        Ok(())
    }

    async fn lock_order(&mut self, id: Uuid) -> AppResult<Option<Order>> {
        self.ensure_open()?;
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn update_order(&mut self, id: Uuid, changes: OrderChanges) -> AppResult<Order> {
        self.ensure_open()?;
        let order = self
            .working
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        order.status = changes.status;
        order.due_date = changes.due_date;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| AppError::Internal("Unit of work already committed".to_string()))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;

    fn product_input(name: &str, stock: i32) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: "Tools".to_string(),
            stock,
            reorder_point: 5,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_unit_is_discarded() {
        let store = MemoryStore::new();
        let product = store.create_product(product_input("Hammer", 10)).await.unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            uow.set_stock(product.id, 3).await.unwrap();
        }

        let reloaded = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock, 10);
    }

    #[tokio::test]
    async fn test_committed_unit_is_visible() {
        let store = MemoryStore::new();
        let product = store.create_product(product_input("Hammer", 10)).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.set_stock(product.id, 3).await.unwrap();
        uow.insert_transaction(NewTransaction {
            direction: Direction::Out,
            quantity: 7,
            product_id: product.id,
            supplier_id: None,
            user_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
        uow.commit().await.unwrap();
        assert!(uow.commit().await.is_err());
        drop(uow);

        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 3);
        assert_eq!(store.list_transactions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_referenced_product_cannot_be_deleted() {
        let store = MemoryStore::new();
        let product = store.create_product(product_input("Saw", 4)).await.unwrap();
        let supplier = store
            .create_supplier(NewSupplier {
                name: "Acme".to_string(),
                contact: None,
                email: None,
                address: None,
            })
            .await
            .unwrap();
        store
            .create_order(NewOrder {
                product_id: product.id,
                supplier_id: supplier.id,
                quantity: 2,
                due_date: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            store.delete_product(product.id).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            store.delete_supplier(supplier.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_products_applies_filter() {
        let store = MemoryStore::new();
        store.create_product(product_input("Widget", 2)).await.unwrap();
        store.create_product(product_input("Gadget", 50)).await.unwrap();

        let low = store.list_products(&ProductFilter::low_stock()).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Widget");

        let by_name = store
            .list_products(&ProductFilter {
                name: Some("GADG".to_string()),
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
    }
}
