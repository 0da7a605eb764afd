//! Typed repositories over the document store.
//!
//! Each repository wraps one injected collection; the [`Repositories`]
//! facade carries the rules that span collections (referential checks,
//! rate resolution, order receipt, legacy migration). Rejected operations
//! write nothing.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::core::catalog::{Group, Product};
use crate::core::error::{StoreError, ValidationError};
use crate::core::expense::Expense;
use crate::core::migrate::{MigrationOutcome, migrate_legacy_orders};
use crate::core::order::{Order, OrderItems, OrderStatus};
use crate::core::rate::{RateEntry, resolve_current_rate};
use crate::core::receive::plan_receipt;
use crate::store::memory::MemoryCollection;
use crate::store::{DocumentCollection, Store};

/// Config key for the fallback exchange rate.
pub const TASA_KEY: &str = "tasa";
/// Config key for the flat delivery fee in USD.
pub const DELIVERY_KEY: &str = "delivery";

pub struct ProductRepo {
    col: Arc<dyn DocumentCollection<u32, Product>>,
}

impl ProductRepo {
    pub fn new(col: Arc<dyn DocumentCollection<u32, Product>>) -> Self {
        Self { col }
    }

    pub async fn get(&self, id: u32) -> Result<Option<Product>> {
        self.col.get(&id).await
    }

    pub async fn insert(&self, product: &Product) -> Result<()> {
        if product.id == 0 {
            return Err(ValidationError::new("product id", "must be positive").into());
        }
        if self.col.get(&product.id).await?.is_some() {
            return Err(StoreError::DuplicateId { id: product.id }.into());
        }
        self.col.put(&product.id, product).await
    }

    pub async fn update(&self, product: &Product) -> Result<()> {
        if self.col.get(&product.id).await?.is_none() {
            return Err(StoreError::ProductNotFound { id: product.id }.into());
        }
        self.col.put(&product.id, product).await
    }

    pub async fn set_visible(&self, id: u32, visible: bool) -> Result<Product> {
        let mut product = self
            .col
            .get(&id)
            .await?
            .ok_or(StoreError::ProductNotFound { id })?;
        product.visible = visible;
        self.col.put(&id, &product).await?;
        Ok(product)
    }

    pub async fn all(&self) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self.col.entries().await?.into_iter().map(|(_, p)| p).collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    /// Replaces the collection with a backup snapshot, bypassing insert
    /// validation.
    pub async fn restore(&self, products: &[Product]) -> Result<()> {
        self.col.clear().await?;
        for product in products {
            self.col.put(&product.id, product).await?;
        }
        Ok(())
    }

    async fn remove(&self, id: u32) -> Result<()> {
        self.col.remove(&id).await
    }
}

pub struct GroupRepo {
    col: Arc<dyn DocumentCollection<u64, Group>>,
}

impl GroupRepo {
    pub fn new(col: Arc<dyn DocumentCollection<u64, Group>>) -> Self {
        Self { col }
    }

    pub async fn create(&self, name: &str, unit_price: f64, unit_cost: f64) -> Result<Group> {
        let groups = self.all().await?;
        let wanted = name.to_lowercase();
        if groups.iter().any(|g| g.name.to_lowercase() == wanted) {
            return Err(StoreError::DuplicateName { name: name.to_string() }.into());
        }
        let id = groups.iter().map(|g| g.id).max().unwrap_or(0) + 1;
        let group = Group {
            id,
            name: name.to_string(),
            unit_price,
            unit_cost,
        };
        self.col.put(&id, &group).await?;
        Ok(group)
    }

    pub async fn update(&self, group: &Group) -> Result<()> {
        let groups = self.all().await?;
        if !groups.iter().any(|g| g.id == group.id) {
            return Err(StoreError::GroupNotFound { name: group.name.clone() }.into());
        }
        let wanted = group.name.to_lowercase();
        if groups.iter().any(|g| g.id != group.id && g.name.to_lowercase() == wanted) {
            return Err(StoreError::DuplicateName { name: group.name.clone() }.into());
        }
        self.col.put(&group.id, group).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
        let wanted = name.to_lowercase();
        Ok(self
            .all()
            .await?
            .into_iter()
            .find(|g| g.name.to_lowercase() == wanted))
    }

    pub async fn all(&self) -> Result<Vec<Group>> {
        let mut groups: Vec<_> = self.col.entries().await?.into_iter().map(|(_, g)| g).collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    pub async fn restore(&self, groups: &[Group]) -> Result<()> {
        self.col.clear().await?;
        for group in groups {
            self.col.put(&group.id, group).await?;
        }
        Ok(())
    }

    async fn remove(&self, id: u64) -> Result<()> {
        self.col.remove(&id).await
    }
}

pub struct OrderRepo {
    col: Arc<dyn DocumentCollection<u64, Order>>,
}

impl OrderRepo {
    pub fn new(col: Arc<dyn DocumentCollection<u64, Order>>) -> Self {
        Self { col }
    }

    pub async fn next_id(&self) -> Result<u64> {
        let max = self.col.entries().await?.into_iter().map(|(id, _)| id).max();
        Ok(max.unwrap_or(0) + 1)
    }

    pub async fn get(&self, id: u64) -> Result<Option<Order>> {
        self.col.get(&id).await
    }

    pub async fn put(&self, order: &Order) -> Result<()> {
        self.col.put(&order.id, order).await
    }

    pub async fn all(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<_> = self.col.entries().await?.into_iter().map(|(_, o)| o).collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    pub async fn restore(&self, orders: &[Order]) -> Result<()> {
        self.col.clear().await?;
        for order in orders {
            self.col.put(&order.id, order).await?;
        }
        Ok(())
    }
}

pub struct ExpenseRepo {
    col: Arc<dyn DocumentCollection<u64, Expense>>,
}

impl ExpenseRepo {
    pub fn new(col: Arc<dyn DocumentCollection<u64, Expense>>) -> Self {
        Self { col }
    }

    pub async fn next_id(&self) -> Result<u64> {
        let max = self.col.entries().await?.into_iter().map(|(id, _)| id).max();
        Ok(max.unwrap_or(0) + 1)
    }

    pub async fn put(&self, expense: &Expense) -> Result<()> {
        self.col.put(&expense.id, expense).await
    }

    pub async fn all(&self) -> Result<Vec<Expense>> {
        let mut expenses: Vec<_> = self.col.entries().await?.into_iter().map(|(_, e)| e).collect();
        expenses.sort_by_key(|e| e.id);
        Ok(expenses)
    }

    pub async fn restore(&self, expenses: &[Expense]) -> Result<()> {
        self.col.clear().await?;
        for expense in expenses {
            self.col.put(&expense.id, expense).await?;
        }
        Ok(())
    }
}

pub struct RateRepo {
    col: Arc<dyn DocumentCollection<u64, RateEntry>>,
}

impl RateRepo {
    pub fn new(col: Arc<dyn DocumentCollection<u64, RateEntry>>) -> Self {
        Self { col }
    }

    pub async fn add(&self, date: NaiveDate, rate: f64) -> Result<RateEntry> {
        let entries = self.all().await?;
        let id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let entry = RateEntry { id, date, rate };
        self.col.put(&id, &entry).await?;
        Ok(entry)
    }

    pub async fn all(&self) -> Result<Vec<RateEntry>> {
        let mut entries: Vec<_> = self.col.entries().await?.into_iter().map(|(_, e)| e).collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    pub async fn restore(&self, entries: &[RateEntry]) -> Result<()> {
        self.col.clear().await?;
        for entry in entries {
            self.col.put(&entry.id, entry).await?;
        }
        Ok(())
    }
}

pub struct ConfigRepo {
    col: Arc<dyn DocumentCollection<String, String>>,
}

impl ConfigRepo {
    pub fn new(col: Arc<dyn DocumentCollection<String, String>>) -> Self {
        Self { col }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.col.get(&key.to_string()).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.col.put(&key.to_string(), &value.to_string()).await
    }

    /// A numeric config value, `Ok(None)` when the key is unset.
    ///
    /// A present but non-numeric value is a [`ValidationError`], not an
    /// absent one; silently treating it as unconfigured would hide a
    /// corrupt setting.
    pub async fn get_f64(&self, key: &'static str) -> Result<Option<f64>> {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError::new(key, format!("stored value \"{raw}\" is not a number")))?;
                Ok(Some(value))
            }
        }
    }

    pub async fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut entries = self.col.entries().await?;
        entries.sort();
        Ok(entries)
    }

    pub async fn restore(&self, entries: &[(String, String)]) -> Result<()> {
        self.col.clear().await?;
        for (key, value) in entries {
            self.col.put(key, value).await?;
        }
        Ok(())
    }
}

/// Every repository plus the cross-collection rules.
pub struct Repositories {
    pub products: ProductRepo,
    pub groups: GroupRepo,
    pub orders: OrderRepo,
    pub expenses: ExpenseRepo,
    pub rates: RateRepo,
    pub config: ConfigRepo,
}

impl Repositories {
    pub fn open(store: &Store) -> Result<Self> {
        Ok(Self {
            products: ProductRepo::new(Arc::new(store.collection::<u32, Product>("products")?)),
            groups: GroupRepo::new(Arc::new(store.collection::<u64, Group>("groups")?)),
            orders: OrderRepo::new(Arc::new(store.collection::<u64, Order>("orders")?)),
            expenses: ExpenseRepo::new(Arc::new(store.collection::<u64, Expense>("expenses")?)),
            rates: RateRepo::new(Arc::new(store.collection::<u64, RateEntry>("rates")?)),
            config: ConfigRepo::new(Arc::new(store.collection::<String, String>("config")?)),
        })
    }

    /// A fully in-memory instance, for tests and dry runs.
    pub fn in_memory() -> Self {
        Self {
            products: ProductRepo::new(Arc::new(MemoryCollection::<u32, Product>::new())),
            groups: GroupRepo::new(Arc::new(MemoryCollection::<u64, Group>::new())),
            orders: OrderRepo::new(Arc::new(MemoryCollection::<u64, Order>::new())),
            expenses: ExpenseRepo::new(Arc::new(MemoryCollection::<u64, Expense>::new())),
            rates: RateRepo::new(Arc::new(MemoryCollection::<u64, RateEntry>::new())),
            config: ConfigRepo::new(Arc::new(MemoryCollection::<String, String>::new())),
        }
    }

    /// The current exchange rate: most recent history entry, else the
    /// `tasa` config fallback, else not configured.
    pub async fn current_rate(&self) -> Result<Option<f64>> {
        let history = self.rates.all().await?;
        let fallback = self.config.get_f64(TASA_KEY).await?;
        Ok(resolve_current_rate(&history, fallback))
    }

    /// The configured delivery fee, if any.
    pub async fn delivery_fee(&self) -> Result<Option<f64>> {
        self.config.get_f64(DELIVERY_KEY).await
    }

    /// Deletes a product unless a quantity-positive line of an open order
    /// still references it.
    pub async fn delete_product(&self, id: u32) -> Result<Product> {
        let product = self
            .products
            .get(id)
            .await?
            .ok_or(StoreError::ProductNotFound { id })?;

        for order in self.orders.all().await? {
            if order.status == OrderStatus::Closed {
                continue;
            }
            let referenced = match &order.items {
                OrderItems::Canonical(lines) => lines
                    .iter()
                    .any(|l| l.product_id == id && l.quantity > 0),
                OrderItems::Legacy(map) => map
                    .iter()
                    .any(|(k, qty)| *qty > 0 && k.parse::<u32>() == Ok(id)),
            };
            if referenced {
                return Err(StoreError::ReferencedProduct { id, order_id: order.id }.into());
            }
        }

        self.products.remove(id).await?;
        Ok(product)
    }

    /// Deletes a group unless a product still references its name.
    pub async fn delete_group(&self, name: &str) -> Result<Group> {
        let group = self
            .groups
            .find_by_name(name)
            .await?
            .ok_or_else(|| StoreError::GroupNotFound { name: name.to_string() })?;

        let wanted = group.name.to_lowercase();
        let count = self
            .products
            .all()
            .await?
            .iter()
            .filter(|p| p.group.to_lowercase() == wanted)
            .count();
        if count > 0 {
            return Err(StoreError::ReferencedGroup { name: group.name.clone(), count }.into());
        }

        self.groups.remove(group.id).await?;
        Ok(group)
    }

    /// Receives an order: applies every stock increment, closes the order
    /// and stamps the received-at timestamp.
    ///
    /// The plan is validated in full before the first write. Should a
    /// write fail midway, the error carries context naming the
    /// inconsistency instead of silently leaving stale state.
    pub async fn receive_order(&self, order_id: u64, now: DateTime<Utc>) -> Result<Order> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(StoreError::OrderNotFound { id: order_id })?;
        let products = self.products.all().await?;

        let adjustments = plan_receipt(&order, &products)?;

        for adjustment in &adjustments {
            let mut product = self
                .products
                .get(adjustment.product_id)
                .await?
                .ok_or(StoreError::ProductNotFound { id: adjustment.product_id })?;
            product.stock = product.stock.saturating_add(adjustment.quantity);
            self.products
                .update(&product)
                .await
                .context("stock update failed mid-receipt; some increments may already be applied")?;
        }

        order.status = OrderStatus::Closed;
        order.received_at = Some(now);
        self.orders
            .put(&order)
            .await
            .context("stock was adjusted but the order could not be marked closed")?;
        Ok(order)
    }

    /// Rewrites every legacy-shaped order into canonical line items.
    ///
    /// `progress` is invoked once per migrated order as it is written
    /// back.
    pub async fn migrate_orders(
        &self,
        now: DateTime<Utc>,
        progress: &(dyn Fn() + Sync),
    ) -> Result<MigrationOutcome> {
        let orders = self.orders.all().await?;
        let products = self.products.all().await?;
        let groups = self.groups.all().await?;

        let result = migrate_legacy_orders(&orders, &products, &groups, now);
        for order in &result.migrated {
            self.orders
                .put(order)
                .await
                .with_context(|| format!("Failed to write back migrated order {}", order.id))?;
            progress();
        }
        Ok(result.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ReceiveError;
    use crate::core::order::{OrderLine, OrderTotals};
    use std::collections::BTreeMap;

    fn product(id: u32, group: &str, stock: u32) -> Product {
        Product {
            id,
            name: format!("product-{id}"),
            group: group.to_string(),
            stock,
            visible: true,
            image_path: None,
            created_at: Utc::now(),
        }
    }

    fn order(id: u64, status: OrderStatus, items: OrderItems) -> Order {
        Order {
            id,
            number: format!("ORD-{id:04}"),
            date: "2024-05-01".parse().unwrap(),
            rate: 36.0,
            status,
            delivery_applied: false,
            delivery_fee: 0.0,
            items,
            totals: OrderTotals::zero(),
            received_at: None,
            migrated_at: None,
        }
    }

    fn line(product_id: u32, quantity: u32) -> OrderLine {
        OrderLine {
            product_id,
            product_name: format!("product-{product_id}"),
            group_name: "A".to_string(),
            quantity,
            unit_price: 5.0,
            unit_cost: 2.0,
            line_sale_usd: 5.0 * f64::from(quantity),
            line_profit_usd: 3.0 * f64::from(quantity),
        }
    }

    #[tokio::test]
    async fn test_product_insert_rejects_duplicates_and_zero_id() {
        let repos = Repositories::in_memory();

        repos.products.insert(&product(1, "A", 5)).await.unwrap();

        let duplicate = repos.products.insert(&product(1, "A", 5)).await;
        assert_eq!(
            duplicate.unwrap_err().downcast_ref::<StoreError>(),
            Some(&StoreError::DuplicateId { id: 1 })
        );

        let zero = repos.products.insert(&product(0, "A", 5)).await;
        assert!(zero.unwrap_err().downcast_ref::<ValidationError>().is_some());
    }

    #[tokio::test]
    async fn test_group_create_assigns_sequential_ids() {
        let repos = Repositories::in_memory();

        let first = repos.groups.create("Tropical", 5.0, 2.0).await.unwrap();
        let second = repos.groups.create("Mantecado", 4.0, 1.5).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_group_names_are_unique_case_insensitively() {
        let repos = Repositories::in_memory();

        repos.groups.create("Tropical", 5.0, 2.0).await.unwrap();
        let result = repos.groups.create("TROPICAL", 6.0, 2.0).await;

        assert_eq!(
            result.unwrap_err().downcast_ref::<StoreError>(),
            Some(&StoreError::DuplicateName { name: "TROPICAL".to_string() })
        );
    }

    #[tokio::test]
    async fn test_delete_group_blocked_while_referenced() {
        let repos = Repositories::in_memory();

        repos.groups.create("Tropical", 5.0, 2.0).await.unwrap();
        repos.products.insert(&product(1, "tropical", 5)).await.unwrap();

        let blocked = repos.delete_group("Tropical").await;
        assert_eq!(
            blocked.unwrap_err().downcast_ref::<StoreError>(),
            Some(&StoreError::ReferencedGroup { name: "Tropical".to_string(), count: 1 })
        );

        repos.delete_product(1).await.unwrap();
        repos.delete_group("Tropical").await.unwrap();
        assert!(repos.groups.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_product_blocked_by_open_order() {
        let repos = Repositories::in_memory();
        repos.products.insert(&product(1, "A", 5)).await.unwrap();
        repos
            .orders
            .put(&order(1, OrderStatus::Active, OrderItems::Canonical(vec![line(1, 2)])))
            .await
            .unwrap();

        let blocked = repos.delete_product(1).await;
        assert_eq!(
            blocked.unwrap_err().downcast_ref::<StoreError>(),
            Some(&StoreError::ReferencedProduct { id: 1, order_id: 1 })
        );
    }

    #[tokio::test]
    async fn test_delete_product_allowed_once_order_is_closed() {
        let repos = Repositories::in_memory();
        repos.products.insert(&product(1, "A", 5)).await.unwrap();
        repos
            .orders
            .put(&order(1, OrderStatus::Closed, OrderItems::Canonical(vec![line(1, 2)])))
            .await
            .unwrap();

        repos.delete_product(1).await.unwrap();
        assert!(repos.products.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_items_also_block_product_deletion() {
        let repos = Repositories::in_memory();
        repos.products.insert(&product(1, "A", 5)).await.unwrap();
        repos
            .orders
            .put(&order(
                1,
                OrderStatus::Active,
                OrderItems::Legacy(BTreeMap::from([("1".to_string(), 2)])),
            ))
            .await
            .unwrap();

        assert!(repos.delete_product(1).await.is_err());
    }

    #[tokio::test]
    async fn test_receive_order_increments_stock_once() {
        let repos = Repositories::in_memory();
        repos.products.insert(&product(1, "A", 5)).await.unwrap();
        repos
            .orders
            .put(&order(1, OrderStatus::Active, OrderItems::Canonical(vec![line(1, 3)])))
            .await
            .unwrap();

        let received = repos.receive_order(1, Utc::now()).await.unwrap();
        assert_eq!(received.status, OrderStatus::Closed);
        assert!(received.received_at.is_some());
        assert_eq!(repos.products.get(1).await.unwrap().unwrap().stock, 8);

        // Receiving again is rejected and never double-increments
        let again = repos.receive_order(1, Utc::now()).await;
        assert_eq!(
            again.unwrap_err().downcast_ref::<ReceiveError>(),
            Some(&ReceiveError::AlreadyClosed { order_id: 1 })
        );
        assert_eq!(repos.products.get(1).await.unwrap().unwrap().stock, 8);
    }

    #[tokio::test]
    async fn test_receive_order_with_missing_product_applies_nothing() {
        let repos = Repositories::in_memory();
        repos.products.insert(&product(1, "A", 5)).await.unwrap();
        repos
            .orders
            .put(&order(
                1,
                OrderStatus::Active,
                OrderItems::Canonical(vec![line(1, 3), line(42, 2)]),
            ))
            .await
            .unwrap();

        assert!(repos.receive_order(1, Utc::now()).await.is_err());
        assert_eq!(repos.products.get(1).await.unwrap().unwrap().stock, 5);
        assert_eq!(
            repos.orders.get(1).await.unwrap().unwrap().status,
            OrderStatus::Active
        );
    }

    #[tokio::test]
    async fn test_current_rate_prefers_history_over_fallback() {
        let repos = Repositories::in_memory();
        repos.config.set(TASA_KEY, "99.0").await.unwrap();

        assert_eq!(repos.current_rate().await.unwrap(), Some(99.0));

        repos.rates.add("2024-05-01".parse().unwrap(), 36.5).await.unwrap();
        assert_eq!(repos.current_rate().await.unwrap(), Some(36.5));
    }

    #[tokio::test]
    async fn test_config_get_f64_rejects_garbage() {
        let repos = Repositories::in_memory();

        assert_eq!(repos.config.get_f64(TASA_KEY).await.unwrap(), None);

        repos.config.set(TASA_KEY, "not-a-number").await.unwrap();
        let err = repos.config.get_f64(TASA_KEY).await.unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }

    #[tokio::test]
    async fn test_migrate_orders_is_idempotent_against_the_store() {
        let repos = Repositories::in_memory();
        repos.products.insert(&product(1, "A", 0)).await.unwrap();
        repos.groups.create("A", 5.0, 2.0).await.unwrap();
        repos
            .orders
            .put(&order(
                1,
                OrderStatus::Active,
                OrderItems::Legacy(BTreeMap::from([("1".to_string(), 3)])),
            ))
            .await
            .unwrap();

        let first = repos.migrate_orders(Utc::now(), &|| {}).await.unwrap();
        assert_eq!(first.migrated, 1);

        let migrated = repos.orders.get(1).await.unwrap().unwrap();
        assert_eq!(migrated.items.lines().unwrap().len(), 1);
        assert_eq!(migrated.totals.sale_usd, 15.0);

        let second = repos.migrate_orders(Utc::now(), &|| {}).await.unwrap();
        assert_eq!(second.migrated, 0);
        assert_eq!(second.skipped, 1);
    }
}
