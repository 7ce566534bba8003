use chrono::NaiveDate;
use pushkind_common::db::{DbConnection, DbPool};
use pushkind_common::repository::errors::RepositoryResult;

use crate::domain::finance::{
    FinanceExpense, FinanceExpenseListQuery, FinanceSummary, NewFinanceExpense,
    UpdateFinanceExpense,
};
use crate::domain::inventory::{
    Inventory, InventoryListQuery, NewInventory, RemainingInventory, StockKey, UpdateInventory,
};
use crate::domain::order::{DeliveryStatus, NewOrder, Order, OrderListQuery, OrderRevision};
use crate::domain::product::{
    NewProduct, Product, ProductListQuery, ProductUpdate, UpdateProduct,
};
use crate::domain::user::{NewUser, User};

pub mod finance;
pub mod inventory;
pub mod order;
pub mod product;
pub mod user;

#[cfg(test)]
pub mod mock;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over local user records.
pub trait UserReader {
    fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>>;
}

/// Write operations over local user records.
pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
}

/// Read-only operations over the product catalog.
pub trait ProductReader {
    fn get_product_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Product>>;
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
}

/// Write operations over the product catalog.
pub trait ProductWriter {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
    /// Apply `updates` in one transaction. Variants dropped by new pricing
    /// are deleted unless something still references them, in which case
    /// nothing is written.
    fn update_product(
        &self,
        product_id: i32,
        hub_id: i32,
        updates: &UpdateProduct,
    ) -> RepositoryResult<ProductUpdate>;
}

/// Read-only operations over orders and their items.
pub trait OrderReader {
    fn get_order_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Order>>;
    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
}

/// Write operations over orders.
///
/// Every method runs as one transaction that also refreshes the order
/// aggregates and moves held stock in the ledger.
pub trait OrderWriter {
    fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
    fn revise_order(
        &self,
        order_id: i32,
        hub_id: i32,
        revision: &OrderRevision,
    ) -> RepositoryResult<Order>;
    fn delete_order(&self, order_id: i32, hub_id: i32) -> RepositoryResult<()>;
    fn set_item_status(
        &self,
        item_id: i32,
        hub_id: i32,
        status: DeliveryStatus,
    ) -> RepositoryResult<Order>;
    /// Set the status of several items, possibly across orders. Returns the
    /// number of orders touched.
    fn set_items_status(
        &self,
        item_ids: &[i32],
        hub_id: i32,
        status: DeliveryStatus,
    ) -> RepositoryResult<usize>;
    fn set_order_status(
        &self,
        order_id: i32,
        hub_id: i32,
        status: DeliveryStatus,
    ) -> RepositoryResult<Order>;
    /// Move pending orders due before `today` to `today`.
    fn roll_over_orders(&self, hub_id: i32, today: NaiveDate) -> RepositoryResult<usize>;
}

/// Read-only operations over received-stock records.
pub trait InventoryReader {
    fn get_inventory_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Inventory>>;
    fn list_inventory(
        &self,
        query: InventoryListQuery,
    ) -> RepositoryResult<(usize, Vec<Inventory>)>;
}

/// Write operations over received-stock records. Each write adjusts the
/// stock ledger in the same transaction.
pub trait InventoryWriter {
    fn create_inventory(&self, new_inventory: &NewInventory) -> RepositoryResult<Inventory>;
    fn update_inventory(
        &self,
        inventory_id: i32,
        hub_id: i32,
        updates: &UpdateInventory,
    ) -> RepositoryResult<Inventory>;
    fn delete_inventory(&self, inventory_id: i32, hub_id: i32) -> RepositoryResult<()>;
}

/// Remaining-stock counters.
pub trait StockLedger {
    /// Add `delta` to the counter for `key`, clamping at zero.
    ///
    /// Returns `None` when no counter exists and `delta` is not positive.
    fn adjust_stock(
        &self,
        hub_id: i32,
        key: StockKey,
        delta: i32,
    ) -> RepositoryResult<Option<RemainingInventory>>;
    fn get_remaining_stock(
        &self,
        hub_id: i32,
        key: StockKey,
    ) -> RepositoryResult<Option<RemainingInventory>>;
    fn list_remaining_stock(&self, hub_id: i32) -> RepositoryResult<Vec<RemainingInventory>>;
}

/// Read-only operations over the treasurer's ledger.
pub trait FinanceReader {
    fn get_expense_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<FinanceExpense>>;
    fn list_expenses(
        &self,
        query: FinanceExpenseListQuery,
    ) -> RepositoryResult<(usize, Vec<FinanceExpense>)>;
    fn finance_summary(&self, hub_id: i32) -> RepositoryResult<FinanceSummary>;
}

/// Write operations over the treasurer's ledger.
pub trait FinanceWriter {
    fn create_expense(&self, new_expense: &NewFinanceExpense) -> RepositoryResult<FinanceExpense>;
    fn update_expense(
        &self,
        expense_id: i32,
        hub_id: i32,
        updates: &UpdateFinanceExpense,
    ) -> RepositoryResult<FinanceExpense>;
    fn delete_expense(&self, expense_id: i32, hub_id: i32) -> RepositoryResult<()>;
}
