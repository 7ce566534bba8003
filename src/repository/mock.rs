use chrono::NaiveDate;
use mockall::mock;

use super::{
    FinanceReader, FinanceWriter, InventoryReader, InventoryWriter, OrderReader, OrderWriter,
    ProductReader, ProductWriter, StockLedger, UserReader, UserWriter,
};
use crate::domain::{
    finance::{
        FinanceExpense, FinanceExpenseListQuery, FinanceSummary, NewFinanceExpense,
        UpdateFinanceExpense,
    },
    inventory::{
        Inventory, InventoryListQuery, NewInventory, RemainingInventory, StockKey,
        UpdateInventory,
    },
    order::{DeliveryStatus, NewOrder, Order, OrderListQuery, OrderRevision},
    product::{NewProduct, Product, ProductListQuery, ProductUpdate, UpdateProduct},
    user::{NewUser, User},
};
use pushkind_common::repository::errors::RepositoryResult;

mock! {
    pub Repository {}

    impl UserReader for Repository {
        fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>>;
    }

    impl UserWriter for Repository {
        fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
    }

    impl ProductReader for Repository {
        fn get_product_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Product>>;
        fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
    }

    impl ProductWriter for Repository {
        fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
        fn update_product(&self, product_id: i32, hub_id: i32, updates: &UpdateProduct) -> RepositoryResult<ProductUpdate>;
    }

    impl OrderReader for Repository {
        fn get_order_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Order>>;
        fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
    }

    impl OrderWriter for Repository {
        fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
        fn revise_order(&self, order_id: i32, hub_id: i32, revision: &OrderRevision) -> RepositoryResult<Order>;
        fn delete_order(&self, order_id: i32, hub_id: i32) -> RepositoryResult<()>;
        fn set_item_status(&self, item_id: i32, hub_id: i32, status: DeliveryStatus) -> RepositoryResult<Order>;
        fn set_items_status(&self, item_ids: &[i32], hub_id: i32, status: DeliveryStatus) -> RepositoryResult<usize>;
        fn set_order_status(&self, order_id: i32, hub_id: i32, status: DeliveryStatus) -> RepositoryResult<Order>;
        fn roll_over_orders(&self, hub_id: i32, today: NaiveDate) -> RepositoryResult<usize>;
    }

    impl InventoryReader for Repository {
        fn get_inventory_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Inventory>>;
        fn list_inventory(&self, query: InventoryListQuery) -> RepositoryResult<(usize, Vec<Inventory>)>;
    }

    impl InventoryWriter for Repository {
        fn create_inventory(&self, new_inventory: &NewInventory) -> RepositoryResult<Inventory>;
        fn update_inventory(&self, inventory_id: i32, hub_id: i32, updates: &UpdateInventory) -> RepositoryResult<Inventory>;
        fn delete_inventory(&self, inventory_id: i32, hub_id: i32) -> RepositoryResult<()>;
    }

    impl StockLedger for Repository {
        fn adjust_stock(&self, hub_id: i32, key: StockKey, delta: i32) -> RepositoryResult<Option<RemainingInventory>>;
        fn get_remaining_stock(&self, hub_id: i32, key: StockKey) -> RepositoryResult<Option<RemainingInventory>>;
        fn list_remaining_stock(&self, hub_id: i32) -> RepositoryResult<Vec<RemainingInventory>>;
    }

    impl FinanceReader for Repository {
        fn get_expense_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<FinanceExpense>>;
        fn list_expenses(&self, query: FinanceExpenseListQuery) -> RepositoryResult<(usize, Vec<FinanceExpense>)>;
        fn finance_summary(&self, hub_id: i32) -> RepositoryResult<FinanceSummary>;
    }

    impl FinanceWriter for Repository {
        fn create_expense(&self, new_expense: &NewFinanceExpense) -> RepositoryResult<FinanceExpense>;
        fn update_expense(&self, expense_id: i32, hub_id: i32, updates: &UpdateFinanceExpense) -> RepositoryResult<FinanceExpense>;
        fn delete_expense(&self, expense_id: i32, hub_id: i32) -> RepositoryResult<()>;
    }
}
