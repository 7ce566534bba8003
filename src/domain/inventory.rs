use chrono::{NaiveDate, NaiveDateTime};
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

/// Identifies one remaining-stock counter: a product and, for variant
/// products, one of its variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: i32,
    pub variant_id: Option<i32>,
}

impl StockKey {
    pub fn new(product_id: i32, variant_id: Option<i32>) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }
}

/// A received-stock event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inventory {
    pub id: i32,
    pub hub_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity_added: i32,
    /// Purchase cost per unit in paise.
    pub cost_per_unit: i64,
    pub dealer: Option<String>,
    pub date_received: NaiveDate,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Inventory {
    pub fn stock_key(&self) -> StockKey {
        StockKey::new(self.product_id, self.variant_id)
    }

    /// Total purchase cost of the batch in paise.
    pub fn total_cost(&self) -> i64 {
        self.cost_per_unit * i64::from(self.quantity_added)
    }
}

/// Payload required to record received stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventory {
    pub hub_id: i32,
    pub key: StockKey,
    pub quantity_added: i32,
    pub cost_per_unit: i64,
    pub dealer: Option<String>,
    pub date_received: NaiveDate,
    pub created_by: i32,
}

/// Replacement values for an existing inventory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInventory {
    pub key: StockKey,
    pub quantity_added: i32,
    pub cost_per_unit: i64,
    pub dealer: Option<String>,
    pub date_received: NaiveDate,
    pub updated_at: NaiveDateTime,
}

/// Current on-hand quantity for one stock key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemainingInventory {
    pub id: i32,
    pub hub_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
    pub updated_at: NaiveDateTime,
}

impl RemainingInventory {
    pub fn stock_key(&self) -> StockKey {
        StockKey::new(self.product_id, self.variant_id)
    }
}

/// Query definition used to list inventory records for a hub.
#[derive(Debug, Clone)]
pub struct InventoryListQuery {
    pub hub_id: i32,
    pub product_id: Option<i32>,
    pub pagination: Option<Pagination>,
}

impl InventoryListQuery {
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            product_id: None,
            pagination: None,
        }
    }

    pub fn product_id(mut self, product_id: i32) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
