use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::ParseEnumError;
use crate::domain::hall::Hall;
use crate::domain::inventory::StockKey;

/// Delivery state of an order or of a single order item.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Awaiting delivery.
    #[default]
    Pending,
    /// Handed over to the customer.
    Delivered,
    /// Will not be delivered.
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    /// Order-level status for a set of item statuses.
    ///
    /// Delivered only when every item is delivered, cancelled only when every
    /// item is cancelled, pending otherwise (including an empty set).
    pub fn derive<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = DeliveryStatus>,
    {
        let mut seen_any = false;
        let mut all_delivered = true;
        let mut all_cancelled = true;

        for status in statuses {
            seen_any = true;
            all_delivered &= status == DeliveryStatus::Delivered;
            all_cancelled &= status == DeliveryStatus::Cancelled;
        }

        match (seen_any, all_delivered, all_cancelled) {
            (true, true, _) => DeliveryStatus::Delivered,
            (true, _, true) => DeliveryStatus::Cancelled,
            _ => DeliveryStatus::Pending,
        }
    }

    /// Whether an item in this status keeps its quantity out of remaining stock.
    pub fn holds_stock(self) -> bool {
        self != DeliveryStatus::Cancelled
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DeliveryStatus::Pending),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            _ => Err(ParseEnumError::new("delivery status", value)),
        }
    }
}

/// Contact details of the customer placing an order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub alt_phone: Option<String>,
    /// Institute roll number.
    pub roll: Option<String>,
}

/// One priced line within an order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    /// Product and variant name captured when the line was priced.
    pub name: String,
    pub quantity: i32,
    /// Catalog price in paise captured when the line was priced.
    pub unit_price: i64,
    /// `unit_price * quantity` in paise.
    pub total_price: i64,
    pub amount_paid: i64,
    pub discount: i64,
    pub delivery_status: DeliveryStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl OrderItem {
    pub fn stock_key(&self) -> StockKey {
        StockKey::new(self.product_id, self.variant_id)
    }
}

/// Domain representation of a customer order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i32,
    pub hub_id: i32,
    pub customer: CustomerDetails,
    pub hall: Hall,
    pub delivery_date: NaiveDate,
    /// Sum of item totals in paise.
    pub total_amount: i64,
    /// Sum of item payments in paise.
    pub total_paid: i64,
    /// Sum of item discounts in paise.
    pub total_discount: i64,
    pub delivery_status: DeliveryStatus,
    /// Local user id of the staff member who entered the order.
    pub created_by: i32,
    pub items: Vec<OrderItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Order {
    /// Amount still owed by the customer in paise.
    pub fn amount_due(&self) -> i64 {
        self.total_amount
            .saturating_sub(self.total_discount)
            .saturating_sub(self.total_paid)
    }

    pub fn item(&self, item_id: i32) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

/// Priced line ready to be written to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub amount_paid: i64,
    pub discount: i64,
}

/// Payload required to insert a new order with its items.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub hub_id: i32,
    pub customer: CustomerDetails,
    pub hall: Hall,
    pub delivery_date: NaiveDate,
    pub created_by: i32,
    pub items: Vec<NewOrderItem>,
    pub updated_at: NaiveDateTime,
}

impl NewOrder {
    pub fn new(
        hub_id: i32,
        customer: CustomerDetails,
        hall: Hall,
        delivery_date: NaiveDate,
        created_by: i32,
        items: Vec<NewOrderItem>,
    ) -> Self {
        Self {
            hub_id,
            customer,
            hall,
            delivery_date,
            created_by,
            items,
            updated_at: chrono::Local::now().naive_utc(),
        }
    }
}

/// Changes computed by diffing an edited item list against the stored order.
///
/// Aggregates are not part of the revision: they are recomputed from the
/// resulting item set when the revision is written.
#[derive(Debug, Clone)]
pub struct OrderRevision {
    pub customer: CustomerDetails,
    pub hall: Hall,
    pub delivery_date: NaiveDate,
    /// Existing items re-priced in place, keyed by item id.
    pub updated_items: Vec<(i32, NewOrderItem)>,
    /// Lines without an id.
    pub new_items: Vec<NewOrderItem>,
    /// Existing item ids absent from the edited list.
    pub removed_item_ids: Vec<i32>,
    pub updated_at: NaiveDateTime,
}

/// Query definition used to list orders for a hub.
#[derive(Debug, Clone)]
pub struct OrderListQuery {
    pub hub_id: i32,
    pub status: Option<DeliveryStatus>,
    pub hall: Option<Hall>,
    /// Only orders due on or before this date.
    pub due_by: Option<NaiveDate>,
    pub created_by: Option<i32>,
    /// Matches customer name, phone or roll number.
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl OrderListQuery {
    /// Construct a query that targets all orders belonging to `hub_id`.
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            status: None,
            hall: None,
            due_by: None,
            created_by: None,
            search: None,
            pagination: None,
        }
    }

    pub fn status(mut self, status: DeliveryStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn hall(mut self, hall: Hall) -> Self {
        self.hall = Some(hall);
        self
    }

    pub fn due_by(mut self, date: NaiveDate) -> Self {
        self.due_by = Some(date);
        self
    }

    pub fn created_by(mut self, user_id: i32) -> Self {
        self.created_by = Some(user_id);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
