pub mod domain;
pub mod forms;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

/// Passes every role check.
pub const ADMIN_ROLE: &str = "admin";
/// Enters and edits orders.
pub const SALES_ROLE: &str = "sales";
/// Works the delivery dashboard.
pub const DELIVERY_ROLE: &str = "delivery";
/// Keeps the finance ledger and the stock records.
pub const TREASURER_ROLE: &str = "treasurer";
