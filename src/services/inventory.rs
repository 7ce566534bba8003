use chrono::NaiveDate;
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use serde::{Deserialize, Serialize};

use crate::TREASURER_ROLE;
use crate::domain::format_paise;
use crate::domain::inventory::{Inventory, InventoryListQuery};
use crate::forms::inventory::InventoryForm;
use crate::repository::{
    InventoryReader, InventoryWriter, ProductReader, StockLedger, UserReader, UserWriter,
};
use crate::services::stock::{ProductNames, StockRow, catalog_stock_key, load_stock};
use crate::services::{ServiceError, ServiceResult, ensure_any_role, ensure_user};

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    pub product_id: Option<i32>,
    pub page: Option<usize>,
}

/// Data required to render the inventory page.
pub struct InventoryPageData {
    /// Received-stock records, newest first.
    pub records: Paginated<InventoryView>,
    pub stock: Vec<StockRow>,
    pub product_id: Option<i32>,
}

/// Received-stock record with its display name and batch cost.
#[derive(Debug, Serialize)]
pub struct InventoryView {
    #[serde(flatten)]
    pub record: Inventory,
    pub name: String,
    pub cost_per_unit_display: String,
    pub total_cost_display: String,
}

impl InventoryView {
    fn new(record: Inventory, names: &ProductNames) -> Self {
        Self {
            name: names.name(record.stock_key()),
            cost_per_unit_display: format_paise(record.cost_per_unit),
            total_cost_display: format_paise(record.total_cost()),
            record,
        }
    }
}

pub fn load_inventory_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: InventoryQuery,
) -> ServiceResult<InventoryPageData>
where
    R: InventoryReader + ProductReader + StockLedger + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    let page = query.page.unwrap_or(1);
    let mut list_query =
        InventoryListQuery::new(user.hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(product_id) = query.product_id {
        list_query = list_query.product_id(product_id);
    }

    let (total, records) = repo.list_inventory(list_query).map_err(ServiceError::from)?;
    let names = ProductNames::load(repo, user.hub_id)?;

    let views = records
        .into_iter()
        .map(|record| InventoryView::new(record, &names))
        .collect();

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);

    Ok(InventoryPageData {
        records: Paginated::new(views, page, total_pages),
        stock: load_stock(repo, user)?,
        product_id: query.product_id,
    })
}

/// Records received stock. The matching counter grows by the received
/// quantity in the same transaction.
pub fn create_inventory<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: InventoryForm,
    today: NaiveDate,
) -> ServiceResult<Inventory>
where
    R: InventoryWriter + ProductReader + UserReader + UserWriter + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    let creator = ensure_user(repo, user)?;

    let mut new_inventory = form
        .into_new_inventory(user.hub_id, creator.id, today)
        .map_err(|err| ServiceError::Form(err.to_string()))?;
    new_inventory.key = catalog_stock_key(repo, user.hub_id, new_inventory.key)?;

    let record = repo
        .create_inventory(&new_inventory)
        .map_err(ServiceError::from)?;
    log::info!(
        "received {} unit(s) of product #{} variant {:?}",
        record.quantity_added,
        record.product_id,
        record.variant_id
    );
    Ok(record)
}

/// Corrects a received-stock record. The old receipt is reversed and the new
/// one applied to the ledger.
pub fn update_inventory<R>(
    repo: &R,
    user: &AuthenticatedUser,
    inventory_id: i32,
    form: InventoryForm,
    today: NaiveDate,
) -> ServiceResult<Inventory>
where
    R: InventoryWriter + ProductReader + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    let mut updates = form
        .into_update_inventory(today, chrono::Local::now().naive_utc())
        .map_err(|err| ServiceError::Form(err.to_string()))?;
    updates.key = catalog_stock_key(repo, user.hub_id, updates.key)?;

    repo.update_inventory(inventory_id, user.hub_id, &updates)
        .map_err(ServiceError::from)
}

/// Deletes a received-stock record and takes its quantity back out of the
/// ledger.
pub fn delete_inventory<R>(
    repo: &R,
    user: &AuthenticatedUser,
    inventory_id: i32,
) -> ServiceResult<()>
where
    R: InventoryWriter + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    repo.delete_inventory(inventory_id, user.hub_id)
        .map_err(ServiceError::from)
}
