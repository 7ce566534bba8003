use std::collections::HashMap;

use pushkind_common::domain::auth::AuthenticatedUser;
use serde::Serialize;

use crate::domain::inventory::{RemainingInventory, StockKey};
use crate::domain::ledger::StockMovement;
use crate::domain::pricing::{PricingError, resolve_stock_key};
use crate::domain::product::{Product, ProductListQuery};
use crate::repository::{ProductReader, StockLedger};
use crate::services::{ServiceError, ServiceResult, ensure_any_role};
use crate::{SALES_ROLE, TREASURER_ROLE};

/// One remaining-stock counter with the names needed to display it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StockRow {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub name: String,
    pub quantity: i32,
}

/// Remaining stock for the hub, ordered by product and variant.
pub fn load_stock<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<StockRow>>
where
    R: ProductReader + StockLedger + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE, SALES_ROLE])?;

    let counters = repo
        .list_remaining_stock(user.hub_id)
        .map_err(ServiceError::from)?;
    let names = ProductNames::load(repo, user.hub_id)?;

    Ok(counters
        .into_iter()
        .map(|counter| StockRow {
            product_id: counter.product_id,
            variant_id: counter.variant_id,
            name: names.name(counter.stock_key()),
            quantity: counter.quantity,
        })
        .collect())
}

/// Applies a manual receive, consume or restore to one counter.
///
/// Returns `None` when a consumption targets a key that has no counter yet.
pub fn apply_movement<R>(
    repo: &R,
    user: &AuthenticatedUser,
    key: StockKey,
    movement: StockMovement,
) -> ServiceResult<Option<RemainingInventory>>
where
    R: ProductReader + StockLedger + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    let key = catalog_stock_key(repo, user.hub_id, key)?;

    log::info!(
        "{} applied {:?} to product #{} variant {:?}",
        user.email,
        movement,
        key.product_id,
        key.variant_id
    );

    repo.adjust_stock(user.hub_id, key, movement.delta())
        .map_err(ServiceError::from)
}

/// Checks that `key` names a product of the hub and a variant matching the
/// product's pricing mode.
pub(crate) fn catalog_stock_key<R>(repo: &R, hub_id: i32, key: StockKey) -> ServiceResult<StockKey>
where
    R: ProductReader + ?Sized,
{
    let product = repo
        .get_product_by_id(key.product_id, hub_id)
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::Form(PricingError::UnknownProduct(key.product_id).to_string()))?;

    resolve_stock_key(&product, key.variant_id).map_err(|err| ServiceError::Form(err.to_string()))
}

/// Display names of every product of a hub, archived ones included.
pub(crate) struct ProductNames {
    products: HashMap<i32, Product>,
}

impl ProductNames {
    pub(crate) fn load<R>(repo: &R, hub_id: i32) -> ServiceResult<Self>
    where
        R: ProductReader + ?Sized,
    {
        let (_, products) = repo
            .list_products(ProductListQuery::new(hub_id).include_archived())
            .map_err(ServiceError::from)?;

        Ok(Self {
            products: products
                .into_iter()
                .map(|product| (product.id, product))
                .collect(),
        })
    }

    pub(crate) fn name(&self, key: StockKey) -> String {
        match self.products.get(&key.product_id) {
            Some(product) => {
                let variant = key.variant_id.and_then(|id| product.variant(id));
                product.display_name(variant)
            }
            None => format!("#{}", key.product_id),
        }
    }
}
