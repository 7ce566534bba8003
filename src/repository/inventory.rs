use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::inventory::{
        Inventory as DomainInventory, InventoryListQuery, NewInventory as DomainNewInventory,
        RemainingInventory as DomainRemainingInventory, StockKey,
        UpdateInventory as DomainUpdateInventory,
    },
    domain::ledger::{next_quantity, receipt_deltas},
    models::inventory::{
        Inventory as DbInventory, NewInventory as DbNewInventory,
        NewRemainingInventory as DbNewRemainingInventory,
        RemainingInventory as DbRemainingInventory, UpdateInventory as DbUpdateInventory,
    },
    repository::{DieselRepository, InventoryReader, InventoryWriter, StockLedger},
};

/// Apply `delta` to the remaining-stock counter for `key` on an open
/// connection. Callers run this inside their own transaction.
pub(crate) fn apply_stock_delta(
    conn: &mut SqliteConnection,
    hub_id: i32,
    key: StockKey,
    delta: i32,
) -> RepositoryResult<Option<DbRemainingInventory>> {
    use crate::schema::remaining_inventory;

    let mut lookup = remaining_inventory::table
        .filter(remaining_inventory::hub_id.eq(hub_id))
        .filter(remaining_inventory::product_id.eq(key.product_id))
        .into_boxed::<diesel::sqlite::Sqlite>();

    lookup = match key.variant_id {
        Some(variant_id) => lookup.filter(remaining_inventory::variant_id.eq(variant_id)),
        None => lookup.filter(remaining_inventory::variant_id.is_null()),
    };

    let current = lookup.first::<DbRemainingInventory>(conn).optional()?;

    let Some(quantity) = next_quantity(current.as_ref().map(|row| row.quantity), delta) else {
        log::warn!(
            "skipping stock adjustment of {delta} for product {} variant {:?}: no counter",
            key.product_id,
            key.variant_id
        );
        return Ok(None);
    };

    let row = match current {
        Some(row) => {
            log::debug!(
                "stock for product {} variant {:?}: {} {delta:+} -> {quantity}",
                key.product_id,
                key.variant_id,
                row.quantity
            );
            diesel::update(remaining_inventory::table.find(row.id))
                .set((
                    remaining_inventory::quantity.eq(quantity),
                    remaining_inventory::updated_at.eq(Utc::now().naive_utc()),
                ))
                .get_result::<DbRemainingInventory>(conn)?
        }
        None => {
            log::debug!(
                "opening stock counter for product {} variant {:?} at {quantity}",
                key.product_id,
                key.variant_id
            );
            diesel::insert_into(remaining_inventory::table)
                .values(&DbNewRemainingInventory {
                    hub_id,
                    product_id: key.product_id,
                    variant_id: key.variant_id,
                    quantity,
                })
                .get_result::<DbRemainingInventory>(conn)?
        }
    };

    Ok(Some(row))
}

fn apply_receipt(
    conn: &mut SqliteConnection,
    hub_id: i32,
    old: Option<(StockKey, i32)>,
    new: Option<(StockKey, i32)>,
) -> RepositoryResult<()> {
    for (key, delta) in receipt_deltas(old, new) {
        apply_stock_delta(conn, hub_id, key, delta)?;
    }
    Ok(())
}

impl InventoryReader for DieselRepository {
    fn get_inventory_by_id(
        &self,
        id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Option<DomainInventory>> {
        use crate::schema::inventory;

        let mut conn = self.conn()?;
        let record = inventory::table
            .filter(inventory::id.eq(id))
            .filter(inventory::hub_id.eq(hub_id))
            .first::<DbInventory>(&mut conn)
            .optional()?;

        Ok(record.map(Into::into))
    }

    fn list_inventory(
        &self,
        query: InventoryListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainInventory>)> {
        use crate::schema::inventory;

        let mut conn = self.conn()?;

        let mut count_query = inventory::table
            .filter(inventory::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(product_id) = query.product_id {
            count_query = count_query.filter(inventory::product_id.eq(product_id));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = inventory::table
            .filter(inventory::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(product_id) = query.product_id {
            items = items.filter(inventory::product_id.eq(product_id));
        }

        items = items.order((inventory::date_received.desc(), inventory::id.desc()));

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let records = items.load::<DbInventory>(&mut conn)?;

        Ok((total, records.into_iter().map(Into::into).collect()))
    }
}

impl InventoryWriter for DieselRepository {
    fn create_inventory(
        &self,
        new_inventory: &DomainNewInventory,
    ) -> RepositoryResult<DomainInventory> {
        use crate::schema::inventory;

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainInventory, RepositoryError, _>(|conn| {
            let created = diesel::insert_into(inventory::table)
                .values(&DbNewInventory::from(new_inventory))
                .get_result::<DbInventory>(conn)?;

            apply_receipt(
                conn,
                created.hub_id,
                None,
                Some((new_inventory.key, created.quantity_added)),
            )?;

            Ok(created.into())
        })
    }

    fn update_inventory(
        &self,
        inventory_id: i32,
        hub_id: i32,
        updates: &DomainUpdateInventory,
    ) -> RepositoryResult<DomainInventory> {
        use crate::schema::inventory;

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainInventory, RepositoryError, _>(|conn| {
            let existing = inventory::table
                .filter(inventory::id.eq(inventory_id))
                .filter(inventory::hub_id.eq(hub_id))
                .first::<DbInventory>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let updated = diesel::update(inventory::table.find(existing.id))
                .set(&DbUpdateInventory::from(updates))
                .get_result::<DbInventory>(conn)?;

            apply_receipt(
                conn,
                hub_id,
                Some((
                    StockKey::new(existing.product_id, existing.variant_id),
                    existing.quantity_added,
                )),
                Some((updates.key, updated.quantity_added)),
            )?;

            Ok(updated.into())
        })
    }

    fn delete_inventory(&self, inventory_id: i32, hub_id: i32) -> RepositoryResult<()> {
        use crate::schema::inventory;

        let mut conn = self.conn()?;

        conn.immediate_transaction::<(), RepositoryError, _>(|conn| {
            let existing = inventory::table
                .filter(inventory::id.eq(inventory_id))
                .filter(inventory::hub_id.eq(hub_id))
                .first::<DbInventory>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            diesel::delete(inventory::table.find(existing.id)).execute(conn)?;

            apply_receipt(
                conn,
                hub_id,
                Some((
                    StockKey::new(existing.product_id, existing.variant_id),
                    existing.quantity_added,
                )),
                None,
            )
        })
    }
}

impl StockLedger for DieselRepository {
    fn adjust_stock(
        &self,
        hub_id: i32,
        key: StockKey,
        delta: i32,
    ) -> RepositoryResult<Option<DomainRemainingInventory>> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            Ok(apply_stock_delta(conn, hub_id, key, delta)?.map(Into::into))
        })
    }

    fn get_remaining_stock(
        &self,
        hub_id: i32,
        key: StockKey,
    ) -> RepositoryResult<Option<DomainRemainingInventory>> {
        use crate::schema::remaining_inventory;

        let mut conn = self.conn()?;

        let mut lookup = remaining_inventory::table
            .filter(remaining_inventory::hub_id.eq(hub_id))
            .filter(remaining_inventory::product_id.eq(key.product_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        lookup = match key.variant_id {
            Some(variant_id) => lookup.filter(remaining_inventory::variant_id.eq(variant_id)),
            None => lookup.filter(remaining_inventory::variant_id.is_null()),
        };

        let row = lookup.first::<DbRemainingInventory>(&mut conn).optional()?;
        Ok(row.map(Into::into))
    }

    fn list_remaining_stock(&self, hub_id: i32) -> RepositoryResult<Vec<DomainRemainingInventory>> {
        use crate::schema::remaining_inventory;

        let mut conn = self.conn()?;

        let rows = remaining_inventory::table
            .filter(remaining_inventory::hub_id.eq(hub_id))
            .order((
                remaining_inventory::product_id.asc(),
                remaining_inventory::variant_id.asc(),
            ))
            .load::<DbRemainingInventory>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
