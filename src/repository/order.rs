use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::inventory::StockKey,
    domain::ledger::{held_stock, hold_deltas},
    domain::order::{
        DeliveryStatus, NewOrder as DomainNewOrder, Order as DomainOrder,
        OrderItem as DomainOrderItem, OrderListQuery, OrderRevision,
    },
    domain::pricing::OrderTotals,
    models::order::{
        NewOrder as DbNewOrder, NewOrderItem as DbNewOrderItem, Order as DbOrder,
        OrderAggregates as DbOrderAggregates, OrderItem as DbOrderItem,
        RepriceOrderItem as DbRepriceOrderItem, UpdateCustomer as DbUpdateCustomer,
    },
    repository::inventory::apply_stock_delta,
    repository::{DieselRepository, OrderReader, OrderWriter},
};

fn load_items(conn: &mut SqliteConnection, order_id: i32) -> RepositoryResult<Vec<DomainOrderItem>> {
    use crate::schema::order_items;

    let rows = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::id.asc())
        .load::<DbOrderItem>(conn)?;

    Ok(rows
        .into_iter()
        .map(DbOrderItem::into_domain)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Arithmetic overflow while recomputing an order. Reported as a query error
/// so the surrounding transaction rolls back.
fn overflow(what: &str) -> RepositoryError {
    diesel::result::Error::QueryBuilderError(format!("{what} overflows").into()).into()
}

fn holdings(items: &[DomainOrderItem]) -> RepositoryResult<HashMap<StockKey, i32>> {
    held_stock(
        items
            .iter()
            .map(|item| (item.stock_key(), item.quantity, item.delivery_status)),
    )
    .ok_or_else(|| overflow("held stock"))
}

fn stock_deltas(
    before: &HashMap<StockKey, i32>,
    after: &HashMap<StockKey, i32>,
) -> RepositoryResult<Vec<(StockKey, i32)>> {
    hold_deltas(before, after).ok_or_else(|| overflow("stock delta"))
}

fn find_order(conn: &mut SqliteConnection, order_id: i32, hub_id: i32) -> RepositoryResult<DbOrder> {
    use crate::schema::orders;

    orders::table
        .filter(orders::id.eq(order_id))
        .filter(orders::hub_id.eq(hub_id))
        .first::<DbOrder>(conn)
        .optional()?
        .ok_or(RepositoryError::NotFound)
}

/// Recompute the order's aggregates from its current items and move the
/// stock held by the order from `before` to what the items hold now.
fn sync_order(
    conn: &mut SqliteConnection,
    order_id: i32,
    hub_id: i32,
    before: &HashMap<StockKey, i32>,
) -> RepositoryResult<DomainOrder> {
    use crate::schema::orders;

    let items = load_items(conn, order_id)?;
    let totals = OrderTotals::from_lines(items.iter()).ok_or_else(|| overflow("order total"))?;
    let status = DeliveryStatus::derive(items.iter().map(|item| item.delivery_status));

    let updated = diesel::update(orders::table.find(order_id))
        .set(&DbOrderAggregates {
            total_amount: totals.total_amount,
            total_paid: totals.total_paid,
            total_discount: totals.total_discount,
            delivery_status: status.as_str(),
        })
        .get_result::<DbOrder>(conn)?;

    for (key, delta) in stock_deltas(before, &holdings(&items)?)? {
        apply_stock_delta(conn, hub_id, key, delta)?;
    }

    let mut order = updated.into_domain(Vec::new())?;
    order.items = items;
    Ok(order)
}

impl OrderReader for DieselRepository {
    fn get_order_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<DomainOrder>> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;
        let order = orders::table
            .filter(orders::id.eq(id))
            .filter(orders::hub_id.eq(hub_id))
            .first::<DbOrder>(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = order_items::table
            .filter(order_items::order_id.eq(order.id))
            .order(order_items::id.asc())
            .load::<DbOrderItem>(&mut conn)?;

        Ok(Some(order.into_domain(items)?))
    }

    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<DomainOrder>)> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        let OrderListQuery {
            hub_id,
            status,
            hall,
            due_by,
            created_by,
            search,
            pagination,
        } = query;

        let search_pattern = search.as_ref().map(|term| format!("%{}%", term));

        let mut count_query = orders::table
            .filter(orders::hub_id.eq(hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(status) = status {
            count_query = count_query.filter(orders::delivery_status.eq(status.as_str()));
        }

        if let Some(hall) = hall {
            count_query = count_query.filter(orders::hall.eq(hall.as_str()));
        }

        if let Some(date) = due_by {
            count_query = count_query.filter(orders::delivery_date.le(date));
        }

        if let Some(user_id) = created_by {
            count_query = count_query.filter(orders::created_by.eq(user_id));
        }

        if let Some(ref pattern) = search_pattern {
            count_query = count_query.filter(
                orders::customer_name
                    .like(pattern.clone())
                    .or(orders::customer_phone.like(pattern.clone()))
                    .or(orders::customer_roll.like(pattern.clone())),
            );
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = orders::table
            .filter(orders::hub_id.eq(hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(status) = status {
            items = items.filter(orders::delivery_status.eq(status.as_str()));
        }

        if let Some(hall) = hall {
            items = items.filter(orders::hall.eq(hall.as_str()));
        }

        if let Some(date) = due_by {
            items = items.filter(orders::delivery_date.le(date));
        }

        if let Some(user_id) = created_by {
            items = items.filter(orders::created_by.eq(user_id));
        }

        if let Some(ref pattern) = search_pattern {
            items = items.filter(
                orders::customer_name
                    .like(pattern.clone())
                    .or(orders::customer_phone.like(pattern.clone()))
                    .or(orders::customer_roll.like(pattern.clone())),
            );
        }

        items = items.order((orders::delivery_date.asc(), orders::created_at.desc()));

        if let Some(pagination) = pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let db_orders = items.load::<DbOrder>(&mut conn)?;
        if db_orders.is_empty() {
            return Ok((total, Vec::new()));
        }

        let order_ids: Vec<i32> = db_orders.iter().map(|order| order.id).collect();

        let mut items_by_order: HashMap<i32, Vec<DbOrderItem>> = HashMap::new();

        let rows = order_items::table
            .filter(order_items::order_id.eq_any(&order_ids))
            .order(order_items::id.asc())
            .load::<DbOrderItem>(&mut conn)?;

        for item in rows {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let orders = db_orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                order.into_domain(items)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, orders))
    }
}

impl OrderWriter for DieselRepository {
    fn create_order(&self, new_order: &DomainNewOrder) -> RepositoryResult<DomainOrder> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let created = diesel::insert_into(orders::table)
                .values(&DbNewOrder::from(new_order))
                .get_result::<DbOrder>(conn)?;

            let order_id = created.id;

            if !new_order.items.is_empty() {
                let payload: Vec<DbNewOrderItem> = new_order
                    .items
                    .iter()
                    .map(|item| DbNewOrderItem::from_domain(order_id, item, new_order.updated_at))
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(&payload)
                    .execute(conn)?;
            }

            sync_order(conn, order_id, created.hub_id, &HashMap::new())
        })
    }

    fn revise_order(
        &self,
        order_id: i32,
        hub_id: i32,
        revision: &OrderRevision,
    ) -> RepositoryResult<DomainOrder> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let order = find_order(conn, order_id, hub_id)?;
            let before = holdings(&load_items(conn, order.id)?)?;

            diesel::update(orders::table.find(order.id))
                .set(&DbUpdateCustomer {
                    customer_name: revision.customer.name.as_str(),
                    customer_phone: revision.customer.phone.as_str(),
                    customer_alt_phone: revision.customer.alt_phone.as_deref(),
                    customer_roll: revision.customer.roll.as_deref(),
                    hall: revision.hall.as_str(),
                    delivery_date: revision.delivery_date,
                    updated_at: revision.updated_at,
                })
                .execute(conn)?;

            if !revision.removed_item_ids.is_empty() {
                diesel::delete(
                    order_items::table
                        .filter(order_items::order_id.eq(order.id))
                        .filter(order_items::id.eq_any(&revision.removed_item_ids)),
                )
                .execute(conn)?;
            }

            for (item_id, item) in &revision.updated_items {
                let changed = diesel::update(
                    order_items::table
                        .filter(order_items::id.eq(*item_id))
                        .filter(order_items::order_id.eq(order.id)),
                )
                .set(&DbRepriceOrderItem::from_domain(item, revision.updated_at))
                .execute(conn)?;

                if changed == 0 {
                    return Err(RepositoryError::NotFound);
                }
            }

            if !revision.new_items.is_empty() {
                let payload: Vec<DbNewOrderItem> = revision
                    .new_items
                    .iter()
                    .map(|item| DbNewOrderItem::from_domain(order.id, item, revision.updated_at))
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(&payload)
                    .execute(conn)?;
            }

            sync_order(conn, order.id, hub_id, &before)
        })
    }

    fn delete_order(&self, order_id: i32, hub_id: i32) -> RepositoryResult<()> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<(), RepositoryError, _>(|conn| {
            let order = find_order(conn, order_id, hub_id)?;
            let before = holdings(&load_items(conn, order.id)?)?;

            diesel::delete(order_items::table.filter(order_items::order_id.eq(order.id)))
                .execute(conn)?;
            diesel::delete(orders::table.find(order.id)).execute(conn)?;

            for (key, delta) in stock_deltas(&before, &HashMap::new())? {
                apply_stock_delta(conn, hub_id, key, delta)?;
            }

            Ok(())
        })
    }

    fn set_item_status(
        &self,
        item_id: i32,
        hub_id: i32,
        status: DeliveryStatus,
    ) -> RepositoryResult<DomainOrder> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let order_id = order_items::table
                .inner_join(orders::table)
                .filter(order_items::id.eq(item_id))
                .filter(orders::hub_id.eq(hub_id))
                .select(order_items::order_id)
                .first::<i32>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let before = holdings(&load_items(conn, order_id)?)?;

            diesel::update(order_items::table.find(item_id))
                .set((
                    order_items::delivery_status.eq(status.as_str()),
                    order_items::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;

            sync_order(conn, order_id, hub_id, &before)
        })
    }

    fn set_items_status(
        &self,
        item_ids: &[i32],
        hub_id: i32,
        status: DeliveryStatus,
    ) -> RepositoryResult<usize> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<usize, RepositoryError, _>(|conn| {
            let rows = order_items::table
                .inner_join(orders::table)
                .filter(order_items::id.eq_any(item_ids))
                .filter(orders::hub_id.eq(hub_id))
                .select((order_items::id, order_items::order_id))
                .load::<(i32, i32)>(conn)?;

            if rows.len() != item_ids.len() {
                return Err(RepositoryError::NotFound);
            }

            let mut order_ids: Vec<i32> = rows.iter().map(|(_, order_id)| *order_id).collect();
            order_ids.sort_unstable();
            order_ids.dedup();

            let now = Utc::now().naive_utc();

            for order_id in &order_ids {
                let before = holdings(&load_items(conn, *order_id)?)?;

                diesel::update(
                    order_items::table
                        .filter(order_items::order_id.eq(*order_id))
                        .filter(order_items::id.eq_any(item_ids)),
                )
                .set((
                    order_items::delivery_status.eq(status.as_str()),
                    order_items::updated_at.eq(now),
                ))
                .execute(conn)?;

                sync_order(conn, *order_id, hub_id, &before)?;
            }

            Ok(order_ids.len())
        })
    }

    fn set_order_status(
        &self,
        order_id: i32,
        hub_id: i32,
        status: DeliveryStatus,
    ) -> RepositoryResult<DomainOrder> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let order = find_order(conn, order_id, hub_id)?;
            let before = holdings(&load_items(conn, order.id)?)?;
            let now = Utc::now().naive_utc();

            diesel::update(order_items::table.filter(order_items::order_id.eq(order.id)))
                .set((
                    order_items::delivery_status.eq(status.as_str()),
                    order_items::updated_at.eq(now),
                ))
                .execute(conn)?;

            diesel::update(orders::table.find(order.id))
                .set(orders::updated_at.eq(now))
                .execute(conn)?;

            sync_order(conn, order.id, hub_id, &before)
        })
    }

    fn roll_over_orders(&self, hub_id: i32, today: NaiveDate) -> RepositoryResult<usize> {
        use crate::schema::orders;

        let mut conn = self.conn()?;

        let target = orders::table
            .filter(orders::hub_id.eq(hub_id))
            .filter(orders::delivery_status.eq(DeliveryStatus::Pending.as_str()))
            .filter(orders::delivery_date.lt(today));

        let moved = diesel::update(target)
            .set((
                orders::delivery_date.eq(today),
                orders::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;

        Ok(moved)
    }
}
