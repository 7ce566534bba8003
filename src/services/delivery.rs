//! Hall-by-hall delivery dashboard.
//!
//! Couriers work from the list of pending orders due on or before a date,
//! grouped by hall. Status changes go through the order repository so held
//! stock follows every cancellation and un-cancellation.

use chrono::NaiveDate;
use pushkind_common::domain::auth::AuthenticatedUser;
use serde::Serialize;

use crate::DELIVERY_ROLE;
use crate::domain::hall::Hall;
use crate::domain::order::{DeliveryStatus, Order, OrderListQuery};
use crate::forms::delivery::DeliveryQuery;
use crate::repository::{OrderReader, OrderWriter};
use crate::services::{ServiceError, ServiceResult, ensure_any_role};

/// Pending orders of one hall.
#[derive(Debug, Serialize)]
pub struct HallGroup {
    pub hall: Hall,
    pub hall_id: &'static str,
    pub label: &'static str,
    pub orders: Vec<Order>,
}

impl HallGroup {
    pub fn count(&self) -> usize {
        self.orders.len()
    }
}

pub struct DeliveryPageData {
    pub date: NaiveDate,
    pub hall: Option<Hall>,
    /// Halls with at least one pending order, in display order.
    pub groups: Vec<HallGroup>,
    pub total_orders: usize,
}

pub fn load_delivery_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: DeliveryQuery,
    today: NaiveDate,
) -> ServiceResult<DeliveryPageData>
where
    R: OrderReader + ?Sized,
{
    ensure_any_role(user, &[DELIVERY_ROLE])?;

    let hall = query
        .hall()
        .map_err(|err| ServiceError::Form(err.to_string()))?;
    let date = query.date.unwrap_or(today);

    let mut list_query = OrderListQuery::new(user.hub_id)
        .status(DeliveryStatus::Pending)
        .due_by(date);
    if let Some(hall) = hall {
        list_query = list_query.hall(hall);
    }

    let (total_orders, orders) = repo.list_orders(list_query).map_err(ServiceError::from)?;

    Ok(DeliveryPageData {
        date,
        hall,
        groups: group_by_hall(orders),
        total_orders,
    })
}

fn group_by_hall(orders: Vec<Order>) -> Vec<HallGroup> {
    let mut groups: Vec<HallGroup> = Hall::ALL
        .into_iter()
        .map(|hall| HallGroup {
            hall,
            hall_id: hall.as_str(),
            label: hall.label(),
            orders: Vec::new(),
        })
        .collect();

    for order in orders {
        if let Some(group) = groups.iter_mut().find(|group| group.hall == order.hall) {
            group.orders.push(order);
        }
    }

    groups.retain(|group| group.count() > 0);
    groups
}

/// Changes the status of one item and returns its order with the recomputed
/// order-level status.
pub fn set_item_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    item_id: i32,
    status: DeliveryStatus,
) -> ServiceResult<Order>
where
    R: OrderWriter + ?Sized,
{
    ensure_any_role(user, &[DELIVERY_ROLE])?;

    let order = repo
        .set_item_status(item_id, user.hub_id, status)
        .map_err(ServiceError::from)?;
    log::info!(
        "{} set item #{item_id} of order #{} to {status}",
        user.email,
        order.id
    );
    Ok(order)
}

/// Applies `status` to every item of an order.
pub fn set_order_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    order_id: i32,
    status: DeliveryStatus,
) -> ServiceResult<Order>
where
    R: OrderWriter + ?Sized,
{
    ensure_any_role(user, &[DELIVERY_ROLE])?;

    let order = repo
        .set_order_status(order_id, user.hub_id, status)
        .map_err(ServiceError::from)?;
    log::info!("{} set order #{} to {status}", user.email, order.id);
    Ok(order)
}

/// Marks the selected items delivered. Returns the number of orders touched.
pub fn mark_delivered<R>(
    repo: &R,
    user: &AuthenticatedUser,
    item_ids: &[i32],
) -> ServiceResult<usize>
where
    R: OrderWriter + ?Sized,
{
    ensure_any_role(user, &[DELIVERY_ROLE])?;

    if item_ids.is_empty() {
        return Err(ServiceError::Form("select at least one item".to_string()));
    }

    repo.set_items_status(item_ids, user.hub_id, DeliveryStatus::Delivered)
        .map_err(ServiceError::from)
}

/// Moves every pending order due before `today` to `today`.
pub fn roll_over<R>(repo: &R, user: &AuthenticatedUser, today: NaiveDate) -> ServiceResult<usize>
where
    R: OrderWriter + ?Sized,
{
    ensure_any_role(user, &[DELIVERY_ROLE])?;

    let moved = repo
        .roll_over_orders(user.hub_id, today)
        .map_err(ServiceError::from)?;
    log::info!("rolled {moved} pending order(s) over to {today}");
    Ok(moved)
}
