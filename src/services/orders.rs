use std::collections::HashMap;

use chrono::NaiveDate;
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use serde::Deserialize;

use crate::domain::hall::Hall;
use crate::domain::order::{
    DeliveryStatus, NewOrder, NewOrderItem, Order, OrderListQuery, OrderRevision,
};
use crate::domain::pricing::{OrderTotals, PricingError, price_line, reprice_line};
use crate::domain::product::Product;
use crate::forms::orders::{OrderFormError, OrderPayload};
use crate::repository::{OrderReader, OrderWriter, ProductReader, UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult, ensure_any_role, ensure_user};
use crate::{DELIVERY_ROLE, SALES_ROLE};

/// Query parameters accepted by the orders index page and the list API.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Matches customer name, phone or roll number.
    pub search: Option<String>,
    pub hall: Option<String>,
    pub status: Option<String>,
    /// Page number requested by the user interface.
    pub page: Option<usize>,
}

/// Data required to render the orders index template.
pub struct IndexPageData {
    /// Paginated list of orders to show in the table.
    pub orders: Paginated<Order>,
    /// Search query echoed back to the template when present.
    pub search: Option<String>,
    pub hall: Option<Hall>,
    pub status: Option<DeliveryStatus>,
}

/// Result of editing an order's item list.
#[derive(Debug)]
pub enum ReconcileOutcome {
    Updated(Order),
    /// The edit removed every item, so the order itself was deleted.
    Deleted,
}

/// Loads one page of orders for the hub.
pub fn load_orders_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: IndexQuery,
) -> ServiceResult<IndexPageData>
where
    R: OrderReader + ?Sized,
{
    ensure_any_role(user, &[SALES_ROLE, DELIVERY_ROLE])?;

    let IndexQuery {
        search,
        hall,
        status,
        page,
    } = query;

    let search = search
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let hall = non_blank(hall)
        .map(|value| value.parse::<Hall>())
        .transpose()
        .map_err(|err| ServiceError::Form(err.to_string()))?;
    let status = non_blank(status)
        .map(|value| value.parse::<DeliveryStatus>())
        .transpose()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let page = page.unwrap_or(1);
    let mut list_query = OrderListQuery::new(user.hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(value) = search.as_ref() {
        list_query = list_query.search(value);
    }
    if let Some(hall) = hall {
        list_query = list_query.hall(hall);
    }
    if let Some(status) = status {
        list_query = list_query.status(status);
    }

    let (total, orders) = repo.list_orders(list_query).map_err(ServiceError::from)?;

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);
    let orders = Paginated::new(orders, page, total_pages);

    Ok(IndexPageData {
        orders,
        search,
        hall,
        status,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub fn get_order<R>(repo: &R, user: &AuthenticatedUser, order_id: i32) -> ServiceResult<Order>
where
    R: OrderReader + ?Sized,
{
    ensure_any_role(user, &[SALES_ROLE, DELIVERY_ROLE])?;

    repo.get_order_by_id(order_id, user.hub_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

/// Prices every requested line against the live catalog and stores the
/// order. The stock held by the new items is consumed in the same
/// transaction.
pub fn build_order<R>(
    repo: &R,
    user: &AuthenticatedUser,
    payload: OrderPayload,
    today: NaiveDate,
) -> ServiceResult<Order>
where
    R: ProductReader + OrderWriter + UserReader + UserWriter + ?Sized,
{
    ensure_any_role(user, &[SALES_ROLE])?;

    let draft = payload
        .into_draft(today)
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if draft.lines.is_empty() {
        return Err(ServiceError::Form(OrderFormError::NoItems.to_string()));
    }
    if draft.lines.iter().any(|line| line.id.is_some()) {
        return Err(ServiceError::Form(
            "a new order cannot reference existing items".to_string(),
        ));
    }

    let creator = ensure_user(repo, user)?;

    let mut catalog = Catalog::new(repo, user.hub_id);
    let mut items = Vec::with_capacity(draft.lines.len());
    for line in &draft.lines {
        let product = catalog.product(line.request.product_id)?;
        items.push(price_line(product, &line.request).map_err(pricing_error)?);
    }
    ensure_totals_fit(&items)?;

    let new_order = NewOrder::new(
        user.hub_id,
        draft.customer,
        draft.hall,
        draft.delivery_date,
        creator.id,
        items,
    );

    let order = repo.create_order(&new_order).map_err(ServiceError::from)?;
    log::info!(
        "order #{} created by user #{} with {} item(s)",
        order.id,
        creator.id,
        order.items.len()
    );
    Ok(order)
}

/// Applies an edited item list to an existing order.
///
/// Lines with an id update that item in place and re-resolve its price,
/// lines without an id are added, and stored items missing from the list are
/// removed. An empty list deletes the order.
pub fn reconcile_order<R>(
    repo: &R,
    user: &AuthenticatedUser,
    order_id: i32,
    payload: OrderPayload,
    today: NaiveDate,
) -> ServiceResult<ReconcileOutcome>
where
    R: ProductReader + OrderReader + OrderWriter + UserReader + ?Sized,
{
    ensure_any_role(user, &[SALES_ROLE])?;

    let existing = load_owned_order(repo, user, order_id)?;

    let draft = payload
        .into_draft(today)
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if draft.lines.is_empty() {
        repo.delete_order(existing.id, user.hub_id)
            .map_err(ServiceError::from)?;
        log::info!("order #{} deleted after its last item was removed", existing.id);
        return Ok(ReconcileOutcome::Deleted);
    }

    let mut catalog = Catalog::new(repo, user.hub_id);
    let mut updated_items: Vec<(i32, NewOrderItem)> = Vec::new();
    let mut new_items: Vec<NewOrderItem> = Vec::new();

    for line in &draft.lines {
        let product = catalog.product(line.request.product_id)?;
        match line.id {
            Some(item_id) => {
                let stored = existing.item(item_id).ok_or_else(|| {
                    ServiceError::Form(format!(
                        "order #{} has no item #{item_id}",
                        existing.id
                    ))
                })?;
                let priced = if stored.product_id == product.id {
                    reprice_line(product, &line.request)
                } else {
                    price_line(product, &line.request)
                }
                .map_err(pricing_error)?;
                updated_items.push((item_id, priced));
            }
            None => new_items.push(price_line(product, &line.request).map_err(pricing_error)?),
        }
    }
    ensure_totals_fit(updated_items.iter().map(|(_, item)| item).chain(&new_items))?;

    let removed_item_ids: Vec<i32> = existing
        .items
        .iter()
        .map(|item| item.id)
        .filter(|id| !updated_items.iter().any(|(kept, _)| kept == id))
        .collect();

    let revision = OrderRevision {
        customer: draft.customer,
        hall: draft.hall,
        delivery_date: draft.delivery_date,
        updated_items,
        new_items,
        removed_item_ids,
        updated_at: chrono::Local::now().naive_utc(),
    };

    let order = repo
        .revise_order(existing.id, user.hub_id, &revision)
        .map_err(ServiceError::from)?;
    Ok(ReconcileOutcome::Updated(order))
}

/// Deletes an order with its items and returns their held stock.
pub fn remove_order<R>(repo: &R, user: &AuthenticatedUser, order_id: i32) -> ServiceResult<()>
where
    R: OrderReader + OrderWriter + UserReader + ?Sized,
{
    ensure_any_role(user, &[SALES_ROLE])?;

    let existing = load_owned_order(repo, user, order_id)?;

    repo.delete_order(existing.id, user.hub_id)
        .map_err(ServiceError::from)?;
    log::info!("order #{} deleted", existing.id);
    Ok(())
}

/// Only the staff member who entered an order may change it.
fn load_owned_order<R>(repo: &R, user: &AuthenticatedUser, order_id: i32) -> ServiceResult<Order>
where
    R: OrderReader + UserReader + ?Sized,
{
    let order = repo
        .get_order_by_id(order_id, user.hub_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let local_user = repo
        .get_user_by_email(&user.email, user.hub_id)
        .map_err(ServiceError::from)?;

    match local_user {
        Some(local_user) if local_user.id == order.created_by => Ok(order),
        _ => {
            log::warn!(
                "{} tried to change order #{} owned by user #{}",
                user.email,
                order.id,
                order.created_by
            );
            Err(ServiceError::Forbidden)
        }
    }
}

fn pricing_error(err: PricingError) -> ServiceError {
    ServiceError::Form(err.to_string())
}

fn ensure_totals_fit<'a, I>(lines: I) -> ServiceResult<()>
where
    I: IntoIterator<Item = &'a NewOrderItem>,
{
    OrderTotals::from_lines(lines)
        .map(|_| ())
        .ok_or_else(|| ServiceError::Form("order total is too large".to_string()))
}

/// Products fetched while pricing one request.
struct Catalog<'a, R: ?Sized> {
    repo: &'a R,
    hub_id: i32,
    products: HashMap<i32, Product>,
}

impl<'a, R> Catalog<'a, R>
where
    R: ProductReader + ?Sized,
{
    fn new(repo: &'a R, hub_id: i32) -> Self {
        Self {
            repo,
            hub_id,
            products: HashMap::new(),
        }
    }

    fn product(&mut self, product_id: i32) -> ServiceResult<&Product> {
        if !self.products.contains_key(&product_id) {
            let product = self
                .repo
                .get_product_by_id(product_id, self.hub_id)
                .map_err(ServiceError::from)?
                .ok_or_else(|| pricing_error(PricingError::UnknownProduct(product_id)))?;
            self.products.insert(product_id, product);
        }

        self.products
            .get(&product_id)
            .ok_or_else(|| pricing_error(PricingError::UnknownProduct(product_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::orders::ItemPayload;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::*;

    fn item(id: Option<i32>, product_id: i32, variant_id: Option<i32>, quantity: i32) -> ItemPayload {
        ItemPayload {
            id,
            product_id: Some(product_id),
            variant_id,
            quantity,
            amount_paid: None,
            discount: None,
        }
    }

    fn payload(items: Vec<ItemPayload>) -> OrderPayload {
        OrderPayload {
            customer_name: "Asha".to_string(),
            customer_phone: "98765".to_string(),
            customer_alt_phone: None,
            customer_roll: None,
            hall: "nehru".to_string(),
            delivery_date: None,
            items,
        }
    }

    fn catalog(repo: &mut MockRepository) {
        repo.expect_get_product_by_id()
            .returning(|id, _| match id {
                1 => Ok(Some(chips())),
                2 => Ok(Some(maggi())),
                _ => Ok(None),
            });
    }

    fn order_from(new_order: &NewOrder) -> Order {
        let items = new_order
            .items
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let mut item = order_item(index as i32 + 1, 7, line.product_id, line.unit_price);
                item.variant_id = line.variant_id;
                item.quantity = line.quantity;
                item.total_price = line.total_price;
                item.amount_paid = line.amount_paid;
                item
            })
            .collect();
        order(7, new_order.created_by, items)
    }

    #[test]
    fn build_order_requires_sales_role() {
        let repo = MockRepository::new();
        let user = user_with_roles(&[crate::TREASURER_ROLE]);

        let result = build_order(&repo, &user, payload(vec![item(None, 2, None, 1)]), today());

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn build_order_snapshots_variant_price() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        catalog(&mut repo);
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_create_order()
            .times(1)
            .withf(|new_order| {
                let line = &new_order.items[0];
                new_order.created_by == 3
                    && new_order.hall == Hall::Nehru
                    && new_order.delivery_date == today()
                    && line.unit_price == 3500
                    && line.total_price == 10500
                    && line.amount_paid == 5000
                    && line.name == "Chips (Large)"
            })
            .returning(|new_order| Ok(order_from(new_order)));

        let mut large = item(None, 1, Some(11), 3);
        large.amount_paid = Some(5000);

        let order = build_order(&repo, &user, payload(vec![large]), today()).expect("order");

        assert_eq!(order.total_amount, 10500);
        assert_eq!(order.items[0].unit_price, 3500);
    }

    #[test]
    fn build_order_rejects_unknown_product() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        catalog(&mut repo);
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_create_order().never();

        let result = build_order(&repo, &user, payload(vec![item(None, 99, None, 1)]), today());

        assert!(matches!(result, Err(ServiceError::Form(message)) if message.contains("#99")));
    }

    #[test]
    fn build_order_rejects_missing_variant() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        catalog(&mut repo);
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_create_order().never();

        let result = build_order(&repo, &user, payload(vec![item(None, 1, None, 1)]), today());

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn build_order_rejects_empty_item_list() {
        let repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);

        let result = build_order(&repo, &user, payload(Vec::new()), today());

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn build_order_rejects_archived_product() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        repo.expect_get_product_by_id().returning(|_, _| {
            let mut product = maggi();
            product.is_archived = true;
            Ok(Some(product))
        });
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_create_order().never();

        let result = build_order(&repo, &user, payload(vec![item(None, 2, None, 1)]), today());

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn reconcile_by_non_owner_is_forbidden() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        repo.expect_get_order_by_id()
            .returning(|_, _| Ok(Some(order(7, 3, vec![order_item(1, 7, 2, 1400)]))));
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(4))));
        repo.expect_revise_order().never();
        repo.expect_delete_order().never();

        let result = reconcile_order(&repo, &user, 7, payload(Vec::new()), today());

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn reconcile_with_empty_list_deletes_order() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        repo.expect_get_order_by_id()
            .returning(|_, _| Ok(Some(order(7, 3, vec![order_item(1, 7, 2, 1400)]))));
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_delete_order()
            .times(1)
            .withf(|order_id, hub_id| *order_id == 7 && *hub_id == HUB_ID)
            .returning(|_, _| Ok(()));

        let outcome = reconcile_order(&repo, &user, 7, payload(Vec::new()), today()).expect("ok");

        assert!(matches!(outcome, ReconcileOutcome::Deleted));
    }

    #[test]
    fn reconcile_diffs_item_list() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        catalog(&mut repo);
        repo.expect_get_order_by_id().returning(|_, _| {
            Ok(Some(order(
                7,
                3,
                vec![order_item(1, 7, 2, 1200), order_item(2, 7, 2, 1200)],
            )))
        });
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_revise_order()
            .times(1)
            .withf(|order_id, _, revision| {
                *order_id == 7
                    && revision.removed_item_ids == vec![2]
                    && revision.updated_items.len() == 1
                    && revision.updated_items[0].0 == 1
                    && revision.updated_items[0].1.unit_price == 1400
                    && revision.updated_items[0].1.quantity == 4
                    && revision.new_items.len() == 1
                    && revision.new_items[0].variant_id == Some(10)
            })
            .returning(|_, _, _| Ok(order(7, 3, Vec::new())));

        let outcome = reconcile_order(
            &repo,
            &user,
            7,
            payload(vec![item(Some(1), 2, None, 4), item(None, 1, Some(10), 1)]),
            today(),
        )
        .expect("ok");

        assert!(matches!(outcome, ReconcileOutcome::Updated(_)));
    }

    #[test]
    fn reconcile_rejects_foreign_item_id() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        catalog(&mut repo);
        repo.expect_get_order_by_id()
            .returning(|_, _| Ok(Some(order(7, 3, vec![order_item(1, 7, 2, 1400)]))));
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_revise_order().never();

        let result = reconcile_order(
            &repo,
            &user,
            7,
            payload(vec![item(Some(55), 2, None, 1)]),
            today(),
        );

        assert!(matches!(result, Err(ServiceError::Form(message)) if message.contains("#55")));
    }

    #[test]
    fn reconcile_keeps_archived_product_on_existing_line() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        repo.expect_get_product_by_id().returning(|_, _| {
            let mut product = maggi();
            product.is_archived = true;
            Ok(Some(product))
        });
        repo.expect_get_order_by_id()
            .returning(|_, _| Ok(Some(order(7, 3, vec![order_item(1, 7, 2, 1400)]))));
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_revise_order()
            .times(1)
            .returning(|_, _, _| Ok(order(7, 3, vec![order_item(1, 7, 2, 1400)])));

        let outcome = reconcile_order(
            &repo,
            &user,
            7,
            payload(vec![item(Some(1), 2, None, 2)]),
            today(),
        );

        assert!(matches!(outcome, Ok(ReconcileOutcome::Updated(_))));
    }

    #[test]
    fn remove_order_by_owner_deletes() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        repo.expect_get_order_by_id()
            .returning(|_, _| Ok(Some(order(7, 3, vec![order_item(1, 7, 2, 1400)]))));
        repo.expect_get_user_by_email()
            .returning(|_, _| Ok(Some(local_user(3))));
        repo.expect_delete_order().times(1).returning(|_, _| Ok(()));

        assert!(remove_order(&repo, &user, 7).is_ok());
    }

    #[test]
    fn remove_missing_order_is_not_found() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        repo.expect_get_order_by_id().returning(|_, _| Ok(None));

        assert!(matches!(
            remove_order(&repo, &user, 7),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn load_orders_page_rejects_unknown_hall() {
        let repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);

        let result = load_orders_page(
            &repo,
            &user,
            IndexQuery {
                hall: Some("hogwarts".to_string()),
                ..IndexQuery::default()
            },
        );

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn load_orders_page_applies_filters() {
        let mut repo = MockRepository::new();
        let user = user_with_roles(&[SALES_ROLE]);
        repo.expect_list_orders()
            .times(1)
            .withf(|query| {
                query.hub_id == HUB_ID
                    && query.hall == Some(Hall::Rk)
                    && query.status == Some(DeliveryStatus::Pending)
                    && query.search.as_deref() == Some("asha")
            })
            .returning(|_| Ok((1, vec![order(7, 3, Vec::new())])));

        let data = load_orders_page(
            &repo,
            &user,
            IndexQuery {
                search: Some(" asha ".to_string()),
                hall: Some("rk".to_string()),
                status: Some("pending".to_string()),
                page: None,
            },
        )
        .expect("page");

        assert_eq!(data.hall, Some(Hall::Rk));
        assert_eq!(data.search.as_deref(), Some("asha"));
    }
}
