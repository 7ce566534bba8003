use chrono::NaiveDate;

use pushkind_bulk::domain::inventory::StockKey;
use pushkind_bulk::domain::order::DeliveryStatus;
use pushkind_bulk::forms::delivery::DeliveryQuery;
use pushkind_bulk::forms::orders::OrderPayload;
use pushkind_bulk::repository::{OrderReader, StockLedger};
use pushkind_bulk::services::{ServiceError, delivery, orders};
use pushkind_bulk::{DELIVERY_ROLE, SALES_ROLE};

mod common;

use common::{HUB_ID, line, payload, seed_maggi, user};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, day).expect("valid date")
}

fn to_hall(hall: &str, delivery_date: NaiveDate, product_id: i32) -> OrderPayload {
    OrderPayload {
        hall: hall.into(),
        delivery_date: Some(delivery_date),
        ..payload(vec![line(product_id, None, 1, 0), line(product_id, None, 2, 0)])
    }
}

#[test]
fn dashboard_groups_pending_orders_by_hall() {
    let test_db = common::TestDb::new("delivery_groups_by_hall.db");
    let repo = test_db.repo();
    let maggi = seed_maggi(&repo);
    let seller = user("seller@example.com", &[SALES_ROLE]);
    let courier = user("courier@example.com", &[DELIVERY_ROLE]);

    orders::build_order(&repo, &seller, to_hall("patel", date(1), maggi.id), date(1))
        .expect("patel order");
    orders::build_order(&repo, &seller, to_hall("azad", date(2), maggi.id), date(1))
        .expect("azad order");
    orders::build_order(&repo, &seller, to_hall("azad", date(5), maggi.id), date(1))
        .expect("future order");

    let page = delivery::load_delivery_page(
        &repo,
        &courier,
        DeliveryQuery {
            date: Some(date(2)),
            hall: None,
        },
        date(1),
    )
    .expect("dashboard");

    assert_eq!(page.total_orders, 2);
    let halls: Vec<_> = page.groups.iter().map(|group| group.hall_id).collect();
    assert_eq!(halls, vec!["azad", "patel"]);

    let err = delivery::load_delivery_page(&repo, &seller, DeliveryQuery::default(), date(1))
        .expect_err("sales cannot open the dashboard");
    assert!(matches!(err, ServiceError::Unauthorized));
}

#[test]
fn bulk_delivery_updates_orders_together() {
    let test_db = common::TestDb::new("delivery_bulk.db");
    let repo = test_db.repo();
    let maggi = seed_maggi(&repo);
    let seller = user("seller@example.com", &[SALES_ROLE]);
    let courier = user("courier@example.com", &[DELIVERY_ROLE]);

    let first = orders::build_order(&repo, &seller, to_hall("rk", date(1), maggi.id), date(1))
        .expect("first order");
    let second = orders::build_order(&repo, &seller, to_hall("rk", date(1), maggi.id), date(1))
        .expect("second order");

    let item_ids = vec![first.items[0].id, first.items[1].id, second.items[0].id];
    let touched = delivery::mark_delivered(&repo, &courier, &item_ids).expect("delivered");
    assert_eq!(touched, 2);

    let first = repo
        .get_order_by_id(first.id, HUB_ID)
        .expect("load")
        .expect("exists");
    let second = repo
        .get_order_by_id(second.id, HUB_ID)
        .expect("load")
        .expect("exists");
    assert_eq!(first.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(second.delivery_status, DeliveryStatus::Pending);
    assert_eq!(second.items[0].delivery_status, DeliveryStatus::Delivered);

    let err = delivery::mark_delivered(&repo, &courier, &[second.items[1].id, 9999])
        .expect_err("unknown item aborts the batch");
    assert!(matches!(err, ServiceError::NotFound));
    let second = repo
        .get_order_by_id(second.id, HUB_ID)
        .expect("load")
        .expect("exists");
    assert_eq!(second.items[1].delivery_status, DeliveryStatus::Pending);
}

#[test]
fn cancelling_an_order_returns_its_stock() {
    let test_db = common::TestDb::new("delivery_cancel_returns_stock.db");
    let repo = test_db.repo();
    let maggi = seed_maggi(&repo);
    let key = StockKey::new(maggi.id, None);
    let seller = user("seller@example.com", &[SALES_ROLE]);
    let courier = user("courier@example.com", &[DELIVERY_ROLE]);

    repo.adjust_stock(HUB_ID, key, 20).expect("stock received");
    let order = orders::build_order(&repo, &seller, to_hall("vs", date(1), maggi.id), date(1))
        .expect("order");
    assert_eq!(
        repo.get_remaining_stock(HUB_ID, key).expect("read").map(|c| c.quantity),
        Some(17)
    );

    let cancelled = delivery::set_order_status(&repo, &courier, order.id, DeliveryStatus::Cancelled)
        .expect("cancelled");
    assert_eq!(cancelled.delivery_status, DeliveryStatus::Cancelled);
    assert!(
        cancelled
            .items
            .iter()
            .all(|item| item.delivery_status == DeliveryStatus::Cancelled)
    );
    assert_eq!(
        repo.get_remaining_stock(HUB_ID, key).expect("read").map(|c| c.quantity),
        Some(20)
    );
}

#[test]
fn rollover_moves_only_overdue_pending_orders() {
    let test_db = common::TestDb::new("delivery_rollover.db");
    let repo = test_db.repo();
    let maggi = seed_maggi(&repo);
    let seller = user("seller@example.com", &[SALES_ROLE]);
    let courier = user("courier@example.com", &[DELIVERY_ROLE]);

    let overdue = orders::build_order(&repo, &seller, to_hall("llr", date(1), maggi.id), date(1))
        .expect("overdue");
    let delivered = orders::build_order(&repo, &seller, to_hall("llr", date(1), maggi.id), date(1))
        .expect("delivered");
    let upcoming = orders::build_order(&repo, &seller, to_hall("llr", date(6), maggi.id), date(1))
        .expect("upcoming");
    delivery::set_order_status(&repo, &courier, delivered.id, DeliveryStatus::Delivered)
        .expect("delivered");

    let moved = delivery::roll_over(&repo, &courier, date(3)).expect("rolled over");
    assert_eq!(moved, 1);

    let load = |id| {
        repo.get_order_by_id(id, HUB_ID)
            .expect("load")
            .expect("exists")
            .delivery_date
    };
    assert_eq!(load(overdue.id), date(3));
    assert_eq!(load(delivered.id), date(1));
    assert_eq!(load(upcoming.id), date(6));
}
