use pushkind_bulk::domain::product::{ProductPricing, ProductUpdate, UpdateProduct, VariantDraft};
use pushkind_bulk::forms::products::ProductForm;
use pushkind_bulk::repository::{ProductReader, ProductWriter};
use pushkind_bulk::services::{ServiceError, orders, products};
use pushkind_bulk::{ADMIN_ROLE, SALES_ROLE};

mod common;

use common::{HUB_ID, line, payload, seed_chips, user, variant_id};

fn form(body: String) -> ProductForm {
    ProductForm::from_form_body(body.as_bytes()).expect("valid product form")
}

#[test]
fn variants_in_use_cannot_be_removed() {
    let test_db = common::TestDb::new("products_variant_in_use.db");
    let repo = test_db.repo();
    let chips = seed_chips(&repo);
    let small = variant_id(&chips, "Small");
    let large = variant_id(&chips, "Large");
    let admin = user("admin@example.com", &[ADMIN_ROLE]);
    let seller = user("seller@example.com", &[SALES_ROLE]);

    orders::build_order(
        &repo,
        &seller,
        payload(vec![line(chips.id, Some(large), 1, 0)]),
        chrono::NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
    )
    .expect("order");

    let drop_large = format!(
        "name=Chips&variants[0][id]={small}&variants[0][name]=Small&variants[0][price]=20"
    );
    let err = products::update_product(&repo, &admin, chips.id, form(drop_large))
        .expect_err("large is ordered");
    assert!(matches!(err, ServiceError::Conflict(_)));

    let drop_small = format!(
        "name=Chips&variants[0][id]={large}&variants[0][name]=Large&variants[0][price]=38.50"
    );
    let updated = products::update_product(&repo, &admin, chips.id, form(drop_small))
        .expect("small is unused");
    assert_eq!(updated.variants.len(), 1);
    assert_eq!(updated.variants[0].id, large);
    assert_eq!(updated.variants[0].price, 3850);
}

#[test]
fn variant_removal_is_checked_inside_the_write() {
    let test_db = common::TestDb::new("products_variant_check_in_write.db");
    let repo = test_db.repo();
    let chips = seed_chips(&repo);
    let small = variant_id(&chips, "Small");
    let large = variant_id(&chips, "Large");
    let seller = user("seller@example.com", &[SALES_ROLE]);

    orders::build_order(
        &repo,
        &seller,
        payload(vec![line(chips.id, Some(large), 1, 0)]),
        chrono::NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
    )
    .expect("order");

    let outcome = repo
        .update_product(
            chips.id,
            HUB_ID,
            &UpdateProduct::new()
                .name("Potato Chips".to_string())
                .pricing(ProductPricing::Variants(vec![VariantDraft {
                    id: Some(small),
                    name: "Small".into(),
                    price: 2000,
                }])),
        )
        .expect("update runs");
    assert!(matches!(outcome, ProductUpdate::VariantsInUse(1)));

    let stored = repo
        .get_product_by_id(chips.id, HUB_ID)
        .expect("load")
        .expect("product kept");
    assert_eq!(stored.name, "Chips");
    assert_eq!(stored.variants.len(), 2);
}

#[test]
fn archived_products_leave_the_catalog() {
    let test_db = common::TestDb::new("products_archive.db");
    let repo = test_db.repo();
    let chips = seed_chips(&repo);
    let admin = user("admin@example.com", &[ADMIN_ROLE]);
    let seller = user("seller@example.com", &[SALES_ROLE]);

    let err = products::set_archived(&repo, &seller, chips.id, true).expect_err("admin only");
    assert!(matches!(err, ServiceError::Unauthorized));

    products::set_archived(&repo, &admin, chips.id, true).expect("archived");
    assert!(
        products::load_catalog(&repo, &seller)
            .expect("catalog")
            .is_empty()
    );

    let stored = repo
        .get_product_by_id(chips.id, HUB_ID)
        .expect("load")
        .expect("product kept");
    assert!(stored.is_archived);

    products::set_archived(&repo, &admin, chips.id, false).expect("restored");
    assert_eq!(products::load_catalog(&repo, &seller).expect("catalog").len(), 1);
}
