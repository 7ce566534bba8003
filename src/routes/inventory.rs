use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::forms::inventory::{InventoryForm, StockMovementForm};
use crate::repository::DieselRepository;
use crate::routes::{page_error, redirect_with_error, today};
use crate::services::inventory::{self, InventoryQuery};
use crate::services::{ServiceError, products, stock};

#[get("/inventory")]
pub async fn show_inventory(
    params: web::Query<InventoryQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let data = match inventory::load_inventory_page(repo.get_ref(), &user, params.0) {
        Ok(data) => data,
        Err(err) => return page_error(err, "inventory", "/inventory"),
    };

    let catalog = match products::load_catalog(repo.get_ref(), &user) {
        Ok(catalog) => catalog,
        Err(err) => return page_error(err, "catalog", "/inventory"),
    };

    let mut context = base_context(
        &flash_messages,
        &user,
        "inventory",
        &server_config.auth_service_url,
    );
    context.insert("records", &data.records);
    context.insert("stock", &data.stock);
    context.insert("product_id", &data.product_id);
    context.insert("catalog", &catalog);
    context.insert("today", &today());
    render_template(&tera, "inventory/index.html", &context)
}

#[post("/inventory/add")]
pub async fn add_inventory(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<InventoryForm>,
) -> impl Responder {
    match inventory::create_inventory(repo.get_ref(), &user, form, today()) {
        Ok(record) => {
            FlashMessage::success(format!(
                "Received {} unit(s); remaining stock updated.",
                record.quantity_added
            ))
            .send();
            redirect("/inventory")
        }
        Err(err) => redirect_with_error(err, "record received stock", "/inventory"),
    }
}

#[post("/inventory/{inventory_id}/edit")]
pub async fn edit_inventory(
    inventory_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<InventoryForm>,
) -> impl Responder {
    match inventory::update_inventory(repo.get_ref(), &user, inventory_id.into_inner(), form, today())
    {
        Ok(_) => {
            FlashMessage::success("Stock record updated.").send();
            redirect("/inventory")
        }
        Err(err) => redirect_with_error(err, "update the stock record", "/inventory"),
    }
}

#[post("/inventory/{inventory_id}/delete")]
pub async fn delete_inventory(
    inventory_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match inventory::delete_inventory(repo.get_ref(), &user, inventory_id.into_inner()) {
        Ok(()) => {
            FlashMessage::success("Stock record deleted.").send();
            redirect("/inventory")
        }
        Err(err) => redirect_with_error(err, "delete the stock record", "/inventory"),
    }
}

#[post("/stock/movement")]
pub async fn stock_movement(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<StockMovementForm>,
) -> impl Responder {
    let result = form
        .into_movement()
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|(key, movement)| stock::apply_movement(repo.get_ref(), &user, key, movement));

    match result {
        Ok(Some(counter)) => {
            FlashMessage::success(format!("Remaining stock is now {}.", counter.quantity)).send();
            redirect("/inventory")
        }
        Ok(None) => {
            FlashMessage::warning("Nothing in stock for that item; no change made.").send();
            redirect("/inventory")
        }
        Err(err) => redirect_with_error(err, "adjust stock", "/inventory"),
    }
}
