use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::domain::hall::hall_options;
use crate::forms::delivery::{BulkDeliverForm, DeliveryQuery, StatusForm};
use crate::repository::DieselRepository;
use crate::routes::{page_error, redirect_with_error, today};
use crate::services::{ServiceError, delivery};

#[get("/delivery")]
pub async fn show_delivery(
    params: web::Query<DeliveryQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match delivery::load_delivery_page(repo.get_ref(), &user, params.0, today()) {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "delivery",
                &server_config.auth_service_url,
            );
            context.insert("date", &data.date);
            context.insert("hall", &data.hall.map(|hall| hall.as_str()));
            context.insert("groups", &data.groups);
            context.insert("total_orders", &data.total_orders);
            context.insert("halls", &hall_options());
            render_template(&tera, "delivery/index.html", &context)
        }
        Err(err) => page_error(err, "delivery dashboard", "/delivery"),
    }
}

#[post("/delivery/items/{item_id}/status")]
pub async fn item_status(
    item_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<StatusForm>,
) -> impl Responder {
    let item_id = item_id.into_inner();
    let result = form
        .status()
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|status| delivery::set_item_status(repo.get_ref(), &user, item_id, status));

    match result {
        Ok(order) => {
            FlashMessage::success(format!(
                "Item updated; order #{} is {}.",
                order.id, order.delivery_status
            ))
            .send();
            redirect("/delivery")
        }
        Err(err) => redirect_with_error(err, "update the item", "/delivery"),
    }
}

#[post("/delivery/orders/{order_id}/status")]
pub async fn order_status(
    order_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<StatusForm>,
) -> impl Responder {
    let order_id = order_id.into_inner();
    let result = form
        .status()
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|status| delivery::set_order_status(repo.get_ref(), &user, order_id, status));

    match result {
        Ok(order) => {
            FlashMessage::success(format!("Order #{} is {}.", order.id, order.delivery_status))
                .send();
            redirect("/delivery")
        }
        Err(err) => redirect_with_error(err, "update the order", "/delivery"),
    }
}

#[post("/delivery/deliver")]
pub async fn deliver_items(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> impl Responder {
    let result = BulkDeliverForm::from_form_body(&body)
        .and_then(BulkDeliverForm::into_item_ids)
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|item_ids| delivery::mark_delivered(repo.get_ref(), &user, &item_ids));

    match result {
        Ok(orders) => {
            FlashMessage::success(format!("Marked items delivered across {orders} order(s)."))
                .send();
            redirect("/delivery")
        }
        Err(err) => redirect_with_error(err, "mark items delivered", "/delivery"),
    }
}

#[post("/delivery/rollover")]
pub async fn rollover(user: AuthenticatedUser, repo: web::Data<DieselRepository>) -> impl Responder {
    match delivery::roll_over(repo.get_ref(), &user, today()) {
        Ok(moved) => {
            FlashMessage::success(format!("Moved {moved} pending order(s) to today.")).send();
            redirect("/delivery")
        }
        Err(err) => redirect_with_error(err, "roll over orders", "/delivery"),
    }
}
